//! Types d'erreurs pour le crate ndvi-core

use thiserror::Error;

/// Erreurs pouvant survenir dans la sélection de région ou la timeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Polygone avec moins de 3 sommets (traité comme "rien de sélectionné")
    #[error("Invalid polygon: {vertices} vertices, at least 3 required")]
    InvalidPolygon { vertices: usize },

    /// Index de frame hors de la timeline
    #[error("Frame index {index} out of range for {len} frames")]
    IndexOutOfRange { index: usize, len: usize },

    /// Opération refusée dans l'état courant du sélecteur
    #[error("Cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: &'static str,
    },
}

impl CoreError {
    /// Crée une erreur de polygone invalide
    pub fn invalid_polygon(vertices: usize) -> Self {
        Self::InvalidPolygon { vertices }
    }

    /// Crée une erreur d'index hors limites
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Crée une erreur de transition invalide
    pub fn invalid_transition(operation: &'static str, state: &'static str) -> Self {
        Self::InvalidTransition { operation, state }
    }
}
