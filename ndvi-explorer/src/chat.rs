//! Assistant conversationnel sur la région analysée
//!
//! Le relais reçoit la question et un instantané du contexte (région, frame
//! courante) et renvoie une réponse texte. Une erreur du relais ne remonte
//! jamais : l'utilisateur reçoit un message de repli.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use ndvi_core::{Region, TimelineFrame};

use crate::api::types::NdviResponse;

/// Premier message de chaque conversation
pub const GREETING: &str = "Hello! How can I help you analyze this region?";

/// Réponse affichée quand le relais échoue
pub const FALLBACK_REPLY: &str = "Sorry, I'm having trouble connecting. Please try again later.";

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Chat relay unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat relay returned status {0}")]
    Status(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRef {
    pub name: String,
}

/// Contexte envoyé avec chaque question
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    pub selected_region: Option<RegionRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_ndvi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub land_cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_elevation: Option<f64>,
}

impl ChatContext {
    pub fn new(
        region: Option<&Region>,
        frame: Option<&TimelineFrame>,
        response: Option<&NdviResponse>,
    ) -> Self {
        Self {
            selected_region: region
                .filter(|r| !r.is_empty())
                .map(|r| RegionRef { name: r.name.clone() }),
            current_ndvi: frame.map(|f| f.ndvi),
            temperature: frame.and_then(|f| f.temperature),
            precipitation: frame.and_then(|f| f.precipitation),
            date: frame.map(|f| f.date.clone()),
            land_cover: response
                .and_then(|r| r.landcover.as_ref())
                .map(|lc| lc.land_cover.dominant_class.clone()),
            mean_elevation: response
                .and_then(|r| r.topography.as_ref())
                .map(|t| t.elevation.mean_meters),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    context: &'a ChatContext,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    message: String,
}

/// Relais vers le modèle de langage
pub trait ChatRelay: Send + Sync {
    fn ask<'a>(
        &'a self,
        message: &'a str,
        context: &'a ChatContext,
    ) -> BoxFuture<'a, Result<String, ChatError>>;
}

/// Relais HTTP : `POST {url}` avec `{ message, context }`
#[derive(Debug, Clone)]
pub struct ChatClient {
    url: String,
    http: Client,
}

impl ChatClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ChatError> {
        Ok(Self {
            url: url.into(),
            http: Client::builder().timeout(timeout).build()?,
        })
    }
}

impl ChatRelay for ChatClient {
    fn ask<'a>(
        &'a self,
        message: &'a str,
        context: &'a ChatContext,
    ) -> BoxFuture<'a, Result<String, ChatError>> {
        Box::pin(async move {
            let response = self
                .http
                .post(&self.url)
                .json(&ChatRequest { message, context })
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(ChatError::Status(response.status().as_u16()));
            }

            let reply: ChatReply = response.json().await?;
            Ok(reply.message)
        })
    }
}

/// Fil de discussion
pub struct Conversation {
    relay: Arc<dyn ChatRelay>,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Nouvelle conversation, ouverte par le message d'accueil
    pub fn new(relay: Arc<dyn ChatRelay>) -> Self {
        Self {
            relay,
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Envoie une question et ajoute la réponse au fil
    ///
    /// Une entrée vide (ou blanche) est ignorée et retourne `None`.
    pub async fn send(&mut self, input: &str, context: &ChatContext) -> Option<&ChatMessage> {
        if input.trim().is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::user(input));
        let reply = match self.relay.ask(input, context).await {
            Ok(content) => {
                debug!(chars = content.len(), "Chat reply received");
                ChatMessage::assistant(content)
            }
            Err(e) => {
                warn!(error = %e, "Chat relay failed");
                ChatMessage::assistant(FALLBACK_REPLY)
            }
        };
        self.messages.push(reply);
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndvi_core::LatLng;

    struct Echo;

    impl ChatRelay for Echo {
        fn ask<'a>(
            &'a self,
            message: &'a str,
            context: &'a ChatContext,
        ) -> BoxFuture<'a, Result<String, ChatError>> {
            Box::pin(async move {
                Ok(format!("{} @ {:?}", message, context.date))
            })
        }
    }

    struct Down;

    impl ChatRelay for Down {
        fn ask<'a>(
            &'a self,
            _message: &'a str,
            _context: &'a ChatContext,
        ) -> BoxFuture<'a, Result<String, ChatError>> {
            Box::pin(async { Err(ChatError::Status(500)) })
        }
    }

    #[tokio::test]
    async fn test_greeting_then_reply() {
        let mut chat = Conversation::new(Arc::new(Echo));
        assert_eq!(chat.messages(), &[ChatMessage::assistant(GREETING)]);

        let context = ChatContext {
            date: Some("2024-12-01".into()),
            ..ChatContext::default()
        };
        let reply = chat.send("How green?", &context).await.cloned().unwrap();

        assert_eq!(reply.content, "How green? @ Some(\"2024-12-01\")");
        assert_eq!(chat.messages().len(), 3);
        assert_eq!(chat.messages()[1], ChatMessage::user("How green?"));
    }

    #[tokio::test]
    async fn test_empty_input_ignored() {
        let mut chat = Conversation::new(Arc::new(Echo));
        assert!(chat.send("   ", &ChatContext::default()).await.is_none());
        assert_eq!(chat.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_relay_failure_uses_fallback() {
        let mut chat = Conversation::new(Arc::new(Down));
        let reply = chat.send("Hello", &ChatContext::default()).await.cloned();
        assert_eq!(reply, Some(ChatMessage::assistant(FALLBACK_REPLY)));
    }

    #[test]
    fn test_context_serialization() {
        let region = Region::from_vertices(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 1.0),
            LatLng::new(1.0, 1.0),
        ])
        .unwrap();
        let frame = TimelineFrame::new("2024-12-01", 0.42, "t").with_weather(Some(7.5), None);

        let context = ChatContext::new(Some(&region), Some(&frame), None);
        let value = serde_json::to_value(context).unwrap();
        assert_eq!(value["selectedRegion"]["name"], "Selected Region (0.5000, 0.5000)");
        assert_eq!(value["currentNdvi"], 0.42);
        assert_eq!(value["temperature"], 7.5);
        assert_eq!(value["date"], "2024-12-01");
        assert!(value.get("precipitation").is_none());
    }

    #[test]
    fn test_context_without_region() {
        let context = ChatContext::new(Some(&Region::empty()), None, None);
        let value = serde_json::to_value(context).unwrap();
        assert!(value["selectedRegion"].is_null());
    }
}
