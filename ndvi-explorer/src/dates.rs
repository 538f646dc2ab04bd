//! Validation des dates ISO (YYYY-MM-DD)

use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;

fn iso_date() -> &'static Regex {
    static ISO_DATE: OnceLock<Regex> = OnceLock::new();
    ISO_DATE.get_or_init(|| {
        Regex::new(r"^(\d{4})-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$")
            .expect("ISO date pattern is valid")
    })
}

/// Vérifie le format `YYYY-MM-DD` (année 1900-2100)
pub fn is_iso_date(date: &str) -> bool {
    let Some(caps) = iso_date().captures(date) else {
        return false;
    };
    caps[1]
        .parse::<u32>()
        .map(|year| (1900..=2100).contains(&year))
        .unwrap_or(false)
}

/// Valide une plage de dates pour une requête d'analyse
pub fn validate_date_range(start: &str, end: &str) -> Result<()> {
    for date in [start, end] {
        if !is_iso_date(date) {
            anyhow::bail!(
                "Invalid date format: '{}'. Expected YYYY-MM-DD (e.g., 2024-11-01)",
                date
            );
        }
    }

    // L'ordre lexicographique suit l'ordre chronologique en ISO
    if start > end {
        anyhow::bail!("Start date {} is after end date {}", start, end);
    }

    Ok(())
}
