use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::Spread;
use crate::utils::{looks_like_address, percent_encode};

const SUBJECT: &str = "Tu lectura: Mensaje de los Angeles";

#[derive(Debug, Error, PartialEq)]
pub enum MailError {
    #[error("mail address does not look deliverable")]
    InvalidAddress,
    #[error("there is no revealed reading to send")]
    NothingToSend,
}

/// Build the `mailto:` URL for a revealed spread. Delivery stays with the
/// user's mail client; nothing here sends anything.
pub fn send_by_mail(address: &str, spread: &Spread) -> Result<String, MailError> {
    let address = address.trim();
    if !looks_like_address(address) {
        return Err(MailError::InvalidAddress);
    }
    if spread.result.is_empty() {
        return Err(MailError::NothingToSend);
    }
    let body = summary_text(spread);
    Ok(format!(
        "mailto:{}?subject={}&body={}",
        percent_encode(address),
        percent_encode(SUBJECT),
        percent_encode(&body)
    ))
}

/// Plain-text rendering of a spread, entries ordered by position index
/// ascending whatever order the upstream sent them in.
pub fn summary_text(spread: &Spread) -> String {
    let mut entries: Vec<_> = spread.result.iter().collect();
    entries.sort_by_key(|entry| entry.position_index);

    let mut lines: Vec<String> = Vec::new();
    lines.push("Gracias por confiar en nosotros".to_string());
    lines.push(String::new());
    if let Some(product) = &spread.product_id {
        lines.push(format!("Producto: {}", product));
    }
    if let Some(stamp) = &spread.timestamp {
        lines.push(format!("Fecha: {}", format_timestamp(stamp)));
    }
    lines.push(String::new());
    lines.push("Tu lectura:".to_string());
    lines.push(String::new());
    for entry in entries {
        lines.push(format!(
            "{} (#{}) — {}",
            entry.position, entry.position_index, entry.card.name
        ));
        lines.push(entry.card.meaning.clone());
        lines.push(String::new());
    }
    lines.join("\n")
}

// Upstream stamps are RFC 3339 when present; anything else passes through.
fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M UTC")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SpreadCard, SpreadEntry};

    fn entry(index: i64, position: &str, name: &str, meaning: &str) -> SpreadEntry {
        SpreadEntry {
            position: position.to_string(),
            position_index: index,
            card: SpreadCard {
                id: name.to_lowercase().replace(' ', "-"),
                name: name.to_string(),
                meaning: meaning.to_string(),
                image: None,
                reversed: None,
            },
        }
    }

    fn sample_spread() -> Spread {
        Spread {
            product_id: Some("angeles_12".to_string()),
            spread: Some("angeles".to_string()),
            deck: None,
            seed: None,
            timestamp: Some("2025-03-02T10:30:00Z".to_string()),
            // Deliberately out of order
            result: vec![
                entry(1, "Futuro", "La Estrella", "Esperanza renovada."),
                entry(0, "Presente", "El Sol", "Claridad y alegria."),
            ],
        }
    }

    #[test]
    fn test_summary_orders_by_position_index() {
        let text = summary_text(&sample_spread());
        let sol = text.find("El Sol").unwrap();
        let estrella = text.find("La Estrella").unwrap();
        assert!(sol < estrella);
        assert!(text.contains("Presente (#0) — El Sol"));
        assert!(text.contains("Futuro (#1) — La Estrella"));
    }

    #[test]
    fn test_summary_carries_meanings_and_metadata() {
        let text = summary_text(&sample_spread());
        assert!(text.contains("Claridad y alegria."));
        assert!(text.contains("Producto: angeles_12"));
        assert!(text.contains("Fecha: 2025-03-02 10:30 UTC"));
    }

    #[test]
    fn test_unparseable_timestamp_passes_through() {
        let mut spread = sample_spread();
        spread.timestamp = Some("sometime yesterday".to_string());
        assert!(summary_text(&spread).contains("Fecha: sometime yesterday"));
    }

    #[test]
    fn test_send_by_mail_builds_encoded_url() {
        let url = send_by_mail("cliente@example.com", &sample_spread()).unwrap();
        assert!(url.starts_with("mailto:cliente%40example.com?subject="));
        assert!(url.contains("&body="));
        // Raw separators never leak into the body
        let body = url.split("&body=").nth(1).unwrap();
        assert!(!body.contains(' '));
        assert!(!body.contains('\n'));
    }

    #[test]
    fn test_send_by_mail_rejects_bad_address() {
        assert_eq!(
            send_by_mail("not-an-email", &sample_spread()),
            Err(MailError::InvalidAddress)
        );
        assert_eq!(send_by_mail("", &sample_spread()), Err(MailError::InvalidAddress));
    }

    #[test]
    fn test_send_by_mail_rejects_empty_spread() {
        let mut spread = sample_spread();
        spread.result.clear();
        assert_eq!(
            send_by_mail("cliente@example.com", &spread),
            Err(MailError::NothingToSend)
        );
    }
}
