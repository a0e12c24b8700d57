//! Canonical plaintext extraction from raw RFC 822 bytes.

use mailparse::{parse_mail, MailHeaderMap, ParsedMail};

use crate::config::ProcessingConfig;
use crate::error::TriageError;

/// A message reduced to the three fields the classifier consumes.
/// Subject and body are already capped to the configured lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    pub subject: String,
    pub sender: String,
    pub body: String,
}

/// Parse raw message bytes into a [`NormalizedMessage`].
///
/// For multipart messages the first `text/plain` part wins; a message with
/// no such part gets an empty body. Decoding is best-effort: undecodable
/// bytes degrade to lossy text instead of failing the message.
pub fn normalize(raw: &[u8], cfg: &ProcessingConfig) -> Result<NormalizedMessage, TriageError> {
    let parsed = parse_mail(raw).map_err(|e| TriageError::Parse(e.to_string()))?;

    let subject = parsed
        .headers
        .get_first_value("Subject")
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "No Subject".to_string());

    let sender = parsed
        .headers
        .get_first_value("From")
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown Sender".to_string());

    let body = if parsed.subparts.is_empty() {
        decode_part(&parsed)
    } else {
        first_text_plain(&parsed).unwrap_or_default()
    };

    Ok(NormalizedMessage {
        subject: truncate_chars(&subject, cfg.max_subject_length),
        sender,
        body: truncate_chars(&body, cfg.max_content_length),
    })
}

/// Depth-first scan for the first `text/plain` part.
fn first_text_plain(part: &ParsedMail) -> Option<String> {
    for sub in &part.subparts {
        if sub.ctype.mimetype == "text/plain" {
            return Some(decode_part(sub));
        }
        if let Some(found) = first_text_plain(sub) {
            return Some(found);
        }
    }
    None
}

fn decode_part(part: &ParsedMail) -> String {
    match part.get_body() {
        Ok(body) => body,
        // Fall back to lossy UTF-8 over the transfer-decoded bytes
        Err(_) => part
            .get_body_raw()
            .map(|raw| String::from_utf8_lossy(&raw).into_owned())
            .unwrap_or_default(),
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
