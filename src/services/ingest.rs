//! Ingestion orchestrator: pull unseen messages from one account, run the
//! classification pipeline on each, and persist the results.

use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

use crate::adapters::imap;
use crate::adapters::sqlite::accounts::EmailAccount;
use crate::adapters::sqlite::emails::{self, ProcessedEmail};
use crate::adapters::sqlite::DbPool;
use crate::config::ProcessingConfig;
use crate::error::TriageError;
use crate::services::helpers::{classify, fingerprint, normalize};

/// Character cap applied to `content` in returned records; storage keeps
/// the full capped body.
const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Serialize)]
pub struct IngestOutcome {
    pub processed_count: usize,
    pub emails: Vec<ProcessedEmail>,
}

/// Caller-supplied limit if present, else the configured default; always
/// clamped to the ceiling rather than rejected.
fn resolve_batch_limit(requested: Option<usize>, cfg: &ProcessingConfig) -> usize {
    requested
        .unwrap_or(cfg.default_batch_size)
        .min(cfg.max_batch_size)
}

/// Process up to `limit` unseen messages for one account.
///
/// Authentication and mailbox selection failures abort the whole call.
/// Failures on individual messages (fetch, parse) are logged and skipped,
/// so one bad message never sinks the batch. All writes are committed in
/// one batch after the fetch loop.
pub async fn process_account(
    pool: &DbPool,
    cfg: &ProcessingConfig,
    account: &EmailAccount,
    limit: Option<usize>,
) -> Result<IngestOutcome, TriageError> {
    if !cfg.processing_enabled {
        return Err(TriageError::ProcessingDisabled);
    }

    let limit = resolve_batch_limit(limit, cfg);
    let timeout = Duration::from_secs(cfg.imap_timeout_seconds);

    info!(account_id = account.id, email = %account.email, limit = limit, "Starting ingestion");

    let mut session = imap::connect(
        &account.imap_host,
        imap::IMAPS_PORT,
        &account.email,
        &account.password,
        timeout,
    )
    .await?;

    session.select_inbox().await?;

    let uids = session.search_unseen().await?;

    // Most recently received within the search ordering
    let start = uids.len().saturating_sub(limit);
    let batch = &uids[start..];

    let mut fetched: Vec<(u32, Result<Option<Vec<u8>>, TriageError>)> =
        Vec::with_capacity(batch.len());
    for &uid in batch {
        fetched.push((uid, session.fetch_raw(uid, timeout).await));
    }

    let records = process_fetched(fetched, cfg);

    let persisted: HashSet<String> = emails::upsert_emails(pool, &records)?.into_iter().collect();
    session.logout().await;

    // Only rows that made it into the store count as processed
    let emails: Vec<ProcessedEmail> = records
        .into_iter()
        .filter(|record| persisted.contains(&record.id))
        .map(|record| record.with_preview(PREVIEW_CHARS))
        .collect();

    info!(
        account_id = account.id,
        processed = emails.len(),
        "Ingestion finished"
    );

    Ok(IngestOutcome {
        processed_count: emails.len(),
        emails,
    })
}

/// Run the classification pipeline over a batch of fetch results.
///
/// A failed or empty fetch, or a message that fails processing, is logged
/// with its UID and dropped; the surviving messages come through untouched.
fn process_fetched<I>(items: I, cfg: &ProcessingConfig) -> Vec<ProcessedEmail>
where
    I: IntoIterator<Item = (u32, Result<Option<Vec<u8>>, TriageError>)>,
{
    let mut records = Vec::new();

    for (uid, fetched) in items {
        let raw = match fetched {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                warn!(uid = uid, "FETCH returned no body, skipping message");
                continue;
            }
            Err(e) => {
                warn!(uid = uid, "Fetch failed, skipping message: {}", e);
                continue;
            }
        };

        match process_message(&raw, cfg) {
            Ok(record) => records.push(record),
            Err(e) => warn!(uid = uid, "Processing failed, skipping message: {}", e),
        }
    }

    records
}

/// Normalize, fingerprint, and classify one raw message.
pub fn process_message(raw: &[u8], cfg: &ProcessingConfig) -> Result<ProcessedEmail, TriageError> {
    let msg = normalize::normalize(raw, cfg)?;
    let id = fingerprint::fingerprint(&msg.sender, &msg.subject, &msg.body);

    let result = classify::classify(&msg.body, &msg.subject, cfg.response_generation_enabled);

    Ok(ProcessedEmail {
        id,
        subject: msg.subject,
        sender: msg.sender,
        content: msg.body,
        category: result.category,
        priority: result.priority,
        processed_at: Utc::now(),
        action_items: result.action_items,
        deadlines: result.deadlines,
        sentiment: result.sentiment,
        suggested_response: result.suggested_response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::helpers::classify::{Category, Sentiment};

    fn test_config() -> ProcessingConfig {
        ProcessingConfig::default()
    }

    #[test]
    fn test_batch_limit_defaults_when_unspecified() {
        let cfg = test_config();
        assert_eq!(resolve_batch_limit(None, &cfg), cfg.default_batch_size);
    }

    #[test]
    fn test_batch_limit_clamped_not_rejected() {
        let cfg = test_config();
        assert_eq!(resolve_batch_limit(Some(500), &cfg), cfg.max_batch_size);
        assert_eq!(resolve_batch_limit(Some(3), &cfg), 3);
    }

    #[test]
    fn test_batch_survives_individual_failures() {
        let good_a = b"From: a@example.com\r\nSubject: One\r\n\r\nfirst body\r\n".to_vec();
        let good_b = b"From: b@example.com\r\nSubject: Two\r\n\r\nsecond body\r\n".to_vec();

        let items = vec![
            (1_u32, Ok(Some(good_a))),
            (2, Err(TriageError::Imap("FETCH for UID 2 timed out".into()))),
            (3, Ok(None)),
            (4, Ok(Some(good_b))),
        ];

        let records = process_fetched(items, &test_config());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].subject, "One");
        assert_eq!(records[1].subject, "Two");
    }

    #[test]
    fn test_process_message_pipeline() {
        let raw = b"From: billing@example.com\r\n\
                    Subject: Payment needed\r\n\
                    \r\n\
                    Please send the invoice by Friday, this is urgent!\r\n";
        let record = process_message(raw, &test_config()).unwrap();

        assert_eq!(record.category, Category::Invoice);
        assert_eq!(record.sentiment, Sentiment::Negative);
        assert_eq!(record.priority, 5);
        assert_eq!(record.deadlines.len(), 1);
        assert!(!record.suggested_response.is_empty());
    }

    #[test]
    fn test_process_message_idempotent_fingerprint() {
        let raw = b"From: a@example.com\r\nSubject: Hi\r\n\r\nsame body\r\n";
        let first = process_message(raw, &test_config()).unwrap();
        let second = process_message(raw, &test_config()).unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn test_process_message_respects_response_flag() {
        let raw = b"From: a@example.com\r\nSubject: Hi\r\n\r\nhello\r\n";
        let mut cfg = test_config();
        cfg.response_generation_enabled = false;
        let record = process_message(raw, &cfg).unwrap();
        assert_eq!(record.suggested_response, "");
    }
}
