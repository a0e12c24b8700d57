use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, params_from_iter, types::Value};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

use super::DbPool;
use crate::error::TriageError;
use crate::services::helpers::classify::{Category, Deadline, Sentiment};

/// A fully processed message ready to be stored.
/// Decoupled from IMAP — any source can produce this.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedEmail {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub content: String,
    pub category: Category,
    pub priority: u8,
    pub processed_at: DateTime<Utc>,
    pub action_items: Vec<String>,
    pub deadlines: Vec<Deadline>,
    pub sentiment: Sentiment,
    /// Returned to the caller but not persisted
    pub suggested_response: String,
}

impl ProcessedEmail {
    /// Cap `content` to `max_chars` with an ellipsis marker, for listing
    /// and API-style responses.
    pub fn with_preview(mut self, max_chars: usize) -> Self {
        if self.content.chars().count() > max_chars {
            let truncated: String = self.content.chars().take(max_chars).collect();
            self.content = format!("{}...", truncated);
        }
        self
    }
}

/// Insert-or-replace each record keyed by its fingerprint id, committing
/// once for the whole batch. Individual failures are logged and skipped;
/// the returned ids are the rows that actually made it into the store, so
/// callers can drop unpersisted records from their own accounting.
pub fn upsert_emails(pool: &DbPool, emails: &[ProcessedEmail]) -> Result<Vec<String>, TriageError> {
    let conn = pool.get()?;
    let tx = conn.unchecked_transaction()?;

    let mut persisted = Vec::with_capacity(emails.len());

    for email in emails {
        let action_items = serde_json::to_string(&email.action_items)?;
        let deadlines = serde_json::to_string(&email.deadlines)?;

        let result = tx.execute(
            "INSERT OR REPLACE INTO emails (
                id, subject, sender, content, category,
                priority, processed_at, action_items, deadlines, sentiment
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                email.id,
                email.subject,
                email.sender,
                email.content,
                email.category.as_str(),
                email.priority,
                email.processed_at.to_rfc3339(),
                action_items,
                deadlines,
                email.sentiment.as_str(),
            ],
        );

        match result {
            Ok(_) => persisted.push(email.id.clone()),
            Err(e) => warn!(id = %email.id, "Failed to upsert email: {}", e),
        }
    }

    tx.commit()?;
    Ok(persisted)
}

/// A stored record as read back for listing; classification fields come
/// back as plain strings.
#[derive(Debug, Serialize)]
pub struct StoredEmail {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub content: String,
    pub category: String,
    pub priority: i64,
    pub processed_at: String,
    pub action_items: Vec<String>,
    pub deadlines: Vec<Deadline>,
    pub sentiment: String,
}

pub fn list_emails(
    pool: &DbPool,
    category: Option<&str>,
    min_priority: Option<i64>,
) -> Result<Vec<StoredEmail>, TriageError> {
    let conn = pool.get()?;

    let mut sql = String::from(
        "SELECT id, subject, sender, content, category, priority,
                processed_at, action_items, deadlines, sentiment
         FROM emails WHERE 1=1",
    );
    let mut values: Vec<Value> = Vec::new();

    if let Some(category) = category {
        sql.push_str(" AND category = ?");
        values.push(Value::Text(category.to_string()));
    }
    if let Some(min_priority) = min_priority {
        sql.push_str(" AND priority >= ?");
        values.push(Value::Integer(min_priority));
    }
    sql.push_str(" ORDER BY processed_at DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), |row| {
        let action_items: String = row.get(7)?;
        let deadlines: String = row.get(8)?;
        Ok(StoredEmail {
            id: row.get(0)?,
            subject: row.get(1)?,
            sender: row.get(2)?,
            content: row.get(3)?,
            category: row.get(4)?,
            priority: row.get(5)?,
            processed_at: row.get(6)?,
            action_items: serde_json::from_str(&action_items).unwrap_or_default(),
            deadlines: serde_json::from_str(&deadlines).unwrap_or_default(),
            sentiment: row.get(9)?,
        })
    })?;

    let mut emails = Vec::new();
    for row in rows {
        emails.push(row?);
    }
    Ok(emails)
}

/// Aggregate counts backing the dashboard.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_emails: i64,
    pub categories: HashMap<String, i64>,
    pub priorities: HashMap<String, i64>,
    pub recent_activity: i64,
}

pub fn dashboard_stats(pool: &DbPool) -> Result<DashboardStats, TriageError> {
    let conn = pool.get()?;

    let total_emails: i64 = conn.query_row("SELECT COUNT(*) FROM emails", [], |row| row.get(0))?;

    let mut categories = HashMap::new();
    let mut stmt = conn.prepare("SELECT category, COUNT(*) FROM emails GROUP BY category")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    for row in rows {
        let (category, count) = row?;
        categories.insert(category, count);
    }

    let mut priorities = HashMap::new();
    let mut stmt = conn.prepare("SELECT priority, COUNT(*) FROM emails GROUP BY priority")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
    for row in rows {
        let (priority, count) = row?;
        priorities.insert(priority.to_string(), count);
    }

    let week_ago = (Utc::now() - Duration::days(7)).to_rfc3339();
    let recent_activity: i64 = conn.query_row(
        "SELECT COUNT(*) FROM emails WHERE processed_at > ?1",
        params![week_ago],
        |row| row.get(0),
    )?;

    Ok(DashboardStats {
        total_emails,
        categories,
        priorities,
        recent_activity,
    })
}
