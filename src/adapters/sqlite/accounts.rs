use rusqlite::params;
use serde::Serialize;
use tracing::info;

use super::DbPool;
use crate::error::TriageError;

/// A configured mail account. The ingestion pipeline borrows this read-only
/// for the duration of one call.
#[derive(Debug, Clone)]
pub struct EmailAccount {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub imap_host: String,
    pub smtp_host: String,
}

/// Account listing entry; never exposes the password.
#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub id: i64,
    pub email: String,
    pub imap_host: String,
    pub smtp_host: String,
}

pub fn add_account(
    pool: &DbPool,
    email: &str,
    password: &str,
    imap_host: &str,
    smtp_host: &str,
) -> Result<i64, TriageError> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO email_accounts (email, password, imap_host, smtp_host)
         VALUES (?1, ?2, ?3, ?4)",
        params![email, password, imap_host, smtp_host],
    )?;
    let id = conn.last_insert_rowid();
    info!(account_id = id, email = %email, "Email account added");
    Ok(id)
}

pub fn get_account(pool: &DbPool, account_id: i64) -> Result<EmailAccount, TriageError> {
    let conn = pool.get()?;
    conn.query_row(
        "SELECT id, email, password, imap_host, smtp_host
         FROM email_accounts WHERE id = ?1",
        params![account_id],
        |row| {
            Ok(EmailAccount {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                imap_host: row.get(3)?,
                smtp_host: row.get(4)?,
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => TriageError::AccountNotFound(account_id),
        other => other.into(),
    })
}

pub fn list_accounts(pool: &DbPool) -> Result<Vec<AccountSummary>, TriageError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, email, imap_host, smtp_host FROM email_accounts ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(AccountSummary {
            id: row.get(0)?,
            email: row.get(1)?,
            imap_host: row.get(2)?,
            smtp_host: row.get(3)?,
        })
    })?;

    let mut accounts = Vec::new();
    for row in rows {
        accounts.push(row?);
    }
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{pool, schema};

    fn test_pool() -> DbPool {
        let pool = pool::create_memory_pool();
        schema::initialize_schema(&pool.get().unwrap()).unwrap();
        pool
    }

    #[test]
    fn test_add_and_get_roundtrip() {
        let pool = test_pool();
        let id = add_account(
            &pool,
            "user@example.com",
            "hunter2",
            "imap.example.com",
            "smtp.example.com",
        )
        .unwrap();

        let account = get_account(&pool, id).unwrap();
        assert_eq!(account.email, "user@example.com");
        assert_eq!(account.imap_host, "imap.example.com");
    }

    #[test]
    fn test_missing_account_errors() {
        let pool = test_pool();
        match get_account(&pool, 42) {
            Err(TriageError::AccountNotFound(42)) => {}
            other => panic!("expected AccountNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_listing_omits_password() {
        let pool = test_pool();
        add_account(&pool, "a@b.c", "secret", "imap.b.c", "smtp.b.c").unwrap();
        let accounts = list_accounts(&pool).unwrap();
        assert_eq!(accounts.len(), 1);
        let json = serde_json::to_string(&accounts[0]).unwrap();
        assert!(!json.contains("secret"));
    }
}
