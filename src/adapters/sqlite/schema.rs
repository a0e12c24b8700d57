use rusqlite::Connection;

use crate::error::TriageError;

pub fn initialize_schema(conn: &Connection) -> Result<(), TriageError> {
    conn.execute_batch(
        "
        -- Processed message store, keyed by content fingerprint.
        -- Reprocessing the same logical message replaces the row.
        CREATE TABLE IF NOT EXISTS emails (
            id              TEXT PRIMARY KEY,   -- sha-256 hex of sender+subject+body prefix
            subject         TEXT NOT NULL,
            sender          TEXT NOT NULL,
            content         TEXT NOT NULL,
            category        TEXT NOT NULL,
            priority        INTEGER NOT NULL,
            processed_at    TEXT NOT NULL,      -- RFC 3339
            action_items    TEXT NOT NULL DEFAULT '[]',  -- JSON array
            deadlines       TEXT NOT NULL DEFAULT '[]',  -- JSON array
            sentiment       TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_emails_category   ON emails(category);
        CREATE INDEX IF NOT EXISTS idx_emails_priority   ON emails(priority);
        CREATE INDEX IF NOT EXISTS idx_emails_processed  ON emails(processed_at DESC);

        -- Accounts the ingestion pipeline can pull from.
        CREATE TABLE IF NOT EXISTS email_accounts (
            id              INTEGER PRIMARY KEY,
            email           TEXT NOT NULL,
            password        TEXT NOT NULL,
            imap_host       TEXT NOT NULL,
            smtp_host       TEXT NOT NULL
        );
    ",
    )?;

    Ok(())
}
