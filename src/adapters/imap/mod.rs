//! Thin IMAP session wrapper: connect, select, search unseen, fetch raw.

use std::time::Duration;

use async_imap::Session;
use async_native_tls::TlsStream;
use futures::StreamExt;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::error::TriageError;

pub const IMAPS_PORT: u16 = 993;

pub type ImapSession = Session<TlsStream<TcpStream>>;

pub struct MailSession {
    session: ImapSession,
}

/// Open a TLS session and authenticate. Connection establishment is bounded
/// by `timeout`; a failure here is fatal for the whole ingestion call.
pub async fn connect(
    host: &str,
    port: u16,
    username: &str,
    password: &str,
    timeout: Duration,
) -> Result<MailSession, TriageError> {
    info!(host = %host, port = port, "Connecting to IMAP server");

    let tcp = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| TriageError::Imap(format!("Connection to {} timed out", host)))?
        .map_err(|e| TriageError::Imap(format!("TCP connection failed: {}", e)))?;

    let tls = async_native_tls::TlsConnector::new();
    let tls_stream = tls
        .connect(host, tcp)
        .await
        .map_err(|e| TriageError::Imap(format!("TLS handshake failed: {}", e)))?;

    let client = async_imap::Client::new(tls_stream);

    let session = client
        .login(username, password)
        .await
        .map_err(|(e, _)| TriageError::Imap(format!("Login failed: {}", e)))?;

    Ok(MailSession { session })
}

impl MailSession {
    pub async fn select_inbox(&mut self) -> Result<(), TriageError> {
        self.session
            .select("INBOX")
            .await
            .map_err(|e| TriageError::Imap(format!("SELECT INBOX failed: {}", e)))?;
        Ok(())
    }

    /// UIDs of unseen messages, ascending.
    pub async fn search_unseen(&mut self) -> Result<Vec<u32>, TriageError> {
        let uid_set = self
            .session
            .uid_search("UNSEEN")
            .await
            .map_err(|e| TriageError::Imap(format!("SEARCH UNSEEN failed: {}", e)))?;

        let mut uids: Vec<u32> = uid_set.into_iter().collect();
        uids.sort_unstable();
        Ok(uids)
    }

    /// Fetch the full raw message for one UID, bounded by `timeout`.
    ///
    /// Unparseable responses within the FETCH stream are logged and skipped
    /// rather than failing the call; `None` means the server returned no
    /// usable body for this UID.
    pub async fn fetch_raw(
        &mut self,
        uid: u32,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, TriageError> {
        let fetch = async {
            let stream = self
                .session
                .uid_fetch(uid.to_string(), "(RFC822)")
                .await
                .map_err(|e| TriageError::Imap(format!("FETCH failed for UID {}: {}", uid, e)))?;

            futures::pin_mut!(stream);
            let mut raw: Option<Vec<u8>> = None;
            while let Some(result) = stream.next().await {
                match result {
                    Ok(fetch) => {
                        if raw.is_none() {
                            raw = fetch.body().map(|b| b.to_vec());
                        }
                    }
                    Err(e) => {
                        warn!(uid = uid, "Skipping unparseable IMAP response: {}", e);
                    }
                }
            }
            Ok(raw)
        };

        tokio::time::timeout(timeout, fetch)
            .await
            .map_err(|_| TriageError::Imap(format!("FETCH for UID {} timed out", uid)))?
    }

    pub async fn logout(mut self) {
        if let Err(e) = self.session.logout().await {
            debug!("IMAP logout failed: {}", e);
        }
    }
}
