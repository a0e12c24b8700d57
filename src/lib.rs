//! inbox-triage - IMAP inbox triage backend
//!
//! Connects to a mail account over IMAP, pulls unread messages, classifies
//! each with keyword heuristics (category, sentiment, priority, action
//! items, deadlines), and persists the results for dashboard-style queries.
//!
//! ## Module Organization
//!
//! - `adapters/`: IMAP session and SQLite storage
//! - `services/`: Ingestion pipeline and classification heuristics
//! - `config/`: Configuration loading (explicit struct, no global state)
//! - `error`: Crate-wide error type

pub mod adapters;
pub mod config;
pub mod error;
pub mod services;
