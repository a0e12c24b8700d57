pub mod helpers;
pub mod ingest;
