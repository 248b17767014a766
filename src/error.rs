use std::path::PathBuf;

use thiserror::Error;

use crate::api::models::{DnsRecord, RecordId};

pub type Result<T, E = DnsError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum DnsError {
    #[error("Not connected: {0}")]
    Session(String),

    #[error("Unable to parse records from the domain page{}", dump_note(dump_path))]
    ExtractionFailed { dump_path: Option<PathBuf> },

    #[error("Unable to find record {0}")]
    RecordNotFound(String),

    #[error("{count} records match {query}, refusing to pick one")]
    TooManyMatches { query: String, count: usize },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Invalid domain name: {0:?}")]
    InvalidDomain(String),

    #[error("Record {} was removed but adding its replacement failed: {source}", removed.id)]
    PartialUpdate {
        removed: Box<DnsRecord>,
        #[source]
        source: Box<DnsError>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn dump_note(dump_path: &Option<PathBuf>) -> String {
    match dump_path {
        Some(path) => format!(
            "; the page was saved to {} for debugging (it may contain sensitive account data)",
            path.display()
        ),
        None => "; saving the page for debugging failed".to_string(),
    }
}

impl DnsError {
    pub fn not_found(id: &RecordId) -> Self {
        DnsError::RecordNotFound(id.to_string())
    }
}
