use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DnsError, Result};

pub const DEFAULT_TTL: u32 = 10800;

/// Upstream-assigned record identifier. The registrar hands out numbers on
/// the scraped pages and strings on the API, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Number(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Text(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    #[serde(default)]
    pub content: String,
    pub ttl: u32,
    // Fields like `prio` must survive a bulk update of the record set.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainRef {
    ByName(String),
    Resolved(Domain),
}

impl DomainRef {
    pub fn resolve(&self) -> Result<Domain> {
        match self {
            DomainRef::Resolved(domain) => Ok(domain.clone()),
            DomainRef::ByName(name) => {
                let name = name.trim();
                if name.is_empty() || name.contains('/') || name.contains(char::is_whitespace) {
                    return Err(DnsError::InvalidDomain(name.to_string()));
                }
                Ok(Domain {
                    name: name.to_string(),
                })
            }
        }
    }
}

impl From<&str> for DomainRef {
    fn from(name: &str) -> Self {
        DomainRef::ByName(name.to_string())
    }
}

impl From<Domain> for DomainRef {
    fn from(domain: Domain) -> Self {
        DomainRef::Resolved(domain)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

impl NewRecord {
    pub fn new(record_type: &str, name: &str, content: &str) -> Self {
        Self {
            record_type: record_type.to_string(),
            name: name.to_string(),
            content: content.to_string(),
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn matches(&self, record: &DnsRecord) -> bool {
        self.record_type == record.record_type
            && self.name == record.name
            && self.content == record.content
            && self.ttl == record.ttl
    }
}

/// Fields to change on an existing record. Unset fields keep the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

impl RecordPatch {
    pub fn apply(&self, record: &DnsRecord) -> NewRecord {
        NewRecord {
            record_type: record.record_type.clone(),
            name: self.name.clone().unwrap_or_else(|| record.name.clone()),
            content: self.content.clone().unwrap_or_else(|| record.content.clone()),
            ttl: self.ttl.unwrap_or(record.ttl),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRef {
    ById(RecordId),
    Query { record_type: String, name: String },
}

impl RecordRef {
    pub fn query(record_type: &str, name: &str) -> Self {
        RecordRef::Query {
            record_type: record_type.to_string(),
            name: name.to_string(),
        }
    }

    pub fn resolve<'a>(&self, records: &'a [DnsRecord]) -> Result<&'a DnsRecord> {
        match self {
            RecordRef::ById(id) => records
                .iter()
                .find(|record| &record.id == id)
                .ok_or_else(|| DnsError::not_found(id)),
            RecordRef::Query { record_type, name } => {
                let mut matches = records
                    .iter()
                    .filter(|record| &record.record_type == record_type && &record.name == name);
                let first = matches
                    .next()
                    .ok_or_else(|| DnsError::RecordNotFound(format!("{} {}", record_type, name)))?;
                let rest = matches.count();
                if rest > 0 {
                    return Err(DnsError::TooManyMatches {
                        query: format!("{} {}", record_type, name),
                        count: rest + 1,
                    });
                }
                Ok(first)
            }
        }
    }
}

impl From<RecordId> for RecordRef {
    fn from(id: RecordId) -> Self {
        RecordRef::ById(id)
    }
}
