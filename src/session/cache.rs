use crate::api::models::DnsRecord;

/// Single slot holding the records of the last domain read.
///
/// The slot does not know which domain it holds. Callers ask for a cached
/// value only right after an uncached read of the same domain, and every
/// mutation clears it.
#[derive(Debug, Default)]
pub struct RecordCache {
    records: Option<Vec<DnsRecord>>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, use_cache: bool) -> Option<&[DnsRecord]> {
        if !use_cache {
            return None;
        }
        self.records.as_deref()
    }

    pub fn store(&mut self, records: Vec<DnsRecord>) {
        self.records = Some(records);
    }

    pub fn invalidate(&mut self) {
        self.records = None;
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_none()
    }
}
