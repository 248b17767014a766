use super::models::*;
use crate::error::Result;
use async_trait::async_trait;

/// Record operations shared by the scraping session and the JSON-RPC API.
#[async_trait]
pub trait DnsApiClient: Send {
    async fn list_domains(&mut self) -> Result<Vec<Domain>>;

    async fn list_records(&mut self, domain: &DomainRef) -> Result<Vec<DnsRecord>>;

    async fn add_record(&mut self, domain: &DomainRef, record: &NewRecord) -> Result<()>;

    async fn remove_record(&mut self, domain: &DomainRef, record: &RecordRef) -> Result<()>;

    async fn update_record(
        &mut self,
        domain: &DomainRef,
        record: &RecordRef,
        patch: &RecordPatch,
    ) -> Result<()>;
}
