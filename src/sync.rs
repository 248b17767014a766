use anyhow::{Context, Result};
use log::{error, info};
use tokio::time::{sleep, Duration};

use crate::api::models::{DnsRecord, DomainRef, NewRecord, RecordPatch, RecordRef};
use crate::api::DnsApiClient;
use crate::config::{Config, Domain};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Added,
    Updated,
    Unchanged,
}

/// Brings the records listed in the config in line with the registrar.
pub struct RecordSync<C: DnsApiClient> {
    client: C,
    domains: Vec<Domain>,
    interval: Option<Duration>,
}

impl<C: DnsApiClient> RecordSync<C> {
    pub fn new(client: C, config: Config) -> Self {
        Self {
            client,
            domains: config.domains,
            interval: config.interval_minutes.map(|m| Duration::from_secs(m * 60)),
        }
    }

    pub fn client(&mut self) -> &mut C {
        &mut self.client
    }

    pub async fn sync_record(&mut self, domain: &DomainRef, desired: &NewRecord) -> Result<SyncAction> {
        let records = self.client.list_records(domain).await?;
        let existing: Vec<&DnsRecord> = records
            .iter()
            .filter(|r| r.record_type == desired.record_type && r.name == desired.name)
            .collect();

        if existing.is_empty() {
            self.client.add_record(domain, desired).await?;
            return Ok(SyncAction::Added);
        }

        if existing.iter().any(|r| desired.matches(r)) {
            info!("Record already up to date");
            return Ok(SyncAction::Unchanged);
        }

        // Several candidates are rejected by the query instead of guessing.
        let patch = RecordPatch {
            name: None,
            content: Some(desired.content.clone()),
            ttl: Some(desired.ttl),
        };
        self.client
            .update_record(
                domain,
                &RecordRef::query(&desired.record_type, &desired.name),
                &patch,
            )
            .await?;
        Ok(SyncAction::Updated)
    }

    pub async fn sync_all(&mut self) -> Result<()> {
        let domains = std::mem::take(&mut self.domains);
        let mut outcome = Ok(());

        for domain in &domains {
            let domain_ref = DomainRef::ByName(domain.name.to_string());
            for record in &domain.records {
                info!("Syncing {} record {} on {}", record.record_type, record.name, domain.name);
                match self.sync_record(&domain_ref, record).await {
                    Ok(action) => info!("Done ({:?}).", action),
                    Err(e) => {
                        error!("Failed to sync record: {:#}", e);
                        outcome = Err(e).with_context(|| {
                            format!("Failed to sync {} on {}", record.name, domain.name)
                        });
                        break;
                    }
                }
            }
            if outcome.is_err() {
                break;
            }
        }

        self.domains = domains;
        outcome
    }

    pub async fn run(&mut self) -> Result<()> {
        let Some(interval) = self.interval else {
            return self.sync_all().await;
        };

        loop {
            if let Err(e) = self.sync_all().await {
                error!("Error syncing records: {:#}", e);
            }
            sleep(interval).await;
        }
    }
}
