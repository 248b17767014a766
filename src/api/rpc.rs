use std::time::Duration;

use super::{client::DnsApiClient, models::*};
use crate::error::{DnsError, Result};
use async_trait::async_trait;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

pub const API_BASE_URL: &str = "https://njal.la/api/1/";

const INVALID_CREDENTIALS_CODE: i64 = 403;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct DomainList {
    domains: Vec<Domain>,
}

#[derive(Debug, Deserialize)]
struct RecordList {
    records: Vec<DnsRecord>,
}

/// Client for the registrar's documented JSON-RPC endpoint.
pub struct RpcClient {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
}

impl RpcClient {
    pub fn new(api_url: &str, api_token: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            api_token,
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        debug!("RPC call {}", method);
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Njalla {}", self.api_token))
            .json(&json!({ "method": method, "params": params }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(DnsError::Upstream(format!(
                "{} returned HTTP {}: {}",
                method, status, text
            )));
        }

        let parsed: RpcResponse = serde_json::from_str(&text).map_err(|e| {
            DnsError::Upstream(format!(
                "Failed to parse {} response: {}. Response: {}",
                method, e, text
            ))
        })?;

        if let Some(error) = parsed.error {
            return Err(if error.code == INVALID_CREDENTIALS_CODE {
                DnsError::InvalidCredentials(error.message)
            } else {
                DnsError::Upstream(format!("{} failed ({}): {}", method, error.code, error.message))
            });
        }

        Ok(serde_json::from_value(parsed.result.unwrap_or(Value::Null))?)
    }
}

#[async_trait]
impl DnsApiClient for RpcClient {
    async fn list_domains(&mut self) -> Result<Vec<Domain>> {
        let list: DomainList = self.call("list-domains", json!({})).await?;
        Ok(list.domains)
    }

    async fn list_records(&mut self, domain: &DomainRef) -> Result<Vec<DnsRecord>> {
        let domain = domain.resolve()?;
        let list: RecordList = self
            .call("list-records", json!({ "domain": domain.name }))
            .await?;
        Ok(list.records)
    }

    async fn add_record(&mut self, domain: &DomainRef, record: &NewRecord) -> Result<()> {
        let domain = domain.resolve()?;
        let _: Value = self
            .call(
                "add-record",
                json!({
                    "domain": domain.name,
                    "type": record.record_type,
                    "name": record.name,
                    "content": record.content,
                    "ttl": record.ttl,
                }),
            )
            .await?;
        info!("Added {} record {} on {}", record.record_type, record.name, domain.name);
        Ok(())
    }

    async fn remove_record(&mut self, domain: &DomainRef, record: &RecordRef) -> Result<()> {
        let domain = domain.resolve()?;
        let id = match record {
            RecordRef::ById(id) => id.clone(),
            query => {
                let records = self.list_records(&DomainRef::Resolved(domain.clone())).await?;
                query.resolve(&records)?.id.clone()
            }
        };
        let _: Value = self
            .call("remove-record", json!({ "domain": domain.name, "id": id }))
            .await?;
        info!("Removed record {} on {}", id, domain.name);
        Ok(())
    }

    async fn update_record(
        &mut self,
        domain: &DomainRef,
        record: &RecordRef,
        patch: &RecordPatch,
    ) -> Result<()> {
        let domain = domain.resolve()?;
        let records = self.list_records(&DomainRef::Resolved(domain.clone())).await?;
        let target = record.resolve(&records)?;

        let mut params = json!({ "domain": domain.name, "id": target.id });
        if let (Value::Object(params), Value::Object(fields)) = (&mut params, serde_json::to_value(patch)?) {
            params.extend(fields);
        }
        let _: Value = self.call("edit-record", params).await?;
        info!("Edited record {} on {}", target.id, domain.name);
        Ok(())
    }
}
