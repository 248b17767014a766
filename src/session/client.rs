use async_trait::async_trait;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::{Map, Value};

use super::cache::RecordCache;
use super::extract::RecordExtractor;
use super::transport::SessionTransport;
use crate::api::client::DnsApiClient;
use crate::api::models::*;
use crate::error::{DnsError, Result};

pub const BASE_URL: &str = "https://njal.la";

const CSRF_COOKIE: &str = "csrftoken";

static CSRF_INPUT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input[name=csrfmiddlewaretoken]").unwrap());

static DOMAIN_CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".table tbody td:first-child").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

/// Record management through the registrar's logged-in web pages.
///
/// The upstream replaces a domain's whole record set on every update, so
/// callers must not run mutations against the same domain concurrently.
/// Taking `&mut self` everywhere enforces that for a single client.
pub struct SessionClient<T: SessionTransport> {
    transport: T,
    base_url: String,
    extractor: RecordExtractor,
    cache: RecordCache,
    state: SessionState,
}

impl<T: SessionTransport> SessionClient<T> {
    pub fn new(transport: T, base_url: &str, extractor: RecordExtractor) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            extractor,
            cache: RecordCache::new(),
            state: SessionState::Unauthenticated,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn domain_url(&self, domain: &Domain) -> String {
        format!("{}/domains/{}/", self.base_url, domain.name)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        self.transport.reset()?;
        self.cache.invalidate();
        self.state = SessionState::Authenticating;

        match self.sign_in(email, password).await {
            Ok(()) => {
                self.state = SessionState::Authenticated;
                info!("Logged in");
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Unauthenticated;
                Err(e)
            }
        }
    }

    async fn sign_in(&mut self, email: &str, password: &str) -> Result<()> {
        let signin_url = self.url("/signin/");
        let page = self.transport.get(&signin_url).await.map_err(|e| {
            DnsError::Session(format!("Unable to retrieve CSRF token: {}", e))
        })?;

        let token = Html::parse_document(&page)
            .select(&CSRF_INPUT_SELECTOR)
            .next()
            .and_then(|input| input.value().attr("value"))
            .map(str::to_string)
            .ok_or_else(|| DnsError::Session("No CSRF token on the sign-in page".to_string()))?;

        self.transport
            .post(
                &signin_url,
                vec![
                    ("csrfmiddlewaretoken".to_string(), token),
                    ("email".to_string(), email.to_string()),
                    ("password".to_string(), password.to_string()),
                ],
            )
            .await?;

        self.csrf_token().map(|_| ())
    }

    /// Current CSRF token. Its absence means the session is gone.
    fn csrf_token(&self) -> Result<String> {
        self.transport
            .find_cookie(&self.base_url, CSRF_COOKIE)
            .ok_or_else(|| DnsError::Session("session cookie missing".to_string()))
    }

    fn ensure_authenticated(&self) -> Result<String> {
        if self.state != SessionState::Authenticated {
            return Err(DnsError::Session("login required".to_string()));
        }
        self.csrf_token()
    }

    /// With `use_cache`, returns whatever the last read stored regardless of
    /// domain. Only pass it right after an uncached read of `domain`.
    async fn records(&mut self, domain: &Domain, use_cache: bool) -> Result<Vec<DnsRecord>> {
        if let Some(records) = self.cache.get(use_cache) {
            debug!("Using cached records for {}", domain.name);
            return Ok(records.to_vec());
        }
        self.ensure_authenticated()?;
        let page = self.transport.get(&self.domain_url(domain)).await?;
        let records = self.extractor.extract(&page)?;
        self.cache.store(records.clone());
        Ok(records)
    }

    async fn post_add(&mut self, domain: &Domain, record: &NewRecord) -> Result<()> {
        let token = self.ensure_authenticated()?;
        let result = self
            .transport
            .post(
                &self.domain_url(domain),
                vec![
                    ("action".to_string(), "add".to_string()),
                    ("csrfmiddlewaretoken".to_string(), token),
                    ("type".to_string(), record.record_type.clone()),
                    ("name".to_string(), record.name.clone()),
                    ("ttl".to_string(), record.ttl.to_string()),
                    ("content".to_string(), record.content.clone()),
                ],
            )
            .await;
        self.cache.invalidate();
        result?;
        info!("Added {} record {} on {}", record.record_type, record.name, domain.name);
        Ok(())
    }

    /// Posts every record except `target` as the new record set, keyed by id
    /// and kept in page order.
    async fn post_remove(&mut self, domain: &Domain, target: &RecordId) -> Result<()> {
        let records = self.records(domain, true).await?;
        if !records.iter().any(|r| &r.id == target) {
            return Err(DnsError::not_found(target));
        }
        let token = self.ensure_authenticated()?;

        let mut remaining = Map::new();
        for record in records.into_iter().filter(|r| &r.id != target) {
            remaining.insert(record.id.to_string(), serde_json::to_value(&record)?);
        }
        let payload = Value::Object(remaining).to_string();

        let result = self
            .transport
            .post(
                &self.domain_url(domain),
                vec![
                    ("action".to_string(), "update".to_string()),
                    ("csrfmiddlewaretoken".to_string(), token),
                    ("records".to_string(), payload),
                ],
            )
            .await;
        self.cache.invalidate();
        result?;
        info!("Removed record {} on {}", target, domain.name);
        Ok(())
    }
}

#[async_trait]
impl<T: SessionTransport> DnsApiClient for SessionClient<T> {
    async fn list_domains(&mut self) -> Result<Vec<Domain>> {
        self.ensure_authenticated()?;
        let page = self.transport.get(&self.url("/domains")).await?;
        let document = Html::parse_document(&page);
        Ok(document
            .select(&DOMAIN_CELL_SELECTOR)
            .filter_map(|cell| cell.text().next())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Domain {
                name: name.to_string(),
            })
            .collect())
    }

    async fn list_records(&mut self, domain: &DomainRef) -> Result<Vec<DnsRecord>> {
        let domain = domain.resolve()?;
        self.records(&domain, false).await
    }

    async fn add_record(&mut self, domain: &DomainRef, record: &NewRecord) -> Result<()> {
        let domain = domain.resolve()?;
        self.post_add(&domain, record).await
    }

    async fn remove_record(&mut self, domain: &DomainRef, record: &RecordRef) -> Result<()> {
        let domain = domain.resolve()?;
        let records = self.records(&domain, false).await?;
        let id = record.resolve(&records)?.id.clone();
        self.post_remove(&domain, &id).await
    }

    /// Runs as remove then add. The upstream has no edit action for the web
    /// session, so if the add fails the original record is already gone; that
    /// case is reported as [`DnsError::PartialUpdate`] carrying the removed
    /// record so the caller can restore it.
    async fn update_record(
        &mut self,
        domain: &DomainRef,
        record: &RecordRef,
        patch: &RecordPatch,
    ) -> Result<()> {
        let domain = domain.resolve()?;
        let records = self.records(&domain, false).await?;
        let original = record.resolve(&records)?.clone();
        let replacement = patch.apply(&original);

        self.post_remove(&domain, &original.id).await?;
        if let Err(e) = self.post_add(&domain, &replacement).await {
            warn!(
                "Record {} on {} was removed but its replacement was not added",
                original.id, domain.name
            );
            return Err(DnsError::PartialUpdate {
                removed: Box::new(original),
                source: Box::new(e),
            });
        }
        Ok(())
    }
}
