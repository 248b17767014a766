use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;

use crate::error::{DnsError, Result};

/// Cookie-carrying HTTP session against the registrar's web frontend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<String>;

    /// Form-encoded POST. The upstream checks `Referer` against the target for CSRF.
    async fn post(&self, url: &str, form: Vec<(String, String)>) -> Result<()>;

    fn find_cookie(&self, scope_url: &str, name: &str) -> Option<String>;

    /// Drops every cookie and starts a fresh session.
    fn reset(&mut self) -> Result<()>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    jar: Arc<Jar>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = Self::build_client(jar.clone(), timeout)?;
        Ok(Self {
            client,
            jar,
            timeout,
        })
    }

    fn build_client(jar: Arc<Jar>, timeout: Duration) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .cookie_provider(jar)
            .timeout(timeout)
            .build()?)
    }

    fn check_status(url: &str, response: &reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DnsError::Upstream(format!("{} returned HTTP {}", url, status)))
        }
    }
}

#[async_trait]
impl SessionTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        Self::check_status(url, &response)?;
        Ok(response.text().await?)
    }

    async fn post(&self, url: &str, form: Vec<(String, String)>) -> Result<()> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .header(reqwest::header::REFERER, url)
            .form(&form)
            .send()
            .await?;
        Self::check_status(url, &response)
    }

    fn find_cookie(&self, scope_url: &str, name: &str) -> Option<String> {
        let url = Url::parse(scope_url).ok()?;
        let header = self.jar.cookies(&url)?;
        let header = header.to_str().ok()?;
        header.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
    }

    fn reset(&mut self) -> Result<()> {
        let jar = Arc::new(Jar::default());
        self.client = Self::build_client(jar.clone(), self.timeout)?;
        self.jar = jar;
        Ok(())
    }
}
