use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use njalla_dns::api::{DnsApiClient, RpcClient};
use njalla_dns::config::{self, Config, Credentials};
use njalla_dns::session::{HttpTransport, RecordExtractor, SessionClient};
use njalla_dns::sync::RecordSync;

async fn run<C: DnsApiClient>(client: C, config: Config) -> Result<()> {
    let mut sync = RecordSync::new(client, config);

    let domains = sync.client().list_domains().await?;
    info!("Account holds {} domain(s)", domains.len());
    for domain in &domains {
        info!("  {}", domain.name);
    }

    sync.run().await
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config_file = config::config_path();
    let config = config::load_config(&config_file)?;
    let timeout = Duration::from_secs(config.request_timeout_secs);

    match config.credentials.clone() {
        Credentials::Session { email, password } => {
            let transport = HttpTransport::new(timeout)?;
            let extractor = RecordExtractor::new(config.dump_path.to_string());
            let mut client = SessionClient::new(transport, &config.base_url, extractor);
            client
                .login(&email, &password)
                .await
                .context("Unable to login")?;
            run(client, config).await
        }
        Credentials::Api { api_token } => {
            let client = RpcClient::new(&config.api_url, api_token.to_string(), timeout)?;
            run(client, config).await
        }
    }
}
