use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::api::models::NewRecord;
use crate::api::rpc::API_BASE_URL;
use crate::session::client::BASE_URL;
use crate::session::extract::DEFAULT_DUMP_PATH;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(custom(function = "validate_credentials"))]
    pub credentials: Credentials,

    #[serde(default = "default_base_url")]
    #[validate(url(message = "Base URL must be a valid URL"))]
    pub base_url: Cow<'static, str>,

    #[serde(default = "default_api_url")]
    #[validate(url(message = "API URL must be a valid URL"))]
    pub api_url: Cow<'static, str>,

    #[serde(default = "default_timeout")]
    #[validate(range(min = 1, message = "Request timeout must be greater than 0"))]
    pub request_timeout_secs: u64,

    #[serde(default = "default_dump_path")]
    pub dump_path: Cow<'static, str>,

    /// Repeat the sync every N minutes. Runs once when unset.
    #[serde(default)]
    #[validate(range(min = 1, message = "Sync interval must be greater than 0"))]
    pub interval_minutes: Option<u64>,

    #[serde(default)]
    #[validate(nested)]
    pub domains: Vec<Domain>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum Credentials {
    Session {
        email: Cow<'static, str>,
        password: Cow<'static, str>,
    },
    Api {
        api_token: Cow<'static, str>,
    },
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Domain {
    #[validate(length(min = 1, message = "Domain name cannot be empty"))]
    pub name: Cow<'static, str>,

    #[serde(default)]
    #[validate(custom(function = "validate_records"))]
    pub records: Vec<NewRecord>,
}

fn validate_credentials(credentials: &Credentials) -> Result<(), ValidationError> {
    let complete = match credentials {
        Credentials::Session { email, password } => !email.is_empty() && !password.is_empty(),
        Credentials::Api { api_token } => !api_token.is_empty(),
    };
    if complete {
        Ok(())
    } else {
        Err(ValidationError::new("credentials").with_message(Cow::Borrowed(
            "Credentials cannot be empty",
        )))
    }
}

fn validate_records(records: &[NewRecord]) -> Result<(), ValidationError> {
    for record in records {
        if record.record_type.is_empty() || record.name.is_empty() {
            return Err(ValidationError::new("record").with_message(Cow::Borrowed(
                "Records need a type and a name",
            )));
        }
        if record.ttl == 0 {
            return Err(ValidationError::new("record")
                .with_message(Cow::Borrowed("TTL must be greater than 0")));
        }
    }
    Ok(())
}

fn default_base_url() -> Cow<'static, str> {
    Cow::Borrowed(BASE_URL)
}

fn default_api_url() -> Cow<'static, str> {
    Cow::Borrowed(API_BASE_URL)
}

fn default_timeout() -> u64 {
    10
}

fn default_dump_path() -> Cow<'static, str> {
    Cow::Borrowed(DEFAULT_DUMP_PATH)
}
