//! sms.rs
//! Outbound SMS. The service only ever needs "send this text to these
//! numbers", so the gateway is a one-method trait with an Africa's Talking
//! implementation and a log-only one for setups without credentials.

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

use crate::models::types::AppCfg;

const LIVE_BASE: &str = "https://api.africastalking.com";
const SANDBOX_BASE: &str = "https://api.sandbox.africastalking.com";

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("SMS gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("SMS gateway rejected the message ({0}): {1}")]
    Rejected(StatusCode, String),
}

#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, message: &str, recipients: &[String]) -> Result<(), SmsError>;
}

/// Africa's Talking bulk messaging API.
pub struct AfricasTalkingSms {
    http: Client,
    base_url: String,
    username: String,
    api_key: String,
    sender_id: Option<String>,
}

impl AfricasTalkingSms {
    pub fn new(username: &str, api_key: &str, sender_id: Option<String>) -> Result<Self, SmsError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .gzip(true)
            .build()?;
        let base_url = if username == "sandbox" { SANDBOX_BASE } else { LIVE_BASE };
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            username: username.to_string(),
            api_key: api_key.to_string(),
            sender_id,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn form<'a>(&'a self, message: &'a str, to: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut form = vec![("username", self.username.as_str()), ("to", to), ("message", message)];
        if let Some(from) = &self.sender_id {
            form.push(("from", from.as_str()));
        }
        form
    }
}

#[async_trait]
impl SmsGateway for AfricasTalkingSms {
    async fn send(&self, message: &str, recipients: &[String]) -> Result<(), SmsError> {
        let to = recipients.join(",");
        let url = format!("{}/version1/messaging", self.base_url);
        let resp = self
            .http
            .post(&url)
            .header("apiKey", &self.api_key)
            .header(ACCEPT, "application/json")
            .form(&self.form(message, &to))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SmsError::Rejected(status, body));
        }
        debug!("SMS accepted for {to}: {}", resp.text().await.unwrap_or_default());
        Ok(())
    }
}

/// Logs instead of sending. Used when no API key is configured.
#[derive(Default)]
pub struct LogSms;

#[async_trait]
impl SmsGateway for LogSms {
    async fn send(&self, message: &str, recipients: &[String]) -> Result<(), SmsError> {
        info!("SMS (dry run) to {}: {}", recipients.join(","), message.replace('\n', " | "));
        Ok(())
    }
}

/// Picks the gateway from configuration.
pub fn from_cfg(cfg: &AppCfg) -> Result<Box<dyn SmsGateway>, SmsError> {
    match &cfg.at_api_key {
        Some(key) => {
            info!("SMS via Africa's Talking as '{}'", cfg.at_username);
            let mut sms = AfricasTalkingSms::new(&cfg.at_username, key, cfg.at_sender_id.clone())?;
            if let Some(base) = &cfg.at_base_url {
                sms = sms.with_base_url(base.trim_end_matches('/'));
            }
            Ok(Box::new(sms))
        }
        None => {
            info!("AT_API_KEY not set, SMS will only be logged");
            Ok(Box::new(LogSms))
        }
    }
}
