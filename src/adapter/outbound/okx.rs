//! OKX REST client for on-chain withdrawals.
//!
//! Requests are signed with `base64(HMAC-SHA256(secret, ts + method + path + body))`
//! and carry the `OK-ACCESS-*` headers. Every response is wrapped in a
//! `{code, msg, data}` envelope; a non-zero code is mapped onto
//! [`ExchangeError`].

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::{Client as HttpClient, Method};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, info, warn};

use crate::domain::{Amount, Chain};
use crate::error::{ExchangeError, Result};
use crate::infrastructure::config::secrets::OkxCredentials;
use crate::port::outbound::exchange::{ExchangeClient, WithdrawalRequest, WithdrawalStatus};

type HmacSha256 = Hmac<Sha256>;

/// Production REST endpoint.
pub const OKX_API_URL: &str = "https://www.okx.com";

const WITHDRAWAL_PATH: &str = "/api/v5/asset/withdrawal";
const STATUS_PATH: &str = "/api/v5/asset/deposit-withdraw-status";

/// Withdrawal destination code for an on-chain address.
const DEST_ON_CHAIN: &str = "4";

const NOT_ALLOWLISTED: &str = "Withdrawal address is not allowlisted for verification exemption";
const INSUFFICIENT_BALANCE: &str = "Insufficient balance";
const CANCELLED_STATE: &str = "Cancelation complete";
const COMPLETE_STATE: &str = "Withdrawal complete";

/// Signature, key and passphrase failures.
const AUTH_CODES: [&str; 5] = ["50100", "50111", "50113", "50105", "50119"];

/// OKX's native-coin withdrawal fee on chains it serves.
#[must_use]
pub fn default_withdrawal_fee(chain: Chain) -> Option<Amount> {
    match chain {
        Chain::Bsc => Some(dec!(0.002)),
        Chain::Polygon => Some(dec!(0.1)),
        Chain::Celo => Some(dec!(0.0008)),
        Chain::Moonbeam => Some(dec!(0.01)),
        Chain::Moonriver => Some(dec!(0.0001)),
        Chain::Conflux => Some(dec!(0.01)),
        _ => None,
    }
}

fn timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

fn sign(secret: &str, prehash: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::Auth(e.to_string()))?;
    mac.update(prehash.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Map an error envelope onto the typed exchange error.
fn classify(code: String, message: String) -> ExchangeError {
    if message.contains(NOT_ALLOWLISTED) {
        ExchangeError::NotAllowlisted(message)
    } else if message.contains(INSUFFICIENT_BALANCE) {
        ExchangeError::InsufficientBalance(message)
    } else if AUTH_CODES.contains(&code.as_str()) {
        ExchangeError::Auth(message)
    } else {
        ExchangeError::Rejected { code, message }
    }
}

fn status_from_state(state: &str) -> WithdrawalStatus {
    if state.contains(CANCELLED_STATE) {
        WithdrawalStatus::Cancelled
    } else if state.contains(COMPLETE_STATE) {
        WithdrawalStatus::Complete
    } else {
        WithdrawalStatus::Pending(state.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WithdrawalBody<'a> {
    ccy: &'a str,
    amt: String,
    dest: &'static str,
    to_addr: &'a str,
    fee: String,
    chain: &'a str,
}

impl<'a> From<&'a WithdrawalRequest> for WithdrawalBody<'a> {
    fn from(request: &'a WithdrawalRequest) -> Self {
        Self {
            ccy: &request.currency,
            amt: request.amount.normalize().to_string(),
            dest: DEST_ON_CHAIN,
            to_addr: &request.address,
            fee: request.fee.normalize().to_string(),
            chain: &request.network,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WithdrawalAck {
    wd_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusEntry {
    state: String,
}

/// Signed OKX REST client.
pub struct OkxClient {
    http: HttpClient,
    base_url: String,
    credentials: OkxCredentials,
}

impl OkxClient {
    #[must_use]
    pub fn new(credentials: OkxCredentials) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });
        Self {
            http,
            base_url: OKX_API_URL.into(),
            credentials,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<Vec<T>> {
        let ts = timestamp();
        let body = body.unwrap_or_default();
        let signature = sign(
            &self.credentials.secret,
            &format!("{ts}{}{path}{body}", method.as_str()),
        )?;

        let mut request = self
            .http
            .request(method, format!("{}{path}", self.base_url))
            .header("OK-ACCESS-KEY", &self.credentials.api_key)
            .header("OK-ACCESS-SIGN", signature)
            .header("OK-ACCESS-TIMESTAMP", ts)
            .header("OK-ACCESS-PASSPHRASE", &self.credentials.passphrase)
            .header("Content-Type", "application/json");
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            if status.is_success() {
                ExchangeError::Decode(e.to_string())
            } else {
                ExchangeError::Transport(format!("HTTP {status}: {text}"))
            }
        })?;

        if envelope.code != "0" {
            return Err(classify(envelope.code, envelope.msg).into());
        }
        Ok(envelope.data)
    }
}

#[async_trait]
impl ExchangeClient for OkxClient {
    async fn submit_withdrawal(&self, request: &WithdrawalRequest) -> Result<String> {
        info!(
            currency = %request.currency,
            amount = %request.amount,
            network = %request.network,
            address = %request.address,
            "Requesting withdrawal"
        );
        let body = serde_json::to_string(&WithdrawalBody::from(request))?;
        let acks: Vec<WithdrawalAck> = self
            .request(Method::POST, WITHDRAWAL_PATH, Some(body))
            .await?;
        let ack = acks
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::Decode("withdrawal response without data".into()))?;
        debug!(wd_id = %ack.wd_id, "Withdrawal accepted");
        Ok(ack.wd_id)
    }

    async fn withdrawal_status(&self, id: &str) -> Result<WithdrawalStatus> {
        let path = format!("{STATUS_PATH}?wdId={id}");
        let entries: Vec<StatusEntry> = self.request(Method::GET, &path, None).await?;
        let entry = entries
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::Decode(format!("no status for withdrawal {id}")))?;
        Ok(status_from_state(&entry.state))
    }
}

/// Fee for `chain`, preferring a configured nonzero value.
#[must_use]
pub fn withdrawal_fee(chain: Chain, configured: Amount) -> Amount {
    if configured > Decimal::ZERO {
        configured
    } else {
        default_withdrawal_fee(chain).unwrap_or(configured)
    }
}
