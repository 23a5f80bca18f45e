//! 0x swap API: quote over HTTP, then send the quoted transaction.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Bytes, U256};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::adapter::outbound::bridge::{to_u128, to_units};
use crate::adapter::outbound::evm::client::parse_address;
use crate::adapter::outbound::evm::erc20;
use crate::domain::{Account, Amount, Asset, Chain, DelayRange};
use crate::error::{ChainError, Result};
use crate::port::outbound::chain::{ChainClient, TxRequest};
use crate::port::outbound::transfer::Swapper;

/// Placeholder address 0x uses for a chain's native coin.
pub const NATIVE_TOKEN_ADDRESS: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

const API_KEY_HEADER: &str = "0x-api-key";
const QUOTE_ATTEMPTS: u32 = 10;
const QUOTE_ATTEMPT_DELAY: Duration = Duration::from_secs(1);

/// Subdomain prefix of the quote API for `chain`.
const fn api_prefix(chain: Chain) -> Option<&'static str> {
    match chain {
        Chain::Ethereum => Some(""),
        Chain::Bsc => Some("bsc."),
        Chain::Polygon => Some("polygon."),
        Chain::Arbitrum => Some("arbitrum."),
        Chain::Celo => Some("celo."),
        Chain::Base => Some("base."),
        _ => None,
    }
}

fn token_param(asset: &Asset) -> &'static str {
    match asset {
        Asset::Native(_) => NATIVE_TOKEN_ADDRESS,
        Asset::Erc20(token) => token.address,
    }
}

/// Quote request URL selling `sell_units` base units of `sell`.
fn quote_url(sell: &Asset, buy: &Asset, sell_units: U256, slippage_percent: Decimal) -> Result<Url> {
    let chain = sell.chain();
    let prefix = api_prefix(chain).ok_or(ChainError::UnsupportedChain {
        provider: "0x",
        chain,
    })?;
    let slippage = (slippage_percent / Decimal::ONE_HUNDRED).normalize();
    let url = Url::parse_with_params(
        &format!("https://{prefix}api.0x.org/swap/v1/quote"),
        &[
            ("buyToken", token_param(buy).to_string()),
            ("sellToken", token_param(sell).to_string()),
            ("sellAmount", sell_units.to_string()),
            ("slippagePercentage", slippage.to_string()),
        ],
    )?;
    Ok(url)
}

/// Per-account HTTP client, routed through the account's proxy if it has one.
fn http_client(proxy: Option<&str>) -> Result<HttpClient> {
    let mut builder = HttpClient::builder().timeout(Duration::from_secs(30));
    if let Some(proxy) = proxy.map(str::trim).filter(|p| !p.is_empty()) {
        let proxy = if proxy.contains("://") {
            proxy.to_string()
        } else {
            format!("http://{proxy}")
        };
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}

/// The fields of a 0x quote the swap needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub to: String,
    pub data: String,
    #[serde(default = "zero")]
    pub value: String,
    pub allowance_target: String,
}

fn zero() -> String {
    "0".into()
}

impl Quote {
    fn transaction(&self) -> Result<TxRequest> {
        let data = Bytes::from_str(&self.data)
            .map_err(|e| ChainError::Quote(format!("calldata: {e}")))?;
        let value = U256::from_str(&self.value)
            .map_err(|e| ChainError::Quote(format!("value {}: {e}", self.value)))?;
        Ok(TxRequest::new(self.to.clone(), data.to_vec()).with_value(to_u128(value)?))
    }
}

/// [`Swapper`] backed by the 0x swap API.
pub struct ZeroXSwapper {
    chain: Arc<dyn ChainClient>,
    api_key: String,
    slippage_percent: Decimal,
    approve_pause: DelayRange,
}

impl ZeroXSwapper {
    #[must_use]
    pub fn new(
        chain: Arc<dyn ChainClient>,
        api_key: impl Into<String>,
        slippage_percent: Decimal,
        approve_pause: DelayRange,
    ) -> Self {
        Self {
            chain,
            api_key: api_key.into(),
            slippage_percent,
            approve_pause,
        }
    }

    async fn fetch_quote(&self, http: &HttpClient, url: Url) -> Result<Quote> {
        for attempt in 1..=QUOTE_ATTEMPTS {
            let response = http
                .get(url.clone())
                .header(API_KEY_HEADER, &self.api_key)
                .send()
                .await;
            match response {
                Ok(response) if response.status() == StatusCode::OK => {
                    return Ok(response.json::<Quote>().await?);
                }
                Ok(response) => {
                    debug!(attempt, status = %response.status(), "Quote not ready");
                }
                Err(e) => {
                    debug!(attempt, error = %e, "Quote request failed");
                }
            }
            info!(attempt, attempts = QUOTE_ATTEMPTS, "Waiting for a swap quote");
            tokio::time::sleep(QUOTE_ATTEMPT_DELAY).await;
        }
        Err(ChainError::Quote(format!("no quote after {QUOTE_ATTEMPTS} attempts")).into())
    }

    /// Approve the quote's allowance target if selling a token, then send
    /// the quoted transaction.
    async fn execute(&self, account: &Account, sell: &Asset, sell_units: U256, quote: &Quote) -> Result<String> {
        let chain = sell.chain();
        if let Asset::Erc20(token) = sell {
            erc20::ensure_allowance(
                self.chain.as_ref(),
                account,
                chain,
                parse_address(token.address)?,
                parse_address(&quote.allowance_target)?,
                sell_units,
                self.approve_pause,
            )
            .await?;
        }
        self.chain
            .send_and_confirm(account, chain, quote.transaction()?)
            .await
    }
}

#[async_trait]
impl Swapper for ZeroXSwapper {
    async fn swap(&self, account: &Account, sell: &Asset, buy: &Asset, amount: Amount) -> Result<()> {
        if sell.chain() != buy.chain() {
            return Err(ChainError::Quote(format!("{sell} and {buy} are on different chains")).into());
        }

        info!(
            address = %account.address,
            chain = %sell.chain(),
            amount = %amount,
            sell = sell.symbol(),
            buy = buy.symbol(),
            "Swapping"
        );

        let sell_units = to_units(amount, sell.decimals())?;
        let url = quote_url(sell, buy, sell_units, self.slippage_percent)?;
        let http = http_client(account.proxy.as_deref())?;
        let quote = self.fetch_quote(&http, url).await.inspect_err(|e| {
            warn!(address = %account.address, error = %e, "Swap quote unavailable");
        })?;

        let tx_hash = self.execute(account, sell, sell_units, &quote).await?;
        debug!(tx_hash = %tx_hash, "Swap confirmed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::evm::contracts::IERC20;
    use crate::domain::Token;
    use crate::testkit::chain::ScriptedChain;
    use alloy_sol_types::{SolCall, SolValue};
    use rust_decimal_macros::dec;

    const ADDRESS: &str = "0x3333333333333333333333333333333333333333";
    const ROUTER: &str = "0xdef1c0ded9bec7f1a1670819833240f027b25eff";

    fn quote() -> Quote {
        serde_json::from_str(&format!(
            r#"{{"to":"{ROUTER}","data":"0xd9627aa4","value":"1000","allowanceTarget":"{ROUTER}","price":"1.2"}}"#
        ))
        .unwrap()
    }

    fn swapper(chain: Arc<ScriptedChain>) -> ZeroXSwapper {
        ZeroXSwapper::new(chain, "key", dec!(1), DelayRange::none())
    }

    #[test]
    fn quote_url_uses_chain_host_and_native_placeholder() {
        let url = quote_url(
            &Asset::Native(Chain::Polygon),
            &Asset::Erc20(Token::STG_POLYGON),
            U256::from(5u64),
            dec!(1),
        )
        .unwrap();
        assert_eq!(url.host_str(), Some("polygon.api.0x.org"));
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("sellToken".into(), NATIVE_TOKEN_ADDRESS.into())));
        assert!(query.contains(&("buyToken".into(), Token::STG_POLYGON.address.into())));
        assert!(query.contains(&("sellAmount".into(), "5".into())));
        assert!(query.contains(&("slippagePercentage".into(), "0.01".into())));
    }

    #[test]
    fn quote_url_rejects_unserved_chain() {
        assert!(quote_url(
            &Asset::Native(Chain::Kava),
            &Asset::Native(Chain::Kava),
            U256::from(1u64),
            dec!(1),
        )
        .is_err());
    }

    #[test]
    fn proxy_without_scheme_is_accepted() {
        assert!(http_client(Some("user:pass@127.0.0.1:8080")).is_ok());
        assert!(http_client(None).is_ok());
    }

    #[test]
    fn quote_converts_to_transaction() {
        let tx = quote().transaction().unwrap();
        assert_eq!(tx.to, ROUTER);
        assert_eq!(tx.data, vec![0xd9, 0x62, 0x7a, 0xa4]);
        assert_eq!(tx.value, 1000);
    }

    #[tokio::test]
    async fn native_sell_sends_quote_without_approval() {
        let chain = Arc::new(ScriptedChain::new());

        swapper(chain.clone())
            .execute(
                &Account::new("k", ADDRESS),
                &Asset::Native(Chain::Bsc),
                U256::from(1000u64),
                &quote(),
            )
            .await
            .unwrap();

        assert_eq!(chain.call_count(), 0);
        assert_eq!(chain.sent().len(), 1);
    }

    #[tokio::test]
    async fn token_sell_approves_allowance_target() {
        let chain = Arc::new(ScriptedChain::new().with_call_results(vec![Ok(U256::ZERO.abi_encode())]));

        swapper(chain.clone())
            .execute(
                &Account::new("k", ADDRESS),
                &Asset::Erc20(Token::USDT_BSC),
                U256::from(1000u64),
                &quote(),
            )
            .await
            .unwrap();

        let sent = chain.sent();
        assert_eq!(sent.len(), 2);
        let approve = IERC20::approveCall::abi_decode(&sent[0].tx.data).unwrap();
        assert_eq!(approve.spender, parse_address(ROUTER).unwrap());
        assert_eq!(sent[1].tx.to, ROUTER);
    }
}
