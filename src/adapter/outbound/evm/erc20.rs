//! ERC-20 allowance handling shared by the bridge and swap adapters.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use tracing::{debug, info};

use super::contracts::IERC20;
use crate::domain::{Account, Chain, DelayRange};
use crate::error::{ChainError, Result};
use crate::port::outbound::chain::{ChainClient, TxRequest};

/// Current allowance of `owner` towards `spender` on `token`.
pub(crate) async fn allowance(
    client: &dyn ChainClient,
    chain: Chain,
    token: Address,
    owner: Address,
    spender: Address,
) -> Result<U256> {
    let data = IERC20::allowanceCall { owner, spender }.abi_encode();
    let output = client.call(chain, &token.to_string(), data).await?;
    IERC20::allowanceCall::abi_decode_returns(&output)
        .map_err(|e| ChainError::Contract(format!("allowance: {e}")).into())
}

/// Approve `spender` for `amount` unless the allowance already covers it.
///
/// Sleeps for a draw from `pause` after a fresh approval. Returns whether
/// an approval transaction was sent.
pub(crate) async fn ensure_allowance(
    client: &dyn ChainClient,
    account: &Account,
    chain: Chain,
    token: Address,
    spender: Address,
    amount: U256,
    pause: DelayRange,
) -> Result<bool> {
    let owner = super::client::parse_address(&account.address)?;
    let current = allowance(client, chain, token, owner, spender).await?;
    if current >= amount {
        debug!(token = %token, spender = %spender, allowance = %current, "Allowance sufficient");
        return Ok(false);
    }

    let data = IERC20::approveCall { spender, amount }.abi_encode();
    let tx_hash = client
        .send_and_confirm(account, chain, TxRequest::new(token.to_string(), data))
        .await?;
    info!(token = %token, spender = %spender, tx_hash = %tx_hash, "Approved");

    let delay = pause.sample(&mut rand::thread_rng());
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::chain::ScriptedChain;
    use alloy_sol_types::SolValue;

    const TOKEN: Address = Address::repeat_byte(0x11);
    const SPENDER: Address = Address::repeat_byte(0x22);

    fn account() -> Account {
        Account::new("k", "0x3333333333333333333333333333333333333333")
    }

    #[tokio::test]
    async fn skips_approval_when_allowance_covers_amount() {
        let chain = ScriptedChain::new()
            .with_call_results(vec![Ok(U256::from(1000u64).abi_encode())]);

        let sent = ensure_allowance(
            &chain,
            &account(),
            Chain::Bsc,
            TOKEN,
            SPENDER,
            U256::from(500u64),
            DelayRange::none(),
        )
        .await
        .unwrap();

        assert!(!sent);
        assert!(chain.sent().is_empty());
    }

    #[tokio::test]
    async fn approves_when_allowance_is_short() {
        let chain = ScriptedChain::new().with_call_results(vec![Ok(U256::ZERO.abi_encode())]);

        let sent = ensure_allowance(
            &chain,
            &account(),
            Chain::Bsc,
            TOKEN,
            SPENDER,
            U256::from(500u64),
            DelayRange::none(),
        )
        .await
        .unwrap();

        assert!(sent);
        let txs = chain.sent();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].tx.value, 0);
        let decoded = IERC20::approveCall::abi_decode(&txs[0].tx.data).unwrap();
        assert_eq!(decoded.spender, SPENDER);
        assert_eq!(decoded.amount, U256::from(500u64));
    }
}
