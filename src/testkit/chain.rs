//! Mock [`ChainClient`] for testing.
//!
//! Balance reads pop from per-kind queues. Once a queue runs dry the last
//! successful value is repeated (zero if there never was one), so a test only
//! scripts the reads it cares about.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::{Account, Amount, Chain, Token};
use crate::error::{ChainError, Result};
use crate::port::outbound::chain::{ChainClient, TxRequest};

#[derive(Default)]
struct BalanceScript {
    queue: VecDeque<Result<Amount>>,
    last: Amount,
}

impl BalanceScript {
    fn next(&mut self) -> Result<Amount> {
        match self.queue.pop_front() {
            Some(Ok(value)) => {
                self.last = value;
                Ok(value)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last),
        }
    }
}

/// A transaction captured by [`ScriptedChain::send_and_confirm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTx {
    pub address: String,
    pub chain: Chain,
    pub tx: TxRequest,
}

/// A chain client with scripted balances, call outputs and send results.
pub struct ScriptedChain {
    native: Mutex<BalanceScript>,
    token: Mutex<BalanceScript>,
    call_results: Mutex<VecDeque<Result<Vec<u8>>>>,
    send_results: Mutex<VecDeque<Result<String>>>,
    sent: Mutex<Vec<SentTx>>,
    native_count: Arc<AtomicU32>,
    token_count: Arc<AtomicU32>,
    call_count: Arc<AtomicU32>,
}

impl ScriptedChain {
    pub fn new() -> Self {
        Self {
            native: Mutex::new(BalanceScript::default()),
            token: Mutex::new(BalanceScript::default()),
            call_results: Mutex::new(VecDeque::new()),
            send_results: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            native_count: Arc::new(AtomicU32::new(0)),
            token_count: Arc::new(AtomicU32::new(0)),
            call_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_native_balances(self, balances: Vec<Decimal>) -> Self {
        self.with_native_results(balances.into_iter().map(Ok).collect())
    }

    pub fn with_native_results(self, results: Vec<Result<Amount>>) -> Self {
        self.native.lock().queue = results.into();
        self
    }

    pub fn with_token_balances(self, balances: Vec<Decimal>) -> Self {
        self.token.lock().queue = balances.into_iter().map(Ok).collect();
        self
    }

    /// Queue raw outputs for [`ChainClient::call`]. Defaults to an RPC error.
    pub fn with_call_results(self, results: Vec<Result<Vec<u8>>>) -> Self {
        *self.call_results.lock() = results.into();
        self
    }

    /// Queue results for sends. Defaults to `Ok("0x01")`.
    pub fn with_send_results(self, results: Vec<Result<String>>) -> Self {
        *self.send_results.lock() = results.into();
        self
    }

    pub fn native_balance_calls(&self) -> u32 {
        self.native_count.load(Ordering::SeqCst)
    }

    pub fn token_balance_calls(&self) -> u32 {
        self.token_count.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every transaction sent so far, in order.
    pub fn sent(&self) -> Vec<SentTx> {
        self.sent.lock().clone()
    }
}

impl Default for ScriptedChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainClient for ScriptedChain {
    async fn native_balance(&self, _account: &Account, _chain: Chain) -> Result<Amount> {
        self.native_count.fetch_add(1, Ordering::SeqCst);
        self.native.lock().next()
    }

    async fn token_balance(&self, _account: &Account, _token: &Token) -> Result<Amount> {
        self.token_count.fetch_add(1, Ordering::SeqCst);
        self.token.lock().next()
    }

    async fn call(&self, _chain: Chain, _to: &str, _data: Vec<u8>) -> Result<Vec<u8>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.call_results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ChainError::Rpc("no scripted call result".into()).into()))
    }

    async fn send_and_confirm(
        &self,
        account: &Account,
        chain: Chain,
        tx: TxRequest,
    ) -> Result<String> {
        self.sent.lock().push(SentTx {
            address: account.address.clone(),
            chain,
            tx,
        });
        self.send_results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok("0x01".to_string()))
    }
}
