//! Mock transfer providers, swappers and bridges.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{Account, Amount, Asset, ProviderKind, Route, Token};
use crate::error::{ChainError, Result};
use crate::port::outbound::transfer::{Swapper, TokenBridge, TransferProvider};

fn scripted_failure() -> crate::error::Error {
    ChainError::Reverted {
        tx_hash: "0xdead".into(),
    }
    .into()
}

/// A provider whose entry points succeed or fail from a script.
///
/// Outcomes are popped per call; when the script is empty the default
/// outcome given at construction applies.
pub struct ScriptedProvider {
    kind: ProviderKind,
    outcomes: Mutex<VecDeque<bool>>,
    default_outcome: bool,
    routes: Mutex<Vec<(Route, Amount)>>,
    transfer_count: Arc<AtomicU32>,
    swap_count: Arc<AtomicU32>,
}

impl ScriptedProvider {
    fn with_default(kind: ProviderKind, default_outcome: bool) -> Self {
        Self {
            kind,
            outcomes: Mutex::new(VecDeque::new()),
            default_outcome,
            routes: Mutex::new(Vec::new()),
            transfer_count: Arc::new(AtomicU32::new(0)),
            swap_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn succeeding(kind: ProviderKind) -> Self {
        Self::with_default(kind, true)
    }

    pub fn failing(kind: ProviderKind) -> Self {
        Self::with_default(kind, false)
    }

    pub fn with_outcomes(self, outcomes: Vec<bool>) -> Self {
        *self.outcomes.lock() = outcomes.into();
        self
    }

    pub fn transfer_calls(&self) -> u32 {
        self.transfer_count.load(Ordering::SeqCst)
    }

    pub fn swap_calls(&self) -> u32 {
        self.swap_count.load(Ordering::SeqCst)
    }

    /// Routes and amounts executed so far, in order.
    pub fn executed(&self) -> Vec<(Route, Amount)> {
        self.routes.lock().clone()
    }

    fn outcome(&self, route: &Route, amount: Amount) -> Result<()> {
        self.routes.lock().push((*route, amount));
        let ok = self
            .outcomes
            .lock()
            .pop_front()
            .unwrap_or(self.default_outcome);
        if ok {
            Ok(())
        } else {
            Err(scripted_failure())
        }
    }
}

#[async_trait]
impl TransferProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn transfer(&self, _account: &Account, route: &Route, amount: Amount) -> Result<()> {
        self.transfer_count.fetch_add(1, Ordering::SeqCst);
        self.outcome(route, amount)
    }

    async fn swap_and_transfer(
        &self,
        _account: &Account,
        route: &Route,
        amount: Amount,
    ) -> Result<()> {
        self.swap_count.fetch_add(1, Ordering::SeqCst);
        self.outcome(route, amount)
    }
}

/// A swapper that records sold amounts.
pub struct RecordingSwapper {
    swaps: Mutex<Vec<Amount>>,
    fail: bool,
}

impl RecordingSwapper {
    pub fn new() -> Self {
        Self {
            swaps: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn swaps(&self) -> Vec<Amount> {
        self.swaps.lock().clone()
    }
}

impl Default for RecordingSwapper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Swapper for RecordingSwapper {
    async fn swap(&self, _account: &Account, _sell: &Asset, _buy: &Asset, amount: Amount)
        -> Result<()> {
        if self.fail {
            return Err(ChainError::Quote("no route".into()).into());
        }
        self.swaps.lock().push(amount);
        Ok(())
    }
}

/// A token bridge that records bridged amounts.
pub struct RecordingBridge {
    token: Token,
    bridged: Mutex<Vec<Amount>>,
}

impl RecordingBridge {
    pub fn new(token: Token) -> Self {
        Self {
            token,
            bridged: Mutex::new(Vec::new()),
        }
    }

    pub fn bridged(&self) -> Vec<Amount> {
        self.bridged.lock().clone()
    }
}

#[async_trait]
impl TokenBridge for RecordingBridge {
    fn token(&self) -> Token {
        self.token
    }

    async fn bridge(&self, _account: &Account, _route: &Route, amount: Amount) -> Result<()> {
        self.bridged.lock().push(amount);
        Ok(())
    }
}
