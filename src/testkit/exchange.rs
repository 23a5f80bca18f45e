//! Mock [`ExchangeClient`] for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{ExchangeError, Result};
use crate::port::outbound::exchange::{ExchangeClient, WithdrawalRequest, WithdrawalStatus};

/// An exchange with pre-loaded submission results and status replies.
///
/// Submissions default to `Ok("wd-1")` and status polls to
/// [`WithdrawalStatus::Complete`] once their queues are exhausted.
pub struct ScriptedExchange {
    submit_results: Mutex<VecDeque<Result<String>>>,
    statuses: Mutex<VecDeque<Result<WithdrawalStatus>>>,
    requests: Mutex<Vec<WithdrawalRequest>>,
    submit_count: Arc<AtomicU32>,
    status_count: Arc<AtomicU32>,
}

impl ScriptedExchange {
    pub fn new() -> Self {
        Self {
            submit_results: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            submit_count: Arc::new(AtomicU32::new(0)),
            status_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_submit_results(self, results: Vec<Result<String>>) -> Self {
        *self.submit_results.lock() = results.into();
        self
    }

    pub fn with_statuses(self, statuses: Vec<WithdrawalStatus>) -> Self {
        *self.statuses.lock() = statuses.into_iter().map(Ok).collect();
        self
    }

    pub fn with_status_results(self, results: Vec<Result<WithdrawalStatus>>) -> Self {
        *self.statuses.lock() = results.into();
        self
    }

    /// Reject every submission with the not-allowlisted error.
    pub fn not_allowlisted() -> Self {
        Self::new().with_submit_results(vec![Err(ExchangeError::NotAllowlisted(
            "Withdrawal address is not allowlisted for verification exemption".into(),
        )
        .into())])
    }

    pub fn submit_count(&self) -> u32 {
        self.submit_count.load(Ordering::SeqCst)
    }

    pub fn status_count(&self) -> u32 {
        self.status_count.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<WithdrawalRequest> {
        self.requests.lock().clone()
    }
}

impl Default for ScriptedExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeClient for ScriptedExchange {
    async fn submit_withdrawal(&self, request: &WithdrawalRequest) -> Result<String> {
        self.submit_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        self.submit_results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok("wd-1".to_string()))
    }

    async fn withdrawal_status(&self, _id: &str) -> Result<WithdrawalStatus> {
        self.status_count.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .pop_front()
            .unwrap_or(Ok(WithdrawalStatus::Complete))
    }
}
