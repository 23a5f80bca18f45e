//! Recording notifier and a counting IP rotator.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{ChainError, Result};
use crate::port::outbound::network::IpRotator;
use crate::port::outbound::notifier::{Event, Notifier};

/// Collects every event it receives. Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn count<P: Fn(&Event) -> bool>(&self, predicate: P) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: Event) {
        self.events.lock().push(event);
    }
}

/// Counts rotations; optionally fails every call.
#[derive(Default)]
pub struct CountingRotator {
    count: AtomicU32,
    fail: bool,
}

impl CountingRotator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            count: AtomicU32::new(0),
            fail: true,
        }
    }

    pub fn rotations(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IpRotator for CountingRotator {
    async fn rotate(&self) -> Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ChainError::Rpc("rotation endpoint unreachable".into()).into());
        }
        Ok(())
    }
}
