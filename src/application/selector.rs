//! Action selection and the static route → provider table.

use std::collections::HashMap;
use std::sync::Arc;

use rand::seq::IteratorRandom;
use rand::Rng;

use crate::domain::{Account, ProviderKind, Route};
use crate::port::outbound::transfer::TransferProvider;

/// Providers keyed by the kind of route they serve.
#[derive(Clone, Default)]
pub struct ProviderTable {
    providers: HashMap<ProviderKind, Arc<dyn TransferProvider>>,
}

impl ProviderTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under its own [`kind`](TransferProvider::kind).
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn TransferProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    #[must_use]
    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn TransferProvider>> {
        self.providers.get(&kind).cloned()
    }

    #[must_use]
    pub fn serves(&self, route: &Route) -> bool {
        self.providers.contains_key(&route.provider())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// A route picked for execution, with the provider that serves it.
#[derive(Clone)]
pub struct Selection {
    pub route: Route,
    pub provider: Arc<dyn TransferProvider>,
}

impl std::fmt::Debug for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("route", &self.route)
            .field("provider", &self.provider.name())
            .finish()
    }
}

/// Picks the next route for an account.
pub struct ActionSelector {
    providers: ProviderTable,
}

impl ActionSelector {
    #[must_use]
    pub const fn new(providers: ProviderTable) -> Self {
        Self { providers }
    }

    #[must_use]
    pub const fn providers(&self) -> &ProviderTable {
        &self.providers
    }

    /// Uniform choice among the account's routes with quota left.
    ///
    /// `None` means there is nothing servable to do for this account.
    pub fn select<R: Rng + ?Sized>(&self, account: &Account, rng: &mut R) -> Option<Selection> {
        let route = account
            .route_quota
            .active()
            .map(|(route, _)| route)
            .filter(|route| self.providers.serves(route))
            .choose(rng)?;
        let provider = self.providers.get(route.provider())?;
        Some(Selection { route, provider })
    }
}
