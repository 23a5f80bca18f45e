//! Chain-agnostic warmup domain: accounts, routes, quotas and ranges.

mod account;
mod chain;
mod range;
mod route;
mod token;

pub mod error;

pub use account::{Account, FieldUpdate, Flag, ProgressFlags, QuotaTable};
pub use chain::Chain;
pub use range::{Amount, AmountRange, CountRange, DelayRange};
pub use route::{ProviderKind, ProviderMode, Route};
pub use token::{from_base_units, to_base_units, Asset, Token};
