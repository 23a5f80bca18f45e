//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the warmup run: the account database, action selection,
//! exchange funding and the loop that ties them together.

pub mod executor;
pub mod funding;
pub mod retry;
pub mod selector;
pub mod store;
pub mod warmup;
pub mod withdrawal;
