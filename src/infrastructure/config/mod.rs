//! Infrastructure configuration modules.

pub mod execution;
pub mod logging;
pub mod routes;
pub mod secrets;
pub mod settings;
pub mod telegram;
