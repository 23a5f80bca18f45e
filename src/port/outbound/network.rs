//! Network egress port.

use async_trait::async_trait;

use crate::error::Result;

/// Rotates the outbound IP of a mobile proxy.
#[async_trait]
pub trait IpRotator: Send + Sync {
    async fn rotate(&self) -> Result<()>;
}
