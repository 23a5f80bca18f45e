//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! The warmup engine in [`crate::application`] only ever talks to these
//! traits; concrete chain, exchange and bridge integrations live in
//! [`crate::adapter`].

pub mod outbound;
