//! Identity-provider endpoints (data) and token-error classification (behavior).
//!
//! `descriptor` holds the validated authorization and token endpoints. `strategy` maps the
//! provider's OAuth error payloads into the relay's upstream error categories.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
