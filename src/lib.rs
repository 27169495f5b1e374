//! Rate-limited chat and tone-rewrite front ends for a hosted completion API.
//!
//! Every outgoing call passes through a shared [`rate_limit::RateGate`] first,
//! and every reply is cleaned by [`sanitize::Sanitizer`] before it is shown.

pub mod cli;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod sanitize;
pub mod state;
pub mod tone;
pub mod worker;

pub use error::GatewayError;
pub use rate_limit::{Admission, Denial, RateGate, WindowPolicy};
pub use sanitize::{Sanitizer, sanitize};
