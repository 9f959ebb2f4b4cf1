//! Inbound guards evaluated before a request is forwarded

pub mod auth;
pub mod kill_switch;
pub mod rate_limit;

pub use auth::{bearer_token, verify_bearer};
pub(crate) use auth::constant_time_eq;
pub use kill_switch::KillSwitch;
pub use rate_limit::{LimitWindow, RateDecision, RateLimiter};
