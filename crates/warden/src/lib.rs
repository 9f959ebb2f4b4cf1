//! Warden - Firewall proxy between autonomous agents and LLM providers
//!
//! This crate provides a daemon that authorizes, rate-limits and scans every
//! agent request before forwarding it with the real provider credential,
//! and redacts leaked secrets from completion responses.

pub mod admin;
pub mod audit;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod guard;
pub mod notify;
pub mod proxy;
pub mod scan;
pub mod storage;
pub mod stream;
pub mod testing;
pub mod vault;

pub use error::WardenError;
