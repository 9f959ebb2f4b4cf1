//! Secret scanning for request bodies and completion responses

pub mod inbound;
pub mod outbound;
mod patterns;

pub use inbound::{InboundScanner, scan_body};
pub use outbound::{KnownSecret, REDACTION_MARKER, ScanOutcome, scan_completion};
