pub mod credential;
pub mod heartbeat;

pub use credential::{CredentialError, PasswordDigest};
pub use heartbeat::{BatchOutcome, GroupBy, HeartbeatBatch, HeartbeatFilter, NewHeartbeat};
