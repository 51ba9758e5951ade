pub mod heartbeat;
pub mod user;
