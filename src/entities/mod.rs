pub mod prelude;

pub mod heartbeats;
pub mod users;
