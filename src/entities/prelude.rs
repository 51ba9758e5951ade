pub use super::heartbeats::Entity as Heartbeats;
pub use super::users::Entity as Users;
