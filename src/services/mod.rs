pub mod auth_service;
pub use auth_service::{AuthError, AuthService};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod heartbeat_service;
pub use heartbeat_service::{HeartbeatError, HeartbeatPage, HeartbeatService};

pub mod heartbeat_service_impl;
pub use heartbeat_service_impl::SeaOrmHeartbeatService;
