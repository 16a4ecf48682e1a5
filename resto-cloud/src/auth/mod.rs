//! Authentication and access control for pages, API and voice assistant

pub mod client_ip;
pub mod middleware;
pub mod policy;
pub mod rate_limit;
pub mod session;
pub mod voice_auth;

pub use rate_limit::RateLimiter;
pub use client_ip::ClientIp;
pub use session::{SessionGuard, SessionKeys, SessionUser};
pub use voice_auth::VoiceSecret;
