//! Rate limiting ports and application service.
//!
//! Fixed-window counter per `{category}:{identifier}` key. Privileged
//! endpoints use it to bound the load a single caller can put on the store.

mod config;
mod ports;
mod service;


pub use config::RateLimitRule;
pub use ports::{AttemptInfo, RateLimitRepository};
pub use service::RateLimitService;
