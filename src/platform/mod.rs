//! Transport implementations of the portal session
//!
//! All network-specific code is isolated here; `core` only sees the
//! [`PortalSession`](crate::core::PortalSession) trait.

pub mod http;

pub use http::HttpPortalSession;
