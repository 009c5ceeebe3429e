//! # auth-adapters
//!
//! `IdentityResolver` implementations. Tokens are issued by the external
//! auth service; this crate only verifies them and extracts the user id.

#[cfg(feature = "auth-jwt")]
pub mod jwt;

#[cfg(feature = "auth-jwt")]
pub use jwt::{Claims, JwtIdentityResolver, TOKEN_TTL_HOURS};
