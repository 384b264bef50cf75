//! Wire types for the attendee portal and its identity provider.
//!
//! This crate contains the serde-serializable shapes exchanged with the
//! portal API, the backend storage endpoint, and the Cognito user pool, plus
//! the cookie value types captured at the end of the login handshake.
//!
//! Types in this crate are pure data: no networking, no logging. Behaviour
//! lives in `reinvent-rs`.

pub mod cookie;
pub mod identity;
pub mod portal;

pub use cookie::*;
pub use identity::*;
pub use portal::*;
