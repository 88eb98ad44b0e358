//! Qzone photo web API client.
//!
//! Speaks the same three fcgi endpoints the web client uses: album listing,
//! a first-photo lookup that seeds item pagination, and the floatview photo
//! list that pages through an album by photo key. Responses arrive JSONP
//! wrapped and carry a `code`/`message` envelope.

pub mod client;
pub mod cookie;
pub mod error;
pub mod types;

pub use client::QzoneClient;
pub use error::QzoneError;
