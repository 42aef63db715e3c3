//! HTTP transport layer.

pub mod http;

pub use http::{status_tag, HttpTransport, TransportError};
