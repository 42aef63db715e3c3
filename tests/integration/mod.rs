//! Integration tests with mock HTTP server

pub mod cache;
pub mod chat;
pub mod mock_server;
pub mod retry;
pub mod streaming;
