//! pager-notify — watches a pager-gateway log stream, classifies lines
//! into typed events, and routes them to per-subscriber notification
//! endpoints.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod transport;
