//! HTTP transport module
//!
//! Provides the client used by every resource service and the normalized
//! response type it returns.

mod client;
mod response;

pub use client::{HttpClient, HttpRequest};
pub use response::HttpResponse;
