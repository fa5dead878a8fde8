//! Utility modules.
//!
//! - [`HttpClient`]: shared, pooled HTTP client used by the taxonomy store

mod http;

pub use http::{HttpClient, DEFAULT_TIMEOUT};
