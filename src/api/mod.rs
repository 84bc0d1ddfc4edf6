//! Typed access to the PortfolioX REST backend.
//!
//! Every page shares one [`ApiClient`]; authorization failures are handled
//! here once instead of at each call site.

pub mod client;
pub mod error;

pub use client::{ApiClient, ApiSettings};
pub use error::ApiError;
