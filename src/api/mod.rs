//! HTTP client for the remote content API.

mod client;

pub use client::{ApiClient, ApiError, Author, ContentCreated};
