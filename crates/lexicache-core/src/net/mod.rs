//! Network access for dictionaries and offline assets.
//!
//! The `Fetcher` trait is the seam every request passes through: the
//! `HttpFetcher` talks to the real network, and the offline cache wraps a
//! fetcher to answer from its bucket first.

pub mod client;
pub mod error;

pub use client::{Fetcher, HttpFetcher, Response};
pub use error::FetchError;
