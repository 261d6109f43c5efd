//! Async client for the AhaVault REST API.
//!
//! Wraps every JSON route the client applications need (auth, files,
//! shares, public pickup) and normalizes backend failures into
//! [`ApiError`].

pub mod client;
pub mod error;

pub use client::Client;
pub use error::ApiError;
