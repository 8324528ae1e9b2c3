//! GraphQL client module for the Vibbo API.
//!
//! This module provides the `VibboClient` for communicating with the
//! vibbo.no GraphQL endpoint to fetch the organization activity feed.
//!
//! Requests authenticate with the session cookie pair obtained through
//! the passwordless SMS login flow in [`crate::auth`].

pub mod client;
pub mod error;

pub use client::{VibboClient, DEFAULT_LIMIT};
pub use error::UpdateError;
