//! Data models for Vibbo entities.
//!
//! This module contains the data structures used to represent
//! Vibbo data including:
//!
//! - `StreamEntry`, `FeedItem`: activity feed entries (news and board posts)
//! - `Membership`: an organization the logged-in user belongs to

pub mod feed;
pub mod organization;

pub use feed::{FeedItem, StreamEntry};
pub use organization::Membership;
