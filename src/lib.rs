//! Plugin core for exposing a Vibbo activity feed to a hosting automation
//! platform.
//!
//! The crate authenticates against the Vibbo community portal's
//! passwordless SMS login, polls the GraphQL activity feed on an interval,
//! and maps the latest items to a single sensor state plus an attribute
//! mapping for the companion feed card. The hosting platform owns
//! scheduling, entity lifecycle, and the settings UI; its contract with
//! this crate is "run the setup wizard, call refresh on a timer, render
//! the mapping".

pub mod api;
pub mod auth;
pub mod config;
pub mod coordinator;
pub mod frontend;
pub mod models;
pub mod sensor;
pub mod setup;

pub use api::{UpdateError, VibboClient};
pub use auth::{AuthError, CredentialBundle};
pub use coordinator::{FeedCoordinator, FeedSnapshot};
pub use setup::{SetupFlow, SetupStep};
