//! ReleaseRite client
//!
//! Release dashboard core over the ReleaseRite REST API: token claim reading,
//! advisory permission checks, per-environment deployment progress and the
//! deploy/undeploy commands of the release detail view.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod progress;
pub mod session;
pub mod tracker;
