//! Data models for the ReleaseRite API.
//!
//! These models match the JSON documents exchanged with the REST API.

mod auth;
mod environment;
mod release;
mod role;
mod service;
pub mod timestamp;
mod user;

pub use auth::*;
pub use environment::*;
pub use release::*;
pub use role::*;
pub use service::*;
pub use user::*;
