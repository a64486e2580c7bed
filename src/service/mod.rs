//! Service layer for business logic orchestration
//!
//! This module contains the service layer that orchestrates business logic,
//! separating concerns from the CLI layer in main.rs.

pub mod push;

pub use push::{MissingPolicy, PushContext, PushService};
