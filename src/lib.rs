pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod manifest;
pub mod platform;
pub mod registry;
pub mod service;
pub mod spec;

pub use anyhow::Result;
pub use error::Error;
