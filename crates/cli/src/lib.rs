//! Command line front end for Stowage.
//!
//! This crate provides:
//! - Loading and saving the inventory state file
//! - Reading JSON requests and configuration overrides

mod state;

pub use state::{load_config, read_request, StateError, StateStore};
