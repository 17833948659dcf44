//! Core library components.
//!
//! Business logic for key lifecycle, file encryption and store consistency.
//! Nothing here prints; the CLI renders results.

pub mod atomic;
pub mod audit;
pub mod cipher;
pub mod config;
pub mod confirm;
pub mod constants;
pub mod context;
pub mod domain;
pub mod gitignore;
pub mod layout;
pub mod pattern;
pub mod registry;
pub mod resolve;
pub mod store;
pub mod types;
pub mod vault;
