//! Command handlers.

pub mod config;
pub mod inspect;
pub mod progress;
pub mod relationships;
pub mod vocab;
