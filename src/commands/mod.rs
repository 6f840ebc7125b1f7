//! CLI command handlers.

pub mod build;
pub mod doctor;
pub mod info;
pub mod platforms;
