//! Command handlers

pub mod archive;
pub mod config;
pub mod status;
pub mod story;
pub mod tag;
