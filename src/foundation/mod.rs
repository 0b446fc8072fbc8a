//! Core value types, error taxonomy and configuration shared by every layer.

pub mod config;
pub mod core;
pub mod error;
