//! Notes Service access
//!
//! - Record models exchanged with the service
//! - Typed HTTP client for notes and labels

pub mod client;
pub mod models;

pub use client::NotesClient;
pub use models::*;
