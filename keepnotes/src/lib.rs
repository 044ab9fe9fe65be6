//! Keepnotes library
//!
//! Client core for a Keep-style notes application: the block editor model,
//! conversion to and from the Notes Service record shape, bulk selection
//! and the services that talk to the Notes Service.

pub mod api;
pub mod app;
pub mod config;
pub mod editor;
pub mod error;
pub mod selection;
pub mod services;
