//! Deal pipeline board: stage registry, per-stage analytics, drag-and-drop
//! state, and the record stores that back them.

pub mod auth;
pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod store;
