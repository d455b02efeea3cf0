//! `taskpad-server` library.
//!
//! Exposes the development backend for use in tests and embedding: an
//! in-memory account and task document store served over HTTP.

pub mod config;
pub mod server;
pub mod store;
