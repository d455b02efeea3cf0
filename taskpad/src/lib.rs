//! `Taskpad`: offline-first task list client library.

pub mod auth;
pub mod config;
pub mod connectivity;
pub mod remote;
pub mod session;
pub mod storage;
pub mod tasks;
