// Library root: re-exports all modules so integration tests and the binary
// share one API.

pub mod config;
pub mod report;
pub mod roster;
pub mod service;
pub mod store;
