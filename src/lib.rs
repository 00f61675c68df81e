// Crate root library declaration and module exports.
pub mod agenda;
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod output;
pub mod runner;
pub mod source;
