// File: ./src/client/mod.rs
pub mod auth;
pub mod cert;
pub mod core;
pub mod ics;
pub mod middleware;

pub use crate::client::core::{CalDavSource, CalendarCollection};
pub use crate::client::ics::IcsFeedSource;
