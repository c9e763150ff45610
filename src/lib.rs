//! Shelter - offline-first cache controller for progressive web apps
//!
//! Precaches an app shell on install, drops stale caches on activate,
//! and answers fetches network-first for navigations (with an offline
//! page fallback) and cache-first for everything else.

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod journal;
pub mod network;
pub mod notify;
pub mod storage;
pub mod sync_routine;
pub mod ui;
pub mod worker;

pub use error::{ShelterError, ShelterResult};
