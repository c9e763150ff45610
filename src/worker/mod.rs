//! Cache controller and its worker lifecycle
//!
//! # Strategies
//!
//! | Request | Strategy | On failure |
//! |---------|----------|------------|
//! | Navigation | network first | cached offline page |
//! | Anything else | cache first | one network fetch |
//!
//! Install precaches the asset manifest all-or-nothing; activate deletes
//! every bucket but the current version's.

pub mod config;
pub mod controller;
pub mod event;
pub mod host;
pub mod lifecycle;
pub mod manifest;

pub use config::ControllerConfig;
pub use controller::Controller;
pub use event::{
    ActivateReport, Event, EventOutcome, FetchReport, InstallReport, ResponseSource, Route,
    SyncOutcome,
};
pub use host::{StartReport, WorkerHost};
pub use lifecycle::{WorkerRecord, WorkerState};
pub use manifest::AssetManifest;
