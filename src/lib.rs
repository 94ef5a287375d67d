//! # Channel Claim CDC
//!
//! Derives channel-claim events from the change log of the customer table.
//!
//! ## Architecture
//!
//! ```text
//! change record -> normalize -> reconstruct (before/after) -> diff -> synthesize -> publish
//! ```
//!
//! ## Modules
//!
//! - [`attributes`]: change-log attribute values and the record normalizer
//! - [`domain`]: customer snapshots, the claim differ and event synthesis
//! - [`messaging`]: event-bus client and the all-or-nothing publisher
//! - [`pipeline`]: one invocation over a batch of change records
//! - [`host`]: HTTP and replay hosts that drive invocations

pub mod attributes;
pub mod config;
pub mod domain;
pub mod host;
pub mod messaging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use config::AppConfig;
pub use models::{ChangeRecord, StreamEvent};
pub use pipeline::{ChangeCaptureProcessor, InvocationSummary, PipelineError};
