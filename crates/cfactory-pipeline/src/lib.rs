//! Task runner for the content pipeline.
//!
//! A run is submitted with [`submit_run`] (or [`approve_content`] for
//! generation), which records it in the ledger and enqueues a job in the same
//! transaction. A [`Worker`] claims queued jobs and drives each run through
//! [`execute_run`]. [`recover_interrupted`] settles runs whose worker died.

pub mod context;
pub mod error;
pub mod params;
pub mod recovery;
pub mod runner;
mod steps;
pub mod submit;
pub mod worker;

pub use context::PipelineContext;
pub use error::PipelineError;
pub use params::{DiscoveryParams, GenerationParams, HarvestParams, ScoringParams};
pub use recovery::{recover_interrupted, RecoveryReport};
pub use runner::execute_run;
pub use submit::{approve_content, submit_run};
pub use worker::{Worker, WorkerConfig};
