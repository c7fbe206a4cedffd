//! Core types for the Pulse content aggregation engine
//!
//! This crate defines the shared data structures used across the engine,
//! including source descriptors, fetch outcomes, merged topic results and the
//! `Source` contract every upstream adapter implements.

pub mod descriptor;
pub mod error;
pub mod outcome;
pub mod payload;
pub mod source;
pub mod topic;

pub use descriptor::{PriorityTier, RateBudget, SourceDescriptor};
pub use error::{FetchError, SourceError, SourceResult};
pub use outcome::FetchOutcome;
pub use payload::{is_empty_payload, Payload};
pub use source::Source;
pub use topic::{SourceContribution, SourceFailure, TopicResult};
