//! Answer evaluation engine, document loaders, and collaborator traits.
//!
//! This crate defines the data model, the deterministic scoring engine, the
//! JSON document loaders, and the async pipeline that the rest of evalmate
//! builds on.

pub mod engine;
pub mod error;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod tools;
pub mod traits;

pub use engine::{evaluate, evaluate_strict};
pub use error::{DocumentError, ServiceError};
pub use model::{Evaluation, Evaluations, FeedbackSet, ModelKeySet, Question};
