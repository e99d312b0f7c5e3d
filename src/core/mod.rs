// src/core/mod.rs

//! The central module containing the core logic and data structures of the batch engine.

pub mod builder;
pub mod coerce;
pub mod dispatch;
pub mod engine;
pub mod errors;
pub mod expression;
pub mod functions;
pub mod model;
pub mod path;

pub use builder::JsonBuilder;
pub use engine::BatchEngine;
pub use errors::BatchError;
