// src/core/functions/mod.rs

//! The aggregate function registry.
//!
//! Aggregates collapse a matched sequence of numbers into one number before
//! type coercion. They are stateless and reentrant, so one registry may be
//! shared by any number of concurrent batch executions. The set of
//! functions is injected at construction; there is no global singleton.

pub mod aggregates;

use crate::core::errors::BatchError;
use std::collections::HashMap;
use std::sync::Arc;

pub use aggregates::{Average, Max, Min, Sum};

/// A named, stateless reducer over a sequence of numbers.
pub trait AggregateFunction: Send + Sync + std::fmt::Debug {
    /// The canonical name used in the path call suffix, e.g. `sum`.
    fn name(&self) -> &'static str;

    /// Alternate names the function is also registered under.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn apply(&self, values: &[f64]) -> Result<f64, BatchError>;
}

/// A fixed, injectable set of named aggregate functions.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<&'static str, Arc<dyn AggregateFunction>>,
}

impl FunctionRegistry {
    /// Builds a registry from an explicit set of functions.
    pub fn new(functions: Vec<Arc<dyn AggregateFunction>>) -> Self {
        let mut map: HashMap<&'static str, Arc<dyn AggregateFunction>> = HashMap::new();
        for f in functions {
            map.insert(f.name(), Arc::clone(&f));
            for alias in f.aliases() {
                map.insert(alias, Arc::clone(&f));
            }
        }
        Self { functions: map }
    }

    /// The standard set: `sum`, `avg` (alias `average`), `min`, `max`.
    pub fn standard() -> Self {
        Self::new(vec![
            Arc::new(Sum),
            Arc::new(Average),
            Arc::new(Min),
            Arc::new(Max),
        ])
    }

    pub fn get(&self, name: &str) -> Result<&Arc<dyn AggregateFunction>, BatchError> {
        self.functions
            .get(name)
            .ok_or_else(|| BatchError::UnknownFunction(name.to_string()))
    }
}
