// src/core/functions/aggregates.rs

//! The standard aggregate functions: sum, average, min, and max.

use super::AggregateFunction;
use crate::core::errors::BatchError;

/// Arithmetic total. The sum of an empty sequence is 0.
#[derive(Debug)]
pub struct Sum;

impl AggregateFunction for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn apply(&self, values: &[f64]) -> Result<f64, BatchError> {
        Ok(values.iter().sum())
    }
}

/// Arithmetic mean. Undefined over an empty sequence.
#[derive(Debug)]
pub struct Average;

impl AggregateFunction for Average {
    fn name(&self) -> &'static str {
        "avg"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["average"]
    }

    fn apply(&self, values: &[f64]) -> Result<f64, BatchError> {
        if values.is_empty() {
            return Err(BatchError::EmptyAggregate(self.name()));
        }
        Ok(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Smallest value. Undefined over an empty sequence.
#[derive(Debug)]
pub struct Min;

impl AggregateFunction for Min {
    fn name(&self) -> &'static str {
        "min"
    }

    fn apply(&self, values: &[f64]) -> Result<f64, BatchError> {
        values
            .iter()
            .copied()
            .reduce(f64::min)
            .ok_or(BatchError::EmptyAggregate(self.name()))
    }
}

/// Largest value. Undefined over an empty sequence.
#[derive(Debug)]
pub struct Max;

impl AggregateFunction for Max {
    fn name(&self) -> &'static str {
        "max"
    }

    fn apply(&self, values: &[f64]) -> Result<f64, BatchError> {
        values
            .iter()
            .copied()
            .reduce(f64::max)
            .ok_or(BatchError::EmptyAggregate(self.name()))
    }
}
