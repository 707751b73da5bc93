use std::collections::BTreeMap;

use scb_core::{BenchError, ErrorInfo};

use crate::model::Benchmark;
use crate::synthetic::SyntheticBench;

/// Named benchmarks a batch worker can instantiate from a job description.
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<String, Box<dyn Benchmark>>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in `synthetic` benchmark.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.entries.insert(
            SyntheticBench::NAME.to_string(),
            Box::new(SyntheticBench::default()),
        );
        registry
    }

    /// Adds a benchmark under `name`; names are unique.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        bench: Box<dyn Benchmark>,
    ) -> Result<(), BenchError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(BenchError::Config(
                ErrorInfo::new("scb_exp.duplicate_benchmark", "benchmark already registered")
                    .with_context("benchmark", name),
            ));
        }
        self.entries.insert(name, bench);
        Ok(())
    }

    /// Looks up a benchmark by name.
    pub fn get(&self, name: &str) -> Result<&dyn Benchmark, BenchError> {
        self.entries
            .get(name)
            .map(|bench| bench.as_ref())
            .ok_or_else(|| {
                BenchError::Config(
                    ErrorInfo::new("scb_exp.unknown_benchmark", "no benchmark with that name")
                        .with_context("benchmark", name)
                        .with_hint(format!("registered: {}", self.names().join(", "))),
                )
            })
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}
