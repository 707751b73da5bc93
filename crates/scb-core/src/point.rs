//! Sweep coordinates and phase measurements.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::spec::{Phase, SweepMode};

/// One coordinate of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Number of design variables.
    pub ndv: usize,
    /// Number of states.
    pub nstate: usize,
    /// Number of processors.
    pub nproc: usize,
    /// Boolean toggle for A/B code paths.
    pub flag: bool,
}

impl SweepPoint {
    /// Coordinate along the varying axis.
    pub fn x(&self, mode: SweepMode) -> usize {
        match mode {
            SweepMode::Desvar => self.ndv,
            SweepMode::State => self.nstate,
            SweepMode::Proc => self.nproc,
        }
    }
}

impl Display for SweepPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dv={}, state={}, proc={}, flag={}",
            self.ndv, self.nstate, self.nproc, self.flag
        )
    }
}

/// Phase durations in seconds for one repetition, or their average.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurement {
    /// Primary evaluation time.
    pub t_primary: f64,
    /// Differentiation time.
    pub t_diff: f64,
    /// Optimization time.
    pub t_opt: f64,
}

impl Measurement {
    /// Builds a measurement from its three durations.
    pub const fn new(t_primary: f64, t_diff: f64, t_opt: f64) -> Self {
        Self {
            t_primary,
            t_diff,
            t_opt,
        }
    }

    /// All phases zero.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Duration recorded for a phase.
    pub fn get(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Primary => self.t_primary,
            Phase::Diff => self.t_diff,
            Phase::Opt => self.t_opt,
        }
    }

    /// Durations in file order.
    pub fn as_array(&self) -> [f64; 3] {
        [self.t_primary, self.t_diff, self.t_opt]
    }

    /// True when every duration is finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.as_array()
            .iter()
            .all(|value| value.is_finite() && *value >= 0.0)
    }
}

/// Running sum of repetitions, averaged by the number actually added.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeasurementSum {
    sum: Measurement,
    count: usize,
}

impl MeasurementSum {
    /// Adds one repetition.
    pub fn add(&mut self, sample: &Measurement) {
        self.sum.t_primary += sample.t_primary;
        self.sum.t_diff += sample.t_diff;
        self.sum.t_opt += sample.t_opt;
        self.count += 1;
    }

    /// Number of repetitions added so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Arithmetic mean, or `None` before the first sample.
    pub fn average(&self) -> Option<Measurement> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(Measurement::new(
            self.sum.t_primary / n,
            self.sum.t_diff / n,
            self.sum.t_opt / n,
        ))
    }
}
