//! Sweep plans and their validated form.

use std::fmt::{self, Display};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{io_error, BenchError, ErrorInfo};
use crate::point::SweepPoint;
use crate::serde::from_yaml_slice;

/// Separator used when sweep metadata is embedded into file names.
pub const FIELD_SEPARATOR: char = '_';

/// Axis that varies across a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepMode {
    /// Design-variable count varies.
    Desvar,
    /// State count varies.
    State,
    /// Processor count varies.
    Proc,
}

impl SweepMode {
    /// Returns the token written into result headers and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepMode::Desvar => "desvar",
            SweepMode::State => "state",
            SweepMode::Proc => "proc",
        }
    }

    /// Axis label used on charts.
    pub fn axis_label(&self) -> &'static str {
        match self {
            SweepMode::Desvar => "Number of design vars",
            SweepMode::State => "Number of states",
            SweepMode::Proc => "Number of processors",
        }
    }
}

impl Display for SweepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SweepMode {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "desvar" => Ok(SweepMode::Desvar),
            "state" => Ok(SweepMode::State),
            "proc" => Ok(SweepMode::Proc),
            other => Err(BenchError::Parse(
                ErrorInfo::new("sweep_mode", "unknown sweep mode")
                    .with_context("value", other)
                    .with_hint("expected one of desvar, state, proc"),
            )),
        }
    }
}

/// One of the three timed operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Primary model evaluation.
    Primary,
    /// Derivative computation.
    Diff,
    /// Optimization driver run.
    Opt,
}

impl Phase {
    /// All phases in file order.
    pub const ALL: [Phase; 3] = [Phase::Primary, Phase::Diff, Phase::Opt];

    /// Tag embedded in file names.
    pub fn tag(&self) -> &'static str {
        match self {
            Phase::Primary => "primary",
            Phase::Diff => "diff",
            Phase::Opt => "opt",
        }
    }

    /// Default chart title for the phase.
    pub fn title(&self) -> &'static str {
        match self {
            Phase::Primary => "Primary Evaluation",
            Phase::Diff => "Compute Derivatives",
            Phase::Opt => "Optimization",
        }
    }

    fn from_tag(tag: &str) -> Option<Phase> {
        Phase::ALL.into_iter().find(|phase| phase.tag() == tag)
    }
}

/// Which phases have their durations recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phases {
    /// Record the primary evaluation time. The evaluation always runs.
    #[serde(default = "Phases::enabled")]
    pub primary: bool,
    /// Time the derivative computation.
    #[serde(default = "Phases::enabled")]
    pub diff: bool,
    /// Time the optimization driver.
    #[serde(default)]
    pub opt: bool,
}

impl Default for Phases {
    fn default() -> Self {
        Self {
            primary: true,
            diff: true,
            opt: false,
        }
    }
}

impl Phases {
    const fn enabled() -> bool {
        true
    }

    /// Returns whether the given phase is recorded.
    pub fn is_enabled(&self, phase: Phase) -> bool {
        match phase {
            Phase::Primary => self.primary,
            Phase::Diff => self.diff,
            Phase::Opt => self.opt,
        }
    }

    /// Enabled phases in file order.
    pub fn enabled_phases(&self) -> Vec<Phase> {
        Phase::ALL
            .into_iter()
            .filter(|phase| self.is_enabled(*phase))
            .collect()
    }

    /// File name tags of the enabled phases.
    pub fn tags(&self) -> Vec<&'static str> {
        self.enabled_phases().iter().map(Phase::tag).collect()
    }

    /// Rebuilds the phase set from file name tags.
    pub fn from_tags(tags: &[&str]) -> Result<Self, BenchError> {
        let mut phases = Phases {
            primary: false,
            diff: false,
            opt: false,
        };
        for tag in tags {
            match Phase::from_tag(tag) {
                Some(Phase::Primary) => phases.primary = true,
                Some(Phase::Diff) => phases.diff = true,
                Some(Phase::Opt) => phases.opt = true,
                None => {
                    return Err(BenchError::Parse(
                        ErrorInfo::new("phase_tag", "unknown phase tag").with_context("tag", *tag),
                    ))
                }
            }
        }
        Ok(phases)
    }
}

/// Joins sweep metadata into the stem shared by every file of one sweep.
pub fn sweep_stem(name: &str, mode: SweepMode, phases: &Phases) -> String {
    let mut parts = vec![name, mode.as_str()];
    parts.extend(phases.tags());
    parts.join("_")
}

/// Serialized form of a sweep, as written in YAML plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepPlan {
    /// Identifier embedded into file names.
    #[serde(default = "SweepPlan::default_name")]
    pub name: String,
    /// Design-variable counts.
    pub desvars: Vec<usize>,
    /// State counts.
    pub states: Vec<usize>,
    /// Processor counts.
    pub procs: Vec<usize>,
    /// Run every point with the flag off and on.
    #[serde(default)]
    pub use_flag: bool,
    /// Repetitions averaged per point.
    #[serde(default = "SweepPlan::default_repetitions")]
    pub num_repetitions: usize,
    /// Timed phases.
    #[serde(default)]
    pub phases: Phases,
}

impl SweepPlan {
    fn default_name() -> String {
        "bench".to_string()
    }

    const fn default_repetitions() -> usize {
        5
    }

    /// Creates a plan with default options for the given axes.
    pub fn new(
        name: impl Into<String>,
        desvars: Vec<usize>,
        states: Vec<usize>,
        procs: Vec<usize>,
    ) -> Self {
        Self {
            name: name.into(),
            desvars,
            states,
            procs,
            use_flag: false,
            num_repetitions: Self::default_repetitions(),
            phases: Phases::default(),
        }
    }

    /// Validates the plan into an immutable [`SweepSpec`].
    pub fn build(self) -> Result<SweepSpec, BenchError> {
        SweepSpec::try_from(self)
    }
}

/// Immutable, validated configuration for one benchmark campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SweepPlan", into = "SweepPlan")]
pub struct SweepSpec {
    name: String,
    desvars: Vec<usize>,
    states: Vec<usize>,
    procs: Vec<usize>,
    use_flag: bool,
    num_repetitions: usize,
    phases: Phases,
    mode: SweepMode,
}

impl TryFrom<SweepPlan> for SweepSpec {
    type Error = BenchError;

    fn try_from(plan: SweepPlan) -> Result<Self, Self::Error> {
        validate_name(&plan.name)?;
        for (axis, values) in [
            ("desvars", &plan.desvars),
            ("states", &plan.states),
            ("procs", &plan.procs),
        ] {
            if values.is_empty() {
                return Err(BenchError::Config(
                    ErrorInfo::new("empty_axis", "sweep axis has no values")
                        .with_context("axis", axis),
                ));
            }
            if values.iter().any(|value| *value == 0) {
                return Err(BenchError::Config(
                    ErrorInfo::new("zero_size", "sweep axis values must be positive")
                        .with_context("axis", axis),
                ));
            }
            if values.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(BenchError::Config(
                    ErrorInfo::new(
                        "axis_not_ascending",
                        "sweep axis values must strictly increase",
                    )
                    .with_context("axis", axis)
                    .with_context("values", format!("{values:?}"))
                    .with_hint("list each size once, smallest first"),
                ));
            }
        }
        let varying = [&plan.desvars, &plan.states, &plan.procs]
            .iter()
            .filter(|values| values.len() > 1)
            .count();
        if varying > 1 {
            return Err(BenchError::Config(
                ErrorInfo::new("multiple_axes", "only one of desvars, states, procs may vary")
                    .with_context("desvars", plan.desvars.len().to_string())
                    .with_context("states", plan.states.len().to_string())
                    .with_context("procs", plan.procs.len().to_string()),
            ));
        }
        if plan.num_repetitions == 0 {
            return Err(BenchError::config(
                "no_repetitions",
                "num_repetitions must be at least 1",
            ));
        }
        let mode = if plan.desvars.len() > 1 {
            SweepMode::Desvar
        } else if plan.states.len() > 1 {
            SweepMode::State
        } else if plan.procs.len() > 1 {
            SweepMode::Proc
        } else {
            SweepMode::State
        };
        Ok(SweepSpec {
            name: plan.name,
            desvars: plan.desvars,
            states: plan.states,
            procs: plan.procs,
            use_flag: plan.use_flag,
            num_repetitions: plan.num_repetitions,
            phases: plan.phases,
            mode,
        })
    }
}

impl From<SweepSpec> for SweepPlan {
    fn from(spec: SweepSpec) -> Self {
        SweepPlan {
            name: spec.name,
            desvars: spec.desvars,
            states: spec.states,
            procs: spec.procs,
            use_flag: spec.use_flag,
            num_repetitions: spec.num_repetitions,
            phases: spec.phases,
        }
    }
}

/// Rejects names that would corrupt the file naming scheme or the result header.
pub fn validate_name(name: &str) -> Result<(), BenchError> {
    let bad = name.is_empty()
        || name.chars().any(|c| {
            c == FIELD_SEPARATOR || c == ',' || c == '/' || c == '\\' || c.is_whitespace()
        });
    if bad {
        return Err(BenchError::Config(
            ErrorInfo::new("invalid_name", "sweep name is not usable in file names")
                .with_context("name", name)
                .with_hint("use a non-empty name without '_', ',', path separators or whitespace"),
        ));
    }
    Ok(())
}

impl SweepSpec {
    /// Builds a spec with default options (no flag, 5 repetitions, primary and diff timed).
    pub fn new(
        name: impl Into<String>,
        desvars: Vec<usize>,
        states: Vec<usize>,
        procs: Vec<usize>,
    ) -> Result<Self, BenchError> {
        SweepPlan::new(name, desvars, states, procs).build()
    }

    /// Sweep identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Design-variable counts.
    pub fn desvars(&self) -> &[usize] {
        &self.desvars
    }

    /// State counts.
    pub fn states(&self) -> &[usize] {
        &self.states
    }

    /// Processor counts.
    pub fn procs(&self) -> &[usize] {
        &self.procs
    }

    /// Whether each point runs with the flag off and on.
    pub fn use_flag(&self) -> bool {
        self.use_flag
    }

    /// Repetitions averaged per point.
    pub fn num_repetitions(&self) -> usize {
        self.num_repetitions
    }

    /// Timed phases.
    pub fn phases(&self) -> Phases {
        self.phases
    }

    /// The varying axis.
    pub fn mode(&self) -> SweepMode {
        self.mode
    }

    /// Flag values visited for every point.
    pub fn flags(&self) -> &'static [bool] {
        if self.use_flag {
            &[false, true]
        } else {
            &[false]
        }
    }

    /// Enumerates sweep points: proc, then state, then desvar, then flag.
    pub fn points(&self) -> Vec<SweepPoint> {
        let mut points = Vec::with_capacity(self.point_count());
        for &nproc in &self.procs {
            for &nstate in &self.states {
                for &ndv in &self.desvars {
                    for &flag in self.flags() {
                        points.push(SweepPoint {
                            ndv,
                            nstate,
                            nproc,
                            flag,
                        });
                    }
                }
            }
        }
        points
    }

    /// Number of points the sweep visits.
    pub fn point_count(&self) -> usize {
        self.desvars.len() * self.states.len() * self.procs.len() * self.flags().len()
    }

    /// Shared file stem: `{name}_{mode}_{phase tags}`.
    pub fn stem(&self) -> String {
        sweep_stem(&self.name, self.mode, &self.phases)
    }

    /// File name of the consolidated result.
    pub fn result_file_name(&self) -> String {
        format!("{}.dat", self.stem())
    }

    /// Largest processor count across the sweep.
    pub fn max_procs(&self) -> usize {
        self.procs.iter().copied().max().unwrap_or(1)
    }

    /// Fails unless the sweep can execute inside the current process.
    pub fn check_single_process(&self) -> Result<(), BenchError> {
        if self.procs.len() > 1 || self.procs[0] > 1 {
            return Err(BenchError::Config(
                ErrorInfo::new(
                    "multi_process",
                    "in-process sweeps only support a single processor",
                )
                .with_context("procs", format!("{:?}", self.procs))
                .with_hint("use the batch dispatcher for multi-process sweeps"),
            ));
        }
        Ok(())
    }
}

/// Loads and validates a YAML sweep plan.
pub fn load_plan<P: AsRef<Path>>(path: P) -> Result<SweepSpec, BenchError> {
    load_plan_with(path, None)
}

/// Loads a YAML sweep plan, replacing its repetition count before validation.
pub fn load_plan_with<P: AsRef<Path>>(
    path: P,
    repetitions: Option<usize>,
) -> Result<SweepSpec, BenchError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| io_error("plan_read", path, err))?;
    let mut plan: SweepPlan = from_yaml_slice(&bytes)?;
    if let Some(count) = repetitions {
        plan.num_repetitions = count;
    }
    plan.build()
}
