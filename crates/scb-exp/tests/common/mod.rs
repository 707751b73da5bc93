#![allow(dead_code)]

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use scb_core::{BenchError, Measurement, Phases, SweepPoint};
use scb_exp::{BenchHooks, BenchModel, Benchmark, HookResult, SetupContext};

pub type CallLog = Rc<RefCell<Vec<String>>>;

/// Model that records every call the harness makes.
pub struct RecordingModel {
    log: CallLog,
}

impl RecordingModel {
    fn push(&self, call: &str) {
        self.log.borrow_mut().push(call.to_string());
    }
}

impl BenchModel for RecordingModel {
    fn finalize(&mut self) -> HookResult {
        self.push("finalize");
        Ok(())
    }

    fn run_primary(&mut self) -> HookResult {
        self.push("primary");
        Ok(())
    }

    fn run_diff(&mut self) -> HookResult {
        self.push("diff");
        Ok(())
    }

    fn run_optimize(&mut self) -> HookResult {
        self.push("opt");
        Ok(())
    }
}

/// Hooks that log calls, optionally fail at one stage, and optionally change directory.
#[derive(Default)]
pub struct RecordingHooks {
    pub log: CallLog,
    pub fail_post_run_at: Option<usize>,
    pub chdir_to: Option<PathBuf>,
}

impl BenchHooks for RecordingHooks {
    type Model = RecordingModel;

    fn setup(&self, point: &SweepPoint, _ctx: &SetupContext<'_>) -> HookResult<RecordingModel> {
        self.log.borrow_mut().push(format!("setup {}", point.nstate));
        if let Some(dir) = &self.chdir_to {
            std::env::set_current_dir(dir)?;
        }
        Ok(RecordingModel {
            log: self.log.clone(),
        })
    }

    fn post_setup(&self, model: &mut RecordingModel, _point: &SweepPoint) -> HookResult {
        model.push("post_setup");
        Ok(())
    }

    fn post_run(&self, model: &mut RecordingModel, point: &SweepPoint) -> HookResult {
        model.push("post_run");
        if self.fail_post_run_at == Some(point.nstate) {
            return Err(format!("check failed at state {}", point.nstate).into());
        }
        Ok(())
    }
}

/// Benchmark replaying fixed measurements in order.
pub struct ScriptedBench {
    samples: RefCell<Vec<Measurement>>,
}

impl ScriptedBench {
    pub fn new(mut samples: Vec<Measurement>) -> Self {
        samples.reverse();
        Self {
            samples: RefCell::new(samples),
        }
    }

    pub fn remaining(&self) -> usize {
        self.samples.borrow().len()
    }
}

impl Benchmark for ScriptedBench {
    fn measure(
        &self,
        _point: &SweepPoint,
        _ctx: &SetupContext<'_>,
        _phases: Phases,
    ) -> Result<Measurement, BenchError> {
        Ok(self
            .samples
            .borrow_mut()
            .pop()
            .expect("scripted samples exhausted"))
    }
}
