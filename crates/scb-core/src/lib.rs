#![deny(missing_docs)]
#![doc = "Sweep specifications, error taxonomy and on-disk result formats for scaling benchmarks."]

pub mod errors;
pub mod hash;
pub mod io;
pub mod perpoint;
pub mod point;
pub mod result;
pub mod serde;
pub mod spec;

pub use errors::{io_error, parse_error, BenchError, ErrorInfo};
pub use hash::stable_hash_string;
pub use io::write_atomic;
pub use perpoint::{read_per_point, write_per_point, PerPointName, PER_POINT_GLOB};
pub use point::{Measurement, MeasurementSum, SweepPoint};
pub use result::{ResultFile, ResultRow};
pub use self::serde::{from_json_slice, from_yaml_slice, to_canonical_json_bytes};
pub use spec::{
    load_plan, load_plan_with, sweep_stem, validate_name, Phase, Phases, SweepMode, SweepPlan,
    SweepSpec, FIELD_SEPARATOR,
};
