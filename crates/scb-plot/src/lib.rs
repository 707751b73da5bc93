//! Scaling charts for benchmark result files.

pub mod render;
pub mod series;
pub mod svg;

pub use render::PlotRenderer;
pub use series::{baseline, group_by_flag, normalize, scale, FlagSeries, PlotData};
pub use svg::{render_loglog_svg, Chart, Curve, FigureConfig};
