use serde::{Deserialize, Serialize};

const PALETTE: [&str; 3] = ["#1f77b4", "#d62728", "#9467bd"];

/// Canvas geometry for rendered charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureConfig {
    pub width: u32,
    pub height: u32,
    /// Space reserved around the plot area for labels.
    pub margin: u32,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            margin: 64,
        }
    }
}

/// One polyline with markers.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    /// Legend entry; unlabelled curves are left out of the legend.
    pub label: Option<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// A log-log chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub curves: Vec<Curve>,
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
}

/// Decade range `[lo, hi]` covering every positive value.
fn decades(values: impl Iterator<Item = f64>) -> (i32, i32) {
    let (min, max) = values
        .filter(|value| *value > 0.0 && value.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), value| {
            (lo.min(value), hi.max(value))
        });
    if !min.is_finite() {
        return (0, 1);
    }
    let lo = min.log10().floor() as i32;
    let hi = max.log10().ceil() as i32;
    if hi > lo {
        (lo, hi)
    } else {
        (lo, lo + 1)
    }
}

/// Renders `chart` with logarithmic axes. Non-positive points are not drawn.
pub fn render_loglog_svg(chart: &Chart, config: &FigureConfig) -> String {
    let w = config.width as f64;
    let h = config.height as f64;
    let m = config.margin as f64;
    let plot_w = (w - 2.0 * m).max(1.0);
    let plot_h = (h - 2.0 * m).max(1.0);
    let (x_lo, x_hi) = decades(chart.curves.iter().flat_map(|c| c.x.iter().copied()));
    let (y_lo, y_hi) = decades(chart.curves.iter().flat_map(|c| c.y.iter().copied()));
    let px = |x: f64| m + (x.log10() - x_lo as f64) / (x_hi - x_lo) as f64 * plot_w;
    let py = |y: f64| h - m - (y.log10() - y_lo as f64) / (y_hi - y_lo) as f64 * plot_h;

    let mut parts = vec![format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{w}' height='{h}' font-family='sans-serif' font-size='12'>",
        w = config.width,
        h = config.height
    )];
    parts.push(format!("<rect width='{w}' height='{h}' fill='white' />"));

    for k in x_lo..=x_hi {
        let x = px(10f64.powi(k));
        parts.push(format!(
            "<line x1='{x:.2}' y1='{:.2}' x2='{x:.2}' y2='{:.2}' stroke='#dddddd' />",
            m,
            h - m
        ));
        parts.push(format!(
            "<text x='{x:.2}' y='{:.2}' text-anchor='middle'>1e{k}</text>",
            h - m + 16.0
        ));
    }
    for k in y_lo..=y_hi {
        let y = py(10f64.powi(k));
        parts.push(format!(
            "<line x1='{:.2}' y1='{y:.2}' x2='{:.2}' y2='{y:.2}' stroke='#dddddd' />",
            m,
            w - m
        ));
        parts.push(format!(
            "<text x='{:.2}' y='{:.2}' text-anchor='end'>1e{k}</text>",
            m - 6.0,
            y + 4.0
        ));
    }
    parts.push(format!(
        "<rect x='{m:.2}' y='{m:.2}' width='{plot_w:.2}' height='{plot_h:.2}' fill='none' stroke='black' />"
    ));
    parts.push(format!(
        "<text x='{:.2}' y='{:.2}' text-anchor='middle' font-size='14'>{}</text>",
        w / 2.0,
        m / 2.0,
        escape(&chart.title)
    ));
    parts.push(format!(
        "<text x='{:.2}' y='{:.2}' text-anchor='middle'>{}</text>",
        w / 2.0,
        h - m / 4.0,
        escape(&chart.x_label)
    ));
    parts.push(format!(
        "<text x='{x:.2}' y='{y:.2}' text-anchor='middle' transform='rotate(-90 {x:.2} {y:.2})'>{}</text>",
        escape(&chart.y_label),
        x = m / 4.0,
        y = h / 2.0
    ));

    let mut legend_row = 0;
    for (idx, curve) in chart.curves.iter().enumerate() {
        let color = PALETTE[idx % PALETTE.len()];
        let points: Vec<(f64, f64)> = curve
            .x
            .iter()
            .zip(&curve.y)
            .filter(|(x, y)| **x > 0.0 && **y > 0.0 && x.is_finite() && y.is_finite())
            .map(|(x, y)| (px(*x), py(*y)))
            .collect();
        if points.len() > 1 {
            let path: Vec<String> = points
                .iter()
                .map(|(x, y)| format!("{x:.2},{y:.2}"))
                .collect();
            parts.push(format!(
                "<polyline points='{}' fill='none' stroke='{color}' stroke-width='1.5' />",
                path.join(" ")
            ));
        }
        for (x, y) in &points {
            parts.push(format!(
                "<circle cx='{x:.2}' cy='{y:.2}' r='3' fill='{color}' />"
            ));
        }
        if let Some(label) = &curve.label {
            let y = m + 16.0 + 16.0 * legend_row as f64;
            parts.push(format!(
                "<line x1='{:.2}' y1='{:.2}' x2='{:.2}' y2='{:.2}' stroke='{color}' stroke-width='2' />",
                m + 8.0,
                y - 4.0,
                m + 24.0,
                y - 4.0
            ));
            parts.push(format!(
                "<text x='{:.2}' y='{y:.2}'>{}</text>",
                m + 30.0,
                escape(label)
            ));
            legend_row += 1;
        }
    }
    parts.push("</svg>".into());
    parts.join("")
}
