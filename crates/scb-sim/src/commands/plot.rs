use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use scb_core::ResultFile;
use scb_plot::PlotRenderer;

#[derive(Args, Debug)]
pub struct PlotArgs {
    /// Result file to chart.
    #[arg(long)]
    pub input: PathBuf,
    /// Chart title.
    #[arg(long, default_value = "")]
    pub title: String,
    /// Legend entry for flag-on curves.
    #[arg(long)]
    pub flag_label: Option<String>,
    /// Axis title for the optimization phase.
    #[arg(long)]
    pub secondary_title: Option<String>,
    /// Also draw the differentiation/optimization overlay.
    #[arg(long)]
    pub overlay: bool,
    /// Output directory; defaults to the input's directory.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &PlotArgs) -> Result<(), Box<dyn Error>> {
    let result = ResultFile::read(&args.input)?;
    let mut renderer = PlotRenderer::new(args.title.clone());
    if let Some(label) = &args.flag_label {
        renderer.flag_label = label.clone();
    }
    if let Some(title) = &args.secondary_title {
        renderer.secondary_title = title.clone();
    }
    renderer.overlay = args.overlay;

    let out = match &args.out {
        Some(dir) => dir.clone(),
        None => args
            .input
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    std::fs::create_dir_all(&out)?;
    for path in renderer.render(&result, &out)? {
        println!("{}", path.display());
    }
    Ok(())
}
