//! pointprep - command-line front end for the preprocessing stages
//!
//! Each stage subcommand loads one PLY file, runs the stage and writes
//! `<stem>_<Tag>.ply` next to it:
//! - `crop`: keep points inside an axis-aligned box
//! - `exg`: keep vegetation by excess-green index
//! - `dbscan`: keep large density clusters
//! - `denoise`: statistical outlier removal
//! - `voxel`: voxel-grid downsampling
//!
//! `run` chains several stages in memory, and `print-config` dumps the
//! effective configuration as JSON.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use pointprep_pipeline::{
    run_pipeline, LogVisualizer, NoopVisualizer, PipelineConfig, Stage, StageKind, StageReport,
    Visualizer,
};

#[derive(Parser, Debug)]
#[command(name = "pointprep")]
#[command(about = "Crop, filter, cluster, denoise and downsample PLY point clouds", long_about = None)]
struct Cli {
    /// JSON file with stage parameters; missing fields use defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Do not log a summary of each intermediate cloud
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Keep points inside the box x in [-xl, xr], y in [-yl, yr], z in [zd, zu]
    Crop {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, allow_hyphen_values = true)]
        xl: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        xr: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        yl: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        yr: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        zd: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        zu: Option<f64>,
    },
    /// Keep points whose excess-green index 2G-R-B exceeds a threshold
    Exg {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, allow_hyphen_values = true)]
        threshold: Option<f64>,
    },
    /// Cluster with DBSCAN and keep clusters larger than a limit
    Dbscan {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        params: DbscanArgs,
    },
    /// Remove points far from their neighbours on average
    Denoise {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        params: DenoiseArgs,
    },
    /// Replace the points of each voxel by their centroid
    Voxel {
        #[command(flatten)]
        io: IoArgs,
        /// Voxel edge length in centimeters
        #[arg(long)]
        size_cm: Option<f64>,
    },
    /// Run several stages in order and write a single result
    Run {
        #[command(flatten)]
        io: IoArgs,
        /// Stages to run, in order
        #[arg(short, long, value_enum, value_delimiter = ',', required = true)]
        stages: Vec<StageArg>,
    },
    /// Print the effective configuration as JSON
    #[command(name = "print-config")]
    PrintConfig,
}

#[derive(Args, Debug)]
struct IoArgs {
    /// Input PLY file
    input: Option<PathBuf>,

    /// Output file (default: `<stem>_<Tag>.<ext>` next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DbscanArgs {
    /// Neighbourhood radius
    #[arg(long)]
    eps: Option<f64>,
    /// Other points within eps needed for a core point
    #[arg(long)]
    min_points: Option<usize>,
    /// Clusters must have more points than this to be kept
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct DenoiseArgs {
    /// Neighbours used for the mean distance
    #[arg(long)]
    neighbors: Option<usize>,
    /// Standard deviations above the mean before a point is an outlier
    #[arg(long)]
    std_ratio: Option<f64>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StageArg {
    Crop,
    Exg,
    Dbscan,
    Denoise,
    Voxel,
}

impl From<StageArg> for StageKind {
    fn from(arg: StageArg) -> Self {
        match arg {
            StageArg::Crop => StageKind::Crop,
            StageArg::Exg => StageKind::ExcessGreen,
            StageArg::Dbscan => StageKind::Dbscan,
            StageArg::Denoise => StageKind::Denoise,
            StageArg::Voxel => StageKind::Voxel,
        }
    }
}

fn override_field<T>(field: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *field = v;
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {:?}", path)),
        None => Ok(PipelineConfig::default()),
    }
}

fn print_report(report: &StageReport) {
    match &report.output_path {
        Some(path) => println!(
            "{} points -> {} points, saved to {}",
            report.input_points,
            report.output_points,
            path.display()
        ),
        None => println!(
            "{} points -> 0 points, nothing saved",
            report.input_points
        ),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    let (io, kinds) = match cli.command {
        Commands::PrintConfig => {
            let json = config
                .to_json_pretty()
                .context("Failed to serialize config")?;
            println!("{}", json);
            return Ok(());
        }
        Commands::Crop {
            io,
            xl,
            xr,
            yl,
            yr,
            zd,
            zu,
        } => {
            let b = &mut config.box_bounds;
            override_field(&mut b.xl, xl);
            override_field(&mut b.xr, xr);
            override_field(&mut b.yl, yl);
            override_field(&mut b.yr, yr);
            override_field(&mut b.zd, zd);
            override_field(&mut b.zu, zu);
            (io, vec![StageKind::Crop])
        }
        Commands::Exg { io, threshold } => {
            override_field(&mut config.exg_threshold, threshold);
            (io, vec![StageKind::ExcessGreen])
        }
        Commands::Dbscan { io, params } => {
            override_field(&mut config.dbscan_eps, params.eps);
            override_field(&mut config.dbscan_min_points, params.min_points);
            override_field(&mut config.dbscan_limit, params.limit);
            (io, vec![StageKind::Dbscan])
        }
        Commands::Denoise { io, params } => {
            override_field(&mut config.outlier_neighbor_count, params.neighbors);
            override_field(&mut config.outlier_std_ratio, params.std_ratio);
            (io, vec![StageKind::Denoise])
        }
        Commands::Voxel { io, size_cm } => {
            override_field(&mut config.voxel_size, size_cm.map(|cm| cm / 100.0));
            (io, vec![StageKind::Voxel])
        }
        Commands::Run { io, stages } => (io, stages.into_iter().map(StageKind::from).collect()),
    };

    config.validate().context("Invalid parameters")?;

    let stages: Vec<Stage> = kinds
        .into_iter()
        .map(|kind| Stage::from_config(kind, &config))
        .collect();

    let visualizer: &dyn Visualizer = if cli.quiet {
        &NoopVisualizer
    } else {
        &LogVisualizer
    };

    match run_pipeline(
        io.input.as_deref(),
        &stages,
        io.output.as_deref(),
        visualizer,
    ) {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) if e.is_input_missing() => {
            log::info!("{}, exiting", e);
            Ok(())
        }
        Err(e) => Err(e).context("Pipeline failed"),
    }
}
