//! gaugeread CLI — read analog gauges and score values against sensor configs.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gaugeread::{AnomalyChecker, GaugeScale, KeypointSet, ReaderConfig, SensorRegistry};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "gaugeread")]
#[command(about = "Read analog gauge images and score sensor values")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the value shown by a gauge image.
    Read(CliReadArgs),

    /// Score a value against its sensor's soft interval.
    Score {
        #[command(flatten)]
        sensor: SensorArgs,

        /// Value to score.
        #[arg(long, allow_negative_numbers = true)]
        value: f64,
    },

    /// Print the scoring parameters of a sensor.
    Audit {
        #[command(flatten)]
        sensor: SensorArgs,
    },
}

#[derive(Debug, Clone, Args)]
struct SensorArgs {
    /// Sensor registry (JSON, schema gaugeread.sensors.v1).
    #[arg(long)]
    sensors: PathBuf,

    /// Sensor category name.
    #[arg(long)]
    category: String,

    /// Marker id of a replicated sensor.
    #[arg(long)]
    marker_id: Option<u32>,
}

#[derive(Debug, Clone, Args)]
struct CliReadArgs {
    /// Path to the gauge image.
    #[arg(long)]
    image: PathBuf,

    /// Sensor registry providing the dial scale (and tolerance, scoring).
    #[arg(long, requires = "category")]
    sensors: Option<PathBuf>,

    /// Sensor category name (with --sensors).
    #[arg(long)]
    category: Option<String>,

    /// Marker id of a replicated sensor (with --sensors).
    #[arg(long)]
    marker_id: Option<u32>,

    /// Dial scale as "min_angle,max_angle,min_value,max_value" when no
    /// registry is given.
    #[arg(long, conflicts_with = "sensors")]
    scale: Option<String>,

    /// Reader configuration (JSON). Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scale keypoints as "start_x,start_y,end_x,end_y".
    #[arg(long)]
    keypoints: Option<String>,

    /// Resolution the keypoints refer to, e.g. "448x448".
    #[arg(long, default_value = "448x448")]
    keypoint_resolution: String,

    /// Report the scale minimum instead of failing when no needle is found.
    #[arg(long)]
    clamp_missing_needle: bool,

    /// External reference value; replaces the reading on failure or when
    /// the reading is out of tolerance.
    #[arg(long, allow_negative_numbers = true)]
    reference: Option<f64>,

    /// Relative tolerance for --reference (overrides the sensor's).
    #[arg(long)]
    tolerance: Option<f64>,

    /// Path to write the reading (JSON). Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Directory to write intermediate images into.
    #[arg(long)]
    debug_dir: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Read(args) => run_read(&args),
        Commands::Score { sensor, value } => run_score(&sensor, value),
        Commands::Audit { sensor } => run_audit(&sensor),
    }
}

fn load_checker(path: &Path) -> CliResult<AnomalyChecker> {
    let registry = SensorRegistry::from_json_file(path)?;
    tracing::info!("Loaded {} sensors from {}", registry.entries().len(), path.display());
    Ok(AnomalyChecker::new(Arc::new(registry)))
}

fn run_score(sensor: &SensorArgs, value: f64) -> CliResult<()> {
    let checker = load_checker(&sensor.sensors)?;
    let result = checker.evaluate(value, &sensor.category, sensor.marker_id)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_audit(sensor: &SensorArgs) -> CliResult<()> {
    let checker = load_checker(&sensor.sensors)?;
    let audit = checker.get_parameters_for_audit(&sensor.category, sensor.marker_id)?;
    println!("{}", serde_json::to_string_pretty(&audit)?);
    Ok(())
}

fn parse_floats<const N: usize>(s: &str, what: &str) -> CliResult<[f64; N]> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid {what} '{s}': {e}"))?;
    parts
        .try_into()
        .map_err(|_| format!("{what} needs {N} comma-separated numbers, got '{s}'").into())
}

fn parse_resolution(s: &str) -> CliResult<[u32; 2]> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("resolution must look like WIDTHxHEIGHT, got '{s}'"))?;
    Ok([w.trim().parse()?, h.trim().parse()?])
}

fn run_read(args: &CliReadArgs) -> CliResult<()> {
    let mut config = match &args.config {
        Some(path) => ReaderConfig::from_json_file(path)?,
        None => ReaderConfig::default(),
    };
    if args.debug_dir.is_some() {
        config.debug_frames = true;
    }
    if args.clamp_missing_needle {
        config.needle_miss = gaugeread::NeedleMissPolicy::ClampToMin;
    }

    let checker = args.sensors.as_deref().map(load_checker).transpose()?;
    let entry = match (&checker, &args.category) {
        (Some(c), Some(category)) => Some(c.registry().lookup(category, args.marker_id)?.clone()),
        _ => None,
    };

    let scale = match (&entry, &args.scale) {
        (Some(e), _) => e.gauge_scale()?,
        (None, Some(s)) => {
            let [min_angle, max_angle, min_value, max_value] = parse_floats::<4>(s, "scale")?;
            GaugeScale {
                min_angle,
                max_angle,
                min_value,
                max_value,
            }
        }
        (None, None) => return Err("either --sensors/--category or --scale is required".into()),
    };

    let keypoints = match &args.keypoints {
        Some(s) => {
            let [sx, sy, ex, ey] = parse_floats::<4>(s, "keypoints")?;
            Some(KeypointSet {
                start: [sx, sy],
                end: [ex, ey],
                canonical_resolution: parse_resolution(&args.keypoint_resolution)?,
            })
        }
        None => None,
    };

    let bytes = std::fs::read(&args.image)?;
    tracing::info!("Loaded {}", args.image.display());

    let result = gaugeread::read_gauge(&bytes, scale, keypoints.as_ref(), &config);

    let (report, resolved) = match args.reference {
        Some(reference) => {
            let tolerance = args
                .tolerance
                .or(entry.as_ref().map(|e| e.value_tolerance))
                .unwrap_or(0.0);
            let report = result.as_ref().ok().cloned();
            let resolved = gaugeread::resolve_against_reference(
                result.map(|r| r.reading),
                reference,
                tolerance,
            )?;
            (report, Some(resolved))
        }
        None => (Some(result?), None),
    };

    if let (Some(dir), Some(report)) = (&args.debug_dir, &report) {
        std::fs::create_dir_all(dir)?;
        for (i, frame) in report.frames.iter().enumerate() {
            let path = dir.join(format!("{i:02}_{}.png", frame.stage));
            std::fs::write(&path, &frame.png)?;
        }
        tracing::info!("Wrote {} debug frames to {}", report.frames.len(), dir.display());
        if let Some(err) = &report.frame_logging_error {
            tracing::warn!("debug frames incomplete: {err}");
        }
    }

    let value = resolved
        .map(|r| r.value)
        .or(report.as_ref().map(|r| r.reading.value));
    let score = match (&checker, &args.category, value) {
        (Some(c), Some(category), Some(v)) => Some(c.evaluate(v, category, args.marker_id)?),
        _ => None,
    };

    let out = serde_json::json!({
        "image": args.image,
        "center": report.as_ref().map(|r| r.center),
        "scale": report.as_ref().map(|r| r.scale),
        "reading": report.as_ref().map(|r| r.reading),
        "resolved": resolved,
        "score": score,
    });
    let json = serde_json::to_string_pretty(&out)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("Results written to {}", path.display());
        }
        None => println!("{json}"),
    }

    if let Some(v) = value {
        tracing::info!("Gauge value {v:.3}");
    }
    Ok(())
}
