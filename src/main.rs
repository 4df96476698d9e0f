use clap::Parser;
use schemamap::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Multi-signal field-name matching for tabular schemas
#[derive(Parser, Debug)]
#[command(name = "schemamap")]
#[command(about = "Match target schema fields against source schemas", long_about = None)]
struct Args {
    /// Target schema: a JSON object of field key -> example value
    #[arg(short, long)]
    target: PathBuf,

    /// Source schema file(s), same JSON shape; repeatable
    #[arg(short, long, required = true)]
    source: Vec<PathBuf>,

    /// Country tag attached to every source schema
    #[arg(long, default_value = "")]
    country: String,

    /// Domain tag attached to every source schema
    #[arg(long, default_value = "")]
    domain: String,

    /// System tag attached to every source schema
    #[arg(long, default_value = "")]
    system: String,

    /// Scoring worker threads
    #[arg(long, default_value_t = schemamap::DEFAULT_WORKERS)]
    workers: usize,

    /// Directory for diagnostic artifacts (full mapping, best mapping,
    /// data mapping, score CSV); skipped when absent
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting schemamap v{}", env!("CARGO_PKG_VERSION"));

    let target = load_target(&args.target)?;
    let sources = args
        .source
        .iter()
        .map(|path| load_source(path, &args))
        .collect::<anyhow::Result<Vec<_>>>()?;
    info!(
        "Loaded target '{}' and {} source schema(s)",
        target.message,
        sources.len()
    );

    let engine = MatchEngine::builder().workers(args.workers).build();
    let outcome = engine.match_schemas(&target, &sources)?;

    println!("{}", serde_json::to_string_pretty(&outcome.mapping)?);

    if let Some(out_dir) = &args.out_dir {
        write_artifacts(out_dir, &outcome)?;
        info!("Artifacts written to {:?}", out_dir);
    }

    Ok(())
}

fn load_target(path: &Path) -> anyhow::Result<TargetSchema> {
    let fields = load_fields(path)?;
    Ok(TargetSchema::new(file_stem(path), fields))
}

fn load_source(path: &Path, args: &Args) -> anyhow::Result<SourceSchema> {
    let fields = load_fields(path)?;
    let mut info = SourceInfo::new(file_stem(path), path.display().to_string());
    info.country = args.country.clone();
    info.domain = args.domain.clone();
    info.system = args.system.clone();
    Ok(SourceSchema::new(info, fields))
}

fn load_fields(path: &Path) -> anyhow::Result<SchemaDict> {
    let text = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    Ok(SchemaDict::from_json_object(&value)?)
}

/// Schema name from the file name, "schema" when the path has no stem
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "schema".to_string())
}

fn write_artifacts(out_dir: &Path, outcome: &MatchOutcome) -> anyhow::Result<()> {
    fs::create_dir_all(out_dir)?;

    fs::write(
        out_dir.join("full_mapping.json"),
        serde_json::to_string_pretty(&outcome.table.full_mapping())?,
    )?;
    fs::write(
        out_dir.join("best_mapping.json"),
        serde_json::to_string_pretty(&outcome.mapping)?,
    )?;
    fs::write(
        out_dir.join("data_mapping.json"),
        serde_json::to_string_pretty(&outcome.table.data_mapping(&outcome.descriptions))?,
    )?;

    let mut csv = Vec::new();
    outcome.table.write_csv(&mut csv)?;
    fs::write(out_dir.join("mapping_results.csv"), csv)?;

    Ok(())
}
