//! Cipher CLI: run the indicator/signal/prediction pipeline and inspect its output schema.
//!
//! Commands:
//! - `run`: annotate a bar file (or a synthetic series) and export the result
//! - `schema`: print the versioned output columns

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cipher_core::data::{generate_series, load_series, SyntheticSpec};
use cipher_core::output::write_outputs;
use cipher_core::schema::{EXPORT_COLUMNS, OUTPUT_COLUMNS, OUTPUT_SCHEMA_VERSION};
use cipher_core::{
    BarSeries, ModelCache, ModelStore, OutputFormat, Pipeline, PipelineConfig, RunSummary,
    SeriesMeta,
};

#[derive(Parser)]
#[command(
    name = "cipher",
    about = "Cipher CLI: WaveTrend signals and buy/sell classifier predictions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate a bar series and export it.
    Run {
        /// Bar file (.csv, Binance kline .json, or .parquet).
        #[arg(conflicts_with = "synthetic")]
        input: Option<PathBuf>,

        /// Generate this many synthetic bars instead of reading a file.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for --synthetic.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Model directory (overrides [models].dir).
        #[arg(long)]
        models_dir: Option<PathBuf>,

        /// Buy model tag (overrides [models].buy_tag).
        #[arg(long)]
        buy_tag: Option<String>,

        /// Sell model tag (overrides [models].sell_tag).
        #[arg(long)]
        sell_tag: Option<String>,

        /// Output directory (overrides [output].dir).
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Export formats, comma separated: csv, json, parquet.
        #[arg(long, value_delimiter = ',')]
        formats: Vec<OutputFormat>,

        /// Symbol label for the series.
        #[arg(long)]
        symbol: Option<String>,

        /// Timeframe label for the series (e.g. 1h, 4h).
        #[arg(long)]
        timeframe: Option<String>,
    },
    /// Print the output schema.
    Schema {
        /// Print every exported column, not only the rendering contract.
        #[arg(long, default_value_t = false)]
        full: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cipher=info,cipher_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            synthetic,
            seed,
            config,
            models_dir,
            buy_tag,
            sell_tag,
            output_dir,
            formats,
            symbol,
            timeframe,
        } => {
            let mut config = match config {
                Some(path) => PipelineConfig::from_file(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => PipelineConfig::default(),
            };
            if let Some(dir) = models_dir {
                config.models.dir = dir;
            }
            if let Some(tag) = buy_tag {
                config.models.buy_tag = tag;
            }
            if let Some(tag) = sell_tag {
                config.models.sell_tag = tag;
            }
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }
            if !formats.is_empty() {
                config.output.formats = formats;
            }
            config.validate()?;

            let source = match (input, synthetic) {
                (Some(path), None) => Source::File(path),
                (None, Some(bars)) => Source::Synthetic(bars, seed),
                (None, None) => bail!("one of INPUT or --synthetic is required"),
                (Some(_), Some(_)) => bail!("INPUT and --synthetic are mutually exclusive"),
            };
            run_pipeline(config, source, symbol, timeframe)
        }
        Commands::Schema { full } => {
            print_schema(full);
            Ok(())
        }
    }
}

enum Source {
    File(PathBuf),
    Synthetic(usize, u64),
}

fn load_bars(
    source: &Source,
    symbol: Option<String>,
    timeframe: Option<String>,
) -> Result<BarSeries> {
    match source {
        Source::File(path) => {
            let meta = SeriesMeta {
                symbol,
                timeframe,
                synthetic: false,
            };
            load_series(path, meta)
                .with_context(|| format!("failed to load bars from {}", path.display()))
        }
        Source::Synthetic(bars, seed) => {
            let mut spec = SyntheticSpec::with_bars(*bars, *seed);
            if let Some(symbol) = symbol {
                spec.symbol = symbol;
            }
            if let Some(timeframe) = timeframe {
                spec.timeframe = timeframe;
            }
            Ok(generate_series(&spec)?)
        }
    }
}

fn run_pipeline(
    config: PipelineConfig,
    source: Source,
    symbol: Option<String>,
    timeframe: Option<String>,
) -> Result<()> {
    // Models first: a missing model must fail before any bar is read
    let store = ModelStore::new(&config.models.dir);
    let cache = ModelCache::new();
    let pipeline = Pipeline::from_store(config, &store, &cache)?;
    info!(models = cache.len(), dir = %store.dir().display(), "models ready");

    let series = load_bars(&source, symbol, timeframe)?;
    let output = pipeline.run(&series)?;

    print_summary(&output.summary());

    let out = &pipeline.config().output;
    let written = write_outputs(&output, &out.dir, &out.formats)
        .with_context(|| format!("failed to write outputs to {}", out.dir.display()))?;
    for path in written {
        println!("  wrote {}", path.display());
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("=== {} ===", summary.label);
    println!("  bars            {}", summary.input_bars);
    println!("  retained rows   {}", summary.retained);
    match summary.first_retained {
        Some(index) => println!("  first retained  bar {index}"),
        None => println!("  first retained  -"),
    }
    println!(
        "  signals         {} buy / {} sell",
        summary.buy_signals, summary.sell_signals
    );
    println!(
        "  predictions     {} buy / {} sell",
        summary.predicted_buys, summary.predicted_sells
    );
}

fn print_schema(full: bool) {
    let columns = if full { EXPORT_COLUMNS } else { OUTPUT_COLUMNS };
    println!("output schema version {OUTPUT_SCHEMA_VERSION}");
    for field in columns {
        println!("  {:<20} {:?}", field.name, field.dtype);
    }
}
