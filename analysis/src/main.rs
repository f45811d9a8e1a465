//! Stormdata CLI - rank U.S. storm event types by health and economic impact
//!
//! # Main Commands
//!
//! ```bash
//! stormdata report                  # Full report: summary, tables, charts
//! stormdata report --json out.json  # Same, plus a JSON dump
//! stormdata top economic -n 5       # One ranked table
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! stormdata unmatched               # Labels missing from the lookup asset
//! stormdata decode K M 3 ?          # Decode damage exponent codes
//! stormdata cpi --base-year 1950    # CPI yearly averages and ratios
//! stormdata cpi --list              # Cached CPI series
//! ```

use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use stormdata::logs::LOG_SINK;
use stormdata::report::{render_bar_chart, render_metric_table, render_unmatched_table, DEFAULT_CHART_WIDTH};
use stormdata::{
    decode_exponent, load_events_and_lookup, render_report, resolve_series, run_analysis, to_json,
    AnalysisOptions, CpiCache, CpiSource, FredClient, InflationTable, Metric,
};

#[derive(Parser)]
#[command(name = "stormdata")]
#[command(about = "Health and economic impact of U.S. storm event types", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Input overrides shared by the analysis commands
#[derive(Args, Clone, Default)]
struct InputArgs {
    /// Storm events CSV
    #[arg(long)]
    storm_data: Option<PathBuf>,

    /// Event-type lookup asset
    #[arg(long)]
    lookup: Option<PathBuf>,

    /// Local CPI CSV (FRED layout)
    #[arg(long, conflicts_with = "cpi_series")]
    cpi_file: Option<PathBuf>,

    /// FRED CPI series id
    #[arg(long)]
    cpi_series: Option<String>,

    /// CPI cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Fetch the CPI series again even if cached
    #[arg(long)]
    refresh_cpi: bool,

    /// Hide progress messages
    #[arg(short, long)]
    quiet: bool,
}

impl InputArgs {
    /// Environment defaults, then flags
    fn options(&self) -> AnalysisOptions {
        LOG_SINK.set_echo(!self.quiet);

        let mut options = AnalysisOptions::from_env();
        if let Some(path) = &self.storm_data {
            options.storm_data = path.clone();
        }
        if let Some(path) = &self.lookup {
            options.lookup = path.clone();
        }
        if let Some(series) = &self.cpi_series {
            options.cpi = CpiSource::Fred { series: series.clone() };
        }
        if let Some(path) = &self.cpi_file {
            options.cpi = CpiSource::File { path: path.clone() };
        }
        if let Some(dir) = &self.cache_dir {
            options.cache_dir = dir.clone();
        }
        options.refresh_cpi |= self.refresh_cpi;
        options
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Full analysis: summary, one table and chart per metric
    Report {
        #[command(flatten)]
        inputs: InputArgs,

        /// Rows per table (ties at the cutoff are kept)
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Also write the result as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Ranked table for one metric
    Top {
        /// fatalities, injuries, property, crop, health or economic
        metric: Metric,

        #[command(flatten)]
        inputs: InputArgs,

        /// Rows in the table (ties at the cutoff are kept)
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Draw a bar chart under the table
        #[arg(long)]
        chart: bool,
    },

    /// Event labels with no lookup entry
    Unmatched {
        #[command(flatten)]
        inputs: InputArgs,

        /// Labels to show
        #[arg(short, long, default_value = "25")]
        limit: usize,
    },

    /// Decode damage exponent codes
    Decode {
        /// Codes as they appear in PROPDMGEXP / CROPDMGEXP
        #[arg(required = true, allow_hyphen_values = true)]
        codes: Vec<String>,
    },

    /// CPI yearly averages and inflation ratios
    Cpi {
        #[command(flatten)]
        inputs: InputArgs,

        /// Base year (default: first year of the series)
        #[arg(long)]
        base_year: Option<i32>,

        /// List cached series instead
        #[arg(long)]
        list: bool,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report { inputs, top, json } => cmd_report(&inputs, top, json.as_deref()).await,

        Commands::Top {
            metric,
            inputs,
            top,
            chart,
        } => cmd_top(metric, &inputs, top, chart).await,

        Commands::Unmatched { inputs, limit } => cmd_unmatched(&inputs, limit),

        Commands::Decode { codes } => cmd_decode(&codes),

        Commands::Cpi {
            inputs,
            base_year,
            list,
        } => cmd_cpi(&inputs, base_year, list).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_report(
    inputs: &InputArgs,
    top: Option<usize>,
    json: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = inputs.options();
    if let Some(n) = top {
        options.top_n = n;
    }

    let result = run_analysis(&options).await?;
    println!("{}", render_report(&result));

    if let Some(path) = json {
        let content = to_json(&result, &LOG_SINK.entries())?;
        write_output(&content, Some(path))?;
    }

    Ok(())
}

async fn cmd_top(
    metric: Metric,
    inputs: &InputArgs,
    top: Option<usize>,
    chart: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = inputs.options();
    if let Some(n) = top {
        options.top_n = n;
    }

    let result = run_analysis(&options).await?;
    let table = result
        .table(metric)
        .ok_or_else(|| format!("no table for {}", metric))?;

    println!("Top event types by {}", metric.title().to_lowercase());
    println!("{}", render_metric_table(table));
    if chart {
        println!();
        print!("{}", render_bar_chart(table, DEFAULT_CHART_WIDTH));
    }

    Ok(())
}

fn cmd_unmatched(inputs: &InputArgs, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let options = inputs.options();
    let (storm, lookup) = load_events_and_lookup(&options)?;
    let unmatched = lookup.unmatched_labels(&storm.events);

    if unmatched.is_empty() {
        eprintln!("✅ Every event label has a lookup entry");
        return Ok(());
    }

    let rows: usize = unmatched.iter().map(|u| u.rows).sum();
    eprintln!(
        "📋 {} labels ({} rows) missing from lookup {}",
        unmatched.len(),
        rows,
        lookup.version()
    );
    println!("{}", render_unmatched_table(&unmatched, limit));

    Ok(())
}

fn cmd_decode(codes: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let mut invalid = 0;

    for code in codes {
        match decode_exponent(code) {
            Ok(exp) => println!("{:>8}  10^{}", format!("{:?}", code), exp),
            Err(e) => {
                invalid += 1;
                println!("{:>8}  {}", format!("{:?}", code), e);
            }
        }
    }

    if invalid > 0 {
        return Err(format!("{} invalid code(s)", invalid).into());
    }

    Ok(())
}

async fn cmd_cpi(
    inputs: &InputArgs,
    base_year: Option<i32>,
    list: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = inputs.options();
    let mut cache = CpiCache::with_dir(&options.cache_dir);

    if list {
        let stored = cache.list();
        if stored.is_empty() {
            println!("No cached series in {}", options.cache_dir.display());
            return Ok(());
        }
        println!("Cached series ({}):\n", stored.len());
        for s in stored {
            let range = s
                .series
                .year_range()
                .map(|(first, last)| format!("{}-{}", first, last))
                .unwrap_or_else(|| "-".to_string());
            println!("  {} {} ({} observations)", s.series.id, range, s.series.observations.len());
            println!("     fetched {} from {}", s.fetched_at, s.source_url);
        }
        return Ok(());
    }

    let series = resolve_series(&options.cpi, &mut cache, &FredClient::new(), options.refresh_cpi).await?;
    let (first, _) = series.year_range().ok_or("CPI series has no observations")?;
    let table = InflationTable::from_observations(&series.observations, base_year.unwrap_or(first))?;

    println!("{} (base year {})\n", series.id, table.base_year());
    println!("  YEAR   AVERAGE    RATIO");
    for record in table.records() {
        println!("  {}  {:>8.3}  {:>7.4}", record.year, record.average, record.ratio);
    }

    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Saved to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
