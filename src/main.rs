use std::path::PathBuf;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use dihadron::config::AnalysisConfig;
use dihadron::event_source::{EventSource, ParquetSource, expand_inputs};
use dihadron::output::{JsonDirectorySink, write_results};
use dihadron::toy::{ToyConfig, ToyGenerator, write_parquet};
use dihadron::CorrelationAccumulator;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Accumulate correlation histograms from parquet track tables
    Run {
        /// Parquet files or .txt lists of parquet files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,
        /// Correlate multiplicity bins in parallel
        #[arg(long)]
        partitioned: bool,
    },
    /// Write toy events in the input layout
    Generate {
        output: PathBuf,
        #[arg(short, long, value_name = "EVENTS", default_value_t = 10000)]
        n_events: usize,
        #[arg(short, long, value_name = "SEED", default_value_t = 0)]
        seed: u64,
    },
    /// Print the default configuration as YAML
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            inputs,
            output,
            config,
            partitioned,
        } => {
            let config = match config {
                Some(path) => AnalysisConfig::load(&path)?,
                None => AnalysisConfig::default(),
            };
            let files = expand_inputs(&inputs)?;
            let source = ParquetSource::open(&files)?;

            let progress = ProgressBar::new(source.num_events() as u64);
            progress.set_style(ProgressStyle::with_template(
                "{bar:40} {pos}/{len} events [{elapsed_precise}]",
            )?);

            let mut accumulator = CorrelationAccumulator::new(config)?;
            if partitioned {
                accumulator.run_partitioned(&source, Some(&progress))?;
            } else {
                accumulator.run(&source, Some(&progress))?;
            }
            progress.finish();

            let results = accumulator.finish();
            let mut sink = JsonDirectorySink::new(&output)?;
            write_results(&mut sink, &results)?;
            sink.write_summary(&results)?;
            log::info!("Wrote {} files to {}", sink.written(), output.display());
        }
        Commands::Generate {
            output,
            n_events,
            seed,
        } => {
            let mut generator = ToyGenerator::new(ToyConfig::default(), seed);
            let events = generator.generate(n_events);
            write_parquet(&events, &output)?;
        }
        Commands::Config => {
            print!("{}", AnalysisConfig::default().to_yaml()?);
        }
    }
    Ok(())
}
