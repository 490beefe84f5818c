//! dom-xray command line
//!
//! Loads an HTML document into the in-memory host and runs either the main
//! exploration or combo mode over it.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dom_xray::export::{Exporter, FileExporter, StdoutExporter};
use dom_xray::{ComboEnumerator, ComboReport, ControlRecord, DomTree, ExploreOptions, Explorer};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

#[derive(Parser)]
#[command(name = "dom-xray")]
#[command(version)]
#[command(about = "Discover, activate and record every interactive node of a document", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record every control reachable by activating triggers
    Explore(RunArgs),
    /// Snapshot the tree for every single trigger and every pair of triggers
    Combos(RunArgs),
    /// Print the JSON Schemas of both output artifacts
    Schema,
}

#[derive(Args)]
struct RunArgs {
    /// HTML document to load
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Document URL used for origin checks (default: file URL of FILE)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Hard cap on frontier pops
    #[arg(long, default_value = "1000")]
    max_iterations: usize,

    /// Pause after every activation, in milliseconds
    #[arg(long, default_value = "200")]
    settle_ms: u64,

    /// Combination count above which combo mode warns
    #[arg(long, default_value = "100")]
    warn_threshold: usize,

    /// Directory receiving the output file
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Print the output instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Log the output to the console instead of exporting it
    #[arg(long)]
    no_persist: bool,

    /// Skip opening collapsed and hidden content before the initial scan
    #[arg(long)]
    no_reveal: bool,
}

/// Where a finished run's payload goes
enum Output {
    Export(Arc<dyn Exporter>),
    Console,
}

impl Output {
    fn exporter(&self) -> Option<Arc<dyn Exporter>> {
        match self {
            Output::Export(exporter) => Some(Arc::clone(exporter)),
            Output::Console => None,
        }
    }

    fn log(&self, payload: &str) {
        if let Output::Console = self {
            println!("{payload}");
        }
    }
}

impl RunArgs {
    fn options(&self) -> ExploreOptions {
        ExploreOptions::new()
            .max_iterations(self.max_iterations)
            .settle_ms(self.settle_ms)
            .combo_warn_threshold(self.warn_threshold)
            .persist(!self.no_persist)
            .reveal_hidden(!self.no_reveal)
    }

    fn output(&self) -> Output {
        if self.no_persist {
            Output::Console
        } else if self.stdout {
            Output::Export(Arc::new(StdoutExporter))
        } else {
            Output::Export(Arc::new(FileExporter::new(&self.out_dir)))
        }
    }

    async fn load(&self) -> anyhow::Result<DomTree> {
        let html = tokio::fs::read_to_string(&self.file)
            .await
            .with_context(|| format!("failed to read {}", self.file.display()))?;

        let url = match &self.base_url {
            Some(url) => url.clone(),
            None => {
                let path = std::fs::canonicalize(&self.file)?;
                Url::from_file_path(&path)
                    .map_err(|_| anyhow::anyhow!("cannot build a file URL for {}", path.display()))?
                    .to_string()
            }
        };

        Ok(DomTree::parse_html(&html, &url)?)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Explore(args) => {
            let mut tree = args.load().await?;
            let output = args.output();
            let mut explorer = Explorer::new(args.options());
            if let Some(exporter) = output.exporter() {
                explorer = explorer.with_exporter(exporter);
            }
            let report = explorer.run(&mut tree).await?;
            output.log(&report.to_json()?);
            if !report.is_exhaustive() {
                eprintln!(
                    "warning: stopped after {} iterations with {} triggers unexplored",
                    report.iterations, report.frontier_remaining
                );
            }
        }
        Command::Combos(args) => {
            let mut tree = args.load().await?;
            let output = args.output();
            let mut enumerator = ComboEnumerator::new(args.options());
            if let Some(exporter) = output.exporter() {
                enumerator = enumerator.with_exporter(exporter);
            }
            let outcome = enumerator.run(&mut tree).await?;
            output.log(&outcome.report.to_json()?);
            if let Some(advisory) = outcome.advisory {
                eprintln!(
                    "warning: {} combinations exceed the threshold of {}",
                    advisory.combinations, advisory.threshold
                );
            }
        }
        Command::Schema => {
            let records = schemars::schema_for!(Vec<ControlRecord>);
            let combos = schemars::schema_for!(ComboReport);
            let schemas = serde_json::json!({ "dom": records, "combos": combos });
            println!("{}", serde_json::to_string_pretty(&schemas)?);
        }
    }

    Ok(())
}
