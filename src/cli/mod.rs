//! Command-line interface
//!
//! Every command opens an `ExplorerSession` over the training and holdout files
//! and prints one view of it.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::ExplorerConfig;
use crate::report::BarChart;
use crate::session::ExplorerSession;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    eprint!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    eprintln!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn indented(block: &str) {
    for line in block.lines() {
        println!("  {}", line);
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "bank-tree")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Explore the bank-marketing dataset and fit a PEP decision tree")]
#[command(long_about = None)]
pub struct Cli {
    /// Training ARFF file
    #[arg(long, global = true, default_value = "datasets/bank-training.arff")]
    pub train: PathBuf,

    /// Holdout ARFF file
    #[arg(long, global = true, default_value = "datasets/bank-NewCustomers.arff")]
    pub holdout: PathBuf,

    /// Boolean label column (overrides the config file)
    #[arg(long, global = true)]
    pub label: Option<String>,

    /// JSON config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the first rows of the training table
    Preview {
        /// Number of rows
        #[arg(short, long)]
        rows: Option<usize>,

        /// Show the table as loaded instead of the one-hot encoded one
        #[arg(long)]
        raw: bool,
    },

    /// Positive/negative distribution of one attribute
    Summarize {
        /// Attribute name
        #[arg(short, long)]
        attribute: String,

        /// Print the chart as JSON
        #[arg(long)]
        json: bool,
    },

    /// Train a decision tree and evaluate it on the holdout table
    Train {
        /// Maximum tree depth
        #[arg(short = 'd', long)]
        max_depth: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the encoded training table as CSV
    Export {
        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List attributes and their domains
    Attributes,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied
    pub fn explorer_config(&self) -> anyhow::Result<ExplorerConfig> {
        let mut config = match &self.config {
            Some(path) => ExplorerConfig::from_json_file(path)?,
            None => ExplorerConfig::default(),
        };
        if let Some(label) = &self.label {
            config = config.with_label_column(label.clone());
        }
        config.validate()?;
        Ok(config)
    }

    pub fn open_session(&self) -> anyhow::Result<ExplorerSession> {
        let config = self.explorer_config()?;
        open_session(&self.train, &self.holdout, config)
    }
}

fn open_session(train: &Path, holdout: &Path, config: ExplorerConfig) -> anyhow::Result<ExplorerSession> {
    step_run("Loading data");
    let start = Instant::now();
    let session = ExplorerSession::from_files(train, holdout, config)?;
    step_done(&format!(
        "{} train / {} holdout rows in {:?}",
        session.training_data().n_rows(),
        session.holdout_data().n_rows(),
        start.elapsed()
    ));
    Ok(session)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_preview(session: &mut ExplorerSession, rows: Option<usize>, raw: bool) -> anyhow::Result<()> {
    section(if raw { "Raw preview" } else { "Encoded preview" });

    let df = if raw {
        session.preview_raw(rows)?
    } else {
        session.preview(rows)?
    };
    println!("{}", df);
    println!();
    Ok(())
}

pub fn cmd_summarize(session: &mut ExplorerSession, attribute: &str, json: bool) -> anyhow::Result<()> {
    let chart: BarChart = session.distribution_chart(attribute)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&chart)?);
        return Ok(());
    }

    section("Distribution");
    indented(&chart.to_text());
    println!();
    Ok(())
}

pub fn cmd_train(session: &mut ExplorerSession, max_depth: Option<usize>, json: bool) -> anyhow::Result<()> {
    if json {
        let report = session.train(max_depth)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    step_run(&format!("Training on {}", session.config().label_column.cyan()));
    let start = Instant::now();
    let report = session.train(max_depth)?;
    step_done(&format!("{:?}", start.elapsed()));

    section("Tree");
    indented(&report.tree_text);

    section("Scores");
    println!("  {:<20} {}", muted("Max depth"), report.max_depth);
    println!("  {:<20} {}", muted("Depth"), report.depth);
    println!("  {:<20} {}", muted("Leaves"), report.leaves);
    println!("  {:<20} {}", muted("Train accuracy"), format!("{:.4}", report.training_accuracy).white().bold());
    println!("  {:<20} {}", muted("Holdout accuracy"), format!("{:.4}", report.metrics.accuracy).white().bold());
    println!("  {:<20} {:.4}", muted("Precision"), report.metrics.precision);
    println!("  {:<20} {:.4}", muted("Recall"), report.metrics.recall);
    println!("  {:<20} {:.4}", muted("F1"), report.metrics.f1_score);
    match report.metrics.auc_roc {
        Some(auc) => println!("  {:<20} {:.4}", muted("ROC AUC"), auc),
        None => println!("  {:<20} {}", muted("ROC AUC"), "undefined".yellow()),
    }

    section("Holdout");
    indented(&report.confusion.to_text());

    if !report.importances.is_empty() {
        section("Importances");
        for (name, value) in report.importances.iter().take(10) {
            println!("  {:<28} {:.4}", name, value);
        }
    }

    println!();
    Ok(())
}

pub fn cmd_export(session: &mut ExplorerSession, output: &Path) -> anyhow::Result<()> {
    step_run(&format!("Saving → {}", output.display()));
    let rows = session.export_encoded(output)?;
    step_done(&format!("{} rows", rows));
    Ok(())
}

pub fn cmd_attributes(session: &mut ExplorerSession) -> anyhow::Result<()> {
    section("Attributes");

    let data = session.training_data();
    println!("  {:<12} {}", muted("Relation"), data.relation());
    println!("  {:<12} {}", muted("Rows"), data.n_rows());
    println!("  {:<12} {}", muted("Label"), session.config().label_column);
    println!();

    println!("  {:<20} {}", muted("Attribute"), muted("Domain"));
    println!("  {}", dim(&"─".repeat(50)));
    for attr in session.attributes() {
        println!("  {:<20} {}", attr.name, attr.domain.truecolor(140, 140, 140));
    }

    println!();
    Ok(())
}

pub fn show_help() {
    section("Commands");

    let cmds: &[(&str, &str)] = &[
        ("bank-tree attributes", "List attributes and domains"),
        ("bank-tree preview --rows 5", "Show the first one-hot rows"),
        ("bank-tree preview --raw", "Show the table as loaded"),
        ("bank-tree summarize -a age", "Distribution of one attribute"),
        ("bank-tree train -d 3", "Fit and evaluate a tree"),
        ("bank-tree export -o encoded.csv", "Write the encoded table"),
    ];

    for (cmd, desc) in cmds {
        println!("  {:<36} {}", cmd.white(), muted(desc));
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_args_after_subcommand() {
        let cli = Cli::parse_from([
            "bank-tree",
            "train",
            "--max-depth",
            "3",
            "--train",
            "a.arff",
            "--label",
            "married",
        ]);
        assert_eq!(cli.train, PathBuf::from("a.arff"));
        assert_eq!(cli.holdout, PathBuf::from("datasets/bank-NewCustomers.arff"));
        assert!(matches!(cli.command, Some(Commands::Train { max_depth: Some(3), json: false })));

        let config = cli.explorer_config().unwrap();
        assert_eq!(config.label_column, "married");
    }

    #[test]
    fn test_parse_preview_defaults_to_encoded() {
        let cli = Cli::parse_from(["bank-tree", "preview"]);
        assert!(matches!(cli.command, Some(Commands::Preview { rows: None, raw: false })));

        let cli = Cli::parse_from(["bank-tree", "preview", "-r", "5", "--raw"]);
        assert!(matches!(cli.command, Some(Commands::Preview { rows: Some(5), raw: true })));
    }

    #[test]
    fn test_parse_summarize() {
        let cli = Cli::parse_from(["bank-tree", "summarize", "-a", "age", "--json"]);
        match cli.command {
            Some(Commands::Summarize { attribute, json }) => {
                assert_eq!(attribute, "age");
                assert!(json);
            }
            _ => panic!("expected summarize"),
        }
    }
}
