//! CircuitBuilder CLI - inspect, export and combine .circuit snapshots.

use anyhow::{bail, Context, Result};
use circuitbuilder::{
    discover_circuit_files, load_circuit, subcircuit_count, with_default_extension, Circuit,
    CircuitEditor, CircuitStats, EditorOptions, EXPORT_EXTENSION,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "circuitbuilder")]
#[command(about = "Inspect, export and combine circuit snapshot files", long_about = None)]
#[command(version)]
struct Cli {
    /// Log graph operations to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Editor options (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show entity counts and node numbering of a .circuit file
    Inspect {
        /// Path to a .circuit file, or a directory to search
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Write the plain-text branch listing
    Export {
        /// Path to a .circuit file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file (.yml is appended when no extension is given); stdout if omitted
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Import one circuit into another and save the result
    Import {
        /// Circuit to import into
        #[arg(value_name = "BASE")]
        base: PathBuf,

        /// Circuit to import
        #[arg(value_name = "OTHER")]
        other: PathBuf,

        /// Where to save the combined circuit
        #[arg(short, long, value_name = "OUT")]
        output: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_options(cli.config.as_deref()).and_then(|options| match cli.command {
        Commands::Inspect { path, format } => handle_inspect(&path, format),
        Commands::Export { file, output } => handle_export(&file, output.as_deref()),
        Commands::Import {
            base,
            other,
            output,
        } => handle_import(&base, &other, &output, options),
    });

    let exit_code = match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_options(path: Option<&Path>) -> Result<EditorOptions> {
    match path {
        Some(path) => Ok(EditorOptions::from_json_file(path)?),
        None => Ok(EditorOptions::default()),
    }
}

struct Report {
    file: PathBuf,
    stats: CircuitStats,
    subcircuits: usize,
    node_indices: Vec<usize>,
}

impl Report {
    fn new(file: &Path, circuit: &Circuit) -> Self {
        Self {
            file: file.to_path_buf(),
            stats: circuit.stats(),
            subcircuits: subcircuit_count(&circuit.topology()),
            node_indices: circuit.nodes().map(|(_, n)| n.idx()).collect(),
        }
    }
}

fn handle_inspect(path: &Path, format: OutputFormat) -> Result<()> {
    let files = if path.is_dir() {
        discover_circuit_files(path)?
    } else {
        vec![path.to_path_buf()]
    };
    if files.is_empty() {
        bail!("No .circuit files found in {}", path.display());
    }

    let mut reports = Vec::with_capacity(files.len());
    for file in &files {
        let circuit =
            load_circuit(file).with_context(|| format!("failed to load {}", file.display()))?;
        reports.push(Report::new(file, &circuit));
    }

    match format {
        OutputFormat::Human => output_human(&reports),
        OutputFormat::Json => output_json(&reports)?,
    }
    Ok(())
}

fn output_human(reports: &[Report]) {
    for report in reports {
        println!("\nFile: {}", report.file.display());
        println!("{}", "─".repeat(60));

        if report.stats.element_count == 0 && report.stats.ground_count == 0 {
            println!("  Empty circuit");
            continue;
        }
        println!("  Elements:     {}", report.stats.element_count);
        println!("  Nodes:        {}", report.stats.node_count);
        println!("  Grounds:      {}", report.stats.ground_count);
        println!("  Connections:  {}", report.stats.connection_count);
        println!("  Anchors:      {}", report.stats.anchor_count);
        println!("  Sub-circuits: {}", report.subcircuits);

        let indices: Vec<String> = report.node_indices.iter().map(|i| i.to_string()).collect();
        println!("  Node indices: {}", indices.join(", "));
    }
}

fn output_json(reports: &[Report]) -> Result<()> {
    let output = serde_json::json!({
        "results": reports.iter().map(|r| {
            serde_json::json!({
                "file": r.file.display().to_string(),
                "stats": r.stats,
                "subcircuits": r.subcircuits,
                "node_indices": r.node_indices,
            })
        }).collect::<Vec<_>>(),
        "summary": {
            "total_files": reports.len(),
            "total_elements": reports.iter().map(|r| r.stats.element_count).sum::<usize>(),
        }
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn handle_export(file: &Path, output: Option<&Path>) -> Result<()> {
    let circuit = load_circuit(file).with_context(|| format!("failed to load {}", file.display()))?;
    let text = circuit.export_text();

    match output {
        Some(output) => {
            let path = with_default_extension(output, EXPORT_EXTENSION);
            std::fs::write(&path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn handle_import(base: &Path, other: &Path, output: &Path, options: EditorOptions) -> Result<()> {
    let mut editor = CircuitEditor::with_options(options);
    editor
        .open(base)
        .with_context(|| format!("failed to open {}", base.display()))?;
    let imported = editor
        .import(other)
        .with_context(|| format!("failed to import {}", other.display()))?;

    let written = editor.save(output)?;
    println!(
        "Imported {} entities from {} into {}",
        imported.len(),
        other.display(),
        written.display()
    );
    Ok(())
}
