//! Refine CLI
//!
//! Command-line tool for applying reversible transformation recipes to
//! tabular datasets: load a CSV, run a JSON recipe of operations through the
//! history, optionally undo the tail, and export the result.

use clap::{Parser, Subcommand};
use refine_core::{
    export_csv, import_csv, History, OperationRegistry, Project,
};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "refine-cli")]
#[command(about = "Reversible transformations for tabular data", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a loaded project
    Show {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Maximum number of rows to display
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Validate a recipe file without touching any data
    Validate {
        /// Path to recipe file (JSON array of operations)
        #[arg(short, long)]
        recipe: PathBuf,
    },

    /// Apply a recipe to a CSV file and export the result
    Apply {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Path to recipe file (JSON array of operations)
        #[arg(short, long)]
        recipe: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format (csv or json)
        #[arg(long, default_value = "csv")]
        format: String,

        /// Undo this many operations from the end before exporting
        #[arg(long, default_value_t = 0)]
        undo: usize,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> refine_core::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Show { input, limit } => cmd_show(&input, limit),
        Commands::Validate { recipe } => cmd_validate(&recipe),
        Commands::Apply {
            input,
            recipe,
            output,
            format,
            undo,
        } => cmd_apply(&input, &recipe, &output, &format, undo),
    }
}

fn load_recipe(path: &PathBuf) -> refine_core::Result<Vec<Box<dyn refine_core::Operation>>> {
    let content = fs::read_to_string(path).map_err(|e| refine_core::Error::FileRead {
        path: path.clone(),
        source: e,
    })?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    let registry = OperationRegistry::with_core_operations();
    registry.decode_recipe(&value)
}

fn cmd_show(input: &PathBuf, limit: Option<usize>) -> refine_core::Result<()> {
    let project = import_csv(input)?;
    print_project(&project, limit);
    Ok(())
}

fn cmd_validate(recipe_path: &PathBuf) -> refine_core::Result<()> {
    let operations = load_recipe(recipe_path)?;

    for operation in &operations {
        operation.validate()?;
        println!("ok: {}", operation.describe());
    }
    println!();
    println!("{} operation(s) validated", operations.len());
    Ok(())
}

fn cmd_apply(
    input: &PathBuf,
    recipe_path: &PathBuf,
    output: &PathBuf,
    format: &str,
    undo: usize,
) -> refine_core::Result<()> {
    let mut project = import_csv(input)?;
    println!(
        "Loaded {} rows x {} columns from {}",
        project.row_count(),
        project.column_count(),
        input.display()
    );

    let operations = load_recipe(recipe_path)?;
    println!("Applying {} operation(s)", operations.len());

    let mut history = History::new();
    history.replay(&mut project, operations)?;

    for entry in history.past_entries() {
        println!("  {}. {}", entry.id, entry.description);
    }

    for _ in 0..undo {
        let id = history.undo(&mut project)?;
        println!("Undid entry {}", id);
    }

    let file = File::create(output)?;
    let writer = BufWriter::new(file);

    match format.to_lowercase().as_str() {
        "csv" => export_csv(&project, writer)?,
        "json" => serde_json::to_writer_pretty(writer, &project)?,
        _ => {
            eprintln!("Unknown format: {}. Supported formats: csv, json", format);
            std::process::exit(1);
        }
    }

    println!(
        "Exported {} rows to {}",
        project.row_count(),
        output.display()
    );
    Ok(())
}

fn print_project(project: &Project, limit: Option<usize>) {
    let header: Vec<&str> = project.columns.iter().map(|c| c.name.as_str()).collect();
    println!("{}", header.join("\t"));
    println!("{}", "-".repeat(header.len() * 12));

    let row_limit = limit.unwrap_or(project.rows.len());
    for row in project.rows.iter().take(row_limit) {
        let values: Vec<String> = project
            .columns
            .iter()
            .map(|col| {
                row.cell_value(col.cell_index)
                    .map(|v| v.to_string_value())
                    .unwrap_or_default()
            })
            .collect();
        println!("{}", values.join("\t"));
    }

    if project.rows.len() > row_limit {
        println!("... ({} more rows)", project.rows.len() - row_limit);
    }
}
