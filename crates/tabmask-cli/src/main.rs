//! tabmask CLI
//!
//! Command-line tool for merging two CSV tables on a shared key and
//! de-identifying selected columns before export.

mod logging;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tabmask_core::{
    derive_export_paths, load_table, merge_on_default_key, merge_tables, scan_tables,
    write_table, AnonymizationSession, ColumnAssignment, KeySelection, SettingsFile, Table,
    TransformKind, TransformRegistry, CATALOG,
};
use tracing::warn;

#[derive(Parser)]
#[command(name = "tabmask")]
#[command(about = "Merge CSV tables and mask sensitive columns", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a CSV file and preview its columns and first rows
    Columns {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Number of rows to preview
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Show which columns two CSV files share
    Keys {
        /// First CSV file
        #[arg(short, long)]
        left: PathBuf,

        /// Second CSV file
        #[arg(short, long)]
        right: PathBuf,
    },

    /// Outer-join two CSV files on a shared key column
    Merge {
        /// First CSV file (its columns come first)
        #[arg(short, long)]
        left: PathBuf,

        /// Second CSV file
        #[arg(short, long)]
        right: PathBuf,

        /// Key column (defaults to the first shared column)
        #[arg(short, long)]
        key: Option<String>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the available transforms
    Methods,

    /// De-identify columns of a CSV file
    Anonymize {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Output file for the de-identified table
        #[arg(short, long)]
        output: PathBuf,

        /// Column assignment as column=Transform (repeatable)
        #[arg(short, long = "set", value_name = "COLUMN=TRANSFORM")]
        set: Vec<String>,

        /// Settings file with saved assignments
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Also write the original values of the assigned columns here
        #[arg(long)]
        originals: Option<PathBuf>,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Create a settings file from column assignments
    CreateSettings {
        /// Output path for the settings file
        #[arg(short, long)]
        output: PathBuf,

        /// Column assignment as column=Transform (repeatable)
        #[arg(short, long = "set", value_name = "COLUMN=TRANSFORM")]
        set: Vec<String>,
    },

    /// Apply a settings file to every CSV file under the given roots
    Batch {
        /// Settings file with saved assignments
        #[arg(long)]
        settings: PathBuf,

        /// Root directories to scan
        #[arg(short, long, required = true)]
        root: Vec<PathBuf>,

        /// Output directory for exports
        #[arg(long)]
        output_dir: PathBuf,

        #[command(flatten)]
        registry: RegistryArgs,
    },
}

#[derive(clap::Args)]
struct RegistryArgs {
    /// Secret prepended to values before hashing
    #[arg(long, env = "TABMASK_SALT", hide_env_values = true)]
    salt: Option<String>,

    /// Reference date for age bands (YYYY-MM-DD, default: today)
    #[arg(long)]
    today: Option<NaiveDate>,
}

impl RegistryArgs {
    fn build(&self) -> TransformRegistry {
        let mut registry = TransformRegistry::new();
        if let Some(salt) = &self.salt {
            registry = registry.with_salt(salt.clone());
        }
        if let Some(today) = self.today {
            registry = registry.with_today(today);
        }
        registry
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> tabmask_core::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match cli.command {
        Commands::Columns { file, limit } => cmd_columns(&file, limit),
        Commands::Keys { left, right } => cmd_keys(&left, &right),
        Commands::Merge {
            left,
            right,
            key,
            output,
        } => cmd_merge(&left, &right, key.as_deref(), &output),
        Commands::Methods => cmd_methods(),
        Commands::Anonymize {
            file,
            output,
            set,
            settings,
            originals,
            registry,
        } => cmd_anonymize(
            &file,
            &output,
            &set,
            settings.as_deref(),
            originals.as_deref(),
            registry.build(),
        ),
        Commands::CreateSettings { output, set } => cmd_create_settings(&output, &set),
        Commands::Batch {
            settings,
            root,
            output_dir,
            registry,
        } => cmd_batch(&settings, &root, &output_dir, registry.build()),
    }
}

fn cmd_columns(file: &Path, limit: usize) -> tabmask_core::Result<()> {
    let table = load_table(file)?;

    println!("File: {}", file.display());
    println!("Columns: {}", table.column_count());
    println!("Rows: {}", table.row_count());
    println!();

    print_table(&table, limit);
    Ok(())
}

fn cmd_keys(left: &Path, right: &Path) -> tabmask_core::Result<()> {
    let left_table = load_table(left)?;
    let right_table = load_table(right)?;
    let selection = KeySelection::analyze(&left_table, &right_table);

    for (path, table, flags) in [
        (left, &left_table, &selection.left_highlight),
        (right, &right_table, &selection.right_highlight),
    ] {
        println!("{}:", path.display());
        for (column, shared) in table.columns.iter().zip(flags) {
            let marker = if *shared { "*" } else { " " };
            println!("  {} {}", marker, column.name);
        }
        println!();
    }

    if selection.is_empty() {
        println!("No shared columns; these files cannot be merged.");
    } else {
        println!("Candidate keys: {}", selection.keys.join(", "));
    }

    Ok(())
}

fn cmd_merge(left: &Path, right: &Path, key: Option<&str>, output: &Path) -> tabmask_core::Result<()> {
    let left_table = load_table(left)?;
    let right_table = load_table(right)?;

    let merged = match key {
        Some(key) => merge_tables(&left_table, &right_table, key)?,
        None => merge_on_default_key(&left_table, &right_table)?,
    };

    write_table(&merged, output)?;
    println!(
        "Merged {} + {} rows into {} rows: {}",
        left_table.row_count(),
        right_table.row_count(),
        merged.row_count(),
        output.display()
    );

    Ok(())
}

fn cmd_methods() -> tabmask_core::Result<()> {
    let width = CATALOG.iter().map(|e| e.name.len()).max().unwrap_or(0);
    for entry in CATALOG {
        println!("{:width$}  {}", entry.name, entry.description, width = width);
    }
    println!();
    println!("TruncateMask(n) and RoundUp(n) accept any non-negative / positive integer n.");
    Ok(())
}

fn cmd_anonymize(
    file: &Path,
    output: &Path,
    pairs: &[String],
    settings: Option<&Path>,
    originals: Option<&Path>,
    registry: TransformRegistry,
) -> tabmask_core::Result<()> {
    let assignments = collect_assignments(settings, pairs)?;

    let mut session = AnonymizationSession::new(registry);
    session.load(load_table(file)?);
    session.import_assignments(&assignments)?;

    warn_if_unsalted(session.registry(), session.assignments());
    print_assignments(&session);

    if let Some(originals) = originals {
        let slice = session.extract_assigned_columns()?;
        write_table(&slice, originals)?;
        println!("Original columns saved to {}", originals.display());
    }

    let anonymized = session.anonymize()?;
    write_table(&anonymized, output)?;
    println!(
        "Anonymized {} rows saved to {}",
        anonymized.row_count(),
        output.display()
    );

    Ok(())
}

fn cmd_create_settings(output: &Path, pairs: &[String]) -> tabmask_core::Result<()> {
    let mut assignments = collect_assignments(None, pairs)?;

    // Placeholder so the template shows the format
    if assignments.is_empty() {
        assignments.set("ColumnName", TransformKind::NameMask);
    }

    let settings = SettingsFile::new(assignments);
    settings.save(output)?;
    println!("Created settings file: {}", output.display());
    println!("Assignments: {}", settings.assignments.len());
    println!();
    println!("Edit the file to add your columns, then run:");
    println!(
        "  tabmask anonymize --file <csv> --output <csv> --settings {}",
        output.display()
    );

    Ok(())
}

fn cmd_batch(
    settings_path: &Path,
    roots: &[PathBuf],
    output_dir: &Path,
    registry: TransformRegistry,
) -> tabmask_core::Result<()> {
    let settings = SettingsFile::load(settings_path)?;
    let scan = scan_tables(roots)?;

    println!(
        "Running batch over {} tables ({} earlier exports skipped)",
        scan.total_tables(),
        scan.skipped_exports
    );

    warn_if_unsalted(&registry, &settings.assignments);

    let mut session = AnonymizationSession::new(registry);
    let mut written = 0;
    let (targets, mut errors) = plan_targets(&scan.tables, roots, output_dir);

    for (path, target) in &targets {
        match anonymize_one(&mut session, path, target, &settings.assignments) {
            Ok(files) => {
                written += files;
                println!("  {}", path.display());
            }
            Err(e) => errors.push((path.clone(), describe_failure(&e))),
        }
    }

    println!();
    println!("Batch complete:");
    println!("  {} tables processed", scan.total_tables() - errors.len());
    println!("  {} files written to {}", written, output_dir.display());

    if !errors.is_empty() {
        println!("\nErrors ({}):", errors.len());
        for (path, err) in &errors {
            println!("  {}: {}", path.display(), err);
        }
    }

    Ok(())
}

/// Anonymize one table of a batch, returning the number of files written
fn anonymize_one(
    session: &mut AnonymizationSession,
    path: &Path,
    target: &Path,
    assignments: &ColumnAssignment,
) -> tabmask_core::Result<usize> {
    session.load(load_table(path)?);
    session.import_assignments(assignments)?;

    let (anonymized_path, originals_path) = derive_export_paths(target);
    let mut files = 0;

    let slice = session.extract_assigned_columns()?;
    if slice.column_count() == 0 {
        warn!(path = %path.display(), "no assigned column present, skipping original columns export");
    } else {
        write_table(&slice, &originals_path)?;
        files += 1;
    }

    write_table(&session.anonymize()?, &anonymized_path)?;
    files += 1;

    Ok(files)
}

/// Export target for every table; a table whose target was already taken
/// is reported as an error instead of overwriting the earlier export
fn plan_targets(
    tables: &[PathBuf],
    roots: &[PathBuf],
    output_dir: &Path,
) -> (Vec<(PathBuf, PathBuf)>, Vec<(PathBuf, String)>) {
    let mut owners: HashMap<PathBuf, &Path> = HashMap::new();
    let mut targets = Vec::new();
    let mut errors = Vec::new();

    for path in tables {
        let target = output_dir.join(relative_to_roots(path, roots));
        match owners.get(&target) {
            Some(owner) => errors.push((
                path.clone(),
                format!(
                    "output {} already written for {}",
                    target.display(),
                    owner.display()
                ),
            )),
            None => {
                owners.insert(target.clone(), path);
                targets.push((path.clone(), target));
            }
        }
    }

    (targets, errors)
}

fn describe_failure(err: &tabmask_core::Error) -> String {
    if err.is_load_error() {
        format!("read failed: {}", err)
    } else if err.is_write_error() {
        format!("export failed: {}", err)
    } else {
        err.to_string()
    }
}

/// Path of `path` below whichever root contains it
fn relative_to_roots(path: &Path, roots: &[PathBuf]) -> PathBuf {
    roots
        .iter()
        .find_map(|root| path.strip_prefix(root).ok())
        .map(Path::to_path_buf)
        .or_else(|| path.file_name().map(PathBuf::from))
        .unwrap_or_else(|| path.to_path_buf())
}

/// Settings file entries first, then command-line pairs on top
fn collect_assignments(
    settings: Option<&Path>,
    pairs: &[String],
) -> tabmask_core::Result<ColumnAssignment> {
    let mut assignments = match settings {
        Some(path) => SettingsFile::load(path)?.assignments,
        None => ColumnAssignment::new(),
    };

    for pair in pairs {
        let (column, kind) = ColumnAssignment::parse_pair(pair)?;
        assignments.set(column, kind);
    }

    Ok(assignments)
}

fn warn_if_unsalted(registry: &TransformRegistry, assignments: &ColumnAssignment) {
    let hashes = assignments
        .iter()
        .any(|(_, kind)| kind == TransformKind::HashSha256);
    if hashes && !registry.is_salted() {
        warn!("hashing without a salt, set --salt or TABMASK_SALT");
    }
}

fn print_assignments(session: &AnonymizationSession) {
    println!("Anonymization settings:");
    for (column, kind) in session.assignments().iter() {
        let note = if session.table().and_then(|t| t.find_column(column)).is_some() {
            ""
        } else {
            " (column not in table, ignored)"
        };
        println!("  {}: {}{}", column, kind, note);
    }
    if session
        .assignments()
        .iter()
        .any(|(_, kind)| kind == TransformKind::AgeBand)
    {
        println!("Age bands as of {}", session.registry().today());
    }
    println!();
}

fn print_table(table: &Table, limit: usize) {
    let header = table.column_names();
    println!("{}", header.join("\t"));
    println!("{}", "-".repeat(header.len() * 12));

    for row in table.rows.iter().take(limit) {
        let values: Vec<String> = row.cells.iter().map(|c| c.to_text()).collect();
        println!("{}", values.join("\t"));
    }

    if table.row_count() > limit {
        println!("... ({} more rows)", table.row_count() - limit);
    }
}
