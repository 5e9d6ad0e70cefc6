use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use doc_patcher::config::{
    apply_to_file, load_from_path, ApplicationError, ApplyMode, ApplyReport, ApplyStatus,
};
use doc_patcher::document::Node;
use doc_patcher::file::Format;
use doc_patcher::patch::{Changeset, PatchError};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};
use tracing::Level;
use walkdir::WalkDir;

/// Directory searched for changeset definitions when none are given.
const DEFAULT_CHANGESET_DIR: &str = "changesets";

#[derive(Parser)]
#[command(name = "doc-patcher")]
#[command(about = "Apply path-addressed edits to YAML and JSON documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply changeset definition files
    Apply {
        /// Definition files or directories of *.toml definitions (default: ./changesets)
        paths: Vec<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Back up each file before modifying it
        #[arg(short, long)]
        backup: bool,

        /// Print one JSON object per definition instead of text
        #[arg(long)]
        json: bool,
    },

    /// Check whether changeset definitions are already applied (exit 1 on drift)
    Check {
        /// Definition files or directories of *.toml definitions (default: ./changesets)
        paths: Vec<PathBuf>,

        /// Show unified diff of pending changes
        #[arg(short, long)]
        diff: bool,

        /// Print one JSON object per definition instead of text
        #[arg(long)]
        json: bool,
    },

    /// Set values in a single document
    Set {
        /// Document to edit (created if missing)
        file: PathBuf,

        /// Edits such as `serve.port=8080` or `args[0]=--verbose`
        #[arg(value_name = "PATH=VALUE", required = true)]
        assignments: Vec<String>,

        /// Treat every value as a string instead of parsing it as YAML
        #[arg(short, long)]
        string: bool,

        /// Document format (default: from the file extension)
        #[arg(short, long)]
        format: Option<Format>,

        /// Dry run - show what would be changed without modifying the file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Back up the file before modifying it
        #[arg(short, long)]
        backup: bool,

        /// Print the result as a JSON object instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Machine-readable result line, shaped like the `changed`/`msg` pair that
/// configuration-management tools expect.
#[derive(Serialize)]
struct JsonReport<'a> {
    name: &'a str,
    file: Option<String>,
    changed: bool,
    failed: bool,
    status: Option<ApplyStatus>,
    backup: Option<String>,
    msg: String,
}

#[derive(Default)]
struct Summary {
    updated: usize,
    unchanged: usize,
    failed: usize,
}

#[derive(Clone, Copy)]
struct Output {
    diff: bool,
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Apply {
            paths,
            dry_run,
            diff,
            backup,
            json,
        } => cmd_apply(paths, ApplyMode { dry_run, backup }, Output { diff, json }),

        Commands::Check { paths, diff, json } => cmd_check(paths, Output { diff, json }),

        Commands::Set {
            file,
            assignments,
            string,
            format,
            dry_run,
            diff,
            backup,
            json,
        } => cmd_set(
            file,
            assignments,
            string,
            format,
            ApplyMode { dry_run, backup },
            Output { diff, json },
        ),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Helper: Expand the command-line paths into definition files.
///
/// Directories contribute their `*.toml` files (not recursively, sorted);
/// files are taken as given. With no paths, `./changesets` is searched.
fn discover_definition_files(paths: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    let paths = if paths.is_empty() {
        vec![PathBuf::from(DEFAULT_CHANGESET_DIR)]
    } else {
        paths
    };

    let mut files = Vec::new();
    for path in &paths {
        if !path.exists() {
            anyhow::bail!("Changeset path not found: {}", path.display());
        }
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(path).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
            {
                found.push(entry.path().to_path_buf());
            }
        }
        found.sort();
        files.extend(found);
    }

    if files.is_empty() {
        let searched: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        anyhow::bail!(
            "No .toml changeset definitions found in {}",
            searched.join(", ")
        );
    }

    Ok(files)
}

/// Helper: Split `PATH=VALUE` on the first `=` outside brackets, so keys such
/// as `a["x=y"]` survive.
fn split_assignment(assignment: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (idx, ch) in assignment.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '=' if depth == 0 => return Some((&assignment[..idx], &assignment[idx + 1..])),
            _ => {}
        }
    }
    None
}

/// Helper: Turn a command-line value into a node. Values are read as YAML
/// (`8080` is a number, `[a, b]` a sequence) unless `as_string` is set or
/// the text is not valid YAML.
fn parse_value(raw: &str, as_string: bool) -> Node {
    if as_string || raw.is_empty() {
        return Node::from(raw);
    }
    match serde_yaml::from_str::<Node>(raw) {
        Ok(node) => node,
        Err(err) => {
            tracing::debug!(value = raw, error = %err, "value is not YAML, using it as a string");
            Node::from(raw)
        }
    }
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn report_success(name: &str, report: &ApplyReport, output: Output, summary: &mut Summary) {
    if report.changed() {
        summary.updated += 1;
    } else {
        summary.unchanged += 1;
    }

    if output.json {
        print_json(&JsonReport {
            name,
            file: Some(report.file.display().to_string()),
            changed: report.changed(),
            failed: false,
            status: Some(report.status),
            backup: report.backup.as_ref().map(|p| p.display().to_string()),
            msg: report.message(),
        });
        return;
    }

    match report.status {
        ApplyStatus::Updated => {
            println!(
                "{} {}: Updated {} ({} edits)",
                "✓".green(),
                name,
                report.file.display(),
                report.edits
            );
            if let Some(backup) = &report.backup {
                println!("  Backup: {}", backup.display());
            }
        }
        ApplyStatus::WouldUpdate => {
            println!(
                "{} {}: Would update {} ({} edits)",
                "✓".green(),
                name,
                report.file.display(),
                report.edits
            );
        }
        ApplyStatus::Unchanged => {
            println!(
                "{} {}: Already applied to {}",
                "⊙".yellow(),
                name,
                report.file.display()
            );
        }
    }

    if output.diff && report.changed() {
        display_diff(&report.file, &report.before, &report.after);
    }
}

fn report_failure(name: &str, error: &dyn std::fmt::Display, output: Output, summary: &mut Summary) {
    summary.failed += 1;

    if output.json {
        print_json(&JsonReport {
            name,
            file: None,
            changed: false,
            failed: true,
            status: None,
            backup: None,
            msg: error.to_string(),
        });
        return;
    }

    eprintln!("{} {}: Error - {}", "✗".red(), name, error);
}

fn report_application_failure(
    name: &str,
    error: &ApplicationError,
    output: Output,
    summary: &mut Summary,
) {
    report_failure(name, error, output, summary);
    if output.json {
        return;
    }

    // Provide helpful conflict diagnostics
    match error {
        ApplicationError::Patch {
            file,
            source:
                PatchError::TypeConflict {
                    segment,
                    expected,
                    found,
                    ..
                },
        } => {
            eprintln!(
                "  {}",
                format!("CONFLICT: segment {segment} needs a {expected} but the document has a {found}")
                    .red()
            );
            eprintln!("  File: {}", file.display());
            eprintln!("  Only empty maps and sequences are converted automatically.");
            eprintln!("  Action: fix the path expression or the document; nothing was written");
        }
        ApplicationError::File(file_error) => {
            eprintln!("  File error: {}", file_error);
        }
        _ => {}
    }
}

fn print_json(report: &JsonReport<'_>) {
    match serde_json::to_string(report) {
        Ok(line) => println!("{line}"),
        Err(err) => eprintln!("{} failed to encode report: {}", "✗".red(), err),
    }
}

fn print_summary(summary: &Summary, dry_run: bool) {
    println!();
    println!("{}", "Summary:".bold());
    let updated_label = if dry_run { "would update" } else { "updated" };
    println!(
        "  {} {}",
        format!("{}", summary.updated).green(),
        updated_label
    );
    println!(
        "  {} already applied",
        format!("{}", summary.unchanged).yellow()
    );
    println!("  {} failed", format!("{}", summary.failed).red());
}

fn run_definitions(paths: Vec<PathBuf>, mode: ApplyMode, output: Output) -> Result<Summary> {
    let files = discover_definition_files(paths)?;
    let mut summary = Summary::default();

    if mode.dry_run && !output.json {
        println!("{}", "[DRY RUN - no files will be modified]".cyan());
    }

    for definition_file in files {
        let label = definition_file.display().to_string();
        let loaded = match load_from_path(&definition_file) {
            Ok(loaded) => loaded,
            Err(err) => {
                report_failure(&label, &err, output, &mut summary);
                continue;
            }
        };

        match loaded.apply(mode) {
            Ok(report) => report_success(loaded.name(), &report, output, &mut summary),
            Err(err) => report_application_failure(loaded.name(), &err, output, &mut summary),
        }
    }

    if !output.json {
        print_summary(&summary, mode.dry_run);
    }

    Ok(summary)
}

fn cmd_apply(paths: Vec<PathBuf>, mode: ApplyMode, output: Output) -> Result<()> {
    let summary = run_definitions(paths, mode, output)?;

    if summary.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_check(paths: Vec<PathBuf>, output: Output) -> Result<()> {
    let mode = ApplyMode {
        dry_run: true,
        backup: false,
    };
    let summary = run_definitions(paths, mode, output)?;

    if summary.failed > 0 || summary.updated > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_set(
    file: PathBuf,
    assignments: Vec<String>,
    as_string: bool,
    format: Option<Format>,
    mode: ApplyMode,
    output: Output,
) -> Result<()> {
    let mut changeset = Changeset::new();
    for assignment in &assignments {
        let Some((path, raw_value)) = split_assignment(assignment) else {
            anyhow::bail!("expected PATH=VALUE, got '{assignment}'");
        };
        changeset.set(path, parse_value(raw_value, as_string))?;
    }

    let format = format.unwrap_or_else(|| Format::from_path(&file));
    let name = file.display().to_string();
    let mut summary = Summary::default();

    match apply_to_file(&file, format, &changeset, mode) {
        Ok(report) => report_success(&name, &report, output, &mut summary),
        Err(err) => report_application_failure(&name, &err, output, &mut summary),
    }

    if summary.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
