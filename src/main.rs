use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use jar_rewriter::config::{
    load_from_path, ArchiveSection, PatchSection, RemapSection, RunConfig, DEFAULT_STRIP,
};
use jar_rewriter::patch::{HunkStatus, PatchStatus};
use jar_rewriter::task::{run, PatchRunReport, RunOptions, RunOutcome, SourceChange, TaskError};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "jar-rewriter")]
#[command(about = "Patch and remap decompiled Java source archives", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply unified diff patches to the sources in an archive
    Patch {
        #[command(flatten)]
        archive: ArchiveArgs,

        /// Directory of *.patch files, or a zip/jar of them
        #[arg(short, long)]
        patches: PathBuf,

        /// Leading path segments to strip from patch targets
        #[arg(short, long, default_value_t = DEFAULT_STRIP)]
        strip: usize,

        /// Maximum line offset tried when a hunk's context has moved
        #[arg(long, default_value_t = 0)]
        max_fuzz: usize,

        /// Do not write .rej files for failed hunks
        #[arg(long)]
        no_rejects: bool,

        /// Abort without writing the output archive if any hunk fails
        #[arg(long)]
        fail_on_error: bool,

        /// Compare lines exactly instead of ignoring access modifiers
        #[arg(long)]
        exact_access: bool,

        /// Ignore differences in runs of whitespace
        #[arg(long)]
        ignore_whitespace: bool,

        /// Extra files, directories or archives merged in before patching
        #[arg(long = "inject")]
        injects: Vec<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Rename generated ids in an archive's sources from mapping CSVs
    Remap {
        #[command(flatten)]
        archive: ArchiveArgs,

        /// methods.csv
        #[arg(long)]
        methods: PathBuf,

        /// fields.csv
        #[arg(long)]
        fields: PathBuf,

        /// params.csv
        #[arg(long)]
        params: PathBuf,

        /// Do not add documentation comments
        #[arg(long)]
        no_javadocs: bool,
    },

    /// Run the stages described by a TOML run config
    Run {
        /// Path to the run config
        #[arg(short, long)]
        config: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct ArchiveArgs {
    /// Input archive
    #[arg(short, long)]
    input: PathBuf,

    /// Output archive
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args, Default)]
struct OutputArgs {
    /// Show unified diff of each source the patch stage changed
    #[arg(short, long)]
    diff: bool,

    /// Write the run report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Patch {
            archive,
            patches,
            strip,
            max_fuzz,
            no_rejects,
            fail_on_error,
            exact_access,
            ignore_whitespace,
            injects,
            output,
        } => {
            let config = RunConfig {
                archive: archive.into(),
                remap: None,
                patch: Some(PatchSection {
                    strip,
                    max_fuzz,
                    make_rejects: !no_rejects,
                    fail_on_error,
                    access_c14n: !exact_access,
                    whitespace_c14n: ignore_whitespace,
                    injects,
                    ..PatchSection::new(patches)
                }),
            };
            cmd_run(&config, &output)
        }

        Commands::Remap {
            archive,
            methods,
            fields,
            params,
            no_javadocs,
        } => {
            let config = RunConfig {
                archive: archive.into(),
                remap: Some(RemapSection {
                    methods,
                    fields,
                    params,
                    javadocs: !no_javadocs,
                }),
                patch: None,
            };
            cmd_run(&config, &OutputArgs::default())
        }

        Commands::Run { config, output } => {
            let config = load_from_path(&config)?;
            cmd_run(&config, &output)
        }
    }
}

impl From<ArchiveArgs> for ArchiveSection {
    fn from(args: ArchiveArgs) -> Self {
        ArchiveSection {
            input: args.input,
            output: args.output,
        }
    }
}

fn cmd_run(config: &RunConfig, output: &OutputArgs) -> Result<()> {
    config.validate()?;

    println!("Input: {}", config.archive.input.display());
    println!("Output: {}", config.archive.output.display());
    println!();

    let options = RunOptions {
        capture_changes: output.diff,
    };

    let outcome = match run(config, options) {
        Ok(outcome) => outcome,
        Err(TaskError::HunksFailed { report, .. }) => {
            print_patch_report(&report);
            println!();
            eprintln!(
                "{}",
                "Aborted: hunks failed and fail_on_error is set; no archive written".red()
            );
            if let Some(path) = &output.report {
                write_report(
                    path,
                    &RunOutcome {
                        patch: Some(*report),
                        ..RunOutcome::default()
                    },
                )?;
            }
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if output.diff {
        for change in &outcome.changes {
            display_diff(change);
        }
        if !outcome.changes.is_empty() {
            println!();
        }
    }

    if let Some(report) = &outcome.patch {
        print_patch_report(report);
        println!();
    }

    println!("{}", "Summary:".bold());
    println!("  {} sources", format!("{}", outcome.summary.sources).green());
    println!(
        "  {} resources",
        format!("{}", outcome.summary.resources).green()
    );
    if !outcome.summary.duplicates.is_empty() {
        println!(
            "  {} duplicate entries dropped",
            format!("{}", outcome.summary.duplicates.len()).yellow()
        );
    }
    if let Some(report) = &outcome.patch {
        println!("  {} hunks applied", format!("{}", report.hunks.success).green());
        println!("  {} hunks fuzzed", format!("{}", report.hunks.fuzzed).yellow());
        println!("  {} hunks failed", format!("{}", report.hunks.failed).red());
    }

    if let Some(path) = &output.report {
        write_report(path, &outcome)?;
    }

    if outcome.patch.as_ref().is_some_and(PatchRunReport::has_failures) {
        std::process::exit(1);
    }

    Ok(())
}

fn print_patch_report(report: &PatchRunReport) {
    for document in &report.documents {
        for patch in &document.patches {
            match patch.status {
                PatchStatus::Success => println!("{} {}", "✓".green(), patch.target),
                PatchStatus::Fuzzed => println!(
                    "{} {}: applied with fuzz {}",
                    "⊙".yellow(),
                    patch.target,
                    patch.max_fuzz()
                ),
                PatchStatus::Failed => {
                    eprintln!("{} {}: Failed", "✗".red(), patch.target);
                    eprintln!("  Patch: {}", document.origin);
                }
            }
            for hunk in &patch.hunks {
                if hunk.status == HunkStatus::Failed {
                    if let Some(failure) = &hunk.failure {
                        eprintln!("  Hunk {}: {}", hunk.id, failure);
                    }
                }
            }
        }
        if let Some(rej) = &document.reject_file {
            eprintln!("  Rejects: {}", rej.display().to_string().dimmed());
        }
    }
}

fn write_report(path: &Path, outcome: &RunOutcome) -> Result<()> {
    let json = serde_json::to_string_pretty(outcome).context("failed to serialize run report")?;
    fs::write(path, json).with_context(|| format!("failed to write report to {}", path.display()))?;
    println!("Report written to {}", path.display());
    Ok(())
}

/// Helper: Show unified diff between a source before and after patching
fn display_diff(change: &SourceChange) {
    let original = change.before.as_deref().unwrap_or_default();
    let modified = change.after.as_deref().unwrap_or_default();

    println!(
        "\n{}",
        format!("--- {} (original)", change.path).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", change.path).dimmed());

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
