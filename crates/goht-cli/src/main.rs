use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use goht_codegen::CompileError;
use rayon::prelude::*;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "goht")]
#[command(about = "GoHT: Haml, Slim and Ego templates compiled to Go")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate NAME.goht.go for every .goht file under a directory
    Generate {
        /// Directory to search for .goht files
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Regenerate files whose output is already up to date
        #[arg(long)]
        force: bool,

        /// Number of files compiled in parallel (defaults to the CPU count)
        #[arg(long)]
        jobs: Option<usize>,
    },

    /// Check a .goht file for errors without writing output
    Check {
        /// Input .goht file
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Generated,
    UpToDate,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("GOHT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let ok = match cli.command {
        Command::Generate { path, force, jobs } => cmd_generate(&path, force, jobs),
        Command::Check { file } => cmd_check(&file),
    };
    match ok {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn cmd_generate(root: &Path, force: bool, jobs: Option<usize>) -> anyhow::Result<bool> {
    let files = find_templates(root);
    tracing::debug!(root = %root.display(), files = files.len(), "found templates");

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = jobs {
        builder = builder.num_threads(jobs);
    }
    let pool = builder.build().context("failed to start worker pool")?;

    let results: Vec<(&PathBuf, anyhow::Result<Outcome>)> = pool.install(|| {
        files
            .par_iter()
            .map(|file| (file, generate_file(file, force)))
            .collect()
    });

    let mut generated = 0;
    let mut failed = 0;
    for (file, result) in results {
        match result {
            Ok(Outcome::Generated) => {
                generated += 1;
                tracing::info!("generated {}", output_path(file).display());
            }
            Ok(Outcome::UpToDate) => tracing::debug!("up to date: {}", file.display()),
            Err(e) => {
                failed += 1;
                eprintln!("{}", format_failure(file, &e));
            }
        }
    }

    tracing::info!(
        generated,
        failed,
        skipped = files.len() - generated - failed,
        "generate finished"
    );
    Ok(failed == 0)
}

fn cmd_check(file: &Path) -> anyhow::Result<bool> {
    let result = goht_codegen::parse_file(file)
        .map_err(anyhow::Error::from)
        .and_then(|template| Ok(template.generate(&mut io::sink())?));
    match result {
        Ok(()) => {
            println!("OK: {}", file.display());
            Ok(true)
        }
        Err(e) => {
            eprintln!("{}", format_failure(file, &e));
            Ok(false)
        }
    }
}

/// All `.goht` files under `root`, sorted.
fn find_templates(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "goht"))
        .collect();
    files.sort();
    files
}

/// `views/page.goht` → `views/page.goht.go`
fn output_path(source: &Path) -> PathBuf {
    source.with_extension("goht.go")
}

fn is_up_to_date(source: &Path, output: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(source), modified(output)) {
        (Some(source), Some(output)) => output >= source,
        _ => false,
    }
}

fn generate_file(source: &Path, force: bool) -> anyhow::Result<Outcome> {
    let output = output_path(source);
    if !force && is_up_to_date(source, &output) {
        return Ok(Outcome::UpToDate);
    }

    let template = goht_codegen::parse_file(source)?;
    let mut code = Vec::new();
    template.generate(&mut code)?;
    fs::write(&output, code).with_context(|| format!("failed to write {}", output.display()))?;
    Ok(Outcome::Generated)
}

/// Template errors read `path:[line:col]: message`; anything else
/// `path: message`.
fn format_failure(file: &Path, err: &anyhow::Error) -> String {
    let positioned = matches!(err.downcast_ref::<CompileError>(), Some(CompileError::Parse(_)))
        || matches!(
            err.downcast_ref::<goht_codegen::CodegenError>(),
            Some(goht_codegen::CodegenError::UnknownDoctype { .. })
        );
    if positioned {
        format!("{}:{err}", file.display())
    } else {
        format!("{}: {err:#}", file.display())
    }
}
