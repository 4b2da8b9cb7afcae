//! Export command implementation.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{load_config, Config};
use crate::db;
use crate::domain::CollisionPolicy;
use crate::error::Error;
use crate::render;
use crate::resolve;
use crate::tree::CollectionForest;

#[derive(Args)]
pub struct ExportArgs {
    /// Path to the Zotero library (or its directory). Default is the current directory.
    #[arg(short = 'l', long, value_name = "PATH")]
    pub library: Option<PathBuf>,

    /// Output directory for the exported file tree
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Remove the output directory first if it exists. All directories and
    /// files in the output directory will be deleted.
    #[arg(long)]
    pub overwrite_dir: bool,

    /// Overwrite files that already exist in the output tree (default: skip them)
    #[arg(long)]
    pub overwrite_files: bool,

    /// Write a JSON export report to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Config file path (default: zotfiles.toml in the working directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn run(args: ExportArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let Config {
        library: cfg_library,
        output_dir: cfg_output_dir,
        overwrite_files: cfg_overwrite_files,
        report: cfg_report,
    } = load_config(&cwd, args.config.as_deref())?;

    let library = super::utils::locate_library(args.library.or(cfg_library).as_deref())?;
    if !library.exists() {
        return Err(Error::LibraryNotFound(library).into());
    }
    println!("Zotero library: {}", library.display());

    let conn = db::open_readonly(&library)?;
    db::check_supported(&conn)?;

    let Some(output_dir) = args.output_dir.or(cfg_output_dir) else {
        anyhow::bail!(
            "no output directory given; pass --output-dir or set output_dir in zotfiles.toml"
        );
    };
    prepare_output_dir(&output_dir, args.overwrite_dir)?;

    let (attachments, collections, resolve_stats) = resolve::resolve_library(&conn, &library)?;
    println!(
        "PDF attachments resolved to files: {} of {}",
        resolve_stats.resolved, resolve_stats.attachments
    );

    let mut forest = CollectionForest::build(collections)?;
    let bind_stats = forest.bind(&attachments);

    let overwrite_files = args.overwrite_files || cfg_overwrite_files.unwrap_or(false);
    let policy =
        if overwrite_files { CollisionPolicy::Overwrite } else { CollisionPolicy::Skip };
    let write_report = forest.write(&output_dir, policy);

    println!();
    println!("{} {}", style("Written files:").bold(), write_report.written);
    if bind_stats.duplicates > 0 {
        println!("Duplicate names skipped: {}", bind_stats.duplicates);
    }
    if write_report.skipped > 0 {
        println!("Existing files skipped: {}", write_report.skipped);
    }
    if write_report.failed > 0 {
        println!("{} {}", style("Failed copies:").red().bold(), write_report.failed);
    }

    if let Some(report_path) = args.report.or(cfg_report) {
        render::write_report(
            &report_path,
            &library,
            &output_dir,
            forest.len(),
            &resolve_stats,
            &bind_stats,
            &write_report,
        )?;
        println!("Report written to {}", report_path.display());
    }

    Ok(())
}

/// Prepare the output directory: optionally wipe an existing one, then make
/// sure it exists. The export itself only ever adds to what is here.
fn prepare_output_dir(path: &Path, overwrite_dir: bool) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidOutputDir(path.to_path_buf()).into());
    }

    if path.exists() && overwrite_dir {
        println!("The output directory already exists and will be replaced: {}", path.display());
        if let Err(err) = fs::remove_dir_all(path) {
            eprintln!("error while removing the output directory: {err}");
            return Err(Error::InvalidOutputDir(path.to_path_buf()).into());
        }
    }

    if !path.exists() {
        if let Err(err) = fs::create_dir_all(path) {
            eprintln!("error while creating the output directory: {err}");
            return Err(Error::InvalidOutputDir(path.to_path_buf()).into());
        }
    }
    Ok(())
}
