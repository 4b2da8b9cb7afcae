//! Info command implementation.

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

use crate::db::{self, queries};
use crate::error::Error;
use crate::resolve;
use crate::utils::format_with_commas;

#[derive(Args)]
pub struct InfoArgs {
    /// Path to the Zotero library (or its directory). Default is the current directory.
    #[arg(value_name = "PATH")]
    pub library: Option<PathBuf>,
}

pub fn run(args: InfoArgs) -> Result<()> {
    let library = super::utils::locate_library(args.library.as_deref())?;
    if !library.exists() {
        return Err(Error::LibraryNotFound(library).into());
    }
    println!("Zotero library: {}", library.display());

    let conn = db::open_readonly(&library)?;
    let info = db::library_info(&conn)?;

    println!("{}", style("Library versions:").bold());
    for (field, value) in info.fields() {
        println!("  {:<14} {}", field, value);
    }
    match db::verify_supported(&info) {
        Ok(()) => println!("Supported: yes"),
        Err(err) => println!("Supported: no ({err})"),
    }

    let (_, collections, stats) = resolve::resolve_library(&conn, &library)?;

    println!("{}", style("Statistics:").bold());
    println!(
        "  Collections in library: {}",
        format_with_commas(queries::collection_count(&conn)?)
    );
    println!("  Collections in export tree: {}", format_with_commas(collections.len() as u64));
    println!("  PDF attachments: {}", format_with_commas(stats.attachments as u64));
    println!("  Resolved to files: {}", format_with_commas(stats.resolved as u64));
    println!("  Missing on disk: {}", format_with_commas(stats.missing as u64));
    println!("  Ambiguous storage entries: {}", format_with_commas(stats.ambiguous as u64));

    Ok(())
}
