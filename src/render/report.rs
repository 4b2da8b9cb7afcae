//! Export report JSON generation.

use crate::domain::{BindStats, ResolveStats, WriteReport, REPORT_SCHEMA_VERSION};
use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::path::Path;

#[allow(clippy::too_many_arguments)]
pub fn write_report(
    report_path: &Path,
    library: &Path,
    output_dir: &Path,
    collections: usize,
    resolve: &ResolveStats,
    bind: &BindStats,
    write: &WriteReport,
) -> Result<()> {
    let mut report = Map::new();
    report.insert("schema_version".to_string(), Value::String(REPORT_SCHEMA_VERSION.to_string()));
    report.insert(
        "generated_at".to_string(),
        Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
    );
    report.insert("library".to_string(), Value::String(library.display().to_string()));
    report.insert("output_dir".to_string(), Value::String(output_dir.display().to_string()));
    report.insert("collections".to_string(), json!(collections));
    report.insert("attachments".to_string(), serde_json::to_value(resolve)?);
    report.insert("bind".to_string(), serde_json::to_value(bind)?);
    report.insert("write".to_string(), serde_json::to_value(write)?);

    if let Some(parent) = report_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(report_path, serde_json::to_string_pretty(&Value::Object(report))?)?;
    Ok(())
}
