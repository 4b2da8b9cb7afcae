//! Read-only access to the Zotero library database.

use crate::error::Error;
use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

pub mod queries;

/// Standard file name of the Zotero database.
pub const LIBRARY_DB_NAME: &str = "zotero.sqlite";

/// The library's `version` table, pivoted into a struct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LibraryInfo {
    pub userdata: u32,
    pub triggers: u32,
    pub translators: u32,
    pub system: u32,
    pub styles: u32,
    pub repository: u32,
    pub global_schema: u32,
    /// Named `delete` in the library schema.
    pub deletes: u32,
    pub compatibility: u32,
}

impl LibraryInfo {
    /// Field name/value pairs in library schema naming, for display.
    pub fn fields(&self) -> [(&'static str, u32); 9] {
        [
            ("userdata", self.userdata),
            ("triggers", self.triggers),
            ("translators", self.translators),
            ("system", self.system),
            ("styles", self.styles),
            ("repository", self.repository),
            ("globalSchema", self.global_schema),
            ("delete", self.deletes),
            ("compatibility", self.compatibility),
        ]
    }
}

/// Open the library database read-only; the library is never mutated.
pub fn open_readonly(path: &Path) -> Result<Connection> {
    if !path.exists() {
        return Err(Error::LibraryNotFound(path.to_path_buf()).into());
    }
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Connection::open_with_flags(path, flags)
        .with_context(|| format!("Failed opening Zotero library: {}", path.display()))
}

pub fn library_info(conn: &Connection) -> Result<LibraryInfo> {
    let mut stmt = conn
        .prepare("SELECT schema, version FROM version")
        .context("the library has no version table")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut info = LibraryInfo::default();
    for row in rows {
        let (schema, value) = row?;
        let value = value as u32;
        match schema.as_str() {
            "userdata" => info.userdata = value,
            "triggers" => info.triggers = value,
            "translators" => info.translators = value,
            "system" => info.system = value,
            "styles" => info.styles = value,
            "repository" => info.repository = value,
            "globalSchema" => info.global_schema = value,
            "delete" => info.deletes = value,
            "compatibility" => info.compatibility = value,
            _ => {}
        }
    }
    Ok(info)
}

/// The library versions this tool was written against.
pub fn supported_library_info() -> LibraryInfo {
    LibraryInfo {
        userdata: 120,
        triggers: 18,
        translators: 1_668_085_253,
        system: 32,
        styles: 1_668_085_253,
        repository: 1_671_627_457,
        global_schema: 21,
        deletes: 74,
        compatibility: 7,
    }
}

/// Check the schema versions that affect the tables this tool reads.
pub fn verify_supported(info: &LibraryInfo) -> Result<(), Error> {
    let supported = supported_library_info();
    let checks = [
        ("userdata", info.userdata, supported.userdata),
        ("globalSchema", info.global_schema, supported.global_schema),
        ("compatibility", info.compatibility, supported.compatibility),
    ];
    for (field, found, expected) in checks {
        if found != expected {
            return Err(Error::UnsupportedLibrary { field, found, supported: expected });
        }
    }
    Ok(())
}

pub fn check_supported(conn: &Connection) -> Result<()> {
    let info = library_info(conn)?;
    verify_supported(&info)?;
    Ok(())
}
