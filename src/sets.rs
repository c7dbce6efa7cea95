//! Content set discovery for `scs-dev sets`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use walkdir::WalkDir;

use crate::config::Config;
use crate::store::{export_content_dir, template_content_dir, METADATA_FILE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetKind {
    Template,
    Export,
}

impl SetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SetKind::Template => "template",
            SetKind::Export => "export",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSetInfo {
    pub name: String,
    pub kind: SetKind,
    pub path: PathBuf,
    pub has_index: bool,
}

/// Templates with embedded content first, then standalone exports.
pub fn discover(config: &Config) -> Result<Vec<ContentSetInfo>> {
    let mut sets = Vec::new();
    for name in child_dirs(&config.templates_path())? {
        let path = template_content_dir(config, &name);
        if path.is_dir() {
            sets.push(info(name, SetKind::Template, path));
        }
    }
    for name in child_dirs(&config.content_path())? {
        let path = export_content_dir(config, &name);
        if path.is_dir() {
            sets.push(info(name, SetKind::Export, path));
        }
    }
    Ok(sets)
}

fn info(name: String, kind: SetKind, path: PathBuf) -> ContentSetInfo {
    let has_index = path.join(METADATA_FILE).is_file();
    ContentSetInfo {
        name,
        kind,
        path,
        has_index,
    }
}

fn child_dirs(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_dir() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    Ok(names)
}

pub fn list_sets(config: &Config) -> Result<()> {
    let sets = discover(config)?;
    if sets.is_empty() {
        println!(
            "No content sets found under {} or {}.",
            config.templates_path().display(),
            config.content_path().display()
        );
        return Ok(());
    }

    println!("{:<24} {:<10} {:<8} PATH", "CONTENT SET", "KIND", "INDEX");
    for set in sets {
        let index = if set.has_index { "yes" } else { "missing" };
        println!(
            "{:<24} {:<10} {:<8} {}",
            set.name,
            set.kind.as_str(),
            index,
            set.path.display()
        );
    }
    Ok(())
}
