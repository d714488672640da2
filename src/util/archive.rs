//! Zip archive access.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use zip::ZipArchive;

use crate::util::fs::Scratch;

fn open(path: &Path) -> Result<ZipArchive<File>> {
    let file =
        File::open(path).with_context(|| format!("failed to open archive {}", path.display()))?;
    ZipArchive::new(file).with_context(|| format!("{} is not a zip archive", path.display()))
}

/// Names of the file entries of an archive, in archive order.
pub fn file_entries(path: &Path) -> Result<Vec<String>> {
    let mut archive = open(path)?;
    let mut names = Vec::new();
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .with_context(|| format!("failed to read entry {} of {}", index, path.display()))?;
        if !entry.is_dir() {
            names.push(entry.name().to_string());
        }
    }
    Ok(names)
}

/// An archive entry extracted to a scratch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntry {
    pub name: String,
    pub location: PathBuf,
}

/// Extract every file entry to its own scratch file.
pub fn extract_files(path: &Path, scratch: &Scratch) -> Result<Vec<ExtractedEntry>> {
    let mut archive = open(path)?;
    let mut extracted = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("failed to read entry {} of {}", index, path.display()))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        io::copy(&mut entry, &mut bytes)
            .with_context(|| format!("failed to extract {} from {}", name, path.display()))?;
        let location = scratch.file("entry-", "", &bytes)?;
        extracted.push(ExtractedEntry { name, location });
    }
    Ok(extracted)
}
