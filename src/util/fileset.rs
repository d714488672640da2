//! Directory scanning with Ant-style include/exclude patterns.
//!
//! Patterns are relative to the scanned directory and use `/` as the
//! separator. `*` stays within one path segment, `**` spans any number of
//! segments (including none), and a pattern ending in `/` matches the whole
//! subtree below it. Results are sorted so they do not depend on the order
//! the filesystem enumerates entries.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

/// Conventional VCS and editor junk, excluded unless disabled.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/*~",
    "**/#*#",
    "**/.#*",
    "**/%*%",
    "**/._*",
    "**/CVS",
    "**/CVS/**",
    "**/.cvsignore",
    "**/SCCS",
    "**/SCCS/**",
    "**/vssver.scc",
    "**/.svn",
    "**/.svn/**",
    "**/.DS_Store",
    "**/.git",
    "**/.git/**",
    "**/.gitattributes",
    "**/.gitignore",
    "**/.gitmodules",
    "**/.hg",
    "**/.hg/**",
    "**/.hgignore",
    "**/.hgsub",
    "**/.hgsubstate",
    "**/.hgtags",
    "**/.bzr",
    "**/.bzr/**",
    "**/.bzrignore",
];

/// Ordered include and exclude patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    includes: Vec<String>,
    excludes: Vec<String>,
}

impl PatternSet {
    pub fn new() -> Self {
        PatternSet::default()
    }

    pub fn include(&mut self, pattern: impl Into<String>) {
        self.includes.push(pattern.into());
    }

    pub fn exclude(&mut self, pattern: impl Into<String>) {
        self.excludes.push(pattern.into());
    }

    /// Append every pattern of a comma/space separated shorthand list
    /// after the existing includes.
    pub fn include_list(&mut self, list: &str) {
        self.includes.extend(tokenize(list));
    }

    /// Append every pattern of a comma/space separated shorthand list
    /// after the existing excludes.
    pub fn exclude_list(&mut self, list: &str) {
        self.excludes.extend(tokenize(list));
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }
}

fn tokenize(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Normalize an Ant-style pattern to `glob` syntax.
fn normalize(pattern: &str) -> String {
    let mut pattern = pattern.trim().replace('\\', "/");
    while pattern.starts_with("./") {
        pattern.drain(..2);
    }
    if pattern.ends_with('/') {
        pattern.push_str("**");
    }
    pattern
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            let normalized = normalize(p);
            Pattern::new(&normalized).with_context(|| format!("invalid pattern `{}`", p))
        })
        .collect()
}

/// Files and empty directories selected by a scan, relative to the base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub files: Vec<PathBuf>,
    pub empty_dirs: Vec<PathBuf>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.empty_dirs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len() + self.empty_dirs.len()
    }
}

/// Scans one directory against a [`PatternSet`].
#[derive(Debug, Clone)]
pub struct FilesetScanner {
    base: PathBuf,
    patterns: PatternSet,
    case_sensitive: bool,
    default_excludes: bool,
}

impl FilesetScanner {
    pub fn new(base: impl Into<PathBuf>, patterns: PatternSet) -> Self {
        FilesetScanner {
            base: base.into(),
            patterns,
            case_sensitive: true,
            default_excludes: true,
        }
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    pub fn default_excludes(mut self, yes: bool) -> Self {
        self.default_excludes = yes;
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Walk the base directory and collect every match.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.base.is_dir() {
            bail!("{} is not a directory", self.base.display());
        }

        let includes = if self.patterns.includes.is_empty() {
            vec![Pattern::new("**")?]
        } else {
            compile(&self.patterns.includes)?
        };
        let mut excludes = compile(&self.patterns.excludes)?;
        if self.default_excludes {
            for pattern in DEFAULT_EXCLUDES {
                excludes.push(Pattern::new(pattern)?);
            }
        }

        let options = MatchOptions {
            case_sensitive: self.case_sensitive,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        let selected = |rel: &str| {
            includes.iter().any(|p| p.matches_with(rel, options))
                && !excludes.iter().any(|p| p.matches_with(rel, options))
        };

        let mut result = ScanResult::default();
        for entry in WalkDir::new(&self.base)
            .min_depth(1)
            .sort_by_file_name()
            .follow_links(true)
        {
            let entry = entry
                .with_context(|| format!("failed to scan {}", self.base.display()))?;
            let rel = entry
                .path()
                .strip_prefix(&self.base)
                .with_context(|| format!("{} escapes the scan root", entry.path().display()))?
                .to_path_buf();
            let rel_str = to_slash(&rel);

            if entry.file_type().is_dir() {
                if is_empty_dir(entry.path())? && selected(&rel_str) {
                    result.empty_dirs.push(rel);
                }
            } else if selected(&rel_str) {
                result.files.push(rel);
            }
        }

        result.files.sort();
        result.empty_dirs.sort();
        tracing::debug!(
            "scanned {}: {} files, {} empty directories",
            self.base.display(),
            result.files.len(),
            result.empty_dirs.len()
        );
        Ok(result)
    }
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path)
        .with_context(|| format!("failed to read directory: {}", path.display()))?;
    Ok(entries.next().is_none())
}

/// Render a relative path with `/` separators.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
