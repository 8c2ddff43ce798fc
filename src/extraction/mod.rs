//! Dependency identifier extraction from Terraform configuration files.
//!
//! Files are read line by line. Every trimmed line is fed to each
//! [`TextProcessor`]; once the file is exhausted the processors hand back the
//! identifiers they collected, module sources first and provider entries
//! second.
//!
//! This is a line-oriented scan, not an HCL parser. A `module` block header
//! must sit on a single line ending in `{`, and a block ends at the first line
//! consisting of a lone `}`.

mod modules;
mod providers;

pub use modules::ModuleSourceProcessor;
pub use providers::RequiredProvidersProcessor;

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::core::VercheckError;
use crate::crawler::Extract;
use crate::models::Identifier;

/// Default pattern for configuration file names.
pub const DEFAULT_FILE_PATTERN: &str = r".+\.tf";

/// Default pattern for directory names that are never descended into.
pub const DEFAULT_IGNORE_PATTERN: &str = "test";

/// Directories skipped regardless of the ignore pattern.
const ALWAYS_SKIPPED: [&str; 2] = [".git", ".terraform"];

/// A stateful line consumer that recognises one kind of dependency reference.
pub trait TextProcessor {
    /// Feed one trimmed line.
    fn process(&mut self, line: &str);

    /// Hand back everything collected so far.
    fn identifiers(&mut self) -> Vec<Identifier>;
}

/// Run every processor over every line of `content`, then gather their output
/// in processor order.
pub fn process_lines(content: &str, processors: &mut [&mut dyn TextProcessor]) -> Vec<Identifier> {
    for line in content.lines() {
        let line = line.trim();
        for processor in processors.iter_mut() {
            processor.process(line);
        }
    }

    processors.iter_mut().flat_map(|processor| processor.identifiers()).collect()
}

/// Module and provider identifiers referenced by one file's content.
#[must_use]
pub fn extract_identifiers(content: &str) -> Vec<Identifier> {
    let mut modules = ModuleSourceProcessor::new();
    let mut providers = RequiredProvidersProcessor::new();
    process_lines(content, &mut [&mut modules, &mut providers])
}

/// Scan every matching file below `directory` and concatenate what they reference.
///
/// Symlinks are never followed. Directories named `.git` or `.terraform`, or
/// whose name matches `ignore_pattern`, are skipped along with everything
/// below them; the root itself is always scanned. Files are visited in file
/// name order.
///
/// # Errors
///
/// Returns [`VercheckError::DirectoryRead`] if the walk or a file read fails.
pub fn process_directory(
    directory: &Path,
    file_pattern: &Regex,
    ignore_pattern: &Regex,
) -> Result<Vec<Identifier>, VercheckError> {
    let read_error = |reason: String| VercheckError::DirectoryRead {
        path: directory.display().to_string(),
        reason,
    };

    let mut identifiers = Vec::new();
    let walker = WalkDir::new(directory).follow_links(false).sort_by_file_name().into_iter().filter_entry(|entry| {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        let skip = ALWAYS_SKIPPED.contains(&name.as_ref()) || ignore_pattern.is_match(&name);
        if skip {
            debug!(directory = %entry.path().display(), "Skipping directory");
        }
        !skip
    });

    for entry in walker {
        let entry = entry.map_err(|e| read_error(e.to_string()))?;
        if entry.path_is_symlink() {
            debug!(path = %entry.path().display(), "Ignoring symlink");
            continue;
        }
        if !entry.file_type().is_file() || !file_pattern.is_match(&entry.file_name().to_string_lossy()) {
            continue;
        }

        trace!(file = %entry.path().display(), "Scanning file");
        let bytes = fs::read(entry.path()).map_err(|e| read_error(format!("{}: {e}", entry.path().display())))?;
        let content = String::from_utf8_lossy(&bytes);
        if matches!(content, Cow::Owned(_)) {
            debug!(file = %entry.path().display(), "File is not valid UTF-8, scanning lossily");
        }
        identifiers.extend(extract_identifiers(&content));
    }

    Ok(identifiers)
}

/// Compile a user-supplied pattern.
///
/// # Errors
///
/// Returns [`VercheckError::InvalidPattern`] if `pattern` is not a valid regex.
pub fn compile_pattern(pattern: &str) -> Result<Regex, VercheckError> {
    Regex::new(pattern).map_err(|e| VercheckError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// [`Extract`] implementation over Terraform files on disk.
#[derive(Debug, Clone)]
pub struct TerraformExtractor {
    file_pattern: Regex,
    ignore_pattern: Regex,
}

impl TerraformExtractor {
    /// Build an extractor from file and ignore patterns.
    ///
    /// # Errors
    ///
    /// Returns [`VercheckError::InvalidPattern`] if either pattern fails to compile.
    pub fn new(file_pattern: &str, ignore_pattern: &str) -> Result<Self, VercheckError> {
        Ok(Self {
            file_pattern: compile_pattern(file_pattern)?,
            ignore_pattern: compile_pattern(ignore_pattern)?,
        })
    }
}

impl Extract for TerraformExtractor {
    fn extract(&self, directory: &Path) -> Result<Vec<Identifier>, VercheckError> {
        process_directory(directory, &self.file_pattern, &self.ignore_pattern)
    }
}
