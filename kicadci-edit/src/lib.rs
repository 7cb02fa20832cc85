//! Edit engine for kicadci board files.
//!
//! Responsibilities:
//! - Rewrite the value of the first `layerselection` line (in-memory or on disk).
//! - Leave every other byte of the file untouched.
//! - Replace the board file through a sibling temp file and a rename.
//! - Generate a unified diff preview of the rewrite.

mod error;

pub use error::{EditError, EditResult};

use camino::Utf8Path;
use fs_err as fs;
use kicadci_domain::LayerSelectionRule;
use std::io::{self, Write};
use std::ops::Range;
use tracing::{debug, warn};

/// What applying a rule did to the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstitutionOutcome {
    /// The value was replaced.
    Rewritten,
    /// The line already carried the requested value.
    Unchanged,
    /// No line carries the field; the text is returned as-is.
    FieldMissing,
}

impl SubstitutionOutcome {
    pub fn changed(self) -> bool {
        matches!(self, SubstitutionOutcome::Rewritten)
    }
}

/// Text after applying a [`LayerSelectionRule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub text: String,
    pub outcome: SubstitutionOutcome,
    /// 1-based line number of the matched line.
    pub line: Option<usize>,
}

/// Result of rewriting a board file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSubstitution {
    pub outcome: SubstitutionOutcome,
    pub line: Option<usize>,
    /// Unified diff of the change; empty unless the file was rewritten.
    pub patch: String,
}

/// Byte range of the value token on `line`, if `line` declares `field`.
///
/// Accepted shape: optional spaces/tabs, optional `(`, the field name, at
/// least one space/tab, then the value up to `)`, whitespace or end of line.
fn value_span(line: &str, field: &str) -> Option<Range<usize>> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
        i += 1;
    }
    if bytes.get(i) == Some(&b'(') {
        i += 1;
    }
    if !line[i..].starts_with(field) {
        return None;
    }
    i += field.len();

    let sep_start = i;
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
        i += 1;
    }
    if i == sep_start {
        return None;
    }

    let start = i;
    while i < bytes.len() && !matches!(bytes[i], b')' | b' ' | b'\t' | b'\r' | b'\n') {
        i += 1;
    }
    Some(start..i)
}

/// Apply `rule` to the first matching line of `text`.
pub fn apply_rule(text: &str, rule: &LayerSelectionRule) -> Substitution {
    let mut offset = 0;
    for (idx, line) in text.split_inclusive('\n').enumerate() {
        if let Some(span) = value_span(line, rule.field) {
            let line_no = Some(idx + 1);
            if line[span.clone()] == *rule.value {
                return Substitution {
                    text: text.to_string(),
                    outcome: SubstitutionOutcome::Unchanged,
                    line: line_no,
                };
            }

            let mut out = text.to_string();
            out.replace_range(offset + span.start..offset + span.end, &rule.value);
            return Substitution {
                text: out,
                outcome: SubstitutionOutcome::Rewritten,
                line: line_no,
            };
        }
        offset += line.len();
    }

    Substitution {
        text: text.to_string(),
        outcome: SubstitutionOutcome::FieldMissing,
        line: None,
    }
}

/// Fails with [`EditError::Write`] when `path` is marked read-only.
fn ensure_writable(path: &Utf8Path) -> EditResult<std::fs::Permissions> {
    let write_error = |source: io::Error| EditError::Write {
        path: path.to_path_buf(),
        source,
    };
    let permissions = fs::metadata(path).map_err(write_error)?.permissions();
    if permissions.readonly() {
        return Err(write_error(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "board file is read-only",
        )));
    }
    Ok(permissions)
}

/// Write `contents` to a temp file next to `path`, then rename it over `path`.
fn replace_contents(
    path: &Utf8Path,
    contents: &str,
    permissions: std::fs::Permissions,
) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.as_file().set_permissions(permissions)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Apply `rule` to the board file at `path`, writing only when the text changed.
///
/// A board that carries the field must be writable even when it already holds
/// the value.
pub fn apply_rule_to_file(path: &Utf8Path, rule: &LayerSelectionRule) -> EditResult<FileSubstitution> {
    let before = fs::read_to_string(path).map_err(|source| EditError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let Substitution {
        text: after,
        outcome,
        line,
    } = apply_rule(&before, rule);

    let patch = match outcome {
        SubstitutionOutcome::Rewritten => {
            let permissions = ensure_writable(path)?;
            replace_contents(path, &after, permissions).map_err(|source| EditError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            let patch = render_patch(path, &before, &after);
            debug!(path = path.as_str(), line, "rewrote {}\n{}", rule.field, patch);
            patch
        }
        SubstitutionOutcome::Unchanged => {
            ensure_writable(path)?;
            debug!(path = path.as_str(), line, value = rule.value.as_str(), "{} already set", rule.field);
            String::new()
        }
        SubstitutionOutcome::FieldMissing => {
            warn!(path = path.as_str(), "no {} line found; board file left as-is", rule.field);
            String::new()
        }
    };

    Ok(FileSubstitution {
        outcome,
        line,
        patch,
    })
}

/// Unified diff between two versions of `path`.
pub fn render_patch(path: &Utf8Path, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }
    let mut out = String::new();
    out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));
    let body = diffy::create_patch(before, after).to_string();
    // diffy emits its own ---/+++ header; keep only the hunks.
    for line in body.lines().skip_while(|l| !l.starts_with("@@")) {
        out.push_str(line);
        out.push('\n');
    }
    out
}
