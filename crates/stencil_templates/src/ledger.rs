//! Write classification and the per-run change ledger.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConflictPolicy;
use crate::error::{TemplateError, TemplateResult};

/// Outcome of writing one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// No file existed at the destination.
    Created,
    /// The existing file matched the new content once trimmed.
    Identical,
    /// The existing file differed and was overwritten.
    Forced,
}

/// Run-scoped record of every written path, relative to the output directory.
///
/// A path is in exactly one of `created`/`identical`, or in both `conflicted`
/// and `forced`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLedger {
    pub created: Vec<PathBuf>,
    pub identical: Vec<PathBuf>,
    pub conflicted: Vec<PathBuf>,
    pub forced: Vec<PathBuf>,
}

impl ChangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: PathBuf, classification: Classification) {
        match classification {
            Classification::Created => self.created.push(path),
            Classification::Identical => self.identical.push(path),
            Classification::Forced => {
                self.conflicted.push(path.clone());
                self.forced.push(path);
            }
        }
    }

    /// Number of distinct paths written.
    pub fn len(&self) -> usize {
        self.created.len() + self.identical.len() + self.forced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compares prospective output against disk, writes it, and records the outcome.
#[derive(Debug)]
pub struct ChangeTracker {
    output_dir: PathBuf,
    policy: ConflictPolicy,
    ledger: ChangeLedger,
    /// Destinations written during this run.
    written: HashSet<PathBuf>,
}

impl ChangeTracker {
    pub fn new(output_dir: impl Into<PathBuf>, policy: ConflictPolicy) -> Self {
        Self {
            output_dir: output_dir.into(),
            policy,
            ledger: ChangeLedger::new(),
            written: HashSet::new(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn ledger(&self) -> &ChangeLedger {
        &self.ledger
    }

    pub fn into_ledger(self) -> ChangeLedger {
        self.ledger
    }

    /// Create a directory below the output directory.
    pub fn ensure_dir(&self, relative: &Path) -> TemplateResult<()> {
        fs::create_dir_all(self.output_dir.join(relative))?;
        Ok(())
    }

    /// Classify the write of `content` to `relative`, then perform it.
    ///
    /// The file is always written, identical content included. A destination
    /// may be written once per run; a second write fails with
    /// [`TemplateError::DuplicateOutput`] before touching the disk.
    pub fn classify_and_write(
        &mut self,
        relative: &Path,
        content: &[u8],
    ) -> TemplateResult<Classification> {
        if self.written.contains(relative) {
            return Err(TemplateError::DuplicateOutput(relative.to_path_buf()));
        }
        let target = self.output_dir.join(relative);

        let classification = match fs::read(&target) {
            Ok(existing) if same_content(&existing, content) => Classification::Identical,
            Ok(_) => {
                if self.policy == ConflictPolicy::Fail {
                    return Err(TemplateError::Conflict(relative.to_path_buf()));
                }
                Classification::Forced
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Classification::Created,
            Err(e) => return Err(e.into()),
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, content)?;
        self.written.insert(relative.to_path_buf());

        debug!("{:?}: {:?}", classification, relative);
        self.ledger.record(relative.to_path_buf(), classification);
        Ok(classification)
    }
}

/// Equality after trimming leading and trailing whitespace on both sides.
///
/// Internal whitespace and line endings are significant.
fn same_content(existing: &[u8], new: &[u8]) -> bool {
    match (std::str::from_utf8(existing), std::str::from_utf8(new)) {
        (Ok(a), Ok(b)) => a.trim() == b.trim(),
        _ => existing.trim_ascii() == new.trim_ascii(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_created_then_identical() {
        let temp = tempdir().unwrap();
        let rel = Path::new("classes/Foo.cls");

        let mut first = ChangeTracker::new(temp.path(), ConflictPolicy::Force);
        assert_eq!(
            first.classify_and_write(rel, b"class Foo {}").unwrap(),
            Classification::Created
        );
        assert_eq!(first.ledger().created, vec![PathBuf::from("classes/Foo.cls")]);

        let mut second = ChangeTracker::new(temp.path(), ConflictPolicy::Force);
        assert_eq!(
            second.classify_and_write(rel, b"\n class Foo {}  \n").unwrap(),
            Classification::Identical
        );
        let ledger = second.into_ledger();
        assert!(ledger.created.is_empty());
        assert_eq!(ledger.identical, vec![PathBuf::from("classes/Foo.cls")]);
        assert!(ledger.conflicted.is_empty());
        // Identical content is still rewritten.
        assert_eq!(
            fs::read_to_string(temp.path().join(rel)).unwrap(),
            "\n class Foo {}  \n"
        );
    }

    #[test]
    fn test_conflict_is_forced() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("Foo.cls"), "old").unwrap();

        let mut tracker = ChangeTracker::new(temp.path(), ConflictPolicy::Force);
        let outcome = tracker.classify_and_write(Path::new("Foo.cls"), b"new").unwrap();

        assert_eq!(outcome, Classification::Forced);
        let ledger = tracker.ledger();
        assert_eq!(ledger.conflicted, vec![PathBuf::from("Foo.cls")]);
        assert_eq!(ledger.forced, vec![PathBuf::from("Foo.cls")]);
        assert!(ledger.created.is_empty() && ledger.identical.is_empty());
        assert_eq!(fs::read_to_string(temp.path().join("Foo.cls")).unwrap(), "new");
    }

    #[test]
    fn test_same_destination_twice_in_one_run() {
        let temp = tempdir().unwrap();
        let mut tracker = ChangeTracker::new(temp.path(), ConflictPolicy::Force);
        let rel = Path::new("bar.txt");

        tracker.classify_and_write(rel, b"first").unwrap();
        let err = tracker.classify_and_write(rel, b"second").unwrap_err();

        assert!(matches!(err, TemplateError::DuplicateOutput(p) if p == rel));
        assert_eq!(fs::read_to_string(temp.path().join(rel)).unwrap(), "first");
        let ledger = tracker.ledger();
        assert_eq!(ledger.created, vec![PathBuf::from("bar.txt")]);
        assert!(ledger.conflicted.is_empty() && ledger.forced.is_empty());
    }

    #[test]
    fn test_fail_policy_leaves_file_untouched() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("Foo.cls"), "old").unwrap();

        let mut tracker = ChangeTracker::new(temp.path(), ConflictPolicy::Fail);
        let err = tracker
            .classify_and_write(Path::new("Foo.cls"), b"new")
            .unwrap_err();

        assert!(matches!(err, TemplateError::Conflict(p) if p == Path::new("Foo.cls")));
        assert_eq!(fs::read_to_string(temp.path().join("Foo.cls")).unwrap(), "old");
        assert!(tracker.ledger().is_empty());
    }

    #[test]
    fn test_line_endings_are_significant() {
        assert!(same_content(b"a\nb\n", b"  a\nb"));
        assert!(!same_content(b"a\r\nb", b"a\nb"));
        assert!(same_content(&[0xff, 0x00, b' '], &[b'\t', 0xff, 0x00]));
    }
}
