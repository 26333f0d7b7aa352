//! Run results.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ledger::ChangeLedger;

/// Result of one generation run, returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// Absolute output directory.
    pub output_dir: PathBuf,
    /// Written paths: created, then identical, then forced.
    pub created: Vec<PathBuf>,
    /// Human-readable report.
    pub raw_output: String,
}

/// Turns a ledger into a [`RunResult`].
pub struct RunReporter;

impl RunReporter {
    pub fn summarize(ledger: &ChangeLedger, output_dir: &Path) -> RunResult {
        // Downstream consumers depend on this ordering.
        let created = ledger
            .created
            .iter()
            .chain(&ledger.identical)
            .chain(&ledger.forced)
            .cloned()
            .collect();

        let mut raw_output = format!("target dir = {}\n", output_dir.display());
        let sections = [
            ("create", &ledger.created),
            ("identical", &ledger.identical),
            ("conflict", &ledger.conflicted),
            ("force", &ledger.forced),
        ];
        for (keyword, paths) in sections {
            for path in paths {
                let _ = writeln!(raw_output, "{:>9} {}", keyword, path.display());
            }
        }

        RunResult {
            output_dir: output_dir.to_path_buf(),
            created,
            raw_output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Classification;

    #[test]
    fn test_summarize_ordering() {
        let mut ledger = ChangeLedger::new();
        ledger.record("b/Forced.cls".into(), Classification::Forced);
        ledger.record("a/Same.cls".into(), Classification::Identical);
        ledger.record("c/New.cls".into(), Classification::Created);
        ledger.record("d/New2.cls".into(), Classification::Created);

        let result = RunReporter::summarize(&ledger, Path::new("/work/out"));

        let created: Vec<_> = result.created.iter().map(|p| p.to_str().unwrap()).collect();
        assert_eq!(
            created,
            ["c/New.cls", "d/New2.cls", "a/Same.cls", "b/Forced.cls"]
        );

        let lines: Vec<_> = result.raw_output.lines().collect();
        assert_eq!(
            lines,
            [
                "target dir = /work/out",
                "   create c/New.cls",
                "   create d/New2.cls",
                "identical a/Same.cls",
                " conflict b/Forced.cls",
                "    force b/Forced.cls",
            ]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let result = RunReporter::summarize(&ChangeLedger::new(), Path::new("/out"));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outputDir"], "/out");
        assert_eq!(json["rawOutput"], "target dir = /out\n");
        assert!(json["created"].as_array().unwrap().is_empty());
    }
}
