//! Change-set summarization.

use crate::config::AnalyzerConfig;
use crate::types::{ChangeSummary, FileChange};

/// Bucket used for files whose name has no `.`.
pub const NO_EXTENSION: &str = "no-ext";

/// Extension of `filename`: the text after its last `.`, or [`NO_EXTENSION`].
///
/// # Examples
///
/// ```
/// use docscout_core::analysis::extension_of;
///
/// assert_eq!(extension_of("src/lib.rs"), "rs");
/// assert_eq!(extension_of("archive.tar.gz"), "gz");
/// assert_eq!(extension_of("Makefile"), "no-ext");
/// ```
pub fn extension_of(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => NO_EXTENSION,
    }
}

/// Summarize a list of file changes for the agent prompt.
///
/// A file is significant when its additions or deletions strictly exceed the
/// configured thresholds.
///
/// # Examples
///
/// ```
/// use docscout_core::{analyze_changes, AnalyzerConfig, FileChange};
///
/// let files = vec![
///     FileChange { filename: "src/api.rs".into(), additions: 40, deletions: 2, status: None },
///     FileChange { filename: "README.md".into(), additions: 3, deletions: 1, status: None },
/// ];
/// let summary = analyze_changes(&files, &AnalyzerConfig::default());
/// assert_eq!(summary.total_files, 2);
/// assert_eq!(summary.significant_changes, vec!["src/api.rs"]);
/// ```
pub fn analyze_changes(files: &[FileChange], config: &AnalyzerConfig) -> ChangeSummary {
    let mut summary = ChangeSummary {
        total_files: files.len(),
        ..ChangeSummary::default()
    };

    for file in files {
        *summary
            .files_by_type
            .entry(extension_of(&file.filename).to_string())
            .or_insert(0) += 1;

        if file.additions > config.significant_additions
            || file.deletions > config.significant_deletions
        {
            summary.significant_changes.push(file.filename.clone());
        }

        summary.total_additions += file.additions;
        summary.total_deletions += file.deletions;

        match file.status.as_deref() {
            Some("added") => summary.files_added += 1,
            Some("modified") | None => summary.files_modified += 1,
            Some("removed") => summary.files_removed += 1,
            Some(_) => {}
        }
    }

    summary
}
