use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::ValidateError;
use crate::models::{RunSummary, SkillOutcome};
use crate::skills::SkillValidator;

const PASS_MARKER: &str = "✓";
const FAIL_MARKER: &str = "✗";

/// Immediate subdirectories of `root`, sorted by name. Files are skipped;
/// symlinks count when they resolve to a directory.
pub fn skill_dirs(root: &Path) -> Result<Vec<PathBuf>, ValidateError> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ValidateError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.path().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

pub fn render_outcome(outcome: &SkillOutcome) -> String {
    if outcome.is_valid() {
        return format!("{PASS_MARKER} {}\n", outcome.name);
    }

    let mut output = format!("{FAIL_MARKER} {}\n", outcome.name);
    for problem in &outcome.problems {
        output.push_str(&format!("    - {problem}\n"));
    }
    output
}

pub fn render_summary(summary: &RunSummary) -> String {
    if summary.failed.is_empty() {
        format!("All {} skills passed validation\n", summary.total)
    } else {
        format!(
            "{}/{} skills invalid: {}\n",
            summary.failed.len(),
            summary.total,
            summary.failed.join(", ")
        )
    }
}

/// Validates every skill directory under `root` and reports to `out`.
pub fn validate_all<V>(
    validator: &V,
    root: &Path,
    out: &mut dyn Write,
) -> Result<RunSummary, ValidateError>
where
    V: SkillValidator + ?Sized,
{
    if !root.is_dir() {
        return Err(ValidateError::Configuration(format!(
            "skills directory not found: {}; pass --root <dir> or run from the repository root",
            root.display()
        )));
    }

    let dirs = skill_dirs(root)?;
    info!(root = %root.display(), count = dirs.len(), "validating skills");

    let mut summary = RunSummary::default();
    for dir in dirs {
        let name = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        let problems = validator.validate(&dir);
        debug!(skill = %name, problems = problems.len(), "validated");

        let outcome = SkillOutcome { name, problems };
        out.write_all(render_outcome(&outcome).as_bytes())?;
        summary.record(&outcome);
    }

    writeln!(out)?;
    out.write_all(render_summary(&summary).as_bytes())?;

    Ok(summary)
}
