//! Job configuration and the batch driver that executes clone directives.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};
use crate::index::ProfileIndex;
use crate::materialize::{CloneDirective, CloneMaterializer, IdentityStrategy, MaterializedProfile};

pub const DEFAULT_JOB_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfig {
    /// Catalog root holding `system/` and `user/`.
    pub bambu_config_dir: PathBuf,
    /// Output root; defaults to `bambu_config_dir`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub clean_output_dir: bool,
    #[serde(default)]
    pub identity: IdentityStrategy,
    #[serde(default)]
    pub clone: Vec<CloneDirective>,
}

impl JobConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ProfileError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| ProfileError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn config_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.bambu_config_dir)
    }

    pub fn output_dir(&self, base: &Path) -> PathBuf {
        base.join(self.output_dir.as_ref().unwrap_or(&self.bambu_config_dir))
    }
}

/// A directive that was not executed because its source profile is unknown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDirective {
    pub directive: CloneDirective,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobReport {
    pub config_dir: PathBuf,
    pub output_dir: PathBuf,
    pub cloned: Vec<MaterializedProfile>,
    pub skipped: Vec<SkippedDirective>,
}

/// Execute every clone directive of `job`, resolving relative paths against
/// `base`.
///
/// A directive whose `from` profile is not indexed is skipped and recorded;
/// every other failure aborts the run.
pub fn run_job(job: &JobConfig, base: &Path) -> Result<JobReport> {
    let config_dir = job.config_dir(base);
    let output_dir = job.output_dir(base);

    tracing::info!(config_dir = %config_dir.display(), "using Bambu Studio configuration");
    tracing::info!(output_dir = %output_dir.display(), "using output directory");

    if job.clean_output_dir {
        clean_dir(&output_dir, &config_dir)?;
    }

    let mut index = ProfileIndex::build(&config_dir)?;
    let mut report = JobReport {
        config_dir,
        output_dir: output_dir.clone(),
        ..JobReport::default()
    };

    for directive in &job.clone {
        tracing::info!(
            profile_type = %directive.profile_type,
            from = %directive.from,
            to = %directive.to,
            "cloning profile"
        );

        let Some(record) = index.find(directive.profile_type, &directive.from).cloned() else {
            let reason = format!(
                "settings for {} \"{}\" not found",
                directive.profile_type, directive.from
            );
            tracing::warn!(%reason, "skipping clone");
            report.skipped.push(SkippedDirective {
                directive: directive.clone(),
                reason,
            });
            continue;
        };

        let source = index.resolve(&record)?;
        let materialized = CloneMaterializer::new(&mut index, &output_dir)
            .with_strategy(job.identity)
            .materialize(&source, directive)?;
        report.cloned.push(materialized);
    }

    Ok(report)
}

/// Remove everything inside `dir`, keeping `dir` itself.
fn clean_dir(dir: &Path, config_dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    if contains_dir(dir, config_dir) {
        return Err(ProfileError::UnsafeClean {
            path: dir.to_path_buf(),
        });
    }

    let entries = fs::read_dir(dir).map_err(|e| ProfileError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ProfileError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| ProfileError::io(&path, e))?;
        let removed = if file_type.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| ProfileError::write(&path, e))?;
    }

    tracing::info!(output_dir = %dir.display(), "cleaned output directory");
    Ok(())
}

/// Whether `inner` is `outer` or lives somewhere below it.
fn contains_dir(outer: &Path, inner: &Path) -> bool {
    match (outer.canonicalize(), inner.canonicalize()) {
        (Ok(outer), Ok(inner)) => inner.starts_with(outer),
        _ => inner.starts_with(outer),
    }
}
