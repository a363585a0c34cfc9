use crate::error::{PipelineError, Result};
use crate::paths;
use crate::types::{PipelineState, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// StageRun
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRun {
    pub stage: Stage,
    pub completed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Per-slug bookkeeping manifest at `.docpipe/pipelines/<slug>.yaml`.
///
/// Advisory only: stage preconditions are enforced by document existence,
/// not by this manifest. A deleted manifest is rebuilt on the next stage run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub slug: String,
    pub feature_name: String,
    pub state: PipelineState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub runs: Vec<StageRun>,
}

impl Pipeline {
    pub fn new(slug: impl Into<String>, feature_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            slug: slug.into(),
            feature_name: feature_name.into(),
            state: PipelineState::Created,
            created_at: now,
            updated_at: now,
            runs: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn load(root: &Path, slug: &str) -> Result<Option<Self>> {
        let manifest = paths::pipeline_manifest(root, slug);
        if !manifest.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&manifest)?;
        let pipeline: Pipeline = serde_yaml::from_str(&data)?;
        Ok(Some(pipeline))
    }

    pub fn load_or_new(root: &Path, slug: &str, feature_name: &str) -> Result<Self> {
        Ok(Self::load(root, slug)?.unwrap_or_else(|| Self::new(slug, feature_name)))
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let manifest = paths::pipeline_manifest(root, &self.slug);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&manifest, data.as_bytes())
    }

    pub fn list(root: &Path) -> Result<Vec<Self>> {
        let dir = root.join(paths::PIPELINES_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut pipelines = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(slug) = name.strip_suffix(".yaml") {
                if let Some(p) = Self::load(root, slug)? {
                    pipelines.push(p);
                }
            }
        }
        pipelines.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(pipelines)
    }

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    /// Explicit forward-only transition. Reruns of an already-passed stage do
    /// not go through here; they keep the current state.
    pub fn advance_to(&mut self, target: PipelineState) -> Result<()> {
        if target < self.state {
            return Err(PipelineError::InvalidTransition {
                from: self.state.to_string(),
                to: target.to_string(),
                reason: "transitions are forward-only".to_string(),
            });
        }
        self.state = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record a successful stage run. Advances the state when the stage
    /// completes new ground; a rerun leaves the state where it was.
    pub fn record_run(&mut self, stage: Stage) {
        let now = Utc::now();
        self.runs.push(StageRun {
            stage,
            completed_at: now,
        });
        let reached = stage.completed_state();
        if reached > self.state {
            self.state = reached;
        }
        self.updated_at = now;
    }

    /// Most recent completion time of a stage, if it ever ran.
    pub fn completed_at(&self, stage: Stage) -> Option<DateTime<Utc>> {
        self.runs
            .iter()
            .rev()
            .find(|r| r.stage == stage)
            .map(|r| r.completed_at)
    }

    /// Stages whose output predates their predecessor's most recent rerun.
    pub fn stale_stages(&self) -> Vec<Stage> {
        let mut stale = Vec::new();
        for &stage in Stage::all() {
            let Some(pred) = stage.predecessor() else {
                continue;
            };
            if let (Some(upstream), Some(own)) = (self.completed_at(pred), self.completed_at(stage))
            {
                if upstream > own {
                    stale.push(stage);
                }
            }
        }
        stale
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn manifest_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut p = Pipeline::new("user-login", "User Login");
        p.record_run(Stage::Requirements);
        p.save(dir.path()).unwrap();

        let loaded = Pipeline::load(dir.path(), "user-login").unwrap().unwrap();
        assert_eq!(loaded.feature_name, "User Login");
        assert_eq!(loaded.state, PipelineState::RequirementsDrafted);
        assert_eq!(loaded.runs.len(), 1);
    }

    #[test]
    fn load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(Pipeline::load(dir.path(), "ghost").unwrap().is_none());
    }

    #[test]
    fn forward_only_transitions() {
        let mut p = Pipeline::new("x", "X");
        p.advance_to(PipelineState::Specified).unwrap();
        let err = p.advance_to(PipelineState::Created).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTransition { .. }));
        assert_eq!(p.state, PipelineState::Specified);
    }

    #[test]
    fn rerun_does_not_regress_state() {
        let mut p = Pipeline::new("x", "X");
        p.record_run(Stage::Requirements);
        p.record_run(Stage::Architecture);
        assert_eq!(p.state, PipelineState::ArchitectureDrafted);

        p.record_run(Stage::Requirements);
        assert_eq!(p.state, PipelineState::ArchitectureDrafted);
        assert_eq!(p.runs.len(), 3);
    }

    #[test]
    fn rerun_marks_downstream_stale() {
        let mut p = Pipeline::new("x", "X");
        p.record_run(Stage::Requirements);
        p.record_run(Stage::Architecture);
        assert!(p.stale_stages().is_empty());

        // Rerunning requirements leaves architecture older than its input.
        // Timestamps are monotonic within a run, so force distinct instants.
        std::thread::sleep(std::time::Duration::from_millis(5));
        p.record_run(Stage::Requirements);
        assert_eq!(p.stale_stages(), vec![Stage::Architecture]);
    }

    #[test]
    fn list_sorted_by_creation() {
        let dir = TempDir::new().unwrap();
        let a = Pipeline::new("a", "A");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = Pipeline::new("b", "B");
        b.save(dir.path()).unwrap();
        a.save(dir.path()).unwrap();

        let listed = Pipeline::list(dir.path()).unwrap();
        let slugs: Vec<_> = listed.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "b"]);
    }
}
