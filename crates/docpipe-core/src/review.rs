use crate::architecture::ArchitectureDocument;
use crate::config::WarnLevel;
use crate::error::Result;
use crate::judgment::Judgment;
use crate::pipeline::Pipeline;
use crate::requirements::RequirementsDocument;
use crate::specification::{SpecKind, SpecificationBundle, NONE_CELL};
use crate::store::DocStore;
use crate::types::PipelineState;
use serde::Serialize;

// ---------------------------------------------------------------------------
// ReviewReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReviewFinding {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
    pub slug: String,
    pub state: Option<PipelineState>,
    pub findings: Vec<ReviewFinding>,
}

impl ReviewReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.findings.push(ReviewFinding {
            level: WarnLevel::Warning,
            message: message.into(),
        });
    }

    fn error(&mut self, message: impl Into<String>) {
        self.findings.push(ReviewFinding {
            level: WarnLevel::Error,
            message: message.into(),
        });
    }
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

/// Read-only cross-stage completeness check: requirement coverage in the
/// architecture, bundle coverage of requirements and modules, stub presence,
/// and staleness after upstream reruns. Never writes.
pub struct Review<'a> {
    store: &'a DocStore,
    judgment: &'a dyn Judgment,
    source_root: &'a str,
    package: &'a str,
}

impl<'a> Review<'a> {
    pub fn new(
        store: &'a DocStore,
        judgment: &'a dyn Judgment,
        source_root: &'a str,
        package: &'a str,
    ) -> Self {
        Self {
            store,
            judgment,
            source_root,
            package,
        }
    }

    pub fn review(&self, slug: &str) -> Result<ReviewReport> {
        crate::slug::validate(slug)?;

        let pipeline = Pipeline::load(self.store.root(), slug)?;
        let mut report = ReviewReport {
            slug: slug.to_string(),
            state: pipeline.as_ref().map(|p| p.state),
            findings: Vec::new(),
        };

        if let Some(pipeline) = &pipeline {
            for stage in pipeline.stale_stages() {
                report.warn(format!(
                    "{stage} output predates the latest {} rerun; regenerate with 'docpipe {}'",
                    stage.predecessor().map(|p| p.to_string()).unwrap_or_default(),
                    stage.command()
                ));
            }
        }

        if !self.store.requirements_exists(slug) {
            report.error(format!(
                "no requirements document; run 'docpipe refine-requirements' for '{slug}'"
            ));
            return Ok(report);
        }
        let req = RequirementsDocument::parse(
            &self.store.requirements_path(slug).display().to_string(),
            &self.store.read_requirements(slug)?,
        )?;

        if !self.store.architecture_exists(slug) {
            report.warn("architecture not yet designed");
            return Ok(report);
        }
        let arch = ArchitectureDocument::parse(
            &self.store.architecture_path(slug).display().to_string(),
            slug,
            &self.store.read_architecture(slug)?,
        )?;

        self.check_traceability(&req, &arch, &mut report);

        if !self.store.bundle_exists(slug) {
            report.warn("specification bundle not yet generated");
            return Ok(report);
        }
        let bundle = SpecificationBundle::parse_index(
            &crate::paths::bundle_index(self.store.root(), slug)
                .display()
                .to_string(),
            slug,
            &self.store.read_bundle_index(slug)?,
        )?;

        self.check_bundle(&req, &arch, &bundle, &mut report)?;

        if report.state == Some(PipelineState::Implemented) {
            self.check_stubs(&arch, &bundle, &mut report);
        }

        Ok(report)
    }

    fn check_traceability(
        &self,
        req: &RequirementsDocument,
        arch: &ArchitectureDocument,
        report: &mut ReviewReport,
    ) {
        for fr in &req.functional {
            if arch.modules_for(&fr.fr_id()).is_empty() {
                report.error(format!(
                    "{} is not covered by any module in the architecture traceability",
                    fr.fr_id()
                ));
            }
        }
        for row in &arch.traceability {
            for module in &row.modules {
                if arch.module(module).is_none() {
                    report.error(format!(
                        "traceability row {} names unknown module '{module}'",
                        row.requirement
                    ));
                }
            }
        }
    }

    fn check_bundle(
        &self,
        req: &RequirementsDocument,
        arch: &ArchitectureDocument,
        bundle: &SpecificationBundle,
        report: &mut ReviewReport,
    ) -> Result<()> {
        for fr in &req.functional {
            let covered = bundle
                .matrix
                .iter()
                .any(|r| r.requirement == fr.fr_id() && r.behavior != NONE_CELL);
            if !covered {
                report.error(format!("{} has no behavior spec in the bundle", fr.fr_id()));
            }
        }

        let failed: Vec<&str> = bundle.failures.iter().map(|f| f.module.as_str()).collect();
        for module in &arch.modules {
            let has_contract = bundle
                .files_of_kind(SpecKind::Contract)
                .iter()
                .any(|e| e.traces_to == module.name);
            if !has_contract && !failed.contains(&module.name.as_str()) {
                report.error(format!("module '{}' has no contract spec", module.name));
            }
            if self.judgment.is_stateful(module) {
                let has_property = bundle
                    .files_of_kind(SpecKind::Property)
                    .iter()
                    .any(|e| e.traces_to == module.name);
                if !has_property && !failed.contains(&module.name.as_str()) {
                    report.warn(format!(
                        "stateful module '{}' has no property spec",
                        module.name
                    ));
                }
            }
        }

        for failure in &bundle.failures {
            report.warn(format!(
                "bundle generation skipped module '{}': {}",
                failure.module, failure.reason
            ));
        }

        // Entries listed in the index must be present on disk.
        for entry in &bundle.entries {
            let (subdir, filename) = entry.file.split_once('/').unwrap_or(("", entry.file.as_str()));
            let on_disk = self
                .store
                .list_bundle_files(&bundle.slug, subdir)?
                .contains(&filename.to_string());
            if !on_disk {
                report.error(format!("index lists '{}' but the file is missing", entry.file));
            }
        }

        Ok(())
    }

    fn check_stubs(
        &self,
        arch: &ArchitectureDocument,
        bundle: &SpecificationBundle,
        report: &mut ReviewReport,
    ) {
        for entry in bundle.files_of_kind(SpecKind::Contract) {
            if let Some(module) = arch.module(&entry.traces_to) {
                let filename = format!("{}.kt", crate::naming::pascal_case(&module.name));
                if !self
                    .store
                    .source_stub_exists(self.source_root, self.package, &filename)
                {
                    report.warn(format!(
                        "implementation stub '{filename}' is missing for module '{}'",
                        module.name
                    ));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
