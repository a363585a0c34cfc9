use crate::architecture::{ArchitectureDocument, Module};
use crate::dialogue::Interviewer;
use crate::error::{PipelineError, Result};
use crate::judgment::{Judgment, OperationSketch};
use crate::naming;
use crate::paths;
use crate::pipeline::Pipeline;
use crate::requirements::{FunctionalRequirement, RequirementsDocument};
use crate::store::DocStore;
use crate::types::Stage;
use std::fmt;

// ---------------------------------------------------------------------------
// SpecKind / SpecEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    Contract,
    Behavior,
    Property,
}

impl SpecKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SpecKind::Contract => "contract",
            SpecKind::Behavior => "behavior",
            SpecKind::Property => "property",
        }
    }

    fn parse(s: &str) -> Option<SpecKind> {
        match s {
            "contract" => Some(SpecKind::Contract),
            "behavior" => Some(SpecKind::Behavior),
            "property" => Some(SpecKind::Property),
            _ => None,
        }
    }

    fn subdir(self) -> &'static str {
        match self {
            SpecKind::Contract => paths::CONTRACTS_SUBDIR,
            SpecKind::Behavior => paths::BEHAVIORS_SUBDIR,
            SpecKind::Property => paths::PROPERTIES_SUBDIR,
        }
    }
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One emitted stub file, relative to the bundle directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecEntry {
    pub file: String,
    pub kind: SpecKind,
    /// Module name or `FR-<n>` id this stub answers for.
    pub traces_to: String,
}

// ---------------------------------------------------------------------------
// MatrixRow / GenerationFailure
// ---------------------------------------------------------------------------

/// Absent cells render and parse as `NONE_CELL`.
pub const NONE_CELL: &str = "(none)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRow {
    pub requirement: String,
    pub module: String,
    pub contract: String,
    pub behavior: String,
    pub property: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationFailure {
    pub module: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// SpecificationBundle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecificationBundle {
    pub slug: String,
    pub architecture_slug: String,
    pub entries: Vec<SpecEntry>,
    pub matrix: Vec<MatrixRow>,
    pub failures: Vec<GenerationFailure>,
}

impl SpecificationBundle {
    pub fn files_of_kind(&self, kind: SpecKind) -> Vec<&SpecEntry> {
        self.entries.iter().filter(|e| e.kind == kind).collect()
    }

    // -----------------------------------------------------------------------
    // Index rendering
    // -----------------------------------------------------------------------

    pub fn render_index(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# Specification Bundle: {}\n\n", self.slug));
        out.push_str(&format!(
            "Architecture: `docs/architecture/{}.md`\n\n",
            self.architecture_slug
        ));

        out.push_str("## Files\n\n");
        out.push_str("| File | Kind | Traces to |\n|---|---|---|\n");
        for e in &self.entries {
            out.push_str(&format!("| {} | {} | {} |\n", e.file, e.kind, e.traces_to));
        }
        out.push('\n');

        out.push_str("## Traceability Matrix\n\n");
        out.push_str("| Requirement | Module | Contract | Behavior | Property |\n");
        out.push_str("|---|---|---|---|---|\n");
        for row in &self.matrix {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                row.requirement, row.module, row.contract, row.behavior, row.property
            ));
        }
        out.push('\n');

        out.push_str("## Generation Summary\n\n");
        out.push_str(&format!(
            "{} file(s) emitted, {} failure(s).\n",
            self.entries.len(),
            self.failures.len()
        ));
        for f in &self.failures {
            out.push_str(&format!("- {}: {}\n", f.module, f.reason));
        }
        out.push('\n');

        out
    }

    // -----------------------------------------------------------------------
    // Index parsing
    // -----------------------------------------------------------------------

    pub fn parse_index(path_hint: &str, slug: &str, content: &str) -> Result<Self> {
        let malformed = |reason: &str| PipelineError::MalformedDocument {
            path: path_hint.to_string(),
            reason: reason.to_string(),
        };

        let mut architecture_slug = None;
        let mut section = String::new();
        let mut entries = Vec::new();
        let mut matrix = Vec::new();
        let mut failures = Vec::new();

        for line in content.lines() {
            if let Some(rest) = line.strip_prefix("Architecture: ") {
                let path = rest.trim().trim_matches('`');
                let stem = path
                    .rsplit('/')
                    .next()
                    .and_then(|f| f.strip_suffix(".md"))
                    .unwrap_or(path);
                architecture_slug = Some(stem.to_string());
                continue;
            }
            if let Some(name) = line.strip_prefix("## ") {
                section = name.trim().to_string();
                continue;
            }

            match section.as_str() {
                "Files" => {
                    if let Some(cells) = table_cells(line, 3) {
                        if let Some(kind) = SpecKind::parse(&cells[1]) {
                            entries.push(SpecEntry {
                                file: cells[0].clone(),
                                kind,
                                traces_to: cells[2].clone(),
                            });
                        }
                    }
                }
                "Traceability Matrix" => {
                    if let Some(cells) = table_cells(line, 5) {
                        if cells[0].starts_with("FR-") {
                            matrix.push(MatrixRow {
                                requirement: cells[0].clone(),
                                module: cells[1].clone(),
                                contract: cells[2].clone(),
                                behavior: cells[3].clone(),
                                property: cells[4].clone(),
                            });
                        }
                    }
                }
                "Generation Summary" => {
                    if let Some(item) = line.strip_prefix("- ") {
                        if let Some((module, reason)) = item.split_once(": ") {
                            failures.push(GenerationFailure {
                                module: module.trim().to_string(),
                                reason: reason.trim().to_string(),
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        let architecture_slug =
            architecture_slug.ok_or_else(|| malformed("missing 'Architecture:' reference"))?;

        Ok(Self {
            slug: slug.to_string(),
            architecture_slug,
            entries,
            matrix,
            failures,
        })
    }
}

/// Split a markdown table row into exactly `n` trimmed cells; header and
/// separator rows are filtered by the callers.
fn table_cells(line: &str, n: usize) -> Option<Vec<String>> {
    let inner = line.trim().strip_prefix('|')?.strip_suffix('|')?;
    let cells: Vec<String> = inner.split('|').map(|c| c.trim().to_string()).collect();
    if cells.len() != n || cells.iter().all(|c| c.chars().all(|ch| ch == '-')) {
        return None;
    }
    Some(cells)
}

// ---------------------------------------------------------------------------
// Stub templates
// ---------------------------------------------------------------------------

fn contract_stub(slug: &str, module: &Module, class_name: &str, ops: &[OperationSketch]) -> String {
    let mut out = String::new();
    out.push_str(&format!("// Contract spec for module: {}\n", module.name));
    out.push_str(&format!("// Traces to: docs/architecture/{slug}.md\n\n"));
    out.push_str("import kotlin.test.Test\n\n");
    out.push_str(&format!("class {class_name} {{\n"));
    for op in ops {
        out.push_str(&format!(
            "\n    @Test\n    fun `{} succeeds on the happy path`() {{\n        TODO(\"{}: happy path\")\n    }}\n",
            op.name, op.summary
        ));
        out.push_str(&format!(
            "\n    @Test\n    fun `{} fails cleanly when preconditions are violated`() {{\n        TODO(\"{}: error path\")\n    }}\n",
            op.name, op.summary
        ));
    }
    out.push_str("}\n");
    out
}

fn behavior_stub(slug: &str, fr: &FunctionalRequirement, class_name: &str) -> String {
    format!(
        "// Behavior spec for {}\n\
         // Traces to: docs/requirements/{slug}.md\n\n\
         import kotlin.test.Test\n\n\
         class {class_name} {{\n\n    \
         @Test\n    \
         fun `{}`() {{\n        \
         TODO(\"{} acceptance\")\n    \
         }}\n\
         }}\n",
        fr.fr_id(),
        fr.acceptance.phrase(),
        fr.fr_id(),
    )
}

fn property_stub(slug: &str, module: &Module, class_name: &str) -> String {
    format!(
        "// Property spec for module: {}\n\
         // Traces to: docs/architecture/{slug}.md\n\n\
         import kotlin.random.Random\n\
         import kotlin.test.Test\n\n\
         class {class_name} {{\n\n    \
         // Seeded so generated cases replay deterministically.\n    \
         private val generator = Random(1729L)\n\n    \
         @Test\n    \
         fun `write then read returns the stored value`() {{\n        \
         TODO(\"{}: roundtrip over generator-driven values\")\n    \
         }}\n\n    \
         @Test\n    \
         fun `repeating an operation leaves state unchanged`() {{\n        \
         TODO(\"{}: idempotence\")\n    \
         }}\n\n    \
         @Test\n    \
         fun `invariants hold after any operation sequence`() {{\n        \
         TODO(\"{}: invariant\")\n    \
         }}\n\
         }}\n",
        module.name, module.name, module.name, module.name,
    )
}

// ---------------------------------------------------------------------------
// SpecificationStage
// ---------------------------------------------------------------------------

pub struct SpecificationStage<'a> {
    store: &'a DocStore,
    judgment: &'a dyn Judgment,
}

impl<'a> SpecificationStage<'a> {
    pub fn new(store: &'a DocStore, judgment: &'a dyn Judgment) -> Self {
        Self { store, judgment }
    }

    /// Emit the specification bundle for an architecture document.
    ///
    /// Best-effort: a module whose spec cannot be generated is logged and
    /// recorded in the summary while the rest of the bundle proceeds.
    /// Returns `Ok(None)` on a declined overwrite.
    pub fn specify(
        &self,
        slug: &str,
        interviewer: &mut dyn Interviewer,
    ) -> Result<Option<SpecificationBundle>> {
        crate::slug::validate(slug)?;

        let content = self.store.read_architecture(slug)?;
        let arch = ArchitectureDocument::parse(
            &self.store.architecture_path(slug).display().to_string(),
            slug,
            &content,
        )?;

        // Acceptance-criteria text comes from the originating requirements
        // document when it is still around.
        let req = match self.store.read_requirements(&arch.requirements_slug) {
            Ok(text) => Some(RequirementsDocument::parse(
                &self
                    .store
                    .requirements_path(&arch.requirements_slug)
                    .display()
                    .to_string(),
                &text,
            )?),
            Err(PipelineError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        if self.store.bundle_exists(slug) {
            let prompt = format!(
                "docs/specifications/{slug}/ already exists; regenerate the bundle?"
            );
            if !interviewer.confirm(&prompt)? {
                return Ok(None);
            }
        }

        let mut entries = Vec::new();
        let mut failures = Vec::new();

        // Contract + property specs, one module at a time.
        for module in &arch.modules {
            match self.specify_module(slug, &arch, req.as_ref(), module) {
                Ok(mut module_entries) => entries.append(&mut module_entries),
                Err(e) => {
                    tracing::warn!(module = %module.name, error = %e, "module spec generation failed");
                    failures.push(GenerationFailure {
                        module: module.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Behavior specs, one per acceptance criterion.
        let mut behavior_files: Vec<(String, String)> = Vec::new();
        if let Some(req) = &req {
            for fr in &req.functional {
                let mut class_name = format!("{}BehaviorSpec", naming::pascal_case(&fr.title));
                if behavior_files.iter().any(|(_, c)| *c == class_name) {
                    class_name = format!("{}{}BehaviorSpec", naming::pascal_case(&fr.title), fr.id);
                }
                let filename = format!("{class_name}.kt");
                self.store.write_bundle_file(
                    slug,
                    paths::BEHAVIORS_SUBDIR,
                    &filename,
                    &behavior_stub(&req.slug, fr, &class_name),
                )?;
                entries.push(SpecEntry {
                    file: format!("{}/{filename}", paths::BEHAVIORS_SUBDIR),
                    kind: SpecKind::Behavior,
                    traces_to: fr.fr_id(),
                });
                behavior_files.push((fr.fr_id(), class_name));
            }
        }

        let matrix = build_matrix(&arch, req.as_ref(), &entries, &behavior_files);

        let bundle = SpecificationBundle {
            slug: slug.to_string(),
            architecture_slug: arch.slug.clone(),
            entries,
            matrix,
            failures,
        };
        self.store.write_bundle_index(slug, &bundle.render_index())?;

        let mut pipeline = Pipeline::load_or_new(self.store.root(), slug, &arch.feature_name)?;
        pipeline.record_run(Stage::Specification);
        pipeline.save(self.store.root())?;

        Ok(Some(bundle))
    }

    fn specify_module(
        &self,
        slug: &str,
        arch: &ArchitectureDocument,
        req: Option<&RequirementsDocument>,
        module: &Module,
    ) -> Result<Vec<SpecEntry>> {
        let ident = naming::pascal_case(&module.name);
        if !ident.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            return Err(PipelineError::MalformedDocument {
                path: format!("docs/architecture/{slug}.md"),
                reason: format!("module '{}' yields no usable identifier", module.name),
            });
        }

        let frs = module_requirements(arch, req, module);
        let mut ops = self.judgment.infer_operations(module, &frs);
        if ops.is_empty() {
            ops.push(OperationSketch {
                name: naming::camel_case(&format!("use {ident}")),
                summary: "exercise the module interface".to_string(),
            });
        }

        let mut entries = Vec::new();

        let class_name = format!("{ident}ContractSpec");
        let filename = format!("{class_name}.kt");
        self.store.write_bundle_file(
            slug,
            SpecKind::Contract.subdir(),
            &filename,
            &contract_stub(slug, module, &class_name, &ops),
        )?;
        entries.push(SpecEntry {
            file: format!("{}/{filename}", SpecKind::Contract.subdir()),
            kind: SpecKind::Contract,
            traces_to: module.name.clone(),
        });

        if self.judgment.is_stateful(module) {
            let class_name = format!("{ident}PropertySpec");
            let filename = format!("{class_name}.kt");
            self.store.write_bundle_file(
                slug,
                SpecKind::Property.subdir(),
                &filename,
                &property_stub(slug, module, &class_name),
            )?;
            entries.push(SpecEntry {
                file: format!("{}/{filename}", SpecKind::Property.subdir()),
                kind: SpecKind::Property,
                traces_to: module.name.clone(),
            });
        }

        Ok(entries)
    }
}

/// Requirements the architecture assigns to `module`, in document order.
fn module_requirements<'r>(
    arch: &ArchitectureDocument,
    req: Option<&'r RequirementsDocument>,
    module: &Module,
) -> Vec<&'r FunctionalRequirement> {
    let Some(req) = req else {
        return Vec::new();
    };
    req.functional
        .iter()
        .filter(|fr| arch.modules_for(&fr.fr_id()).contains(&module.name))
        .collect()
}

fn build_matrix(
    arch: &ArchitectureDocument,
    req: Option<&RequirementsDocument>,
    entries: &[SpecEntry],
    behavior_files: &[(String, String)],
) -> Vec<MatrixRow> {
    let contract_for = |module: &str| -> String {
        entries
            .iter()
            .find(|e| e.kind == SpecKind::Contract && e.traces_to == module)
            .map(|e| filename_of(&e.file))
            .unwrap_or_else(|| NONE_CELL.to_string())
    };
    let property_for = |module: &str| -> String {
        entries
            .iter()
            .find(|e| e.kind == SpecKind::Property && e.traces_to == module)
            .map(|e| filename_of(&e.file))
            .unwrap_or_else(|| NONE_CELL.to_string())
    };
    let behavior_for = |fr_id: &str| -> String {
        behavior_files
            .iter()
            .find(|(id, _)| id == fr_id)
            .map(|(_, class)| format!("{class}.kt"))
            .unwrap_or_else(|| NONE_CELL.to_string())
    };

    let mut rows = Vec::new();
    let fr_ids: Vec<String> = match req {
        Some(req) => req.functional.iter().map(|fr| fr.fr_id()).collect(),
        None => arch.traceability.iter().map(|r| r.requirement.clone()).collect(),
    };

    for fr_id in fr_ids {
        let modules = arch.modules_for(&fr_id);
        if modules.is_empty() {
            rows.push(MatrixRow {
                requirement: fr_id.clone(),
                module: NONE_CELL.to_string(),
                contract: NONE_CELL.to_string(),
                behavior: behavior_for(&fr_id),
                property: NONE_CELL.to_string(),
            });
            continue;
        }
        for module in modules {
            rows.push(MatrixRow {
                requirement: fr_id.clone(),
                module: module.clone(),
                contract: contract_for(module),
                behavior: behavior_for(&fr_id),
                property: property_for(module),
            });
        }
    }
    rows
}

fn filename_of(rel_path: &str) -> String {
    rel_path.rsplit('/').next().unwrap_or(rel_path).to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::ArchitectureStage;
    use crate::config::Config;
    use crate::dialogue::Scripted;
    use crate::judgment::HeuristicJudgment;
    use crate::requirements::RequirementsStage;
    use tempfile::TempDir;

    fn run_upstream(store: &DocStore, description: &str) {
        let config = Config::new("test");
        let judgment = HeuristicJudgment;
        RequirementsStage::new(store, &config, &judgment)
            .refine("Audit Trail", description, &mut Scripted::new(vec![]))
            .unwrap()
            .unwrap();
        ArchitectureStage::new(store, &judgment)
            .design("audit-trail", &mut Scripted::new(vec![]))
            .unwrap()
            .unwrap();
    }

    const THREE_MODULE_DESC: &str =
        "Users must log in with a password. The system must store every action taken. \
         Users should export reports of recent activity.";

    #[test]
    fn specify_without_architecture_fails_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = DocStore::new(dir.path());
        let judgment = HeuristicJudgment;

        let err = SpecificationStage::new(&store, &judgment)
            .specify("ghost", &mut Scripted::new(vec![]))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::NotFound {
                stage: Stage::Architecture,
                ..
            }
        ));
        assert!(!dir.path().join("docs/specifications").exists());
    }

    #[test]
    fn three_modules_one_stateful_yields_expected_counts() {
        let dir = TempDir::new().unwrap();
        let store = DocStore::new(dir.path());
        run_upstream(&store, THREE_MODULE_DESC);

        let judgment = HeuristicJudgment;
        let bundle = SpecificationStage::new(&store, &judgment)
            .specify("audit-trail", &mut Scripted::new(vec![]))
            .unwrap()
            .unwrap();

        assert_eq!(bundle.files_of_kind(SpecKind::Contract).len(), 3);
        assert!(!bundle.files_of_kind(SpecKind::Behavior).is_empty());
        assert_eq!(bundle.files_of_kind(SpecKind::Property).len(), 1);

        assert_eq!(store.list_bundle_files("audit-trail", "contracts").unwrap().len(), 3);
        assert_eq!(store.list_bundle_files("audit-trail", "properties").unwrap().len(), 1);
        assert!(store.bundle_exists("audit-trail"));
    }

    #[test]
    fn matrix_covers_every_requirement() {
        let dir = TempDir::new().unwrap();
        let store = DocStore::new(dir.path());
        run_upstream(&store, THREE_MODULE_DESC);

        let judgment = HeuristicJudgment;
        let bundle = SpecificationStage::new(&store, &judgment)
            .specify("audit-trail", &mut Scripted::new(vec![]))
            .unwrap()
            .unwrap();

        let req_text = store.read_requirements("audit-trail").unwrap();
        let req = RequirementsDocument::parse("r.md", &req_text).unwrap();
        for fr in &req.functional {
            assert!(
                bundle.matrix.iter().any(|r| r.requirement == fr.fr_id()),
                "{} missing from matrix",
                fr.fr_id()
            );
        }

        // Index on disk carries the same matrix.
        let index = store.read_bundle_index("audit-trail").unwrap();
        for fr in &req.functional {
            assert!(index.contains(&fr.fr_id()));
        }
    }

    #[test]
    fn index_render_parse_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = DocStore::new(dir.path());
        run_upstream(&store, THREE_MODULE_DESC);

        let judgment = HeuristicJudgment;
        let bundle = SpecificationStage::new(&store, &judgment)
            .specify("audit-trail", &mut Scripted::new(vec![]))
            .unwrap()
            .unwrap();

        let parsed = SpecificationBundle::parse_index(
            "README.md",
            "audit-trail",
            &bundle.render_index(),
        )
        .unwrap();
        assert_eq!(parsed, bundle);
    }

    #[test]
    fn malformed_module_recorded_but_others_proceed() {
        let dir = TempDir::new().unwrap();
        let store = DocStore::new(dir.path());
        run_upstream(&store, "The system must store every action taken.");

        // Degrade one module entry by hand.
        let arch = store.read_architecture("audit-trail").unwrap();
        let arch = arch.replace("## Requirements Traceability", "### ??? (shallow)\n\n- Responsibility: none\n- Interface: none\n- Hidden complexity: none\n\n## Requirements Traceability");
        store.write_architecture("audit-trail", &arch).unwrap();

        let judgment = HeuristicJudgment;
        let bundle = SpecificationStage::new(&store, &judgment)
            .specify("audit-trail", &mut Scripted::new(vec![]))
            .unwrap()
            .unwrap();

        assert_eq!(bundle.failures.len(), 1);
        assert!(bundle.failures[0].reason.contains("no usable identifier"));
        assert!(!bundle.files_of_kind(SpecKind::Contract).is_empty());

        let index = store.read_bundle_index("audit-trail").unwrap();
        assert!(index.contains("1 failure(s)"));
    }

    #[test]
    fn behavior_stub_names_use_given_when_then() {
        let dir = TempDir::new().unwrap();
        let store = DocStore::new(dir.path());
        run_upstream(&store, "Users must export reports.");

        let judgment = HeuristicJudgment;
        SpecificationStage::new(&store, &judgment)
            .specify("audit-trail", &mut Scripted::new(vec![]))
            .unwrap()
            .unwrap();

        let behaviors = store.list_bundle_files("audit-trail", "behaviors").unwrap();
        assert_eq!(behaviors, vec!["ExportReportsBehaviorSpec.kt"]);
        let body = std::fs::read_to_string(
            store.bundle_dir("audit-trail").join("behaviors").join(&behaviors[0]),
        )
        .unwrap();
        assert!(body.contains("fun `given "));
        assert!(body.contains("TODO("));
    }

    #[test]
    fn declined_regeneration_leaves_bundle_untouched() {
        let dir = TempDir::new().unwrap();
        let store = DocStore::new(dir.path());
        run_upstream(&store, THREE_MODULE_DESC);

        let judgment = HeuristicJudgment;
        let stage = SpecificationStage::new(&store, &judgment);
        stage.specify("audit-trail", &mut Scripted::new(vec![])).unwrap();
        let original = store.read_bundle_index("audit-trail").unwrap();

        let outcome = stage
            .specify("audit-trail", &mut Scripted::new(vec![]).declining())
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(store.read_bundle_index("audit-trail").unwrap(), original);
    }
}
