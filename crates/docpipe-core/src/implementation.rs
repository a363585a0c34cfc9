use crate::architecture::{ArchitectureDocument, Module};
use crate::config::Config;
use crate::dialogue::Interviewer;
use crate::error::{PipelineError, Result};
use crate::judgment::{Judgment, OperationSketch};
use crate::naming;
use crate::pipeline::Pipeline;
use crate::requirements::RequirementsDocument;
use crate::specification::{SpecKind, SpecificationBundle};
use crate::store::DocStore;
use crate::types::Stage;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// ImplementationStub
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubKind {
    Interface,
    ValueType,
}

#[derive(Debug, Clone)]
pub struct ImplementationStub {
    pub path: PathBuf,
    pub type_name: String,
    pub kind: StubKind,
}

// ---------------------------------------------------------------------------
// Stub templates
// ---------------------------------------------------------------------------

fn interface_stub(package: &str, module: &Module, ops: &[OperationSketch]) -> String {
    let mut out = String::new();
    out.push_str(&format!("package {package}\n\n"));
    out.push_str("/**\n");
    out.push_str(&format!(" * {}\n", module.responsibility));
    out.push_str(" *\n");
    out.push_str(" * Purpose: TODO expand beyond the architecture one-liner.\n");
    out.push_str(" */\n");
    out.push_str(&format!("interface {} {{\n", naming::pascal_case(&module.name)));
    for op in ops {
        out.push_str("\n    /**\n");
        out.push_str(&format!("     * {}\n", op.summary));
        out.push_str("     *\n");
        out.push_str("     * Preconditions: TODO.\n");
        out.push_str("     * Postconditions: TODO.\n");
        out.push_str("     */\n");
        out.push_str(&format!("    fun {}()\n", op.name));
    }
    out.push_str("}\n");
    out
}

fn value_type_stub(package: &str, module: &Module, type_name: &str) -> String {
    format!(
        "package {package}\n\n\
         /**\n \
         * Immutable value handled by {}.\n \
         *\n \
         * Validation: TODO enforce invariants in init.\n \
         */\n\
         data class {type_name}(\n    \
         val id: String,\n\
         ) {{\n    \
         init {{\n        \
         // TODO: validate invariants\n    \
         }}\n\
         }}\n",
        module.name,
    )
}

// ---------------------------------------------------------------------------
// ImplementationStage
// ---------------------------------------------------------------------------

pub struct ImplementationStage<'a> {
    store: &'a DocStore,
    config: &'a Config,
    judgment: &'a dyn Judgment,
}

impl<'a> ImplementationStage<'a> {
    pub fn new(store: &'a DocStore, config: &'a Config, judgment: &'a dyn Judgment) -> Self {
        Self {
            store,
            config,
            judgment,
        }
    }

    /// Emit source stubs for the types and interfaces a specification bundle
    /// names: one interface per contract, one value type per property spec.
    /// Pure scaffolding; returns `Ok(None)` on a declined overwrite.
    pub fn implement(
        &self,
        slug: &str,
        interviewer: &mut dyn Interviewer,
    ) -> Result<Option<Vec<ImplementationStub>>> {
        crate::slug::validate(slug)?;

        let index = self.store.read_bundle_index(slug)?;
        let bundle = SpecificationBundle::parse_index(
            &crate::paths::bundle_index(self.store.root(), slug)
                .display()
                .to_string(),
            slug,
            &index,
        )?;

        let arch_text = self.store.read_architecture(&bundle.architecture_slug)?;
        let arch = ArchitectureDocument::parse(
            &self
                .store
                .architecture_path(&bundle.architecture_slug)
                .display()
                .to_string(),
            &bundle.architecture_slug,
            &arch_text,
        )?;

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

        let package = &self.config.implementation.package;
        let source_root = &self.config.implementation.source_root;

        // Plan the full stub set first so the overwrite prompt can name it.
        let mut planned: Vec<(String, StubKind, &Module)> = Vec::new();
        for entry in bundle.files_of_kind(SpecKind::Contract) {
            if let Some(module) = arch.module(&entry.traces_to) {
                planned.push((naming::pascal_case(&module.name), StubKind::Interface, module));
            }
        }
        for entry in bundle.files_of_kind(SpecKind::Property) {
            if let Some(module) = arch.module(&entry.traces_to) {
                planned.push((
                    format!("{}Record", naming::pascal_case(&module.name)),
                    StubKind::ValueType,
                    module,
                ));
            }
        }

        let existing: Vec<&str> = planned
            .iter()
            .filter(|(name, _, _)| {
                self.store
                    .source_stub_exists(source_root, package, &format!("{name}.kt"))
            })
            .map(|(name, _, _)| name.as_str())
            .collect();
        if !existing.is_empty() {
            let prompt = format!(
                "{} source stub(s) already exist ({}); overwrite them?",
                existing.len(),
                existing.join(", ")
            );
            if !interviewer.confirm(&prompt)? {
                return Ok(None);
            }
        }

        let mut stubs = Vec::new();
        for (type_name, kind, module) in planned {
            let content = match kind {
                StubKind::Interface => {
                    let frs = req
                        .as_ref()
                        .map(|r| {
                            r.functional
                                .iter()
                                .filter(|fr| arch.modules_for(&fr.fr_id()).contains(&module.name))
                                .collect::<Vec<_>>()
                        })
                        .unwrap_or_default();
                    let mut ops = self.judgment.infer_operations(module, &frs);
                    if ops.is_empty() {
                        ops.push(OperationSketch {
                            name: naming::camel_case(&format!("use {type_name}")),
                            summary: "exercise the module interface".to_string(),
                        });
                    }
                    interface_stub(package, module, &ops)
                }
                StubKind::ValueType => value_type_stub(package, module, &type_name),
            };
            let path =
                self.store
                    .write_source_stub(source_root, package, &format!("{type_name}.kt"), &content)?;
            stubs.push(ImplementationStub {
                path,
                type_name,
                kind,
            });
        }

        let mut pipeline = Pipeline::load_or_new(self.store.root(), slug, &arch.feature_name)?;
        pipeline.record_run(Stage::Implementation);
        pipeline.save(self.store.root())?;

        Ok(Some(stubs))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
