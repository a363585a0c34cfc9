use crate::dialogue::Interviewer;
use crate::error::{PipelineError, Result};
use crate::judgment::Judgment;
use crate::pipeline::Pipeline;
use crate::requirements::RequirementsDocument;
use crate::store::DocStore;
use crate::types::{Depth, Stage};

// ---------------------------------------------------------------------------
// Module
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Unique within the document.
    pub name: String,
    pub responsibility: String,
    pub interface: String,
    pub hidden_complexity: String,
    pub depth: Depth,
}

// ---------------------------------------------------------------------------
// TraceRow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRow {
    /// `FR-<n>` identifier.
    pub requirement: String,
    pub modules: Vec<String>,
}

// ---------------------------------------------------------------------------
// ArchitectureDocument
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchitectureDocument {
    pub slug: String,
    pub feature_name: String,
    /// Slug of the requirements document this design answers.
    pub requirements_slug: String,
    pub modules: Vec<Module>,
    pub traceability: Vec<TraceRow>,
}

impl ArchitectureDocument {
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Modules listed for a requirement id, in document order.
    pub fn modules_for(&self, fr_id: &str) -> &[String] {
        self.traceability
            .iter()
            .find(|r| r.requirement == fr_id)
            .map(|r| r.modules.as_slice())
            .unwrap_or(&[])
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# Architecture: {}\n\n", self.feature_name));
        out.push_str(&format!(
            "Requirements: `docs/requirements/{}.md`\n\n",
            self.requirements_slug
        ));

        out.push_str("## Modules\n\n");
        for m in &self.modules {
            out.push_str(&format!("### {} ({})\n\n", m.name, m.depth));
            out.push_str(&format!("- Responsibility: {}\n", m.responsibility));
            out.push_str(&format!("- Interface: {}\n", m.interface));
            out.push_str(&format!("- Hidden complexity: {}\n\n", m.hidden_complexity));
        }

        out.push_str("## Requirements Traceability\n\n");
        out.push_str("| Requirement | Modules |\n|---|---|\n");
        for row in &self.traceability {
            out.push_str(&format!(
                "| {} | {} |\n",
                row.requirement,
                row.modules.join(", ")
            ));
        }
        out.push('\n');

        out
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    pub fn parse(path_hint: &str, slug: &str, content: &str) -> Result<Self> {
        let malformed = |reason: &str| PipelineError::MalformedDocument {
            path: path_hint.to_string(),
            reason: reason.to_string(),
        };

        let mut feature_name = None;
        let mut requirements_slug = None;
        let mut section = String::new();
        let mut modules: Vec<Module> = Vec::new();
        let mut traceability: Vec<TraceRow> = Vec::new();

        for line in content.lines() {
            if let Some(rest) = line.strip_prefix("# Architecture: ") {
                feature_name = Some(rest.trim().to_string());
                continue;
            }
            if let Some(rest) = line.strip_prefix("Requirements: ") {
                let path = rest.trim().trim_matches('`');
                let stem = path
                    .rsplit('/')
                    .next()
                    .and_then(|f| f.strip_suffix(".md"))
                    .unwrap_or(path);
                requirements_slug = Some(stem.to_string());
                continue;
            }
            if let Some(name) = line.strip_prefix("## ") {
                section = name.trim().to_string();
                continue;
            }

            match section.as_str() {
                "Modules" => {
                    if let Some(header) = line.strip_prefix("### ") {
                        modules.push(parse_module_header(header).ok_or_else(|| {
                            malformed(&format!("unparseable module header: {line}"))
                        })?);
                    } else if let Some(m) = modules.last_mut() {
                        if let Some(v) = line.strip_prefix("- Responsibility: ") {
                            m.responsibility = v.trim().to_string();
                        } else if let Some(v) = line.strip_prefix("- Interface: ") {
                            m.interface = v.trim().to_string();
                        } else if let Some(v) = line.strip_prefix("- Hidden complexity: ") {
                            m.hidden_complexity = v.trim().to_string();
                        }
                    }
                }
                "Requirements Traceability" => {
                    if let Some(row) = parse_trace_row(line) {
                        traceability.push(row);
                    }
                }
                _ => {}
            }
        }

        let feature_name =
            feature_name.ok_or_else(|| malformed("missing '# Architecture:' title"))?;
        let requirements_slug =
            requirements_slug.ok_or_else(|| malformed("missing 'Requirements:' reference"))?;
        if modules.is_empty() {
            return Err(malformed("no modules found"));
        }

        Ok(Self {
            slug: slug.to_string(),
            feature_name,
            requirements_slug,
            modules,
            traceability,
        })
    }
}

/// Parse `<Name> (<depth>)` from a `### ` header remainder.
fn parse_module_header(rest: &str) -> Option<Module> {
    let open = rest.rfind('(')?;
    let name = rest[..open].trim().to_string();
    let depth = Depth::parse(rest[open + 1..].trim_end().trim_end_matches(')'))?;
    if name.is_empty() {
        return None;
    }
    Some(Module {
        name,
        responsibility: String::new(),
        interface: String::new(),
        hidden_complexity: String::new(),
        depth,
    })
}

/// Parse `| FR-1 | Storage, Interface |`; header and separator rows yield None.
fn parse_trace_row(line: &str) -> Option<TraceRow> {
    let line = line.trim();
    let inner = line.strip_prefix('|')?.strip_suffix('|')?;
    let mut cells = inner.split('|').map(str::trim);
    let requirement = cells.next()?.to_string();
    let modules_cell = cells.next()?.to_string();
    if !requirement.starts_with("FR-") {
        return None;
    }
    Some(TraceRow {
        requirement,
        modules: modules_cell
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

// ---------------------------------------------------------------------------
// ArchitectureStage
// ---------------------------------------------------------------------------

pub struct ArchitectureStage<'a> {
    store: &'a DocStore,
    judgment: &'a dyn Judgment,
}

impl<'a> ArchitectureStage<'a> {
    pub fn new(store: &'a DocStore, judgment: &'a dyn Judgment) -> Self {
        Self { store, judgment }
    }

    /// Design an architecture from an existing requirements document.
    ///
    /// Fails with `NotFound` (and writes nothing) when the requirements
    /// document is absent. Returns `Ok(None)` on a declined overwrite.
    pub fn design(
        &self,
        slug: &str,
        interviewer: &mut dyn Interviewer,
    ) -> Result<Option<ArchitectureDocument>> {
        crate::slug::validate(slug)?;

        let content = self.store.read_requirements(slug)?;
        let req = RequirementsDocument::parse(
            &self.store.requirements_path(slug).display().to_string(),
            &content,
        )?;

        let sketches = self.judgment.group_modules(&req);
        let modules: Vec<Module> = sketches
            .iter()
            .map(|s| Module {
                name: s.name.clone(),
                responsibility: s.responsibility.clone(),
                interface: s.interface.clone(),
                hidden_complexity: s.hidden_complexity.clone(),
                depth: self.judgment.classify_depth(s),
            })
            .collect();

        let traceability = req
            .functional
            .iter()
            .map(|fr| TraceRow {
                requirement: fr.fr_id(),
                modules: sketches
                    .iter()
                    .filter(|s| s.fr_ids.contains(&fr.id))
                    .map(|s| s.name.clone())
                    .collect(),
            })
            .collect();

        let doc = ArchitectureDocument {
            slug: slug.to_string(),
            feature_name: req.feature_name.clone(),
            requirements_slug: req.slug.clone(),
            modules,
            traceability,
        };

        if self.store.architecture_exists(slug) {
            let prompt = format!(
                "docs/architecture/{slug}.md already exists; replace it with {} module(s)?",
                doc.modules.len()
            );
            if !interviewer.confirm(&prompt)? {
                return Ok(None);
            }
        }

        self.store.write_architecture(slug, &doc.render())?;

        let mut pipeline = Pipeline::load_or_new(self.store.root(), slug, &req.feature_name)?;
        pipeline.record_run(Stage::Architecture);
        pipeline.save(self.store.root())?;

        Ok(Some(doc))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
