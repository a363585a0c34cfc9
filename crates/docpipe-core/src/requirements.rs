use crate::config::Config;
use crate::dialogue::{Answer, Interviewer};
use crate::error::{PipelineError, Result};
use crate::judgment::Judgment;
use crate::pipeline::Pipeline;
use crate::slug;
use crate::store::DocStore;
use crate::types::{Priority, Stage};

// ---------------------------------------------------------------------------
// Acceptance
// ---------------------------------------------------------------------------

/// Given/when/then phrasing of one acceptance criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acceptance {
    pub given: String,
    pub when: String,
    pub then: String,
}

impl Acceptance {
    pub fn phrase(&self) -> String {
        format!(
            "given {}, when {}, then {}",
            self.given, self.when, self.then
        )
    }
}

// ---------------------------------------------------------------------------
// FunctionalRequirement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionalRequirement {
    /// Numeric part of the `FR-<n>` identifier; unique and ascending.
    pub id: u32,
    pub title: String,
    pub description: String,
    pub acceptance: Acceptance,
    pub priority: Priority,
}

impl FunctionalRequirement {
    pub fn fr_id(&self) -> String {
        format!("FR-{}", self.id)
    }
}

// ---------------------------------------------------------------------------
// RequirementsDocument
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementsDocument {
    pub slug: String,
    pub feature_name: String,
    pub overview: String,
    pub functional: Vec<FunctionalRequirement>,
    pub non_functional: Vec<String>,
    pub constraints: Vec<String>,
    pub assumptions: Vec<String>,
    pub open_questions: Vec<String>,
}

impl RequirementsDocument {
    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# Requirements: {}\n\n", self.feature_name));
        out.push_str(&format!("Slug: `{}`\n\n", self.slug));

        out.push_str("## Overview\n\n");
        out.push_str(self.overview.trim());
        out.push_str("\n\n");

        out.push_str("## Functional Requirements\n\n");
        for fr in &self.functional {
            out.push_str(&format!(
                "### {}: {} ({})\n\n",
                fr.fr_id(),
                fr.title,
                fr.priority
            ));
            out.push_str(fr.description.trim());
            out.push_str("\n\n");
            out.push_str(&format!("Acceptance: {}.\n\n", fr.acceptance.phrase()));
        }

        render_bullet_section(&mut out, "Non-Functional Requirements", &self.non_functional);
        render_bullet_section(&mut out, "Constraints", &self.constraints);
        render_bullet_section(&mut out, "Assumptions", &self.assumptions);
        render_bullet_section(&mut out, "Open Questions", &self.open_questions);

        out
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    pub fn parse(path_hint: &str, content: &str) -> Result<Self> {
        let malformed = |reason: &str| PipelineError::MalformedDocument {
            path: path_hint.to_string(),
            reason: reason.to_string(),
        };

        let mut feature_name = None;
        let mut slug = None;
        let mut section = String::new();
        let mut overview = String::new();
        let mut functional: Vec<FunctionalRequirement> = Vec::new();
        let mut non_functional = Vec::new();
        let mut constraints = Vec::new();
        let mut assumptions = Vec::new();
        let mut open_questions = Vec::new();

        for line in content.lines() {
            if let Some(rest) = line.strip_prefix("# Requirements: ") {
                feature_name = Some(rest.trim().to_string());
                continue;
            }
            if let Some(rest) = line.strip_prefix("Slug: ") {
                slug = Some(rest.trim().trim_matches('`').to_string());
                continue;
            }
            if let Some(name) = line.strip_prefix("## ") {
                section = name.trim().to_string();
                continue;
            }

            match section.as_str() {
                "Overview" => {
                    if !line.trim().is_empty() {
                        if !overview.is_empty() {
                            overview.push(' ');
                        }
                        overview.push_str(line.trim());
                    }
                }
                "Functional Requirements" => {
                    if let Some(header) = line.strip_prefix("### FR-") {
                        functional.push(parse_fr_header(header).ok_or_else(|| {
                            malformed(&format!("unparseable requirement header: {line}"))
                        })?);
                    } else if let Some(acc) = line.strip_prefix("Acceptance: ") {
                        let fr = functional
                            .last_mut()
                            .ok_or_else(|| malformed("acceptance line before any requirement"))?;
                        fr.acceptance = parse_acceptance(acc);
                    } else if !line.trim().is_empty() {
                        if let Some(fr) = functional.last_mut() {
                            if !fr.description.is_empty() {
                                fr.description.push(' ');
                            }
                            fr.description.push_str(line.trim());
                        }
                    }
                }
                "Non-Functional Requirements" => push_bullet(&mut non_functional, line),
                "Constraints" => push_bullet(&mut constraints, line),
                "Assumptions" => push_bullet(&mut assumptions, line),
                "Open Questions" => push_bullet(&mut open_questions, line),
                _ => {}
            }
        }

        let feature_name = feature_name.ok_or_else(|| malformed("missing '# Requirements:' title"))?;
        let slug = slug.ok_or_else(|| malformed("missing 'Slug:' line"))?;
        if functional.is_empty() {
            return Err(malformed("no functional requirements found"));
        }

        Ok(Self {
            slug,
            feature_name,
            overview,
            functional,
            non_functional,
            constraints,
            assumptions,
            open_questions,
        })
    }
}

fn render_bullet_section(out: &mut String, title: &str, items: &[String]) {
    out.push_str(&format!("## {title}\n\n"));
    if items.is_empty() {
        out.push_str("None recorded.\n\n");
    } else {
        for item in items {
            out.push_str(&format!("- {item}\n"));
        }
        out.push('\n');
    }
}

fn push_bullet(items: &mut Vec<String>, line: &str) {
    if let Some(item) = line.strip_prefix("- ") {
        items.push(item.trim().to_string());
    }
}

/// Parse `<n>: <title> (<priority>)` from a `### FR-` header remainder.
fn parse_fr_header(rest: &str) -> Option<FunctionalRequirement> {
    let (id_str, rest) = rest.split_once(": ")?;
    let id: u32 = id_str.trim().parse().ok()?;
    let open = rest.rfind('(')?;
    let title = rest[..open].trim().to_string();
    let priority = Priority::parse(rest[open + 1..].trim_end().trim_end_matches(')'))?;
    Some(FunctionalRequirement {
        id,
        title,
        description: String::new(),
        acceptance: Acceptance {
            given: String::new(),
            when: String::new(),
            then: String::new(),
        },
        priority,
    })
}

/// Parse `given X, when Y, then Z.` — tolerant of hand-edited phrasing.
fn parse_acceptance(text: &str) -> Acceptance {
    let text = text.trim().trim_end_matches('.');
    let parsed = text.strip_prefix("given ").and_then(|rest| {
        let (given, rest) = rest.split_once(", when ")?;
        let (when, then) = rest.split_once(", then ")?;
        Some(Acceptance {
            given: given.to_string(),
            when: when.to_string(),
            then: then.to_string(),
        })
    });
    parsed.unwrap_or_else(|| Acceptance {
        given: "the documented preconditions hold".to_string(),
        when: text.to_string(),
        then: "the documented outcome is observed".to_string(),
    })
}

// ---------------------------------------------------------------------------
// RequirementsStage
// ---------------------------------------------------------------------------

pub struct RequirementsStage<'a> {
    store: &'a DocStore,
    config: &'a Config,
    judgment: &'a dyn Judgment,
}

impl<'a> RequirementsStage<'a> {
    pub fn new(store: &'a DocStore, config: &'a Config, judgment: &'a dyn Judgment) -> Self {
        Self {
            store,
            config,
            judgment,
        }
    }

    /// Refine an informal feature description into a requirements document.
    ///
    /// Returns `Ok(None)` when a document already exists and the user
    /// declines the overwrite — nothing is written in that case.
    pub fn refine(
        &self,
        feature_name: &str,
        description: &str,
        interviewer: &mut dyn Interviewer,
    ) -> Result<Option<RequirementsDocument>> {
        let slug = slug::derive(feature_name)?;

        let candidates = self.judgment.extract_requirements(description);
        let mut questions = self.judgment.clarifying_questions(description, &candidates);
        questions.truncate(self.config.questions.max_clarifying);
        let answers = interviewer.ask(&questions)?;

        let mut assumptions = Vec::new();
        let mut open_questions = Vec::new();
        for (question, answer) in questions.iter().zip(&answers) {
            match answer {
                Answer::Text(text) => assumptions.push(format!("{} — {}", question.prompt, text)),
                Answer::Skipped => open_questions.push(question.prompt.clone()),
            }
        }

        let functional = candidates
            .into_iter()
            .enumerate()
            .map(|(i, c)| FunctionalRequirement {
                id: i as u32 + 1,
                title: c.title,
                description: c.description,
                acceptance: c.acceptance,
                priority: c.priority,
            })
            .collect::<Vec<_>>();

        let doc = RequirementsDocument {
            slug: slug.clone(),
            feature_name: feature_name.trim().to_string(),
            overview: description.trim().to_string(),
            functional,
            non_functional: Vec::new(),
            constraints: Vec::new(),
            assumptions,
            open_questions,
        };

        if self.store.requirements_exists(&slug) {
            let prompt = format!(
                "docs/requirements/{slug}.md already exists; replace it with {} requirement(s)?",
                doc.functional.len()
            );
            if !interviewer.confirm(&prompt)? {
                return Ok(None);
            }
        }

        self.store.write_requirements(&slug, &doc.render())?;

        let mut pipeline = Pipeline::load_or_new(self.store.root(), &slug, feature_name)?;
        pipeline.record_run(Stage::Requirements);
        pipeline.save(self.store.root())?;

        Ok(Some(doc))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
