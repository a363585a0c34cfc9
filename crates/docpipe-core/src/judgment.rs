use crate::architecture::Module;
use crate::dialogue::Question;
use crate::naming;
use crate::requirements::{Acceptance, FunctionalRequirement, RequirementsDocument};
use crate::types::{Depth, Priority};

// ---------------------------------------------------------------------------
// Sketches (judgment output)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CandidateRequirement {
    pub title: String,
    pub description: String,
    pub acceptance: Acceptance,
    pub priority: Priority,
}

#[derive(Debug, Clone)]
pub struct ModuleSketch {
    pub name: String,
    pub responsibility: String,
    pub interface: String,
    pub hidden_complexity: String,
    /// FR ids this module is responsible for.
    pub fr_ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSketch {
    /// camelCase operation name used in contract specs and interface stubs.
    pub name: String,
    pub summary: String,
}

// ---------------------------------------------------------------------------
// Judgment
// ---------------------------------------------------------------------------

/// Capability interface for the steps that are editorial judgment rather
/// than algorithm: extracting requirements from prose, grouping them into
/// modules, classifying depth. The pipeline scaffolding is written against
/// this trait so deployments can swap in a human-in-the-loop or model-backed
/// implementation; `HeuristicJudgment` is the deterministic rule-based one
/// used by default and by the tests.
pub trait Judgment {
    fn extract_requirements(&self, description: &str) -> Vec<CandidateRequirement>;

    fn clarifying_questions(
        &self,
        description: &str,
        candidates: &[CandidateRequirement],
    ) -> Vec<Question>;

    fn group_modules(&self, doc: &RequirementsDocument) -> Vec<ModuleSketch>;

    fn classify_depth(&self, sketch: &ModuleSketch) -> Depth;

    fn infer_operations(
        &self,
        module: &Module,
        frs: &[&FunctionalRequirement],
    ) -> Vec<OperationSketch>;

    fn is_stateful(&self, module: &Module) -> bool;
}

// ---------------------------------------------------------------------------
// HeuristicJudgment
// ---------------------------------------------------------------------------

/// Keyword-table heuristics, evaluated first-match in table order.
#[derive(Default)]
pub struct HeuristicJudgment;

/// Modal markers that make a sentence a requirement candidate.
const MODALS: &[(&str, Priority)] = &[
    ("must", Priority::MustHave),
    ("shall", Priority::MustHave),
    ("required", Priority::MustHave),
    ("needs", Priority::MustHave),
    ("need", Priority::MustHave),
    ("should", Priority::ShouldHave),
    ("may", Priority::NiceToHave),
    ("can", Priority::NiceToHave),
    ("could", Priority::NiceToHave),
    ("optionally", Priority::NiceToHave),
];

/// Filler words stripped from the front of a derived title.
const TITLE_FILLERS: &[&str] = &["be", "able", "to", "a", "an", "the", "also"];

struct Bucket {
    name: &'static str,
    keywords: &'static [&'static str],
    responsibility: &'static str,
    hidden_complexity: &'static str,
}

/// Responsibility buckets, first match wins. The final fallback bucket is
/// the feature itself (see `group_modules`).
const BUCKETS: &[Bucket] = &[
    Bucket {
        name: "Storage",
        keywords: &[
            "store", "persist", "save", "record", "database", "count", "track", "history",
            "retain", "remember",
        ],
        responsibility: "Persists and retrieves {feature} data.",
        hidden_complexity: "Storage layout, durability, and consistency of persisted state.",
    },
    Bucket {
        name: "AccessControl",
        keywords: &[
            "login", "log", "auth", "credential", "password", "permission", "role", "session",
        ],
        responsibility: "Authenticates callers and guards access to {feature}.",
        hidden_complexity: "Credential handling and session lifetime.",
    },
    Bucket {
        name: "Interface",
        keywords: &[
            "display", "show", "view", "render", "report", "export", "list", "screen", "page",
            "print",
        ],
        responsibility: "Presents {feature} results to the user.",
        hidden_complexity: "Formatting rules and presentation edge cases.",
    },
    Bucket {
        name: "Integration",
        keywords: &[
            "email", "notify", "send", "api", "webhook", "sync", "import", "external", "publish",
        ],
        responsibility: "Exchanges {feature} data with external systems.",
        hidden_complexity: "Delivery failures and retries at the integration boundary.",
    },
    Bucket {
        name: "Validation",
        keywords: &["validate", "verify", "check", "reject", "sanitize"],
        responsibility: "Validates {feature} input before it reaches the core.",
        hidden_complexity: "The full space of malformed input.",
    },
];

/// Markers of hidden complexity that make a module deep.
const DEEP_MARKERS: &[&str] = &[
    "persist",
    "storage",
    "durab",
    "consistency",
    "credential",
    "protocol",
    "pars",
    "concurren",
    "crypt",
];

/// A module whose responsibility mentions these is treated as stateful and
/// gets a property spec.
const STATEFUL_MARKERS: &[&str] = &[
    "persist", "storage", "store", "count", "database", "record", "history",
];

/// Verbs recognized when deriving operation names from requirement titles.
const OPERATION_VERBS: &[&str] = &[
    "create", "add", "register", "store", "save", "persist", "update", "edit", "modify", "delete",
    "remove", "list", "show", "display", "view", "export", "import", "validate", "verify", "send",
    "notify", "search", "find", "track", "count", "log", "lock", "sync", "publish", "retrieve",
    "load", "fetch",
];

const OBJECT_STOPWORDS: &[&str] = &[
    "the", "a", "an", "with", "and", "for", "to", "of", "in", "on", "all", "any", "their", "its",
];

fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_ascii_alphanumeric())
                .to_ascii_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lc = haystack.to_ascii_lowercase();
    needles.iter().any(|n| lc.contains(n))
}

fn split_sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?', ';', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Title = the words following the modal marker, minus leading fillers.
fn derive_title(sentence: &str, modal: &str) -> String {
    let ws = words(sentence);
    let start = ws.iter().position(|w| w == modal).map(|i| i + 1).unwrap_or(0);
    let mut rest: &[String] = &ws[start..];
    while let Some(first) = rest.first() {
        if TITLE_FILLERS.contains(&first.as_str()) {
            rest = &rest[1..];
        } else {
            break;
        }
    }
    if rest.is_empty() {
        rest = &ws;
    }
    rest.iter()
        .take(8)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Judgment for HeuristicJudgment {
    fn extract_requirements(&self, description: &str) -> Vec<CandidateRequirement> {
        let mut candidates = Vec::new();
        for sentence in split_sentences(description) {
            let ws = words(&sentence);
            let hit = MODALS
                .iter()
                .find(|(modal, _)| ws.iter().any(|w| w == modal));
            if let Some((modal, priority)) = hit {
                let title = derive_title(&sentence, modal);
                candidates.push(CandidateRequirement {
                    acceptance: acceptance_for(&title),
                    title,
                    description: sentence,
                    priority: *priority,
                });
            }
        }

        if candidates.is_empty() {
            let title = words(description)
                .into_iter()
                .take(8)
                .collect::<Vec<_>>()
                .join(" ");
            let title = if title.is_empty() {
                "deliver the described behavior".to_string()
            } else {
                title
            };
            candidates.push(CandidateRequirement {
                acceptance: acceptance_for(&title),
                title,
                description: description.trim().to_string(),
                priority: Priority::MustHave,
            });
        }

        candidates
    }

    fn clarifying_questions(
        &self,
        description: &str,
        candidates: &[CandidateRequirement],
    ) -> Vec<Question> {
        let mut questions = vec![Question::open("Who is the primary user of this feature?")];

        if !contains_any(description, &["fail", "error", "invalid"]) {
            questions.push(Question::open(
                "What should happen when an operation fails partway through?",
            ));
        }
        if !contains_any(description, &["store", "persist", "save", "database", "record"]) {
            questions.push(Question::choice(
                "Does any data need to survive a restart?",
                vec!["yes".to_string(), "no".to_string()],
            ));
        }
        if !contains_any(description, &["fast", "performance", "latency", "second"]) {
            questions.push(Question::open(
                "Are there performance constraints worth recording?",
            ));
        }
        if candidates.len() > 1 {
            questions.push(Question::open(
                "What is explicitly out of scope for the first iteration?",
            ));
        }

        questions
    }

    fn group_modules(&self, doc: &RequirementsDocument) -> Vec<ModuleSketch> {
        let feature = naming::title_from_slug(&doc.slug);
        let mut sketches: Vec<ModuleSketch> = Vec::new();
        let mut core_fr_ids = Vec::new();

        for fr in &doc.functional {
            let text = format!("{} {}", fr.title, fr.description);
            let bucket = BUCKETS.iter().find(|b| {
                let ws = words(&text);
                b.keywords.iter().any(|k| ws.iter().any(|w| w == k))
            });
            match bucket {
                Some(b) => match sketches.iter_mut().find(|s| s.name == b.name) {
                    Some(existing) => existing.fr_ids.push(fr.id),
                    None => sketches.push(ModuleSketch {
                        name: b.name.to_string(),
                        responsibility: b.responsibility.replace("{feature}", &feature),
                        interface: String::new(),
                        hidden_complexity: b.hidden_complexity.to_string(),
                        fr_ids: vec![fr.id],
                    }),
                },
                None => core_fr_ids.push(fr.id),
            }
        }

        if !core_fr_ids.is_empty() || sketches.is_empty() {
            let mut name = naming::pascal_case(&doc.slug);
            if sketches.iter().any(|s| s.name == name) {
                name.push_str("Core");
            }
            sketches.push(ModuleSketch {
                name,
                responsibility: format!("Coordinates the core behavior of {feature}."),
                interface: String::new(),
                hidden_complexity: format!("Rules and edge cases of {feature} behavior."),
                fr_ids: core_fr_ids,
            });
        }

        // Interface summary names the requirements the module answers for.
        for sketch in &mut sketches {
            let ids: Vec<String> = sketch.fr_ids.iter().map(|id| format!("FR-{id}")).collect();
            sketch.interface = if ids.is_empty() {
                "Entry point for the feature; no requirement mapped yet.".to_string()
            } else {
                format!("Operations covering {}.", ids.join(", "))
            };
        }

        sketches
    }

    fn classify_depth(&self, sketch: &ModuleSketch) -> Depth {
        let text = format!("{} {}", sketch.responsibility, sketch.hidden_complexity);
        if contains_any(&text, DEEP_MARKERS) {
            Depth::Deep
        } else if sketch.fr_ids.len() <= 1 {
            Depth::Shallow
        } else {
            Depth::Medium
        }
    }

    fn infer_operations(
        &self,
        module: &Module,
        frs: &[&FunctionalRequirement],
    ) -> Vec<OperationSketch> {
        let mut ops: Vec<OperationSketch> = Vec::new();
        for fr in frs {
            let ws = words(&fr.title);
            let verb_pos = ws.iter().position(|w| OPERATION_VERBS.contains(&w.as_str()));

            let name = match verb_pos {
                Some(i) => {
                    let mut verb = ws[i].clone();
                    let mut rest = &ws[i + 1..];
                    // "log in" reads as a single verb
                    if verb == "log" && rest.first().map(String::as_str) == Some("in") {
                        verb = "login".to_string();
                        rest = &rest[1..];
                    }
                    let object = rest
                        .iter()
                        .find(|w| w.len() > 2 && !OBJECT_STOPWORDS.contains(&w.as_str()));
                    match object {
                        Some(obj) => naming::camel_case(&format!("{verb} {obj}")),
                        None => naming::camel_case(&verb),
                    }
                }
                None => {
                    let head: Vec<&str> = ws.iter().take(2).map(String::as_str).collect();
                    if head.is_empty() {
                        format!("handle{}", naming::pascal_case(&module.name))
                    } else {
                        naming::camel_case(&head.join(" "))
                    }
                }
            };

            // Keep names unique within the module.
            let name = if ops.iter().any(|o| o.name == name) {
                format!("{name}{}", fr.id)
            } else {
                name
            };

            ops.push(OperationSketch {
                name,
                summary: fr.title.clone(),
            });
        }
        ops
    }

    fn is_stateful(&self, module: &Module) -> bool {
        let text = format!("{} {}", module.responsibility, module.hidden_complexity);
        contains_any(&text, STATEFUL_MARKERS)
    }
}

fn acceptance_for(title: &str) -> Acceptance {
    Acceptance {
        given: "a correctly configured system".to_string(),
        when: format!("{title} is attempted"),
        then: format!("{title} completes as described"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(frs: Vec<(&str, &str)>) -> RequirementsDocument {
        RequirementsDocument {
            slug: "sample".to_string(),
            feature_name: "Sample".to_string(),
            overview: String::new(),
            functional: frs
                .into_iter()
                .enumerate()
                .map(|(i, (title, desc))| FunctionalRequirement {
                    id: i as u32 + 1,
                    title: title.to_string(),
                    description: desc.to_string(),
                    acceptance: acceptance_for(title),
                    priority: Priority::MustHave,
                })
                .collect(),
            non_functional: vec![],
            constraints: vec![],
            assumptions: vec![],
            open_questions: vec![],
        }
    }

    #[test]
    fn extracts_one_candidate_per_modal_sentence() {
        let h = HeuristicJudgment;
        let cands = h.extract_requirements(
            "Users must log in with a password. The system should lock accounts after failures. This sentence is filler.",
        );
        assert_eq!(cands.len(), 2);
        assert_eq!(cands[0].priority, Priority::MustHave);
        assert_eq!(cands[1].priority, Priority::ShouldHave);
    }

    #[test]
    fn titles_strip_modal_fillers() {
        let h = HeuristicJudgment;
        let cands = h.extract_requirements("Users must be able to export reports.");
        assert_eq!(cands[0].title, "export reports");
    }

    #[test]
    fn plain_description_becomes_single_must_have() {
        let h = HeuristicJudgment;
        let cands = h.extract_requirements("A small tool for renaming photos.");
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].priority, Priority::MustHave);
    }

    #[test]
    fn questions_never_exceed_five() {
        let h = HeuristicJudgment;
        let cands = h.extract_requirements("Users must do x. Users should do y.");
        let qs = h.clarifying_questions("Users must do x. Users should do y.", &cands);
        assert!(!qs.is_empty());
        assert!(qs.len() <= 5);
    }

    #[test]
    fn questions_skip_topics_the_description_covers() {
        let h = HeuristicJudgment;
        let covered = "Data must persist in a database. Invalid input must error fast, within a second.";
        let cands = h.extract_requirements(covered);
        let qs = h.clarifying_questions(covered, &cands);
        assert!(!qs
            .iter()
            .any(|q| q.prompt.contains("survive a restart")));
    }

    #[test]
    fn grouping_covers_every_fr_exactly_once() {
        let h = HeuristicJudgment;
        let doc = doc_with(vec![
            ("store the audit trail", "The system must store the audit trail."),
            ("display the audit trail", "Users must be able to display the audit trail."),
            ("frobnicate widgets", "The system must frobnicate widgets."),
        ]);
        let sketches = h.group_modules(&doc);

        let mut seen: Vec<u32> = sketches.iter().flat_map(|s| s.fr_ids.clone()).collect();
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3]);

        let names: Vec<_> = sketches.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"Storage"));
        assert!(names.contains(&"Interface"));
    }

    #[test]
    fn module_names_are_unique() {
        let h = HeuristicJudgment;
        let doc = doc_with(vec![("do the thing", "The system must do the thing.")]);
        let sketches = h.group_modules(&doc);
        let mut names: Vec<_> = sketches.iter().map(|s| s.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), sketches.len());
    }

    #[test]
    fn storage_classifies_deep_and_stateful() {
        let h = HeuristicJudgment;
        let doc = doc_with(vec![("store records", "The system must store records.")]);
        let sketches = h.group_modules(&doc);
        let storage = sketches.iter().find(|s| s.name == "Storage").unwrap();
        assert_eq!(h.classify_depth(storage), Depth::Deep);

        let module = Module {
            name: storage.name.clone(),
            responsibility: storage.responsibility.clone(),
            interface: storage.interface.clone(),
            hidden_complexity: storage.hidden_complexity.clone(),
            depth: Depth::Deep,
        };
        assert!(h.is_stateful(&module));
    }

    #[test]
    fn single_plain_fr_is_shallow() {
        let h = HeuristicJudgment;
        let sketch = ModuleSketch {
            name: "Thing".to_string(),
            responsibility: "Coordinates the core behavior of thing.".to_string(),
            interface: String::new(),
            hidden_complexity: "Rules and edge cases of thing behavior.".to_string(),
            fr_ids: vec![1],
        };
        assert_eq!(h.classify_depth(&sketch), Depth::Shallow);
    }

    #[test]
    fn operations_get_camel_case_names() {
        let h = HeuristicJudgment;
        let module = Module {
            name: "Storage".to_string(),
            responsibility: "Persists data.".to_string(),
            interface: String::new(),
            hidden_complexity: String::new(),
            depth: Depth::Deep,
        };
        let fr1 = FunctionalRequirement {
            id: 1,
            title: "store the audit trail".to_string(),
            description: String::new(),
            acceptance: acceptance_for("x"),
            priority: Priority::MustHave,
        };
        let fr2 = FunctionalRequirement {
            id: 2,
            title: "log in with email".to_string(),
            description: String::new(),
            acceptance: acceptance_for("x"),
            priority: Priority::MustHave,
        };
        let ops = h.infer_operations(&module, &[&fr1, &fr2]);
        assert_eq!(ops[0].name, "storeAudit");
        assert_eq!(ops[1].name, "loginEmail");
    }

    #[test]
    fn duplicate_operation_names_get_suffixed() {
        let h = HeuristicJudgment;
        let module = Module {
            name: "Core".to_string(),
            responsibility: String::new(),
            interface: String::new(),
            hidden_complexity: String::new(),
            depth: Depth::Medium,
        };
        let fr1 = FunctionalRequirement {
            id: 1,
            title: "export reports".to_string(),
            description: String::new(),
            acceptance: acceptance_for("x"),
            priority: Priority::MustHave,
        };
        let fr2 = FunctionalRequirement {
            id: 2,
            title: "export reports".to_string(),
            description: String::new(),
            acceptance: acceptance_for("x"),
            priority: Priority::MustHave,
        };
        let ops = h.infer_operations(&module, &[&fr1, &fr2]);
        assert_ne!(ops[0].name, ops[1].name);
    }
}
