use crate::interview;
use crate::output::print_json;
use anyhow::Context;
use docpipe_core::config::Config;
use docpipe_core::judgment::HeuristicJudgment;
use docpipe_core::requirements::RequirementsStage;
use docpipe_core::store::DocStore;
use std::path::Path;

#[allow(clippy::too_many_arguments)]
pub fn run(
    root: &Path,
    name: &str,
    description: Option<String>,
    answers: Vec<String>,
    no_input: bool,
    yes: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let store = DocStore::new(root);
    let judgment = HeuristicJudgment;
    let mut interviewer = interview::select(answers, no_input, yes);

    let description = description.unwrap_or_else(|| name.to_string());
    let stage = RequirementsStage::new(&store, &config, &judgment);
    let Some(doc) = stage.refine(name, &description, interviewer.as_mut())? else {
        println!("Left the existing requirements document untouched.");
        return Ok(());
    };

    if json {
        print_json(&serde_json::json!({
            "slug": doc.slug,
            "path": format!("docs/requirements/{}.md", doc.slug),
            "functional_requirements": doc.functional.len(),
            "assumptions": doc.assumptions.len(),
            "open_questions": doc.open_questions.len(),
        }))?;
        return Ok(());
    }

    println!(
        "Wrote docs/requirements/{}.md ({} functional requirement(s))",
        doc.slug,
        doc.functional.len()
    );
    if !doc.open_questions.is_empty() {
        println!("{} question(s) left open in the document.", doc.open_questions.len());
    }
    println!("Next: docpipe design-architecture {}", doc.slug);
    Ok(())
}
