use crate::interview;
use crate::output::{print_json, print_table};
use docpipe_core::architecture::ArchitectureStage;
use docpipe_core::judgment::HeuristicJudgment;
use docpipe_core::store::DocStore;
use std::path::Path;

pub fn run(root: &Path, slug: &str, no_input: bool, yes: bool, json: bool) -> anyhow::Result<()> {
    let store = DocStore::new(root);
    let judgment = HeuristicJudgment;
    let mut interviewer = interview::select(Vec::new(), no_input, yes);

    let stage = ArchitectureStage::new(&store, &judgment);
    let Some(doc) = stage.design(slug, interviewer.as_mut())? else {
        println!("Left the existing architecture document untouched.");
        return Ok(());
    };

    if json {
        let modules: Vec<_> = doc
            .modules
            .iter()
            .map(|m| {
                serde_json::json!({
                    "name": m.name,
                    "depth": m.depth.to_string(),
                    "responsibility": m.responsibility,
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "slug": doc.slug,
            "path": format!("docs/architecture/{}.md", doc.slug),
            "modules": modules,
            "traceability_rows": doc.traceability.len(),
        }))?;
        return Ok(());
    }

    println!("Wrote docs/architecture/{}.md\n", doc.slug);
    let rows = doc
        .modules
        .iter()
        .map(|m| {
            vec![
                m.name.clone(),
                m.depth.to_string(),
                m.responsibility.clone(),
            ]
        })
        .collect();
    print_table(&["MODULE", "DEPTH", "RESPONSIBILITY"], rows);
    println!("\nNext: docpipe specify {}", doc.slug);
    Ok(())
}
