use crate::interview;
use crate::output::{print_json, print_table};
use docpipe_core::judgment::HeuristicJudgment;
use docpipe_core::specification::SpecificationStage;
use docpipe_core::store::DocStore;
use std::path::Path;

pub fn run(root: &Path, slug: &str, no_input: bool, yes: bool, json: bool) -> anyhow::Result<()> {
    let store = DocStore::new(root);
    let judgment = HeuristicJudgment;
    let mut interviewer = interview::select(Vec::new(), no_input, yes);

    let stage = SpecificationStage::new(&store, &judgment);
    let Some(bundle) = stage.specify(slug, interviewer.as_mut())? else {
        println!("Left the existing specification bundle untouched.");
        return Ok(());
    };

    if json {
        let entries: Vec<_> = bundle
            .entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "file": e.file,
                    "kind": e.kind.to_string(),
                    "traces_to": e.traces_to,
                })
            })
            .collect();
        let failures: Vec<_> = bundle
            .failures
            .iter()
            .map(|f| serde_json::json!({ "module": f.module, "reason": f.reason }))
            .collect();
        print_json(&serde_json::json!({
            "slug": bundle.slug,
            "index": format!("docs/specifications/{}/README.md", bundle.slug),
            "entries": entries,
            "failures": failures,
        }))?;
        return Ok(());
    }

    println!(
        "Wrote docs/specifications/{}/ ({} file(s))\n",
        bundle.slug,
        bundle.entries.len()
    );
    let rows = bundle
        .entries
        .iter()
        .map(|e| vec![e.file.clone(), e.kind.to_string(), e.traces_to.clone()])
        .collect();
    print_table(&["FILE", "KIND", "TRACES TO"], rows);

    if !bundle.failures.is_empty() {
        println!("\nSkipped module(s):");
        for f in &bundle.failures {
            println!("  {}: {}", f.module, f.reason);
        }
    }

    println!("\nNext: docpipe implement-functional {}", bundle.slug);
    Ok(())
}
