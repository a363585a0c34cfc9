use crate::interview;
use crate::output::print_json;
use anyhow::Context;
use docpipe_core::config::Config;
use docpipe_core::implementation::{ImplementationStage, StubKind};
use docpipe_core::judgment::HeuristicJudgment;
use docpipe_core::store::DocStore;
use std::path::Path;

pub fn run(root: &Path, slug: &str, no_input: bool, yes: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let store = DocStore::new(root);
    let judgment = HeuristicJudgment;
    let mut interviewer = interview::select(Vec::new(), no_input, yes);

    let stage = ImplementationStage::new(&store, &config, &judgment);
    let Some(stubs) = stage.implement(slug, interviewer.as_mut())? else {
        println!("Left the existing source stubs untouched.");
        return Ok(());
    };

    if json {
        let listed: Vec<_> = stubs
            .iter()
            .map(|s| {
                serde_json::json!({
                    "type": s.type_name,
                    "kind": match s.kind {
                        StubKind::Interface => "interface",
                        StubKind::ValueType => "value_type",
                    },
                    "path": s.path.display().to_string(),
                })
            })
            .collect();
        print_json(&serde_json::json!({ "slug": slug, "stubs": listed }))?;
        return Ok(());
    }

    println!("Emitted {} source stub(s):", stubs.len());
    for stub in &stubs {
        let kind = match stub.kind {
            StubKind::Interface => "interface",
            StubKind::ValueType => "value type",
        };
        println!("  {:<10} {}", kind, stub.path.display());
    }
    println!("\nNext: docpipe review-functional {slug}");
    Ok(())
}
