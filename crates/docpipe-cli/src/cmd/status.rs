use crate::output::{print_json, print_table};
use anyhow::Context;
use docpipe_core::pipeline::Pipeline;
use std::path::Path;

pub fn run(root: &Path, slug: Option<&str>, json: bool) -> anyhow::Result<()> {
    match slug {
        Some(slug) => show(root, slug, json),
        None => list(root, json),
    }
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let pipelines = Pipeline::list(root).context("failed to list pipelines")?;

    if json {
        let summaries: Vec<_> = pipelines
            .iter()
            .map(|p| {
                serde_json::json!({
                    "slug": p.slug,
                    "feature": p.feature_name,
                    "state": p.state.to_string(),
                    "stale": p.stale_stages().iter().map(|s| s.to_string()).collect::<Vec<_>>(),
                })
            })
            .collect();
        print_json(&summaries)?;
        return Ok(());
    }

    if pipelines.is_empty() {
        println!("No pipelines yet.");
        return Ok(());
    }

    let rows = pipelines
        .iter()
        .map(|p| {
            let stale = p
                .stale_stages()
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                p.slug.clone(),
                p.state.to_string(),
                stale,
                p.feature_name.clone(),
            ]
        })
        .collect();
    print_table(&["SLUG", "STATE", "STALE", "FEATURE"], rows);
    Ok(())
}

fn show(root: &Path, slug: &str, json: bool) -> anyhow::Result<()> {
    let pipeline = Pipeline::load(root, slug)?
        .with_context(|| format!("no pipeline recorded for '{slug}'"))?;

    if json {
        let runs: Vec<_> = pipeline
            .runs
            .iter()
            .map(|r| {
                serde_json::json!({
                    "stage": r.stage.to_string(),
                    "completed_at": r.completed_at.to_rfc3339(),
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "slug": pipeline.slug,
            "feature": pipeline.feature_name,
            "state": pipeline.state.to_string(),
            "runs": runs,
            "stale": pipeline.stale_stages().iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        }))?;
        return Ok(());
    }

    println!("Pipeline: {} — {}", pipeline.slug, pipeline.feature_name);
    println!("State:    {}", pipeline.state);
    if !pipeline.runs.is_empty() {
        println!("\nStage runs:");
        for run in &pipeline.runs {
            println!(
                "  {:<15} {}",
                run.stage.to_string(),
                run.completed_at.format("%Y-%m-%d %H:%M")
            );
        }
    }
    let stale = pipeline.stale_stages();
    if !stale.is_empty() {
        println!("\nStale stages (upstream changed since):");
        for s in stale {
            println!("  {s} — rerun 'docpipe {}'", s.command());
        }
    }
    Ok(())
}
