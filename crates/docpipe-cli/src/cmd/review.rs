use crate::output::{print_json, print_table};
use anyhow::Context;
use docpipe_core::config::{Config, WarnLevel};
use docpipe_core::judgment::HeuristicJudgment;
use docpipe_core::pipeline::Pipeline;
use docpipe_core::review::{Review, ReviewReport};
use docpipe_core::store::DocStore;
use std::path::Path;

pub fn run(root: &Path, slug: Option<&str>, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let store = DocStore::new(root);
    let judgment = HeuristicJudgment;
    let review = Review::new(
        &store,
        &judgment,
        &config.implementation.source_root,
        &config.implementation.package,
    );

    let slugs: Vec<String> = match slug {
        Some(s) => vec![s.to_string()],
        None => Pipeline::list(root)
            .context("failed to list pipelines")?
            .into_iter()
            .map(|p| p.slug)
            .collect(),
    };

    if slugs.is_empty() {
        println!("No pipelines yet.");
        return Ok(());
    }

    let mut reports: Vec<ReviewReport> = Vec::new();
    for s in &slugs {
        reports.push(review.review(s)?);
    }

    if json {
        print_json(&reports)?;
        return Ok(());
    }

    for report in &reports {
        let state = report
            .state
            .map(|s| s.to_string())
            .unwrap_or_else(|| "untracked".to_string());
        println!("{} ({state})", report.slug);
        if report.is_clean() {
            println!("  clean: every requirement traces through to the emitted artifacts.\n");
            continue;
        }
        let rows = report
            .findings
            .iter()
            .map(|f| {
                let level = match f.level {
                    WarnLevel::Error => "error",
                    WarnLevel::Warning => "warning",
                };
                vec![level.to_string(), f.message.clone()]
            })
            .collect();
        print_table(&["LEVEL", "FINDING"], rows);
        println!();
    }

    Ok(())
}
