use anyhow::Context;
use docpipe_core::config::{Config, WarnLevel};
use docpipe_core::{io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());

    println!("Initializing docpipe in: {}", root.display());

    let dirs = [
        paths::DOCPIPE_DIR,
        paths::PIPELINES_DIR,
        paths::REQUIREMENTS_DIR,
        paths::ARCHITECTURE_DIR,
        paths::SPECIFICATIONS_DIR,
    ];
    for dir in dirs {
        let p = root.join(dir);
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    let config_path = paths::config_path(root);
    if !config_path.exists() {
        let cfg = Config::new(&project_name);
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: .docpipe/config.yaml");
    } else {
        println!("  exists:  .docpipe/config.yaml");
    }

    let cfg = Config::load(root).context("failed to load config.yaml")?;
    for warning in cfg.validate() {
        let label = match warning.level {
            WarnLevel::Error => "error",
            WarnLevel::Warning => "warning",
        };
        println!("  {label}: {}", warning.message);
    }

    println!("\ndocpipe initialized.");
    println!("Next: docpipe refine-requirements \"<feature name>\" --description \"...\"");

    Ok(())
}
