use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const DOCPIPE_DIR: &str = ".docpipe";
pub const PIPELINES_DIR: &str = ".docpipe/pipelines";
pub const CONFIG_FILE: &str = ".docpipe/config.yaml";

pub const DOCS_DIR: &str = "docs";
pub const REQUIREMENTS_DIR: &str = "docs/requirements";
pub const ARCHITECTURE_DIR: &str = "docs/architecture";
pub const SPECIFICATIONS_DIR: &str = "docs/specifications";

pub const BUNDLE_INDEX_FILE: &str = "README.md";
pub const CONTRACTS_SUBDIR: &str = "contracts";
pub const BEHAVIORS_SUBDIR: &str = "behaviors";
pub const PROPERTIES_SUBDIR: &str = "properties";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn pipeline_manifest(root: &Path, slug: &str) -> PathBuf {
    root.join(PIPELINES_DIR).join(format!("{slug}.yaml"))
}

pub fn requirements_doc(root: &Path, slug: &str) -> PathBuf {
    root.join(REQUIREMENTS_DIR).join(format!("{slug}.md"))
}

pub fn architecture_doc(root: &Path, slug: &str) -> PathBuf {
    root.join(ARCHITECTURE_DIR).join(format!("{slug}.md"))
}

pub fn bundle_dir(root: &Path, slug: &str) -> PathBuf {
    root.join(SPECIFICATIONS_DIR).join(slug)
}

pub fn bundle_index(root: &Path, slug: &str) -> PathBuf {
    bundle_dir(root, slug).join(BUNDLE_INDEX_FILE)
}

pub fn contracts_dir(root: &Path, slug: &str) -> PathBuf {
    bundle_dir(root, slug).join(CONTRACTS_SUBDIR)
}

pub fn behaviors_dir(root: &Path, slug: &str) -> PathBuf {
    bundle_dir(root, slug).join(BEHAVIORS_SUBDIR)
}

pub fn properties_dir(root: &Path, slug: &str) -> PathBuf {
    bundle_dir(root, slug).join(PROPERTIES_SUBDIR)
}

/// Source tree for implementation stubs: `<source_root>/<package as path>/`.
pub fn source_package_dir(root: &Path, source_root: &str, package: &str) -> PathBuf {
    let mut dir = root.join(source_root);
    for part in package.split('.') {
        dir = dir.join(part);
    }
    dir
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
