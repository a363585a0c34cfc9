use crate::error::{PipelineError, Result};
use crate::io;
use crate::paths;
use crate::types::Stage;
use std::path::{Path, PathBuf};

/// Repository over the `docs/` tree, keyed by slug.
///
/// All stage-document path construction goes through here (or `paths`);
/// stages never assemble path strings themselves. Reads of absent documents
/// map to `NotFound` carrying the stage whose command produces them.
pub struct DocStore {
    root: PathBuf,
}

impl DocStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_doc(&self, path: &Path, stage: Stage, slug: &str) -> Result<String> {
        if !path.exists() {
            return Err(PipelineError::NotFound {
                stage,
                slug: slug.to_string(),
            });
        }
        Ok(std::fs::read_to_string(path)?)
    }

    // -----------------------------------------------------------------------
    // Requirements
    // -----------------------------------------------------------------------

    pub fn requirements_path(&self, slug: &str) -> PathBuf {
        paths::requirements_doc(&self.root, slug)
    }

    pub fn requirements_exists(&self, slug: &str) -> bool {
        self.requirements_path(slug).exists()
    }

    pub fn read_requirements(&self, slug: &str) -> Result<String> {
        self.read_doc(&self.requirements_path(slug), Stage::Requirements, slug)
    }

    pub fn write_requirements(&self, slug: &str, content: &str) -> Result<()> {
        io::atomic_write(&self.requirements_path(slug), content.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Architecture
    // -----------------------------------------------------------------------

    pub fn architecture_path(&self, slug: &str) -> PathBuf {
        paths::architecture_doc(&self.root, slug)
    }

    pub fn architecture_exists(&self, slug: &str) -> bool {
        self.architecture_path(slug).exists()
    }

    pub fn read_architecture(&self, slug: &str) -> Result<String> {
        self.read_doc(&self.architecture_path(slug), Stage::Architecture, slug)
    }

    pub fn write_architecture(&self, slug: &str, content: &str) -> Result<()> {
        io::atomic_write(&self.architecture_path(slug), content.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Specification bundle
    // -----------------------------------------------------------------------

    pub fn bundle_dir(&self, slug: &str) -> PathBuf {
        paths::bundle_dir(&self.root, slug)
    }

    pub fn bundle_exists(&self, slug: &str) -> bool {
        paths::bundle_index(&self.root, slug).exists()
    }

    pub fn read_bundle_index(&self, slug: &str) -> Result<String> {
        self.read_doc(
            &paths::bundle_index(&self.root, slug),
            Stage::Specification,
            slug,
        )
    }

    pub fn write_bundle_index(&self, slug: &str, content: &str) -> Result<()> {
        io::atomic_write(&paths::bundle_index(&self.root, slug), content.as_bytes())
    }

    /// Write one stub file into a bundle subdirectory
    /// (`contracts`/`behaviors`/`properties`). Returns the path written.
    pub fn write_bundle_file(
        &self,
        slug: &str,
        subdir: &str,
        filename: &str,
        content: &str,
    ) -> Result<PathBuf> {
        let path = self.bundle_dir(slug).join(subdir).join(filename);
        io::atomic_write(&path, content.as_bytes())?;
        Ok(path)
    }

    /// Filenames present in a bundle subdirectory, sorted. Empty if absent.
    pub fn list_bundle_files(&self, slug: &str, subdir: &str) -> Result<Vec<String>> {
        let dir = self.bundle_dir(slug).join(subdir);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    // -----------------------------------------------------------------------
    // Implementation stubs
    // -----------------------------------------------------------------------

    /// Write a source stub under `<source_root>/<package>/`. Returns the path.
    pub fn write_source_stub(
        &self,
        source_root: &str,
        package: &str,
        filename: &str,
        content: &str,
    ) -> Result<PathBuf> {
        let path = paths::source_package_dir(&self.root, source_root, package).join(filename);
        io::atomic_write(&path, content.as_bytes())?;
        Ok(path)
    }

    pub fn source_stub_exists(&self, source_root: &str, package: &str, filename: &str) -> bool {
        paths::source_package_dir(&self.root, source_root, package)
            .join(filename)
            .exists()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_requirements_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = DocStore::new(dir.path());
        let err = store.read_requirements("ghost").unwrap_err();
        match err {
            PipelineError::NotFound { stage, slug } => {
                assert_eq!(stage, Stage::Requirements);
                assert_eq!(slug, "ghost");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn not_found_names_the_missing_command() {
        let dir = TempDir::new().unwrap();
        let store = DocStore::new(dir.path());
        let msg = store.read_architecture("x").unwrap_err().to_string();
        assert!(msg.contains("design-architecture"), "got: {msg}");
    }

    #[test]
    fn write_then_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = DocStore::new(dir.path());
        store.write_requirements("user-login", "# Requirements").unwrap();
        assert!(store.requirements_exists("user-login"));
        assert_eq!(
            store.read_requirements("user-login").unwrap(),
            "# Requirements"
        );
    }

    #[test]
    fn bundle_files_listed_sorted() {
        let dir = TempDir::new().unwrap();
        let store = DocStore::new(dir.path());
        store
            .write_bundle_file("x", "contracts", "BContractSpec.kt", "b")
            .unwrap();
        store
            .write_bundle_file("x", "contracts", "AContractSpec.kt", "a")
            .unwrap();
        assert_eq!(
            store.list_bundle_files("x", "contracts").unwrap(),
            vec!["AContractSpec.kt", "BContractSpec.kt"]
        );
        assert!(store.list_bundle_files("x", "properties").unwrap().is_empty());
    }

    #[test]
    fn source_stub_lands_under_package_path() {
        let dir = TempDir::new().unwrap();
        let store = DocStore::new(dir.path());
        let path = store
            .write_source_stub("src/main/kotlin", "com.example.app", "Thing.kt", "class Thing")
            .unwrap();
        assert!(path.ends_with("src/main/kotlin/com/example/app/Thing.kt"));
        assert!(store.source_stub_exists("src/main/kotlin", "com.example.app", "Thing.kt"));
    }
}
