use crate::error::{PipelineError, Result};
use regex::Regex;
use std::sync::OnceLock;

pub const MAX_SLUG_LEN: usize = 64;

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap())
}

/// Check that `slug` is already in canonical form.
pub fn validate(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN || !slug_re().is_match(slug) {
        return Err(PipelineError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

/// Derive a slug from a free-text feature name.
///
/// Lowercases, collapses runs of whitespace/punctuation into a single hyphen,
/// strips leading/trailing hyphens, and truncates to `MAX_SLUG_LEN` so the
/// result stays portable as a filename. Idempotent on its own output.
pub fn derive(name: &str) -> Result<String> {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        return Err(PipelineError::EmptyName(name.to_string()));
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    Ok(slug)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
