/// Identifier helpers for generated Kotlin file and symbol names.
///
/// All inputs are expected to be slugs or short free-text phrases; output is
/// restricted to ASCII identifiers.

/// `user-login` / `user login` → `UserLogin`
pub fn pascal_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper_next = true;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if upper_next {
                out.push(c.to_ascii_uppercase());
                upper_next = false;
            } else {
                out.push(c.to_ascii_lowercase());
            }
        } else {
            upper_next = true;
        }
    }
    out
}

/// `store record` → `storeRecord`
pub fn camel_case(s: &str) -> String {
    let pascal = pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => pascal,
    }
}

/// Human-readable title from a slug: `user-login` → `user login`.
pub fn title_from_slug(slug: &str) -> String {
    slug.replace('-', " ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
