//! Human-readable unique keys derived from free text.
//!
//! `slugify` is the pure half: lowercase, collapse every run of
//! non-alphanumeric characters to one `-`, trim the edges. Collision
//! suffixing (`-1`, `-2`, …) is the store's job, because the check must
//! re-query the live store on each attempt rather than a stale snapshot.

/// Derive a slug from free text.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        // Free text with no usable characters still needs a key.
        "untitled".into()
    } else {
        slug
    }
}

/// The candidate slug for attempt `n`: the base for the first attempt,
/// `base-n` afterwards.
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("My Project"), "my-project");
    }

    #[test]
    fn collapses_symbol_runs() {
        assert_eq!(slugify("Q3 — Launch!!  Plan"), "q3-launch-plan");
    }

    #[test]
    fn trims_edges() {
        assert_eq!(slugify("  --hello--  "), "hello");
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(slugify("Sprint 12 (v2)"), "sprint-12-v2");
    }

    #[test]
    fn empty_input_gets_fallback() {
        assert_eq!(slugify("---"), "untitled");
        assert_eq!(slugify(""), "untitled");
    }

    #[test]
    fn candidate_sequence() {
        assert_eq!(candidate("my-project", 0), "my-project");
        assert_eq!(candidate("my-project", 1), "my-project-1");
        assert_eq!(candidate("my-project", 2), "my-project-2");
    }
}
