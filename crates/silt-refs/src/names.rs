//! Ref name validation and root-category classification.
//!
//! Valid ref names follow git-style conventions:
//! - Must be non-empty
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..` (double dot)
//! - Must not start or end with `.` or `/`, or contain `//`
//! - Components between slashes must be non-empty

use serde::{Deserialize, Serialize};

use crate::error::{RefError, RefResult};

/// Characters that are forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

/// Which consolidated pack a ref's history belongs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RootCategory {
    /// Branch-like and tag-like refs; history lands in the `Gc` pack.
    Primary,
    /// All other namespaces; history lands in the `GcRest` pack.
    Secondary,
}

/// Classify a canonical ref name into its root category.
///
/// Primary: `HEAD`, `refs/heads/*`, `refs/tags/*`. Everything else
/// (notes, remote-tracking refs, custom namespaces) is secondary.
///
/// # Examples
///
/// ```
/// use silt_refs::names::{classify_ref, RootCategory};
///
/// assert_eq!(classify_ref("refs/heads/main"), RootCategory::Primary);
/// assert_eq!(classify_ref("refs/tags/v1.0"), RootCategory::Primary);
/// assert_eq!(classify_ref("refs/notes/review"), RootCategory::Secondary);
/// ```
pub fn classify_ref(name: &str) -> RootCategory {
    if name == "HEAD" || name.starts_with("refs/heads/") || name.starts_with("refs/tags/") {
        RootCategory::Primary
    } else {
        RootCategory::Secondary
    }
}

/// Validate a canonical ref name, returning `Ok(())` if valid.
pub fn validate_ref_name(name: &str) -> RefResult<()> {
    if name == "HEAD" {
        return Ok(());
    }
    if name.is_empty() {
        return Err(invalid(name, "ref name must not be empty"));
    }
    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(name, &format!("contains forbidden character: {ch:?}")));
        }
    }
    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }
    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid(name, "must not start or end with '.'"));
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }
    if name.contains("//") {
        return Err(invalid(name, "must not contain consecutive slashes '//'"));
    }
    for component in name.split('/') {
        if component.starts_with('.') {
            return Err(invalid(
                name,
                &format!("component must not start with '.': {component:?}"),
            ));
        }
    }
    Ok(())
}

fn invalid(name: &str, reason: &str) -> RefError {
    RefError::InvalidRefName {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
