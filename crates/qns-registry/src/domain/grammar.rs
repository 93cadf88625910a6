//! # Name Grammar
//!
//! Validates raw names and splits them into fragments. Every operation that
//! takes a name routes it through [`split_and_check`] first.
//!
//! ## Rules
//!
//! | Rule | Value |
//! |------|-------|
//! | Total length | 3..=255 bytes |
//! | Fragments (registrable) | 1..=2 |
//! | Fragments (deep path: record names, CNAME targets) | 1..=8 |
//! | Root fragment | 1..=16, `[a-z]`, then `[a-z0-9-]`, ends `[a-z0-9]` |
//! | Other fragments | 1..=63, `[a-z0-9]` at both ends, `[a-z0-9-]` inside |

use super::errors::RegistryError;

/// Shortest accepted name.
pub const NAME_MIN_LENGTH: usize = 3;

/// Longest accepted name.
pub const NAME_MAX_LENGTH: usize = 255;

/// Maximum fragments for names that may be registered as tokens.
pub const MAX_REGISTRABLE_FRAGMENTS: usize = 2;

/// Maximum fragments for record names and CNAME targets.
pub const MAX_DEEP_PATH_FRAGMENTS: usize = 8;

/// Maximum length of the root (top-level) fragment.
pub const ROOT_FRAGMENT_MAX_LENGTH: usize = 16;

/// Maximum length of any other fragment.
pub const FRAGMENT_MAX_LENGTH: usize = 63;

/// Split `name` on `.` and validate every fragment.
///
/// `allow_deep_path` raises the fragment cap from 2 to 8; it is used for
/// record names and CNAME targets, never for registration.
pub fn split_and_check(name: &str, allow_deep_path: bool) -> Result<Vec<&str>, RegistryError> {
    let length = name.len();
    if !(NAME_MIN_LENGTH..=NAME_MAX_LENGTH).contains(&length) {
        return Err(RegistryError::invalid_format(format!(
            "length {length} outside {NAME_MIN_LENGTH}..={NAME_MAX_LENGTH}"
        )));
    }

    let fragments: Vec<&str> = name.split('.').collect();
    let max_fragments = if allow_deep_path {
        MAX_DEEP_PATH_FRAGMENTS
    } else {
        MAX_REGISTRABLE_FRAGMENTS
    };
    if fragments.len() > max_fragments {
        return Err(RegistryError::invalid_format(format!(
            "{} fragments, at most {max_fragments} allowed",
            fragments.len()
        )));
    }

    let last = fragments.len() - 1;
    for (index, fragment) in fragments.iter().enumerate() {
        if !check_fragment(fragment, index == last) {
            return Err(RegistryError::invalid_format(format!(
                "invalid fragment {fragment:?} in {name:?}"
            )));
        }
    }
    Ok(fragments)
}

/// Check a single fragment. `is_root` selects the top-level rules.
pub fn check_fragment(fragment: &str, is_root: bool) -> bool {
    let bytes = fragment.as_bytes();
    let max_length = if is_root {
        ROOT_FRAGMENT_MAX_LENGTH
    } else {
        FRAGMENT_MAX_LENGTH
    };
    if bytes.is_empty() || bytes.len() > max_length {
        return false;
    }

    let first = bytes[0];
    let first_ok = if is_root {
        first.is_ascii_lowercase()
    } else {
        is_alphanumeric(first)
    };
    if !first_ok {
        return false;
    }

    let last = bytes[bytes.len() - 1];
    if !is_alphanumeric(last) {
        return false;
    }

    bytes.len() < 3
        || bytes[1..bytes.len() - 1]
            .iter()
            .all(|&c| is_alphanumeric(c) || c == b'-')
}

fn is_alphanumeric(c: u8) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

/// Owning token for already validated fragments.
pub fn token_from_fragments(fragments: &[&str]) -> String {
    if fragments.len() <= MAX_REGISTRABLE_FRAGMENTS {
        fragments.join(".")
    } else {
        fragments[fragments.len() - MAX_REGISTRABLE_FRAGMENTS..].join(".")
    }
}

/// Owning token for `name`: the name itself for a root, otherwise the last
/// two fragments. `www.example.com` belongs to `example.com`.
pub fn canonical_token(name: &str) -> Result<String, RegistryError> {
    let fragments = split_and_check(name, true)?;
    Ok(token_from_fragments(&fragments))
}

/// Drop one trailing dot (`example.com.` -> `example.com`).
pub fn normalize(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}
