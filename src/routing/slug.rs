//! Slug rewriting.
//!
//! Turns bracket slugs (`/users/[id]`) into router-native parameter tokens
//! (`/users/:id`), attaching a `(pattern)` suffix when the parameter has a
//! declared constraint.
//!
//! # Design Decisions
//! - Tokens already in router-native form are copied through untouched, with
//!   their whole balanced `(pattern)` group, so brackets inside a constraint
//!   (`:id(([a-z]+(-[0-9]+)?))`) are never mistaken for slugs
//! - Rewriting is therefore idempotent for any constraint nesting depth

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Either the head of a native token (`:name(`) or a bracket slug.
static SLUG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<native>:[A-Za-z_$][A-Za-z0-9_$]*\()|\[(?P<name>[^\[\]/]+)\]")
        .expect("slug pattern is valid")
});

/// Rewrite every `[name]` slug in `path` into `:name` or `:name(pattern)`.
///
/// With no constraint map at all the path is returned unmodified.
pub fn rewrite_slugs(path: &str, constraints: Option<&BTreeMap<String, String>>) -> String {
    let Some(constraints) = constraints else {
        return path.to_string();
    };

    let mut out = String::with_capacity(path.len());
    let mut pos = 0;
    while let Some(caps) = SLUG_PATTERN.captures_at(path, pos) {
        let Some(whole) = caps.get(0) else { break };
        out.push_str(&path[pos..whole.start()]);

        if let Some(name) = caps.name("name") {
            let name = name.as_str();
            match constraints.get(name) {
                Some(pattern) => out.push_str(&format!(":{name}({pattern})")),
                None => out.push_str(&format!(":{name}")),
            }
            pos = whole.end();
            continue;
        }

        // The head match ends on the group's opening paren.
        let open = whole.end() - 1;
        pos = match group_len(&path[open..]) {
            Some(len) => open + len,
            None => whole.end(),
        };
        out.push_str(&path[whole.start()..pos]);
    }
    out.push_str(&path[pos..]);
    out
}

/// Byte length of the parenthesized group opening at the start of `s`,
/// both parens included. Escaped parens and parens inside a character
/// class do not count. `None` when `s` does not open a balanced group.
pub(crate) fn group_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'(') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_class = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'[' if !in_class => {
                in_class = true;
                i += 1;
                // `[^]...]` and `[]...]` open with a literal `]`.
                if bytes.get(i) == Some(&b'^') {
                    i += 1;
                }
                if bytes.get(i) == Some(&b']') {
                    i += 1;
                }
                continue;
            }
            b']' if in_class => in_class = false,
            b'(' if !in_class => depth += 1,
            b')' if !in_class => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}
