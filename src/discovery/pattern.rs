//! Single-segment wildcard matching

/// Does `name` match `pattern`, where `*` stands for any run of characters?
///
/// Matching never crosses a `/`; callers split paths into segments first.
pub fn file_matches(name: &str, pattern: &str) -> bool {
    if !pattern.contains('*') {
        return name == pattern;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return false,
    };
    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return false,
    };

    if name.len() < first.len() + last.len() {
        return false;
    }
    if !name.starts_with(first) || !name.ends_with(last) {
        return false;
    }

    let mut remaining = &name[first.len()..name.len() - last.len()];
    for part in middle {
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }
    true
}

pub(crate) fn is_wildcard(segment: &str) -> bool {
    segment.contains('*')
}
