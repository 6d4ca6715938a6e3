use std::path::{Path, PathBuf};

use crate::error::FileNamerError;

/// Label appended to every generated document name.
pub const DOCUMENT_LABEL: &str = "专利交底书";
pub const DOCUMENT_EXTENSION: &str = "md";

/// Number of title characters kept in the file name.
pub const TITLE_PREFIX_CHARS: usize = 10;

/// Highest numeric suffix tried before giving up.
pub const MAX_COUNTER: u32 = 100;

const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// The title-derived stem: first ten characters of the trimmed title with
/// spaces, path separators, and reserved characters mapped to `_`.
pub fn title_stem(title: &str) -> String {
    title
        .trim()
        .chars()
        .take(TITLE_PREFIX_CHARS)
        .map(|c| {
            if c.is_whitespace() || c.is_control() || RESERVED.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// File name for a given collision counter; `None` is the unsuffixed base.
///
/// ```
/// use patentdraft_core::naming::candidate_file_name;
///
/// assert_eq!(candidate_file_name("智能灌溉系统", None), "智能灌溉系统_专利交底书.md");
/// assert_eq!(candidate_file_name("智能灌溉系统", Some(2)), "智能灌溉系统_专利交底书_2.md");
/// ```
pub fn candidate_file_name(title: &str, counter: Option<u32>) -> String {
    let stem = title_stem(title);
    match counter {
        None => format!("{stem}_{DOCUMENT_LABEL}.{DOCUMENT_EXTENSION}"),
        Some(n) => format!("{stem}_{DOCUMENT_LABEL}_{n}.{DOCUMENT_EXTENSION}"),
    }
}

/// Pick the first candidate in `dir` for which `exists` reports false.
///
/// Tries the base name, then counters `1..=MAX_COUNTER`. The predicate is the
/// only way this function learns about the filesystem, so it never creates or
/// touches a file.
pub fn resolve_with<F>(title: &str, dir: &Path, exists: F) -> Result<PathBuf, FileNamerError>
where
    F: Fn(&Path) -> bool,
{
    let candidates = std::iter::once(None).chain((1..=MAX_COUNTER).map(Some));

    for counter in candidates {
        let path = dir.join(candidate_file_name(title, counter));
        if !exists(&path) {
            return Ok(path);
        }
    }

    Err(FileNamerError::ExhaustedAttempts {
        base: candidate_file_name(title, None),
        attempts: MAX_COUNTER + 1,
    })
}
