use std::borrow::Cow;
use std::path::PathBuf;

const FILE_SCHEME: &str = "file:";

pub(crate) fn decode(encoded: &str) -> Cow<'_, str> {
    percent_encoding::percent_decode_str(encoded).decode_utf8_lossy()
}

/// Strips the query and fragment of an `href`, if any.
pub(crate) fn strip_fragment(href: &str) -> &str {
    href.find(['?', '#']).map_or(href, |position| &href[..position])
}

/// Normalizes a container path into its segments relative to the container root.
///
/// Returns [`None`] if the path escapes the root through `..` segments.
///
/// `/OEBPS/text/../c1.xhtml` -> `["OEBPS", "c1.xhtml"]`
pub(crate) fn normalize(path: &str) -> Option<Vec<&str>> {
    let mut stack = Vec::new();

    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                // Popping past the root is a traversal attempt
                stack.pop()?;
            }
            _ => stack.push(segment),
        }
    }
    Some(stack)
}

/// The provided `href` must not contain a `fragment`
/// and `query` when passed to this method.
pub(crate) fn has_scheme(href: &str) -> bool {
    let Some(position) = href.find(':') else {
        return false;
    };
    let scheme = &href[..position];

    // Windows drive letters (`C:\books`) are not schemes
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

pub(crate) fn scheme(href: &str) -> Option<&str> {
    has_scheme(href).then(|| &href[..href.find(':').unwrap_or_default()])
}

/// Returns `true` if the given href looks like a path on the local file system.
pub(crate) fn is_local_path(href: &str) -> bool {
    !has_scheme(href)
        || href
            .get(..FILE_SCHEME.len())
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case(FILE_SCHEME))
}

/// Converts a local href (`file:` URL or plain path) into a file system path.
pub(crate) fn to_file_path(href: &str) -> Option<PathBuf> {
    if !is_local_path(href) {
        return None;
    }
    if !has_scheme(href) {
        return Some(PathBuf::from(href));
    }

    let path = &href[FILE_SCHEME.len()..];
    // `file:///books/a.epub` and `file://localhost/books/a.epub`
    let path = match path.strip_prefix("//") {
        Some(authority) => authority.find('/').map_or("", |index| &authority[index..]),
        None => path,
    };
    (!path.is_empty()).then(|| PathBuf::from(decode(path).as_ref()))
}
