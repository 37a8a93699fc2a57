//! Container path helpers and small XML attribute utilities shared by the
//! document parsers.

use quick_xml::events::BytesStart;

/// Returns the value of the attribute whose local name is `name`.
pub(crate) fn attr(element: &BytesStart<'_>, name: &str) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Directory part of a container path, with a trailing slash, or `""`.
pub(crate) fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..=pos],
        None => "",
    }
}

/// Resolves an IRI reference found in `base_doc` to a container path.
///
/// Drops fragments and queries, percent-decodes and collapses `.`/`..`
/// segments. Returns `None` for absolute IRIs and for references that
/// climb above the container root.
pub(crate) fn resolve(base_doc: &str, href: &str) -> Option<String> {
    let href = href.split(['#', '?']).next().unwrap_or_default();
    if href.is_empty() || href.contains("://") || href.starts_with("data:") {
        return None;
    }
    let raw = urlencoding::decode_binary(href.as_bytes());
    let decoded = String::from_utf8_lossy(&raw);
    let joined = if let Some(rooted) = decoded.strip_prefix('/') {
        rooted.to_string()
    } else {
        format!("{}{}", parent_dir(base_doc), decoded)
    };
    normalize(&joined)
}

/// Collapses `.` and `..` segments. `None` if the path escapes the root.
pub(crate) fn normalize(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s),
        }
    }
    Some(segments.join("/"))
}
