//! Mapping from crawled paths to the names they are stored and served under.
//!
//! Query strings cannot survive on a static file server, so they are folded
//! into the file name as an extra dotted component in front of the extension:
//! `wp-includes/js/wp-embed.min.js?ver=4.9.7` becomes
//! `wp-includes/js/wp-embed.min.ver_4.9.7.js`. Feed directories become `.xml`
//! files. Every function here is idempotent on its own output.

/// File written for directory-like paths.
pub const DIRECTORY_INDEX: &str = "index.html";

/// Turn a crawled path into its served name.
pub fn normalize(name: &str) -> String {
    let mut name = match name.split_once('?') {
        Some((path, query)) => fold_query(path, query),
        None => name.to_string(),
    };

    if name.ends_with("/feed/") {
        name.pop();
        name.push_str(".xml");
    }

    name
}

/// Relative on-disk location for a served name.
pub fn save_name(stored_name: &str) -> String {
    if stored_name.ends_with('/') {
        format!("{}{}", stored_name, DIRECTORY_INDEX)
    } else {
        stored_name.to_string()
    }
}

/// Insert `.<fragment>` in front of the final extension of `name`.
///
/// Only the last path segment is considered, so dots in directory names are
/// never mistaken for an extension.
pub fn splice_before_extension(name: &str, fragment: &str) -> String {
    let segment_start = name.rfind('/').map_or(0, |i| i + 1);
    match name[segment_start..].rfind('.') {
        Some(dot) => {
            let dot = segment_start + dot;
            format!("{}.{}{}", &name[..dot], fragment, &name[dot..])
        }
        None => format!("{}.{}", name, fragment),
    }
}

fn fold_query(path: &str, query: &str) -> String {
    let folded = query.replace(['&', '=', '?'], "_");

    if path.is_empty() || path.ends_with('/') {
        // No file to attach the query to; it becomes its own directory.
        return format!("{}{}/", path, folded);
    }

    splice_before_extension(path, &folded)
}
