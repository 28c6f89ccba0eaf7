//! Removal of WordPress management artifacts from fetched HTML.
//!
//! Each artifact is identified by a needle. The tag enclosing the needle, from
//! the nearest `<` before it through the first `>` after it, is cut out. The
//! result is never longer than the input and sanitizing twice changes nothing.

use tracing::debug;

/// Needles that only depend on the page, not on the mirrored domain.
const ADMIN_AJAX: &str = "/wp-admin/admin-ajax.php";
const OEMBED_ENDPOINT: &str = "wp-json/oembed/";
const OEMBED_MIME: &str = "text/xml+oembed";

/// Build the needle list for `domain`, in the order they are removed.
fn needles(domain: &str) -> Vec<String> {
    vec![
        // XML-RPC pingback and RSD advertisements
        format!("href='{domain}xmlrpc.php'"),
        format!("href=\"{domain}xmlrpc.php\""),
        format!("href='{domain}xmlrpc.php?rsd'"),
        format!("href=\"{domain}xmlrpc.php?rsd\""),
        // REST API discovery
        format!("{domain}wp-json/"),
        OEMBED_ENDPOINT.to_string(),
        OEMBED_MIME.to_string(),
        ADMIN_AJAX.to_string(),
        // Shortlinks
        format!("href='{domain}?p="),
        format!("href=\"{domain}?p="),
        "href='?p=".to_string(),
        "href=\\'?p=".to_string(),
        "href=\"?p=".to_string(),
        "rel=\\'shortlink\\'".to_string(),
    ]
}

/// Strip every management artifact of `domain` from `html`.
pub fn sanitize(domain: &str, html: &str) -> String {
    let needles = needles(domain);
    let mut content = html.to_string();

    // Removing one tag can splice together a new needle occurrence, so run
    // until a full pass over every needle leaves the content untouched.
    loop {
        let before = content.len();
        for needle in &needles {
            content = drop_enclosing_tags(&content, needle);
        }
        if content.len() == before {
            return content;
        }
    }
}

/// Turn literal `\r\n` and `\t` sequences left by escaped output back
/// into real whitespace.
pub fn restore_escaped_whitespace(content: &str) -> String {
    content.replace("\\r\\n", "\n").replace("\\t", "\t")
}

/// Remove every tag that contains `needle`.
///
/// An occurrence with no `<` before it or no `>` after it is left in place.
pub fn drop_enclosing_tags(content: &str, needle: &str) -> String {
    if needle.is_empty() {
        return content.to_string();
    }

    let mut content = content.to_string();
    let mut search_from = 0;

    while let Some(found) = content[search_from..].find(needle) {
        let position = search_from + found;
        let tag_start = content[..position].rfind('<');
        let tag_end = content[position + needle.len()..]
            .find('>')
            .map(|idx| position + needle.len() + idx);

        match (tag_start, tag_end) {
            (Some(start), Some(end)) => {
                debug!("Dropping tag containing {}", needle);
                content.replace_range(start..=end, "");
                search_from = start;
            }
            _ => search_from = position + needle.len(),
        }
    }

    content
}
