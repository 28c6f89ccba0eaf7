use crate::error::{MirrorError, Result};
use tracing::debug;

/// Characters that end a link embedded in HTML, CSS or inline scripts.
const LINK_DELIMITERS: [char; 5] = ['"', '\'', ' ', '<', '#'];

/// Find every link to `domain_prefix` inside `text`.
///
/// Links are returned in document order as host-relative paths, percent-encoded
/// except for `/`, `?` and `=`. Duplicates are kept; deduplication happens when
/// the paths are pushed into the frontier.
pub fn extract_links(domain_prefix: &str, text: &str) -> Result<Vec<String>> {
    if domain_prefix.is_empty() {
        return Ok(Vec::new());
    }

    let starts: Vec<usize> = text
        .match_indices(domain_prefix)
        .map(|(idx, _)| idx + domain_prefix.len())
        .collect();

    let mut links = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts
            .get(i + 1)
            .map_or(text.len(), |next| next - domain_prefix.len());
        let link = link_from_segment(&text[start..end]).ok_or_else(|| {
            MirrorError::MalformedLink {
                offset: start,
                context: text[start..end].chars().take(60).collect(),
            }
        })?;
        debug!("Found link: {}", link);
        links.push(link);
    }

    Ok(links)
}

/// Cut the link out of the text that follows a domain prefix occurrence.
///
/// Returns `None` when no delimiter ends the link, which means the content was
/// truncated or does not embed links the usual way.
fn link_from_segment(segment: &str) -> Option<String> {
    let decoded = urlencoding::decode_binary(segment.as_bytes());
    let decoded = String::from_utf8_lossy(&decoded);

    let end = decoded.find(|c: char| LINK_DELIMITERS.contains(&c))?;
    let mut tail = &decoded[..end];

    // Feeds never carry query parameters through
    if tail.contains("feed/?")
        && let Some((feed, _)) = tail.split_once('?')
    {
        tail = feed;
    }
    let tail = tail.trim_matches('\\');

    Some(format!("/{}", encode_path(tail)))
}

/// Percent-encode each segment, leaving `/`, `?` and `=` literal so the query
/// can still be folded into the stored name later.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
        .replace("%3F", "?")
        .replace("%3D", "=")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "https://something.org/";

    #[test]
    fn test_extract_single_quoted_script() {
        let text = "script' src='https://something.org/wp-includes/js/wp-embed.min.js?ver=4.9.7'></sc";
        assert_eq!(
            extract_links(DOMAIN, text).unwrap(),
            vec!["/wp-includes/js/wp-embed.min.js?ver=4.9.7"]
        );
    }

    #[test]
    fn test_extract_double_quoted_script() {
        let text = r#"src="https://x.org/wp-includes/js/wp-embed.min.js?ver=4.9.7""#;
        assert_eq!(
            extract_links("https://x.org/", text).unwrap(),
            vec!["/wp-includes/js/wp-embed.min.js?ver=4.9.7"]
        );
    }

    #[test]
    fn test_extract_srcset_entry() {
        let text = r#""logo" srcset="https://something.org/wp-content/uploads/2018/01/cropped-Logo-2.png 1094w, "#;
        assert_eq!(
            extract_links(DOMAIN, text).unwrap(),
            vec!["/wp-content/uploads/2018/01/cropped-Logo-2.png"]
        );
    }

    #[test]
    fn test_feed_query_is_dropped() {
        let text = r#"set="https://something.org/feed/?someparam "#;
        assert_eq!(extract_links(DOMAIN, text).unwrap(), vec!["/feed/"]);
    }

    #[test]
    fn test_non_ascii_is_percent_encoded() {
        let text = r#"set="https://something.org/wp-content/uploads/2018/02/tarte_brocolis_truite_chèvre.jpg" al"#;
        assert_eq!(
            extract_links(DOMAIN, text).unwrap(),
            vec!["/wp-content/uploads/2018/02/tarte_brocolis_truite_ch%C3%A8vre.jpg"]
        );
    }

    #[test]
    fn test_already_encoded_link_round_trips() {
        let text = r#"href="https://something.org/2018/02/ch%C3%A8vre/" "#;
        assert_eq!(extract_links(DOMAIN, text).unwrap(), vec!["/2018/02/ch%C3%A8vre/"]);
    }

    #[test]
    fn test_fragment_and_escaped_slash_trimmed() {
        let text = r#"href="https://something.org/about/#team" x="https://something.org/contact/\" "#;
        assert_eq!(
            extract_links(DOMAIN, text).unwrap(),
            vec!["/about/", "/contact/"]
        );
    }

    #[test]
    fn test_duplicates_are_kept_in_order() {
        let text = r#"<a href="https://something.org/b/">b</a><a href="https://something.org/a/">a</a><a href="https://something.org/b/">b</a>"#;
        assert_eq!(
            extract_links(DOMAIN, text).unwrap(),
            vec!["/b/", "/a/", "/b/"]
        );
    }

    #[test]
    fn test_no_occurrence_yields_nothing() {
        assert!(extract_links(DOMAIN, "<p>nothing here</p>").unwrap().is_empty());
        assert!(extract_links("", "https://something.org/").unwrap().is_empty());
    }

    #[test]
    fn test_missing_delimiter_is_malformed() {
        let text = r#"<a href="https://something.org/truncated"#;
        match extract_links(DOMAIN, text) {
            Err(MirrorError::MalformedLink { offset, context }) => {
                assert_eq!(offset, text.find("truncated").unwrap());
                assert_eq!(context, "truncated");
            }
            other => panic!("expected MalformedLink, got {:?}", other),
        }
    }
}
