//! Final pass that makes stored HTML point at the mirror.
//!
//! The origin base URL is swapped for the target base URL, then every path
//! whose served name changed (query folding, feeds, fingerprints) is replaced
//! by its final name. Path replacement is plain text substitution, so it only
//! fires on delimited matches and longer paths go first; otherwise `/a.css`
//! would also rewrite the tail of `/theme/a.css` or of an external URL.

use crate::mapping::NameMapping;
use stasis_scanner::OutputDir;
use stasis_scanner::error::Result;
use std::fs;
use tracing::{debug, info, warn};

/// Extension of documents the rewrite pass touches.
pub const HTML_EXTENSION: &str = ".html";

/// Substitutions applied to every stored HTML document.
#[derive(Debug, Clone)]
pub struct RewriteRules {
    origin_base: String,
    target_base: String,
    /// Target base without its trailing slash; paths start right after it
    target_anchor: String,
    replacements: Vec<(String, String)>,
}

impl RewriteRules {
    pub fn new(origin_base: &str, target_base: &str, mapping: &NameMapping) -> Self {
        // Documents may spell a path raw instead of percent-encoded
        let mut replacements: Vec<(String, String)> = Vec::new();
        for (path, name) in mapping.renamed_longest_first() {
            replacements.push((path.to_string(), name.to_string()));
            if let Ok(decoded) = urlencoding::decode(path)
                && decoded != path
            {
                replacements.push((decoded.into_owned(), name.to_string()));
            }
        }
        replacements.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        Self {
            origin_base: origin_base.to_string(),
            target_base: target_base.to_string(),
            target_anchor: target_base.trim_end_matches('/').to_string(),
            replacements,
        }
    }

    pub fn replacement_count(&self) -> usize {
        self.replacements.len()
    }

    /// Rewrite one document.
    pub fn apply(&self, html: &str) -> String {
        let mut html = if self.origin_base.is_empty() {
            html.to_string()
        } else {
            html.replace(&self.origin_base, &self.target_base)
        };

        for (path, final_name) in &self.replacements {
            html = replace_delimited(&html, path, final_name, &self.target_anchor);
        }

        html
    }
}

/// Characters that may appear inside a host or path, before a match.
fn is_url_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~' | '%' | '/' | ':' | '@')
}

/// Characters that would continue a path or query after a match.
fn continues_path(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~' | '%' | '/' | '?' | '=' | '&')
}

/// Replace occurrences of `from` that stand on their own.
///
/// A match counts when the next character does not continue the path and the
/// match either follows `anchor` or is not glued to a preceding host or path.
/// A query may follow a match unless `from` carries its own query.
pub fn replace_delimited(text: &str, from: &str, to: &str, anchor: &str) -> String {
    if from.is_empty() {
        return text.to_string();
    }

    let query_may_follow = !from.contains('?');
    let mut result = String::with_capacity(text.len());
    let mut copied = 0;

    for (idx, _) in text.match_indices(from) {
        let before = &text[..idx];
        let after = &text[idx + from.len()..];

        let left_ok = (!anchor.is_empty() && before.ends_with(anchor))
            || before.chars().next_back().is_none_or(|c| !is_url_char(c));
        let right_ok = after
            .chars()
            .next()
            .is_none_or(|c| (c == '?' && query_may_follow) || !continues_path(c));

        if left_ok && right_ok {
            result.push_str(&text[copied..idx]);
            result.push_str(to);
            copied = idx + from.len();
        }
    }

    result.push_str(&text[copied..]);
    result
}

/// Rewrite every stored `.html` file in place. Returns how many changed.
///
/// Files that are not valid UTF-8 are skipped with a warning.
pub fn rewrite_documents(output: &OutputDir, rules: &RewriteRules) -> Result<usize> {
    let mut rewritten = 0;

    for file in output.list_files()? {
        let is_html = file
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(HTML_EXTENSION));
        if !is_html {
            continue;
        }

        let bytes = fs::read(&file)?;
        let html = match String::from_utf8(bytes) {
            Ok(html) => html,
            Err(_) => {
                warn!("Skipping {}: not valid UTF-8", file.display());
                continue;
            }
        };

        debug!("Rewriting {}", file.display());
        let updated = rules.apply(&html);
        if updated != html {
            fs::write(&file, updated)?;
            rewritten += 1;
        }
    }

    info!(
        "Rewrote {} documents with {} renamed paths",
        rewritten,
        rules.replacement_count()
    );
    Ok(rewritten)
}
