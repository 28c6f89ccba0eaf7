use serde::Serialize;
use stasis_scanner::Frontier;
use std::collections::BTreeMap;

/// Final served name of every visited path.
///
/// Built once from the frozen frontier and the fingerprinting results, then
/// only read by the rewrite pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NameMapping {
    names: BTreeMap<String, String>,
}

impl NameMapping {
    /// Mapping of each visited path to its stored name, before fingerprinting.
    pub fn from_frontier(frontier: &Frontier) -> Self {
        frontier
            .visited()
            .map(|(path, stored_name, _)| (path.to_string(), stored_name.to_string()))
            .collect()
    }

    /// Only the fingerprinting pass changes names after construction.
    pub(crate) fn set_final_name(&mut self, path: &str, final_name: &str) {
        self.names.insert(path.to_string(), final_name.to_string());
    }

    pub fn final_name(&self, path: &str) -> Option<&str> {
        self.names.get(path).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(path, name)| (path.as_str(), name.as_str()))
    }

    /// Entries whose final name differs from the path, longest path first.
    ///
    /// Ties are broken by path so the order is stable between runs.
    pub fn renamed_longest_first(&self) -> Vec<(&str, &str)> {
        let mut renamed: Vec<(&str, &str)> = self.iter().filter(|(path, name)| path != name).collect();
        renamed.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
        renamed
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for NameMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_frontier_uses_stored_names() {
        let mut frontier = Frontier::seeded();
        frontier.push("/feed/");
        frontier.push("/never-fetched/");
        frontier
            .mark_visited("/", "/".to_string(), "/index.html".to_string())
            .unwrap();
        frontier
            .mark_visited("/feed/", "/feed.xml".to_string(), "/feed.xml".to_string())
            .unwrap();

        let mapping = NameMapping::from_frontier(&frontier);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.final_name("/feed/"), Some("/feed.xml"));
        assert_eq!(mapping.final_name("/never-fetched/"), None);
    }

    #[test]
    fn test_renamed_longest_first_skips_identity() {
        let mapping: NameMapping = [
            ("/", "/"),
            ("/a.css", "/a.1.css"),
            ("/theme/a.css", "/theme/a.2.css"),
            ("/b.js?ver=1", "/b.ver_1.js"),
            ("/about/", "/about/"),
        ]
        .into_iter()
        .map(|(p, n)| (p.to_string(), n.to_string()))
        .collect();

        assert_eq!(
            mapping.renamed_longest_first(),
            vec![
                ("/theme/a.css", "/theme/a.2.css"),
                ("/b.js?ver=1", "/b.ver_1.js"),
                ("/a.css", "/a.1.css"),
            ]
        );
    }
}
