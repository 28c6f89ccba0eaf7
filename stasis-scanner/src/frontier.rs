use crate::error::{MirrorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// Every crawl starts from the site root.
pub const ROOT_PATH: &str = "/";

/// Visit status of a single discovered path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkRecord {
    Unvisited,
    Visited {
        /// Served name after query folding, before fingerprinting
        stored_name: String,
        /// Location of the stored file, relative to the output root
        save_path: String,
    },
}

impl LinkRecord {
    pub fn is_visited(&self) -> bool {
        matches!(self, LinkRecord::Visited { .. })
    }
}

/// Ledger of every path discovered during a crawl.
///
/// Paths are handed out breadth-first in discovery order. A path is claimed
/// once: after [`Frontier::claim_next`] returns it, it is never returned again,
/// and [`Frontier::mark_visited`] refuses a second visit.
#[derive(Debug, Clone, Serialize)]
pub struct Frontier {
    records: BTreeMap<String, LinkRecord>,
    #[serde(skip)]
    pending: VecDeque<String>,
}

impl Frontier {
    /// A frontier holding only the unvisited root.
    pub fn seeded() -> Self {
        let mut frontier = Self {
            records: BTreeMap::new(),
            pending: VecDeque::new(),
        };
        frontier.push(ROOT_PATH);
        frontier
    }

    /// Record `path` as unvisited if it has never been seen.
    ///
    /// Returns `false` when the path is already known, visited or not.
    pub fn push(&mut self, path: &str) -> bool {
        if self.records.contains_key(path) {
            return false;
        }
        debug!("    + {}", path);
        self.records.insert(path.to_string(), LinkRecord::Unvisited);
        self.pending.push_back(path.to_string());
        true
    }

    /// Record every path in `paths`, returning how many were new.
    pub fn push_all<I, S>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        paths
            .into_iter()
            .filter(|path| self.push(path.as_ref()))
            .count()
    }

    /// Take the oldest unvisited path that has not been claimed yet.
    pub fn claim_next(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    /// Claim up to `limit` unvisited paths at once.
    pub fn claim_batch(&mut self, limit: usize) -> Vec<String> {
        let count = limit.min(self.pending.len());
        self.pending.drain(..count).collect()
    }

    /// Flip `path` to visited.
    pub fn mark_visited(&mut self, path: &str, stored_name: String, save_path: String) -> Result<()> {
        match self.records.get_mut(path) {
            Some(record) if !record.is_visited() => {
                *record = LinkRecord::Visited {
                    stored_name,
                    save_path,
                };
                Ok(())
            }
            Some(_) => Err(MirrorError::AlreadyVisited(path.to_string())),
            None => Err(MirrorError::Other(format!("Path was never discovered: {}", path))),
        }
    }

    pub fn get(&self, path: &str) -> Option<&LinkRecord> {
        self.records.get(path)
    }

    /// All records, ordered by path.
    pub fn records(&self) -> impl Iterator<Item = (&str, &LinkRecord)> {
        self.records.iter().map(|(path, record)| (path.as_str(), record))
    }

    /// Visited records with their stored name and save path.
    pub fn visited(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.records.iter().filter_map(|(path, record)| match record {
            LinkRecord::Visited {
                stored_name,
                save_path,
            } => Some((path.as_str(), stored_name.as_str(), save_path.as_str())),
            LinkRecord::Unvisited => None,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn unvisited_count(&self) -> usize {
        self.records.values().filter(|r| !r.is_visited()).count()
    }

    /// True once every known path has been visited.
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty() && self.unvisited_count() == 0
    }
}
