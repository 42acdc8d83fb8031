//! Runtime identifier fallback graph.

use std::collections::BTreeMap;

/// Per-RID ordered fallback lists (`runtimes` section of the root manifest).
///
/// `linux-x64 -> [linux, unix-x64, unix, any, base]` means an asset for
/// `linux-x64` is preferred, then one for `linux`, and so on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RidFallbackGraph {
    fallbacks: BTreeMap<String, Vec<String>>,
}

impl RidFallbackGraph {
    pub const fn new() -> Self {
        Self {
            fallbacks: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, rid: impl Into<String>, fallbacks: Vec<String>) {
        self.fallbacks.insert(rid.into(), fallbacks);
    }

    pub fn is_empty(&self) -> bool {
        self.fallbacks.is_empty()
    }

    pub fn contains(&self, rid: &str) -> bool {
        self.fallbacks.contains_key(rid)
    }

    /// Ordered preference list for `host_rid`, starting with `host_rid` itself.
    pub fn preference_list<'g>(&'g self, host_rid: &'g str) -> Vec<&'g str> {
        let mut list = vec![host_rid];
        if let Some(fallbacks) = self.fallbacks.get(host_rid) {
            list.extend(fallbacks.iter().map(String::as_str));
        }
        list
    }

    /// Pick the candidate RID that appears earliest in `host_rid`'s preference list.
    pub fn best_match<'c, I>(&self, host_rid: &str, candidates: I) -> Option<&'c str>
    where
        I: IntoIterator<Item = &'c str>,
    {
        let preference = self.preference_list(host_rid);
        candidates
            .into_iter()
            .filter_map(|candidate| {
                preference
                    .iter()
                    .position(|rid| *rid == candidate)
                    .map(|rank| (rank, candidate))
            })
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, candidate)| candidate)
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<String>)> for RidFallbackGraph {
    fn from_iter<T: IntoIterator<Item = (S, Vec<String>)>>(iter: T) -> Self {
        let mut graph = RidFallbackGraph::new();
        for (rid, fallbacks) in iter {
            graph.insert(rid, fallbacks);
        }
        graph
    }
}
