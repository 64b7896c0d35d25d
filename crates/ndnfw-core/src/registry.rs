use std::sync::Arc;

use ndnfw_dsa::{Name, NameTrie};

use crate::route::RouteEntry;

/// The FIB: name prefixes bound to route entries.
///
/// Prefixes are burned into a [`NameTrie`] whose terminal nodes carry a u32
/// handle into `routes`, so lookups are a single trie walk with no string
/// matching. Handles stay stable for the registry's lifetime; an unregistered
/// slot is left empty and reused by the next registration.
#[derive(Default)]
pub struct RouteRegistry {
    trie: NameTrie,
    routes: Vec<Option<Arc<RouteEntry>>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for exactly `prefix`, creating it if needed.
    pub fn route(&mut self, prefix: &Name) -> Arc<RouteEntry> {
        if let Some(entry) = self.exact(prefix) {
            return entry;
        }

        let entry = Arc::new(RouteEntry::new(prefix.clone()));
        let handle = match self.routes.iter().position(Option::is_none) {
            Some(free) => {
                self.routes[free] = Some(Arc::clone(&entry));
                free
            }
            None => {
                self.routes.push(Some(Arc::clone(&entry)));
                self.routes.len() - 1
            }
        };
        self.trie.associate(prefix, handle as u32);
        tracing::info!("RouteRegistry: registered {} (handle {})", prefix, handle);
        entry
    }

    pub fn exact(&self, prefix: &Name) -> Option<Arc<RouteEntry>> {
        let handle = self.trie.exact(prefix)?;
        self.slot(handle)
    }

    /// Longest-prefix match.
    pub fn lookup(&self, name: &Name) -> Option<Arc<RouteEntry>> {
        let (handle, _) = self.trie.longest_prefix_match(name)?;
        self.slot(handle)
    }

    pub fn unregister(&mut self, prefix: &Name) -> Option<Arc<RouteEntry>> {
        let handle = self.trie.dissociate(prefix)?;
        let entry = self.routes.get_mut(handle as usize)?.take();
        if entry.is_some() {
            tracing::info!("RouteRegistry: unregistered {}", prefix);
        }
        entry
    }

    pub fn routes(&self) -> impl Iterator<Item = &Arc<RouteEntry>> {
        self.routes.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.routes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bumped whenever a prefix is bound or unbound.
    pub fn sequence_number(&self) -> u64 {
        self.trie.sequence_number
    }

    fn slot(&self, handle: u32) -> Option<Arc<RouteEntry>> {
        self.routes.get(handle as usize)?.clone()
    }
}
