//! Creator registry: who owns which account on which platform.
//!
//! LIFECYCLE (fixed):
//!   1. `RegistryBuilder::new()`
//!   2. `register()` every known creator (fails fast on handle collisions)
//!   3. `freeze()` into an immutable `CreatorRegistry`
//!   4. share read-only snapshots for the rest of the run
//!
//! RULE: a frozen registry is never mutated. Reloads build a new one and
//! swap it into `SharedRegistry`; runs already holding a snapshot keep it.

use crate::{
    error::{PayoutError, PayoutResult},
    normalize::{handle_from_url, normalize_display_name, normalize_handle},
    types::{CreatorId, Platform},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

/// One registered creator and every handle they post from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorRecord {
    pub creator_id:          CreatorId,
    pub display_name:        String,
    #[serde(default)]
    pub handles_by_platform: BTreeMap<Platform, BTreeSet<String>>,
}

impl CreatorRecord {
    pub fn new(creator_id: impl Into<CreatorId>, display_name: impl Into<String>) -> Self {
        Self {
            creator_id:          creator_id.into(),
            display_name:        display_name.into(),
            handles_by_platform: BTreeMap::new(),
        }
    }

    pub fn with_handle(mut self, platform: Platform, handle: &str) -> Self {
        self.add_handle(platform, handle);
        self
    }

    /// Adds the normalized handle. Empty handles are ignored.
    pub fn add_handle(&mut self, platform: Platform, handle: &str) {
        let handle = normalize_handle(handle);
        if !handle.is_empty() {
            self.handles_by_platform.entry(platform).or_default().insert(handle);
        }
    }

    pub fn handles(&self, platform: Platform) -> impl Iterator<Item = &str> {
        self.handles_by_platform
            .get(&platform)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    fn normalized(mut self) -> Self {
        let raw = std::mem::take(&mut self.handles_by_platform);
        for (platform, handles) in raw {
            for handle in handles {
                self.add_handle(platform, &handle);
            }
        }
        self
    }
}

/// Result of a registry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(CreatorId),
    NotFound,
    /// More than one creator fits; callers must not pick one.
    Ambiguous(Vec<CreatorId>),
}

/// Mutable phase of the registry lifecycle.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    creators:  Vec<CreatorRecord>,
    ids:       HashSet<CreatorId>,
    by_handle: HashMap<(Platform, String), usize>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a creator. Either every handle is claimed or none is: a
    /// collision leaves the builder exactly as it was.
    pub fn register(&mut self, record: CreatorRecord) -> PayoutResult<()> {
        let record = record.normalized();

        if self.ids.contains(&record.creator_id) {
            return Err(PayoutError::DuplicateCreator {
                creator_id: record.creator_id,
            });
        }

        for (platform, handles) in &record.handles_by_platform {
            for handle in handles {
                if let Some(&owner) = self.by_handle.get(&(*platform, handle.clone())) {
                    return Err(PayoutError::DuplicateHandle {
                        platform: *platform,
                        handle:   handle.clone(),
                        existing: self.creators[owner].creator_id.clone(),
                        incoming: record.creator_id.clone(),
                    });
                }
            }
        }

        let index = self.creators.len();
        for (platform, handles) in &record.handles_by_platform {
            for handle in handles {
                self.by_handle.insert((*platform, handle.clone()), index);
            }
        }
        log::debug!(
            "registry: registered '{}' with {} handle(s)",
            record.creator_id,
            record.handles_by_platform.values().map(BTreeSet::len).sum::<usize>()
        );
        self.ids.insert(record.creator_id.clone());
        self.creators.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }

    /// End the build phase.
    pub fn freeze(self) -> CreatorRegistry {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, creator) in self.creators.iter().enumerate() {
            let name = normalize_display_name(&creator.display_name);
            if !name.is_empty() {
                by_name.entry(name).or_default().push(i);
            }
        }
        log::info!("registry: frozen with {} creator(s)", self.creators.len());
        CreatorRegistry {
            creators:  self.creators,
            by_handle: self.by_handle,
            by_name,
        }
    }
}

/// Frozen, read-only registry.
#[derive(Debug)]
pub struct CreatorRegistry {
    creators:  Vec<CreatorRecord>,
    by_handle: HashMap<(Platform, String), usize>,
    by_name:   HashMap<String, Vec<usize>>,
}

impl CreatorRegistry {
    /// Build and freeze in one go. Fails on the first collision.
    pub fn from_records(records: impl IntoIterator<Item = CreatorRecord>) -> PayoutResult<Self> {
        let mut builder = RegistryBuilder::new();
        for record in records {
            builder.register(record)?;
        }
        Ok(builder.freeze())
    }

    pub fn lookup_by_handle(&self, platform: Platform, handle: &str) -> Lookup {
        let handle = normalize_handle(handle);
        if handle.is_empty() {
            return Lookup::NotFound;
        }
        match self.by_handle.get(&(platform, handle)) {
            Some(&i) => Lookup::Found(self.creators[i].creator_id.clone()),
            None => Lookup::NotFound,
        }
    }

    /// Resolve the account handle embedded in `url`, then look it up on the
    /// URL's own platform.
    pub fn lookup_by_url(&self, url: &str) -> Lookup {
        match handle_from_url(url) {
            Some((platform, handle)) => self.lookup_by_handle(platform, &handle),
            None => Lookup::NotFound,
        }
    }

    /// Case-insensitive exact match only. Two creators sharing a name is
    /// `Ambiguous`, never a pick.
    pub fn lookup_by_display_name(&self, name: &str) -> Lookup {
        let name = normalize_display_name(name);
        if name.is_empty() {
            return Lookup::NotFound;
        }
        match self.by_name.get(&name).map(Vec::as_slice) {
            None | Some([]) => Lookup::NotFound,
            Some([only]) => Lookup::Found(self.creators[*only].creator_id.clone()),
            Some(many) => Lookup::Ambiguous(
                many.iter()
                    .map(|&i| self.creators[i].creator_id.clone())
                    .collect(),
            ),
        }
    }

    pub fn get(&self, creator_id: &str) -> Option<&CreatorRecord> {
        self.creators.iter().find(|c| c.creator_id == creator_id)
    }

    pub fn creators(&self) -> &[CreatorRecord] {
        &self.creators
    }

    pub fn len(&self) -> usize {
        self.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

/// Holder for the current registry. Each run takes one `snapshot()` and
/// uses it throughout, so a concurrent `replace()` never splits a run
/// across two registries.
#[derive(Debug)]
pub struct SharedRegistry {
    current: RwLock<Arc<CreatorRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: CreatorRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    pub fn snapshot(&self) -> Arc<CreatorRegistry> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn replace(&self, registry: CreatorRegistry) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(registry);
        log::info!("registry: replaced, {} creator(s) now active", guard.len());
    }
}
