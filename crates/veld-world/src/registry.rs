//! Explicit registration of density sources and their overlap bookkeeping.

use std::collections::BTreeMap;

use hashbrown::HashSet;

use crate::overlap::{chunks_overlapping, overlaps_chunk};
use crate::{ChunkCoord, DensitySource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u32);

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct Entry {
    source: DensitySource,
    enabled: bool,
    changed: bool,
    last_overlap: HashSet<ChunkCoord>,
}

/// Owns every active density source keyed by a stable, monotonically assigned id.
///
/// Sources are iterated in ascending id order everywhere, which is the order the
/// density pass combines them in.
#[derive(Debug, Default)]
pub struct DensityRegistry {
    entries: BTreeMap<SourceId, Entry>,
    next_id: u32,
}

impl DensityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source; it starts marked as changed so the next tick invalidates its chunks.
    pub fn insert(&mut self, source: DensitySource) -> SourceId {
        let id = SourceId(self.next_id);
        self.next_id += 1;
        log::debug!(
            target: "terrain",
            "source {} '{}' registered ({})",
            id,
            source.name,
            source.kind.name()
        );
        self.entries.insert(
            id,
            Entry {
                source,
                enabled: true,
                changed: true,
                last_overlap: HashSet::new(),
            },
        );
        id
    }

    /// Removes a source and hands back its last overlap set; those chunks must be re-evaluated.
    pub fn remove(&mut self, id: SourceId) -> Option<(DensitySource, HashSet<ChunkCoord>)> {
        let e = self.entries.remove(&id)?;
        log::debug!(
            target: "terrain",
            "source {} '{}' removed, flushing {} chunks",
            id,
            e.source.name,
            e.last_overlap.len()
        );
        Some((e.source, e.last_overlap))
    }

    pub fn get(&self, id: SourceId) -> Option<&DensitySource> {
        self.entries.get(&id).map(|e| &e.source)
    }

    /// Mutable access to a source. Any edit counts as a change.
    pub fn edit(&mut self, id: SourceId) -> Option<&mut DensitySource> {
        self.entries.get_mut(&id).map(|e| {
            e.changed = true;
            &mut e.source
        })
    }

    /// Enables or disables a source. Disabling returns the flushed overlap set.
    pub fn set_enabled(&mut self, id: SourceId, enabled: bool) -> Vec<ChunkCoord> {
        let Some(e) = self.entries.get_mut(&id) else {
            return Vec::new();
        };
        if e.enabled == enabled {
            return Vec::new();
        }
        e.enabled = enabled;
        if enabled {
            e.changed = true;
            Vec::new()
        } else {
            e.changed = false;
            let mut flushed: Vec<ChunkCoord> = e.last_overlap.drain().collect();
            flushed.sort();
            flushed
        }
    }

    pub fn is_enabled(&self, id: SourceId) -> bool {
        self.entries.get(&id).is_some_and(|e| e.enabled)
    }

    pub fn request_rebuild(&mut self, id: SourceId) -> bool {
        match self.entries.get_mut(&id) {
            Some(e) if e.enabled => {
                e.changed = true;
                true
            }
            _ => false,
        }
    }

    pub fn request_rebuild_all(&mut self) {
        for e in self.entries.values_mut().filter(|e| e.enabled) {
            e.changed = true;
        }
    }

    pub fn is_changed(&self, id: SourceId) -> bool {
        self.entries.get(&id).is_some_and(|e| e.changed)
    }

    /// Drains the changed flags, returning the affected ids in ascending order.
    pub fn take_changed(&mut self) -> Vec<SourceId> {
        let mut out = Vec::new();
        for (id, e) in self.entries.iter_mut() {
            if e.changed && e.enabled {
                e.changed = false;
                out.push(*id);
            }
        }
        out
    }

    /// Recomputes the overlap set of `id`, stores it, and returns `(old, new)`.
    pub fn refresh_overlap(
        &mut self,
        id: SourceId,
    ) -> Option<(HashSet<ChunkCoord>, HashSet<ChunkCoord>)> {
        let e = self.entries.get_mut(&id)?;
        let new = chunks_overlapping(&e.source.bounds());
        let old = std::mem::replace(&mut e.last_overlap, new.clone());
        Some((old, new))
    }

    pub fn last_overlap(&self, id: SourceId) -> Option<&HashSet<ChunkCoord>> {
        self.entries.get(&id).map(|e| &e.last_overlap)
    }

    /// Enabled sources whose bounds touch the padded chunk box, in ascending id order.
    pub fn overlapping(&self, coord: ChunkCoord) -> Vec<(SourceId, &DensitySource)> {
        self.enabled()
            .filter(|(_, s)| overlaps_chunk(&s.bounds(), coord))
            .collect()
    }

    pub fn enabled(&self) -> impl Iterator<Item = (SourceId, &DensitySource)> {
        self.entries
            .iter()
            .filter(|(_, e)| e.enabled)
            .map(|(id, e)| (*id, &e.source))
    }

    pub fn ids(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.entries.keys().copied()
    }

    pub fn find_by_name(&self, name: &str) -> Option<SourceId> {
        self.entries
            .iter()
            .find(|(_, e)| e.source.name == name)
            .map(|(id, _)| *id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
