//! Point-in-time snapshots of the resource tables.
//!
//! A snapshot is a read-only diff aid, never persisted: it records which
//! entries existed (key, payload identity, count, suffix length) so a
//! later restore can detect drift. Restore only undoes additions: live
//! entries missing from the snapshot are unloaded, while entries that
//! disappeared since the snapshot are reported and left alone.

use crate::entry::PayloadId;
use crate::key::ResourceKey;
use crate::manager::ResourceManager;
use crate::types::ResourceType;
use hashbrown::HashSet;

/// One captured entry.
#[derive(Clone, Debug)]
pub struct SnapshotEntry {
    pub key: ResourceKey,
    pub id: PayloadId,
    pub ref_count: u16,
    pub suffix_len: usize,
}

/// Captured state of every table.
#[derive(Default)]
pub struct ResourceSnapshot {
    per_type: [Vec<SnapshotEntry>; ResourceType::COUNT],
}

impl ResourceSnapshot {
    pub fn entries(&self, ty: ResourceType) -> &[SnapshotEntry] {
        &self.per_type[ty.index()]
    }

    pub fn total_len(&self) -> usize {
        self.per_type.iter().map(Vec::len).sum()
    }
}

/// One reported divergence between a snapshot and the live tables.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SnapshotDiff {
    /// Live entry absent from the snapshot; restore evicts it.
    Added { ty: ResourceType, key: ResourceKey },
    /// Snapshot entry absent from the live table; reported only.
    Removed { ty: ResourceType, key: ResourceKey },
}

impl ResourceManager {
    /// Capture every table. Pure read; entries marked temporary are
    /// skipped so a later restore reclaims them.
    pub fn snapshot(&self) -> ResourceSnapshot {
        let mut snap = ResourceSnapshot::default();
        for ty in ResourceType::ALL {
            let list = &mut snap.per_type[ty.index()];
            for (_slot, key, entry) in self.iter(ty) {
                if entry.is_temporary() {
                    continue;
                }
                list.push(SnapshotEntry {
                    key: key.clone(),
                    id: entry.id(),
                    ref_count: entry.ref_count(),
                    suffix_len: key.suffix_len(),
                });
            }
        }
        snap
    }

    /// Reconcile the live tables against `snapshot`. Entries added since
    /// the snapshot are unloaded (protected ones are skipped with a
    /// warning); removed entries are reported with no corrective action.
    /// Returns true iff no mismatch was found in either direction.
    pub fn restore_snapshot(
        &mut self,
        snapshot: &ResourceSnapshot,
        mut diff_log: Option<&mut Vec<SnapshotDiff>>,
    ) -> bool {
        let mut clean = true;
        for ty in ResourceType::ALL {
            let captured: HashSet<&[u8]> = snapshot
                .entries(ty)
                .iter()
                .map(|e| e.key.as_bytes())
                .collect();

            // Pass 1: evict additions.
            for slot in self.slots_of(ty) {
                let (added, protected, key) = {
                    let key = self.key_at(ty, slot).expect("collected slot resolves");
                    let entry = self.entry_at(ty, slot).expect("collected slot resolves");
                    (
                        !captured.contains(key.as_bytes()),
                        entry.is_protected(),
                        key.clone(),
                    )
                };
                if !added {
                    continue;
                }
                clean = false;
                log::warn!("{} {:?} added since snapshot", ty, key);
                if let Some(log) = diff_log.as_deref_mut() {
                    log.push(SnapshotDiff::Added { ty, key });
                }
                if protected {
                    log::warn!("restore skipping protected addition");
                    continue;
                }
                self.force_unload_at(ty, slot);
            }

            // Pass 2: report removals.
            for captured_entry in snapshot.entries(ty) {
                if self.exists(captured_entry.key.as_bytes(), ty, b"") {
                    continue;
                }
                clean = false;
                log::warn!(
                    "{} {:?} removed since snapshot",
                    ty,
                    captured_entry.key
                );
                if let Some(log) = diff_log.as_deref_mut() {
                    log.push(SnapshotDiff::Removed {
                        ty,
                        key: captured_entry.key.clone(),
                    });
                }
            }
        }
        clean
    }
}
