//! Keyed enter/exit/shift animation of a rendered list.
//!
//! [`ListTransition`] only reacts to changes of the key sequence it is given.
//! Offsets applied by a drag never reach it, so a drag can't re-trigger it.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use crate::config::SpringConfig;
use crate::geometry::{Point, Rect};
use crate::spring::{Spring, SpringPoint};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListChange<K> {
    pub added: Vec<K>,
    pub removed: Vec<K>,
    pub unchanged: Vec<K>,
}

impl<K> ListChange<K> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Classify every key of `prev` and `next` as added, removed or unchanged.
pub fn diff_keys<K: Clone + Eq + Hash>(prev: &[K], next: &[K]) -> ListChange<K> {
    let prev_set = prev.iter().collect::<HashSet<_>>();
    let next_set = next.iter().collect::<HashSet<_>>();

    ListChange {
        added: next
            .iter()
            .filter(|key| !prev_set.contains(key))
            .cloned()
            .collect(),
        removed: prev
            .iter()
            .filter(|key| !next_set.contains(key))
            .cloned()
            .collect(),
        unchanged: next
            .iter()
            .filter(|key| prev_set.contains(key))
            .cloned()
            .collect(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    Entering,
    Present,
    /// Out of layout flow, pinned to the last known box while it fades out.
    Exiting { pinned: Rect },
}

/// Render state of one entry.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionItem<K> {
    pub key: K,
    pub phase: Phase,
    /// Scale and opacity, in `0..=1`.
    pub progress: f32,
    /// Corrective translation to apply on top of layout.
    pub shift: Point,
}

#[derive(Clone, Debug)]
struct Entry<K> {
    key: K,
    phase: Phase,
    progress: Spring,
    shift: SpringPoint,
    rect: Option<Rect>,
    /// Visual origin before the last key change, waiting for the next layout.
    shift_from: Option<Point>,
}

/// Removals that started together leave the render tree together.
#[derive(Clone, Debug)]
struct RemovalGate<K> {
    keys: Vec<K>,
    remaining: Vec<K>,
}

#[derive(Clone, Debug)]
pub struct ListTransition<K> {
    keys: Vec<K>,
    entries: Vec<Entry<K>>,
    gates: Vec<RemovalGate<K>>,
    config: SpringConfig,
}

impl<K: Clone + Eq + Hash + Debug> ListTransition<K> {
    /// Start with `keys` already present; the initial list does not animate in.
    pub fn new(keys: impl IntoIterator<Item = K>, config: SpringConfig) -> Self {
        let keys = keys.into_iter().collect::<Vec<_>>();
        let entries = keys
            .iter()
            .map(|key| Entry {
                key: key.clone(),
                phase: Phase::Present,
                progress: Spring::at(1., config),
                shift: SpringPoint::at(Point::ZERO, config),
                rect: None,
                shift_from: None,
            })
            .collect();
        Self {
            keys,
            entries,
            gates: Vec::new(),
            config,
        }
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Entries to render: the current keys in order, followed by the ones
    /// still animating out.
    pub fn items(&self) -> impl Iterator<Item = TransitionItem<K>> + '_ {
        self.entries.iter().map(|entry| TransitionItem {
            key: entry.key.clone(),
            phase: entry.phase,
            progress: entry.progress.position().clamp(0., 1.),
            shift: entry.shift.position(),
        })
    }

    pub fn is_animating(&self) -> bool {
        !self.gates.is_empty()
            || self.entries.iter().any(|entry| {
                !entry.progress.is_at_rest()
                    || !entry.shift.is_at_rest()
                    || entry.shift_from.is_some()
            })
    }

    /// Apply a new rendered collection.
    pub fn update(&mut self, next: &[K]) -> ListChange<K> {
        if self.keys.as_slice() == next {
            return ListChange {
                added: Vec::new(),
                removed: Vec::new(),
                unchanged: next.to_vec(),
            };
        }

        let change = diff_keys(&self.keys, next);
        let mut entries = std::mem::take(&mut self.entries);

        // Every present entry remembers where it was drawn, so a layout jump
        // caused by this change can be cancelled out once it is measured.
        for entry in &mut entries {
            if !matches!(entry.phase, Phase::Exiting { .. }) {
                entry.shift_from = entry
                    .rect
                    .map(|rect| rect.origin() + entry.shift.position());
            }
        }

        let mut removed_now = Vec::new();
        for key in &change.removed {
            let Some(entry) = entries.iter_mut().find(|entry| entry.key == *key) else {
                continue;
            };
            // Never measured means never drawn; there is nothing to fade out.
            let Some(rect) = entry.rect else {
                continue;
            };
            entry.phase = Phase::Exiting {
                pinned: rect.translate(entry.shift.position()),
            };
            entry.shift_from = None;
            entry.progress.set_target(0.);
            removed_now.push(key.clone());
        }
        entries.retain(|entry| {
            next.contains(&entry.key) || matches!(entry.phase, Phase::Exiting { .. })
        });
        if !removed_now.is_empty() {
            self.gates.push(RemovalGate {
                keys: removed_now.clone(),
                remaining: removed_now,
            });
        }

        let mut ordered = Vec::with_capacity(next.len() + self.gates.len());
        let mut dropped = Vec::new();
        for key in next {
            let entry = match entries.iter().position(|entry| entry.key == *key) {
                Some(ix) => {
                    let mut entry = entries.remove(ix);
                    if matches!(entry.phase, Phase::Exiting { .. }) {
                        dropped.extend(self.revive(key));
                        entry.phase = Phase::Entering;
                        entry.progress.set_target(1.);
                    }
                    entry
                }
                None => Entry {
                    key: key.clone(),
                    phase: Phase::Entering,
                    progress: Spring::new(0., 1., self.config),
                    shift: SpringPoint::at(Point::ZERO, self.config),
                    rect: None,
                    shift_from: None,
                },
            };
            ordered.push(entry);
        }
        entries.retain(|entry| !dropped.contains(&entry.key));
        ordered.extend(entries);

        self.entries = ordered;
        self.keys = next.to_vec();
        tracing::debug!(
            added = change.added.len(),
            removed = change.removed.len(),
            "list transition"
        );
        change
    }

    /// Record the layout box of an entry, excluding any shift applied to it.
    ///
    /// The first measurement after a key change starts the corrective
    /// translation of an entry whose position moved; the returned point is the
    /// translation it starts from.
    pub fn measure(&mut self, key: &K, rect: Rect) -> Option<Point> {
        let config = self.config;
        let entry = self.entries.iter_mut().find(|entry| entry.key == *key)?;
        if matches!(entry.phase, Phase::Exiting { .. }) {
            return None;
        }
        entry.rect = Some(rect);

        let from = entry.shift_from.take()?;
        let correction = from - rect.origin();
        if correction.is_zero() || entry.phase == Phase::Entering {
            return None;
        }
        entry.shift = SpringPoint::new(correction, Point::ZERO, config);
        Some(correction)
    }

    /// Advance all animations. Returns the keys that have now fully left the
    /// render tree.
    pub fn tick(&mut self, dt: Duration) -> Vec<K> {
        let mut exited = Vec::new();
        for entry in &mut self.entries {
            entry.progress.advance(dt);
            entry.shift.advance(dt);
            match entry.phase {
                Phase::Entering if entry.progress.is_at_rest() => entry.phase = Phase::Present,
                Phase::Exiting { .. } if entry.progress.is_at_rest() => {
                    exited.push(entry.key.clone())
                }
                _ => {}
            }
        }

        let mut finished = Vec::new();
        for key in exited {
            finished.extend(self.finish_exit(&key));
        }
        finished
    }

    /// An exit animation has completed. Unknown keys are ignored.
    ///
    /// Returns the keys removed from the render tree, which happens only once
    /// every removal of the same batch has finished.
    pub fn finish_exit(&mut self, key: &K) -> Vec<K> {
        let Some(gate_ix) = self
            .gates
            .iter()
            .position(|gate| gate.remaining.contains(key))
        else {
            return Vec::new();
        };

        let gate = &mut self.gates[gate_ix];
        gate.remaining.retain(|remaining| remaining != key);
        if !gate.remaining.is_empty() {
            return Vec::new();
        }

        let gate = self.gates.remove(gate_ix);
        self.entries.retain(|entry| {
            !(gate.keys.contains(&entry.key) && matches!(entry.phase, Phase::Exiting { .. }))
        });
        gate.keys
    }

    /// A removed key came back before its exit finished. Returns the keys of
    /// any batch that this completes.
    fn revive(&mut self, key: &K) -> Vec<K> {
        let mut completed = Vec::new();
        self.gates.retain_mut(|gate| {
            if !gate.keys.contains(key) {
                return true;
            }
            gate.keys.retain(|k| k != key);
            gate.remaining.retain(|k| k != key);
            if gate.remaining.is_empty() {
                completed.append(&mut gate.keys);
                return false;
            }
            true
        });
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn column(keys: &[&'static str]) -> ListTransition<&'static str> {
        let mut transition = ListTransition::new(keys.iter().copied(), SpringConfig::default());
        for (ix, key) in keys.iter().enumerate() {
            transition.measure(key, Rect::new(0., ix as f32 * 50., 200., 40.));
        }
        transition
    }

    fn settle(transition: &mut ListTransition<&'static str>) -> Vec<&'static str> {
        let mut finished = Vec::new();
        for _ in 0..400 {
            finished.extend(transition.tick(FRAME));
        }
        finished
    }

    #[test]
    fn diff_classifies_keys() {
        let change = diff_keys(&["a", "b", "c"], &["a", "c", "d"]);
        assert_eq!(change.added, vec!["d"]);
        assert_eq!(change.removed, vec!["b"]);
        assert_eq!(change.unchanged, vec!["a", "c"]);
    }

    #[test]
    fn removal_shifts_only_moved_siblings() {
        let mut transition = column(&["a", "b", "c"]);
        let change = transition.update(&["a", "c"]);
        assert_eq!(change.removed, vec!["b"]);
        assert_eq!(change.unchanged, vec!["a", "c"]);
        assert!(change.added.is_empty());

        assert_eq!(transition.measure(&"a", Rect::new(0., 0., 200., 40.)), None);
        assert_eq!(
            transition.measure(&"c", Rect::new(0., 50., 200., 40.)),
            Some(Point::new(0., 50.))
        );

        let b = transition.items().find(|item| item.key == "b").unwrap();
        assert_eq!(
            b.phase,
            Phase::Exiting {
                pinned: Rect::new(0., 50., 200., 40.)
            }
        );

        assert_eq!(settle(&mut transition), vec!["b"]);
        let items = transition.items().collect::<Vec<_>>();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.shift == Point::ZERO));
        assert!(!transition.is_animating());
    }

    #[test]
    fn concurrent_removals_share_a_gate() {
        let mut transition = column(&["a", "b", "c", "d"]);
        transition.update(&["a", "d"]);

        assert!(transition.finish_exit(&"b").is_empty());
        assert_eq!(transition.items().count(), 4);
        assert_eq!(transition.finish_exit(&"c"), vec!["b", "c"]);
        assert_eq!(
            transition.items().map(|item| item.key).collect::<Vec<_>>(),
            vec!["a", "d"]
        );
        assert!(transition.finish_exit(&"zzz").is_empty());
    }

    #[test]
    fn added_items_grow_in() {
        let mut transition = column(&["a"]);
        let change = transition.update(&["a", "b"]);
        assert_eq!(change.added, vec!["b"]);

        let b = transition.items().find(|item| item.key == "b").unwrap();
        assert_eq!(b.phase, Phase::Entering);
        assert_eq!(b.progress, 0.);
        assert_eq!(transition.measure(&"a", Rect::new(0., 0., 200., 40.)), None);

        settle(&mut transition);
        let b = transition.items().find(|item| item.key == "b").unwrap();
        assert_eq!(b.phase, Phase::Present);
        assert_eq!(b.progress, 1.);
    }

    #[test]
    fn identical_keys_do_not_retrigger() {
        let mut transition = column(&["a", "b"]);
        assert!(transition.update(&["a", "b"]).is_empty());
        // A moved box alone is not a key change.
        assert_eq!(transition.measure(&"b", Rect::new(30., 50., 200., 40.)), None);
        assert!(!transition.is_animating());
    }

    #[test]
    fn readded_key_leaves_the_gate() {
        let mut transition = column(&["a", "b", "c"]);
        transition.update(&["a"]);
        transition.update(&["a", "b"]);

        assert_eq!(transition.finish_exit(&"c"), vec!["c"]);
        let b = transition.items().find(|item| item.key == "b").unwrap();
        assert_eq!(b.phase, Phase::Entering);
    }
}
