use std::collections::HashMap;

use crate::geometry::ItemId;

/// Identifies one persistence call for an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteTicket {
    pub id: ItemId,
    pub seq: u64,
}

/// Orders overlapping persistence calls per entity.
///
/// Calls are never queued or serialized; a later call for the same entity
/// supersedes an earlier one, and only the latest completion is reported.
#[derive(Debug, Default)]
pub struct WriteSequencer {
    next_seq: u64,
    latest: HashMap<ItemId, u64>,
}

impl WriteSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, id: &ItemId) -> WriteTicket {
        self.next_seq = self.next_seq.wrapping_add(1);
        self.latest.insert(id.clone(), self.next_seq);
        WriteTicket {
            id: id.clone(),
            seq: self.next_seq,
        }
    }

    fn is_current(&self, ticket: &WriteTicket) -> bool {
        self.latest.get(&ticket.id) == Some(&ticket.seq)
    }

    /// Record a completion. Returns `false` when a newer call for the same
    /// entity has been issued since, in which case the result is stale.
    pub fn finish(&mut self, ticket: &WriteTicket) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(id = %ticket.id, seq = ticket.seq, "stale write completion");
            return false;
        }
        self.latest.remove(&ticket.id);
        true
    }

    /// Number of entities with a write still in flight.
    pub fn pending(&self) -> usize {
        self.latest.len()
    }

    pub fn is_pending(&self, id: &ItemId) -> bool {
        self.latest.contains_key(id)
    }
}
