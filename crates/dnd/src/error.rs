use thiserror::Error;

use crate::ItemId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DndError {
    /// Remapping an item onto the slot it already occupies.
    #[error("can't move item to the same index {from} -> {to}")]
    InvalidMove { from: usize, to: usize },

    #[error("index {index} is out of range for a list of {len} items")]
    OutOfRange { index: usize, len: usize },

    /// The dragged item is missing from the tracked list.
    #[error("no current item: {0}")]
    NoCurrentItem(String),

    #[error("a drag session is already active for {0}")]
    SessionBusy(ItemId),

    #[error("persistence failed: {0}")]
    PersistenceFailure(String),
}

impl DndError {
    pub(crate) fn missing_index(index: usize) -> Self {
        DndError::NoCurrentItem(format!("order index {index}"))
    }

    pub(crate) fn missing_id(id: &ItemId) -> Self {
        DndError::NoCurrentItem(format!("item {id}"))
    }
}

pub type Result<T, E = DndError> = std::result::Result<T, E>;
