use crate::context::{Displacement, DragContext};
use crate::error::{DndError, Result};
use crate::geometry::{ItemId, Point};

#[derive(Clone, Debug, PartialEq)]
pub struct ActiveDrag {
    pub id: ItemId,
    /// Order index of the item when the gesture began.
    pub start_index: usize,
    /// Offset the item carried when the gesture began. Pointer deltas are
    /// measured from here.
    pub start_offset: Point,
    pub delta: Point,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(ActiveDrag),
}

/// Result of one pointer move.
#[derive(Clone, Debug, PartialEq)]
pub struct DragMove {
    /// Translation to apply to the dragged element for this frame, without
    /// easing.
    pub follow: Point,
    /// Siblings that changed slot on this tick, with the offsets to ease to.
    pub displaced: Vec<Displacement>,
    pub order_index: usize,
}

/// A request to persist a changed position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReorderRequest {
    pub id: ItemId,
    pub from: usize,
    pub to: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DragEnd {
    pub id: ItemId,
    /// Offset of the item's final slot; the dragged element eases there.
    pub settle_to: Point,
    /// Present only when the final index differs from the starting one.
    pub reorder: Option<ReorderRequest>,
}

/// Pointer-gesture lifecycle of one list: `Idle -> Dragging -> Idle`.
///
/// A session is exclusive: only the item that started the gesture may move or
/// end it until it returns to idle.
#[derive(Clone, Debug, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveDrag> {
        match &self.state {
            DragState::Dragging(drag) => Some(drag),
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.active().is_some()
    }

    /// Drop the current gesture without producing a reorder.
    pub fn cancel(&mut self) -> Option<ActiveDrag> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(drag) => {
                tracing::debug!(id = %drag.id, "drag cancelled");
                Some(drag)
            }
            DragState::Idle => None,
        }
    }

    pub fn on_drag_start(&mut self, cx: &DragContext, id: &ItemId) -> Result<()> {
        if let Some(active) = self.active() {
            return Err(DndError::SessionBusy(active.id.clone()));
        }
        let item = cx.item(id).ok_or_else(|| DndError::missing_id(id))?;

        tracing::debug!(%id, index = item.order_index(), "drag started");
        self.state = DragState::Dragging(ActiveDrag {
            id: id.clone(),
            start_index: item.order_index(),
            start_offset: item.offset(),
            delta: Point::ZERO,
        });
        Ok(())
    }

    /// Follow the pointer, remapping the list when the dragged item crosses
    /// into another slot.
    ///
    /// `delta` is the raw pointer movement since the gesture started. Any
    /// failure aborts the session.
    pub fn on_drag_move(
        &mut self,
        cx: &mut DragContext,
        id: &ItemId,
        delta: Point,
    ) -> Result<DragMove> {
        let start_offset = match &mut self.state {
            DragState::Dragging(active) if active.id == *id => {
                active.delta = delta;
                active.start_offset
            }
            DragState::Dragging(active) => return Err(DndError::SessionBusy(active.id.clone())),
            DragState::Idle => return Err(DndError::missing_id(id)),
        };

        let result = Self::follow(cx, id, start_offset, delta);
        if result.is_err() {
            self.cancel();
        }
        result
    }

    fn follow(
        cx: &mut DragContext,
        id: &ItemId,
        start_offset: Point,
        delta: Point,
    ) -> Result<DragMove> {
        let item = cx.item(id).ok_or_else(|| DndError::missing_id(id))?;
        let current = item.order_index();
        let follow = start_offset + delta;
        let dragged_center = item.rect().center() + follow;

        let candidate = cx.candidate_index(current, dragged_center)?;
        let mut displaced = Vec::new();
        if candidate != current {
            displaced = cx.update_index(current, candidate)?;
            displaced.retain(|displacement| displacement.id != *id);
        }

        Ok(DragMove {
            follow,
            displaced,
            order_index: candidate,
        })
    }

    /// Release the gesture. A reorder is requested at most once per gesture,
    /// and only when the item ended up in a different slot.
    pub fn on_drag_end(&mut self, cx: &DragContext, id: &ItemId) -> Result<DragEnd> {
        let active = match std::mem::take(&mut self.state) {
            DragState::Dragging(active) if active.id == *id => active,
            DragState::Dragging(active) => {
                let busy = active.id.clone();
                self.state = DragState::Dragging(active);
                return Err(DndError::SessionBusy(busy));
            }
            DragState::Idle => return Err(DndError::missing_id(id)),
        };

        let item = cx.item(id).ok_or_else(|| DndError::missing_id(id))?;
        let to = item.order_index();
        let reorder = (to != active.start_index).then(|| ReorderRequest {
            id: id.clone(),
            from: active.start_index,
            to,
        });

        tracing::debug!(%id, from = active.start_index, to, "drag ended");
        Ok(DragEnd {
            id: id.clone(),
            settle_to: item.offset(),
            reorder,
        })
    }
}
