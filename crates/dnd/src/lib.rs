mod config;
mod context;
mod error;
mod geometry;
mod sequence;
mod session;
mod spring;
mod transition;

pub use config::{DragConfig, SpringConfig};
pub use context::{Displacement, DragContext};
pub use error::{DndError, Result};
pub use geometry::{DraggableItem, ItemId, Orientation, Point, Rect, center};
pub use sequence::{WriteSequencer, WriteTicket};
pub use session::{ActiveDrag, DragEnd, DragMove, DragSession, DragState, ReorderRequest};
pub use spring::{Spring, SpringPoint};
pub use transition::{ListChange, ListTransition, Phase, TransitionItem, diff_keys};
