mod config;
mod ghost;
mod kanban;
mod model;
mod store;

pub use config::{CONFIG_ENV, DEFAULT_CONFIG_FILE, KanbanConfig};
pub use kanban::KanbanBoard;
pub use model::{Board, Task, new_id};
pub use store::{BoardStore, MemoryStore, Result, StoreError};
