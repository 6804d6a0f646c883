use kanban_dnd::ItemId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub board_id: String,
    pub title: String,
    pub index: usize,
}

impl Task {
    pub fn item_id(&self) -> ItemId {
        ItemId::from(&self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub title: String,
    pub index: usize,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Board {
    pub fn new(id: impl Into<String>, title: impl Into<String>, index: usize) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            index,
            tasks: Vec::new(),
        }
    }

    pub fn item_id(&self) -> ItemId {
        ItemId::from(&self.id)
    }

    pub fn task_ids(&self) -> Vec<ItemId> {
        self.tasks.iter().map(Task::item_id).collect()
    }
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
