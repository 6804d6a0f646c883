use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;

use crate::model::{Board, Task};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("board {0} not found")]
    BoardNotFound(String),

    #[error("task {0} not found")]
    TaskNotFound(String),

    #[error("can't move {0} to the index it already has")]
    SameIndex(String),

    #[error("index {index} is out of range for {len} entries")]
    InvalidIndex { index: usize, len: usize },

    #[error("store lock poisoned")]
    Poisoned,

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode boards: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Persistence for boards and tasks.
///
/// Calls are blocking and are expected to run on a background executor. Every
/// mutation returns the persisted entity. Creation takes the id from the
/// caller so the view can show the entity before the store confirms it.
pub trait BoardStore: Send + Sync + 'static {
    /// All boards in index order, each with its tasks in index order.
    fn list_boards(&self) -> Result<Vec<Board>>;

    /// Append a board after the last one.
    fn create_board(&self, id: &str, title: &str) -> Result<Board>;
    fn rename_board(&self, id: &str, title: &str) -> Result<Board>;
    /// Delete a board with its tasks. Later boards shift down by one.
    fn delete_board(&self, id: &str) -> Result<()>;
    /// Move a board to `index`. Boards in between shift by one toward the gap.
    fn reorder_board(&self, id: &str, index: usize) -> Result<Board>;

    /// Append a task to the end of a board.
    fn create_task(&self, id: &str, board_id: &str, title: &str) -> Result<Task>;
    fn rename_task(&self, id: &str, title: &str) -> Result<Task>;
    fn delete_task(&self, id: &str) -> Result<()>;
    /// Move a task into `board_id` at `index`, or to its end when `index` is
    /// `None`. Both columns are left dense.
    fn move_task(&self, id: &str, board_id: &str, index: Option<usize>) -> Result<Task>;
}

/// A `BoardStore` kept in memory and optionally mirrored to a JSON file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    boards: Mutex<Vec<Board>>,
    path: Option<PathBuf>,
    latency: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by `path`. A missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let boards = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let mut boards: Vec<Board> = serde_json::from_str(&content)?;
            normalize(&mut boards);
            boards
        } else {
            Vec::new()
        };

        tracing::debug!(path = %path.display(), boards = boards.len(), "store opened");
        Ok(Self {
            boards: Mutex::new(boards),
            path: Some(path),
            latency: Duration::ZERO,
        })
    }

    /// Delay every call by `latency`, to exercise pending states.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fill an empty store with two boards and two tasks. Returns whether
    /// anything was written.
    pub fn seed(&self) -> Result<bool> {
        self.write(|boards| {
            if !boards.is_empty() {
                return Ok(false);
            }
            let mut first = Board::new(crate::model::new_id(), "Board 1", 0);
            for (index, title) in ["Task 1", "Task 2"].into_iter().enumerate() {
                first.tasks.push(Task {
                    id: crate::model::new_id(),
                    board_id: first.id.clone(),
                    title: title.to_string(),
                    index,
                });
            }
            boards.push(first);
            boards.push(Board::new(crate::model::new_id(), "Board 2", 1));
            tracing::info!("seeded empty store");
            Ok(true)
        })
    }

    fn read<T>(&self, f: impl FnOnce(&[Board]) -> Result<T>) -> Result<T> {
        self.wait();
        let boards = self.boards.lock().map_err(|_| StoreError::Poisoned)?;
        f(&boards)
    }

    /// Apply `f` to a copy of the boards and commit it once it has been saved.
    fn write<T>(&self, f: impl FnOnce(&mut Vec<Board>) -> Result<T>) -> Result<T> {
        self.wait();
        let mut boards = self.boards.lock().map_err(|_| StoreError::Poisoned)?;
        let mut next = boards.clone();
        let value = f(&mut next)?;
        normalize(&mut next);
        if let Some(path) = &self.path {
            save(path, &next)?;
        }
        *boards = next;
        Ok(value)
    }

    fn wait(&self) {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
    }
}

impl BoardStore for MemoryStore {
    fn list_boards(&self) -> Result<Vec<Board>> {
        self.read(|boards| Ok(boards.to_vec()))
    }

    fn create_board(&self, id: &str, title: &str) -> Result<Board> {
        self.write(|boards| {
            let index = boards.iter().map(|b| b.index + 1).max().unwrap_or(0);
            let board = Board::new(id, title, index);
            boards.push(board.clone());
            tracing::debug!(id, index, "board created");
            Ok(board)
        })
    }

    fn rename_board(&self, id: &str, title: &str) -> Result<Board> {
        self.write(|boards| {
            let board = boards
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or_else(|| StoreError::BoardNotFound(id.to_string()))?;
            board.title = title.to_string();
            Ok(board.clone())
        })
    }

    fn delete_board(&self, id: &str) -> Result<()> {
        self.write(|boards| {
            let ix = board_position(boards, id)?;
            let board = boards.remove(ix);
            tracing::debug!(id, index = board.index, tasks = board.tasks.len(), "board deleted");
            Ok(())
        })
    }

    fn reorder_board(&self, id: &str, index: usize) -> Result<Board> {
        self.write(|boards| {
            let from = board_position(boards, id)?;
            if from == index {
                return Err(StoreError::SameIndex(id.to_string()));
            }
            if index >= boards.len() {
                return Err(StoreError::InvalidIndex {
                    index,
                    len: boards.len(),
                });
            }
            let board = boards.remove(from);
            boards.insert(index, board);
            reindex(boards);
            tracing::debug!(id, from, to = index, "board reordered");
            Ok(boards[index].clone())
        })
    }

    fn create_task(&self, id: &str, board_id: &str, title: &str) -> Result<Task> {
        self.write(|boards| {
            let ix = board_position(boards, board_id)?;
            let board = &mut boards[ix];
            let index = board.tasks.iter().map(|t| t.index + 1).max().unwrap_or(0);
            let task = Task {
                id: id.to_string(),
                board_id: board_id.to_string(),
                title: title.to_string(),
                index,
            };
            board.tasks.push(task.clone());
            tracing::debug!(id, board_id, index, "task created");
            Ok(task)
        })
    }

    fn rename_task(&self, id: &str, title: &str) -> Result<Task> {
        self.write(|boards| {
            let (bx, tx) = task_position(boards, id)?;
            let task = &mut boards[bx].tasks[tx];
            task.title = title.to_string();
            Ok(task.clone())
        })
    }

    fn delete_task(&self, id: &str) -> Result<()> {
        self.write(|boards| {
            let (bx, tx) = task_position(boards, id)?;
            boards[bx].tasks.remove(tx);
            tracing::debug!(id, "task deleted");
            Ok(())
        })
    }

    fn move_task(&self, id: &str, board_id: &str, index: Option<usize>) -> Result<Task> {
        self.write(|boards| {
            let target = board_position(boards, board_id)?;
            let (bx, tx) = task_position(boards, id)?;
            let mut task = boards[bx].tasks.remove(tx);
            task.board_id = board_id.to_string();

            let tasks = &mut boards[target].tasks;
            let at = index.map_or(tasks.len(), |index| index.min(tasks.len()));
            tasks.insert(at, task);
            for (ix, task) in tasks.iter_mut().enumerate() {
                task.index = ix;
            }
            tracing::debug!(id, board_id, index = at, "task moved");
            Ok(tasks[at].clone())
        })
    }
}

fn board_position(boards: &[Board], id: &str) -> Result<usize> {
    boards
        .iter()
        .position(|b| b.id == id)
        .ok_or_else(|| StoreError::BoardNotFound(id.to_string()))
}

fn task_position(boards: &[Board], id: &str) -> Result<(usize, usize)> {
    boards
        .iter()
        .enumerate()
        .find_map(|(bx, board)| {
            board
                .tasks
                .iter()
                .position(|t| t.id == id)
                .map(|tx| (bx, tx))
        })
        .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))
}

fn reindex(boards: &mut [Board]) {
    for (ix, board) in boards.iter_mut().enumerate() {
        board.index = ix;
    }
}

/// Sort by index and make every index dense.
fn normalize(boards: &mut [Board]) {
    boards.sort_by_key(|b| b.index);
    reindex(boards);
    for board in boards.iter_mut() {
        board.tasks.sort_by_key(|t| t.index);
        for (ix, task) in board.tasks.iter_mut().enumerate() {
            task.index = ix;
            task.board_id.clone_from(&board.id);
        }
    }
}

fn save(path: &Path, boards: &[Board]) -> Result<()> {
    let content = serde_json::to_string_pretty(boards)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, content).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}
