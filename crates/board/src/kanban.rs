use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme as _, Icon, IconName, Sizable as _, StyledExt as _, WindowExt as _,
    button::{Button, ButtonVariants as _},
    h_flex,
    input::{Input, InputState},
    notification::Notification,
    v_flex,
};
use kanban_dnd::{
    DndError, DragContext, DragSession, ItemId, ListTransition, Orientation, Phase, Point, Rect,
    ReorderRequest, SpringConfig, SpringPoint, WriteSequencer, WriteTicket,
};

use crate::config::KanbanConfig;
use crate::ghost::{DragGhost, DraggedTask, drop_index};
use crate::model::{self, Board, Task};
use crate::store::{self, BoardStore};

/// Longest frame step fed to the springs, so a stall doesn't make them jump.
const MAX_FRAME: Duration = Duration::from_millis(64);

/// Render state of the tasks of one board.
struct Column {
    tasks: DragContext,
    transition: ListTransition<ItemId>,
    /// Titles of everything drawn in the column, including tasks still
    /// fading out after they left it.
    titles: HashMap<ItemId, SharedString>,
    bounds: Rect,
}

impl Column {
    fn new(board: &Board, config: SpringConfig) -> Self {
        let ids = board.task_ids();
        let mut tasks = DragContext::new(Orientation::Vertical);
        tasks.reconcile(&ids);
        let mut column = Self {
            tasks,
            transition: ListTransition::new(ids, config),
            titles: HashMap::new(),
            bounds: Rect::default(),
        };
        column.sync(board);
        column
    }

    fn sync(&mut self, board: &Board) {
        let ids = board.task_ids();
        for task in &board.tasks {
            self.titles
                .insert(task.item_id(), SharedString::from(task.title.clone()));
        }
        self.tasks.reconcile(&ids);
        self.transition.update(&ids);
        // Tasks removed before they were drawn leave the transition at once.
        let drawn = self
            .transition
            .items()
            .map(|item| item.key)
            .collect::<HashSet<_>>();
        self.titles.retain(|key, _| drawn.contains(key));
    }

    fn tick(&mut self, dt: Duration) -> bool {
        for key in self.transition.tick(dt) {
            self.titles.remove(&key);
        }
        self.transition.is_animating()
    }
}

pub struct KanbanBoard {
    store: Arc<dyn BoardStore>,
    config: KanbanConfig,
    title_input: Entity<InputState>,
    loading: bool,
    /// Boards in the order they are laid out. During and right after a drag
    /// the row context holds the live order and `offsets` bridge the two.
    boards: Vec<Board>,
    row: DragContext,
    session: DragSession,
    /// Pointer position at the start of the current board drag.
    grab: Option<Point>,
    offsets: HashMap<ItemId, SpringPoint>,
    columns: HashMap<ItemId, Column>,
    pending_tasks: HashSet<String>,
    writes: WriteSequencer,
    last_frame: Option<Instant>,
}

impl KanbanBoard {
    pub fn new(
        store: Arc<dyn BoardStore>,
        config: KanbanConfig,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let title_input = cx.new(|cx| {
            InputState::new(window, cx)
                .placeholder("Title for a new board or task")
                .default_value("")
        });

        let mut this = Self {
            store,
            config,
            title_input,
            loading: true,
            boards: Vec::new(),
            row: DragContext::new(Orientation::Horizontal),
            session: DragSession::new(),
            grab: None,
            offsets: HashMap::new(),
            columns: HashMap::new(),
            pending_tasks: HashSet::new(),
            writes: WriteSequencer::new(),
            last_frame: None,
        };
        this.reload(window, cx);
        this
    }

    fn reload(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let this = cx.entity();
        let store = self.store.clone();
        self.loading = true;

        cx.spawn_in(window, async move |_, window| {
            let boards = window
                .background_executor()
                .spawn(async move { store.list_boards() })
                .await;

            let _ = window.update(|window, cx| {
                this.update(cx, |this, cx| {
                    this.loading = false;
                    match boards {
                        Ok(boards) => this.set_boards(boards),
                        Err(err) => {
                            tracing::warn!(%err, "failed to load boards");
                            window.push_notification(
                                Notification::new().message(format!("Failed to load boards: {err}")),
                                cx,
                            );
                        }
                    }
                    cx.notify();
                });
            });

            Some(())
        })
        .detach();
    }

    fn set_boards(&mut self, boards: Vec<Board>) {
        self.session.cancel();
        self.grab = None;
        self.boards = boards;

        let transition = self.config.drag.transition;
        let ids = self.boards.iter().map(Board::item_id).collect::<Vec<_>>();
        self.columns.retain(|id, _| ids.contains(id));
        for board in &self.boards {
            match self.columns.get_mut(&board.item_id()) {
                Some(column) => column.sync(board),
                None => {
                    self.columns
                        .insert(board.item_id(), Column::new(board, transition));
                }
            }
        }
        self.sync_row();
        tracing::debug!(boards = self.boards.len(), "boards loaded");
    }

    /// Track exactly the boards in `self.boards`, in their current order.
    fn sync_row(&mut self) {
        let ids = self.boards.iter().map(Board::item_id).collect::<Vec<_>>();
        self.row.reconcile(&ids);
        self.offsets.retain(|id, _| ids.contains(id));
        for spring in self.offsets.values_mut() {
            spring.jump_to(Point::ZERO);
        }
    }

    /// Lay the boards out in the row's order and fold the offsets away. The
    /// next layout re-measures every box.
    fn commit_row_order(&mut self) {
        let order = self.row.ordered_ids();
        if order.len() == self.boards.len() {
            self.boards.sort_by_key(|board| {
                order
                    .iter()
                    .position(|id| id.as_str() == board.id)
                    .unwrap_or(usize::MAX)
            });
        }
        for (index, board) in self.boards.iter_mut().enumerate() {
            board.index = index;
        }
        self.row.settle_all();
        for spring in self.offsets.values_mut() {
            spring.jump_to(Point::ZERO);
        }
        tracing::debug!("board order committed");
    }

    fn offset_of(&self, id: &ItemId) -> Point {
        self.offsets
            .get(id)
            .map(SpringPoint::position)
            .unwrap_or(Point::ZERO)
    }

    /// Advance every animation to now. Returns whether another frame is
    /// needed.
    fn tick(&mut self) -> bool {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| now.saturating_duration_since(last).min(MAX_FRAME))
            .unwrap_or_default();

        let mut animating = self.session.is_dragging();
        for spring in self.offsets.values_mut() {
            spring.advance(dt);
            animating |= !spring.is_at_rest();
        }
        for column in self.columns.values_mut() {
            animating |= column.tick(dt);
        }

        if !animating && !self.row.is_settled() {
            self.commit_row_order();
        }
        self.last_frame = animating.then_some(now);
        animating
    }

    fn measure_board(&mut self, id: &ItemId, bounds: Bounds<Pixels>) {
        if self.session.is_dragging() {
            return;
        }
        let shown = self.offset_of(id);
        self.row
            .measure(id, rect_from(bounds).translate(Point::ZERO - shown));
    }

    fn measure_column(&mut self, board: &ItemId, bounds: Bounds<Pixels>) {
        if let Some(column) = self.columns.get_mut(board) {
            column.bounds = rect_from(bounds);
        }
    }

    /// Returns whether a corrective shift started and needs a redraw.
    fn measure_task(
        &mut self,
        board: &ItemId,
        task: &ItemId,
        shift: Point,
        bounds: Bounds<Pixels>,
    ) -> bool {
        let Some(column) = self.columns.get_mut(board) else {
            return false;
        };
        let rect = rect_from(bounds).translate(Point::ZERO - shift);
        column.tasks.measure(task, rect);
        column.transition.measure(task, rect).is_some()
    }

    fn start_board_drag(
        &mut self,
        id: ItemId,
        position: gpui::Point<Pixels>,
        cx: &mut Context<Self>,
    ) {
        if let Err(err) = self.session.on_drag_start(&self.row, &id) {
            tracing::debug!(%id, %err, "board drag rejected");
            return;
        }
        self.grab = Some(point_from(position));
        cx.notify();
    }

    fn drag_board_to(&mut self, position: gpui::Point<Pixels>, cx: &mut Context<Self>) {
        let Some(grab) = self.grab else {
            return;
        };
        let Some(id) = self.session.active().map(|drag| drag.id.clone()) else {
            return;
        };

        let displace = self.config.drag.displace;
        match self
            .session
            .on_drag_move(&mut self.row, &id, point_from(position) - grab)
        {
            Ok(step) => {
                self.offsets
                    .entry(id)
                    .or_insert_with(|| SpringPoint::at(Point::ZERO, displace))
                    .jump_to(step.follow);
                for displaced in step.displaced {
                    self.offsets
                        .entry(displaced.id)
                        .or_insert_with(|| SpringPoint::at(Point::ZERO, displace))
                        .set_target(displaced.offset);
                }
            }
            Err(err) => {
                tracing::warn!(%id, %err, "board drag aborted");
                self.grab = None;
                let slot = self.row.item(&id).map(|item| item.offset());
                self.ease_to(&id, slot.unwrap_or(Point::ZERO));
            }
        }
        cx.notify();
    }

    fn end_board_drag(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let Some(id) = self.session.active().map(|drag| drag.id.clone()) else {
            return;
        };
        self.grab = None;

        match self.session.on_drag_end(&self.row, &id) {
            Ok(end) => {
                self.ease_to(&end.id, end.settle_to);
                if let Some(request) = end.reorder {
                    self.persist_reorder(request, window, cx);
                }
            }
            Err(err) => {
                tracing::warn!(%id, %err, "board drag ended without a session");
                self.session.cancel();
            }
        }
        cx.notify();
    }

    fn ease_to(&mut self, id: &ItemId, target: Point) {
        let from = self.offset_of(id);
        self.offsets.insert(
            id.clone(),
            SpringPoint::new(from, target, self.config.drag.settle),
        );
    }

    fn board_title(&self, id: &str) -> String {
        self.boards
            .iter()
            .find(|board| board.id == id)
            .map(|board| board.title.clone())
            .unwrap_or_default()
    }

    fn persist_reorder(
        &mut self,
        request: ReorderRequest,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let store = self.store.clone();
        let board_id = request.id.to_string();
        let done = format!(
            "Moved \"{}\" to position {}",
            self.board_title(&board_id),
            request.to + 1
        );
        tracing::debug!(id = %request.id, from = request.from, to = request.to, "persisting board order");
        self.persist(
            request.id,
            done,
            move || store.reorder_board(&board_id, request.to).map(drop),
            window,
            cx,
        );
    }

    /// Run `call` on the background executor. The outcome is reported once it
    /// lands, unless a newer write for the same entity was issued meanwhile.
    fn persist(
        &mut self,
        entity: ItemId,
        done: String,
        call: impl FnOnce() -> store::Result<()> + Send + 'static,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let ticket = self.writes.begin(&entity);
        let this = cx.entity();

        cx.spawn_in(window, async move |_, window| {
            let result = window.background_executor().spawn(async move { call() }).await;

            let _ = window.update(|window, cx| {
                this.update(cx, |this, cx| {
                    this.finish_write(ticket, done, result, window, cx);
                });
            });

            Some(())
        })
        .detach();
        cx.notify();
    }

    fn finish_write(
        &mut self,
        ticket: WriteTicket,
        done: String,
        result: store::Result<()>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let current = self.writes.finish(&ticket);
        self.pending_tasks.remove(ticket.id.as_str());

        let result = result.map_err(|err| DndError::PersistenceFailure(err.to_string()));
        let message = match result {
            Ok(()) => {
                tracing::debug!(id = %ticket.id, seq = ticket.seq, "write finished");
                done
            }
            Err(err) => {
                tracing::warn!(id = %ticket.id, seq = ticket.seq, %err, "write failed");
                err.to_string()
            }
        };
        if current {
            window.push_notification(Notification::new().message(message), cx);
        }
        cx.notify();
    }

    /// The typed title, clearing the input, or `fallback` when nothing was
    /// typed.
    fn take_title(&mut self, fallback: &str, window: &mut Window, cx: &mut Context<Self>) -> String {
        let title = self.title_input.read(cx).value().trim().to_string();
        if title.is_empty() {
            return fallback.to_string();
        }
        self.title_input.update(cx, |state, cx| {
            state.set_value(String::new(), window, cx);
        });
        title
    }

    fn typed_title(&mut self, window: &mut Window, cx: &mut Context<Self>) -> Option<String> {
        let title = self.take_title("", window, cx);
        if title.is_empty() {
            window.push_notification(
                Notification::new().message("Type the new title in the box above first"),
                cx,
            );
            return None;
        }
        Some(title)
    }

    fn add_board(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let title = self.take_title("Untitled board", window, cx);
        let id = model::new_id();

        self.session.cancel();
        self.commit_row_order();
        let board = Board::new(id.clone(), title.clone(), self.boards.len());
        self.columns.insert(
            board.item_id(),
            Column::new(&board, self.config.drag.transition),
        );
        self.boards.push(board);
        self.sync_row();

        let store = self.store.clone();
        self.persist(
            ItemId::from(&id),
            format!("Created board \"{title}\""),
            move || store.create_board(&id, &title).map(drop),
            window,
            cx,
        );
    }

    fn rename_board(&mut self, id: &ItemId, window: &mut Window, cx: &mut Context<Self>) {
        let Some(title) = self.typed_title(window, cx) else {
            return;
        };
        let Some(board) = self.boards.iter_mut().find(|board| board.id == id.as_str()) else {
            return;
        };
        board.title = title.clone();

        let store = self.store.clone();
        let board_id = id.to_string();
        self.persist(
            id.clone(),
            format!("Renamed board to \"{title}\""),
            move || store.rename_board(&board_id, &title).map(drop),
            window,
            cx,
        );
    }

    fn delete_board(&mut self, id: &ItemId, window: &mut Window, cx: &mut Context<Self>) {
        self.session.cancel();
        self.commit_row_order();
        let Some(ix) = self.boards.iter().position(|board| board.id == id.as_str()) else {
            return;
        };
        let board = self.boards.remove(ix);
        self.columns.remove(id);
        self.sync_row();

        let store = self.store.clone();
        let board_id = id.to_string();
        self.persist(
            id.clone(),
            format!("Deleted board \"{}\"", board.title),
            move || store.delete_board(&board_id),
            window,
            cx,
        );
    }

    fn sync_column(&mut self, board_id: &str) {
        let Some(board) = self.boards.iter().find(|board| board.id == board_id) else {
            return;
        };
        if let Some(column) = self.columns.get_mut(&board.item_id()) {
            column.sync(board);
        }
    }

    fn add_task(&mut self, board_id: &ItemId, window: &mut Window, cx: &mut Context<Self>) {
        let title = self.take_title("New task", window, cx);
        let Some(board) = self
            .boards
            .iter_mut()
            .find(|board| board.id == board_id.as_str())
        else {
            return;
        };

        let id = model::new_id();
        board.tasks.push(Task {
            id: id.clone(),
            board_id: board.id.clone(),
            title: title.clone(),
            index: board.tasks.len(),
        });
        self.pending_tasks.insert(id.clone());
        self.sync_column(board_id.as_str());

        let store = self.store.clone();
        let board = board_id.to_string();
        self.persist(
            ItemId::from(&id),
            format!("Created task \"{title}\""),
            move || store.create_task(&id, &board, &title).map(drop),
            window,
            cx,
        );
    }

    fn rename_task(
        &mut self,
        board_id: &ItemId,
        task_id: &ItemId,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let Some(title) = self.typed_title(window, cx) else {
            return;
        };
        let Some(task) = self
            .boards
            .iter_mut()
            .filter(|board| board.id == board_id.as_str())
            .flat_map(|board| board.tasks.iter_mut())
            .find(|task| task.id == task_id.as_str())
        else {
            return;
        };
        task.title = title.clone();
        self.sync_column(board_id.as_str());

        let store = self.store.clone();
        let id = task_id.to_string();
        self.persist(
            task_id.clone(),
            format!("Renamed task to \"{title}\""),
            move || store.rename_task(&id, &title).map(drop),
            window,
            cx,
        );
    }

    fn delete_task(
        &mut self,
        board_id: &ItemId,
        task_id: &ItemId,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let Some(board) = self
            .boards
            .iter_mut()
            .find(|board| board.id == board_id.as_str())
        else {
            return;
        };
        let Some(ix) = board.tasks.iter().position(|task| task.id == task_id.as_str()) else {
            return;
        };
        let task = board.tasks.remove(ix);
        reindex_tasks(&mut board.tasks);
        self.sync_column(board_id.as_str());

        let store = self.store.clone();
        let id = task_id.to_string();
        self.persist(
            task_id.clone(),
            format!("Deleted task \"{}\"", task.title),
            move || store.delete_task(&id),
            window,
            cx,
        );
    }

    /// A task card was released over the column of `target`.
    fn drop_task(
        &mut self,
        drag: &DraggedTask,
        target: &ItemId,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let Some(column) = self.columns.get(target) else {
            return;
        };
        let Some(count) = self
            .boards
            .iter()
            .find(|board| board.id == target.as_str())
            .map(|board| board.tasks.len())
        else {
            return;
        };

        let gap = column.tasks.slot_for_point(point_from(window.mouse_position()));
        let same_board = drag.board_id == target.as_str();
        let to = drop_index(same_board.then_some(drag.index), gap, count);
        if same_board && to == drag.index {
            return;
        }

        let Some(source) = self
            .boards
            .iter_mut()
            .find(|board| board.id == drag.board_id)
        else {
            return;
        };
        let Some(ix) = source.tasks.iter().position(|task| task.id == drag.id) else {
            return;
        };
        let mut task = source.tasks.remove(ix);
        reindex_tasks(&mut source.tasks);
        task.board_id = target.to_string();

        let Some(board) = self
            .boards
            .iter_mut()
            .find(|board| board.id == target.as_str())
        else {
            return;
        };
        let at = to.min(board.tasks.len());
        board.tasks.insert(at, task);
        reindex_tasks(&mut board.tasks);
        self.sync_column(&drag.board_id);
        self.sync_column(target.as_str());

        // Dropping past the last card of another board appends to it.
        let index = (same_board || to < count).then_some(to);
        tracing::debug!(id = %drag.id, board = %target, ?index, "task dropped");

        let store = self.store.clone();
        let id = drag.id.clone();
        let board_id = target.to_string();
        let done = format!(
            "Moved \"{}\" to \"{}\"",
            drag.title,
            self.board_title(&board_id)
        );
        self.persist(
            ItemId::from(&drag.id),
            done,
            move || store.move_task(&id, &board_id, index).map(drop),
            window,
            cx,
        );
    }

    fn status_line(&self) -> SharedString {
        if self.loading {
            return "Loading boards…".into();
        }
        match self.writes.pending() {
            0 => format!("{} boards", self.boards.len()).into(),
            1 => "Saving 1 change…".into(),
            n => format!("Saving {n} changes…").into(),
        }
    }

    fn render_drag_tracker(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let view = cx.entity();
        canvas(
            |_, _, _| {},
            move |_, _, window, _| {
                window.on_mouse_event({
                    let view = view.clone();
                    move |event: &MouseMoveEvent, phase, window, cx| {
                        if !phase.bubble() {
                            return;
                        }
                        view.update(cx, |this, cx| {
                            // Released outside of the window.
                            if event.pressed_button != Some(MouseButton::Left) {
                                this.end_board_drag(window, cx);
                                return;
                            }
                            this.drag_board_to(event.position, cx);
                        });
                    }
                });
                window.on_mouse_event(move |event: &MouseUpEvent, phase, window, cx| {
                    if !phase.bubble() || event.button != MouseButton::Left {
                        return;
                    }
                    view.update(cx, |this, cx| this.end_board_drag(window, cx));
                });
            },
        )
        .absolute()
        .top_0()
        .left_0()
        .size_full()
    }

    fn render_board(&self, ix: usize, board: &Board, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme().clone();
        let id = board.item_id();
        let offset = self.offset_of(&id);
        let dragging = self.session.active().is_some_and(|drag| drag.id == id);
        let view = cx.entity();

        let measure = {
            let id = id.clone();
            canvas(
                move |bounds, _, cx| view.update(cx, |this, _| this.measure_board(&id, bounds)),
                |_, _, _, _| {},
            )
            .absolute()
            .top_0()
            .left_0()
            .size_full()
        };

        let header = h_flex()
            .gap(px(4.))
            .px(px(8.))
            .py(px(6.))
            .border_b_1()
            .border_color(theme.border)
            .child(
                div()
                    .id(("board-handle", ix))
                    .cursor(CursorStyle::OpenHand)
                    .text_color(theme.muted_foreground)
                    .child(Icon::new(IconName::Menu).small())
                    .on_mouse_down(MouseButton::Left, {
                        let id = id.clone();
                        cx.listener(move |this, event: &MouseDownEvent, _window, cx| {
                            cx.stop_propagation();
                            this.start_board_drag(id.clone(), event.position, cx);
                        })
                    }),
            )
            .child(
                div()
                    .flex_1()
                    .truncate()
                    .font_semibold()
                    .when(self.writes.is_pending(&id), |this| {
                        this.text_color(theme.muted_foreground)
                    })
                    .child(board.title.clone()),
            )
            .child(
                div()
                    .px(px(6.))
                    .rounded(px(9.))
                    .bg(theme.secondary)
                    .text_xs()
                    .text_color(theme.muted_foreground)
                    .child(board.tasks.len().to_string()),
            )
            .child(
                Button::new("add-task")
                    .icon(IconName::Plus)
                    .ghost()
                    .small()
                    .compact()
                    .tooltip("Add task")
                    .on_click(cx.listener({
                        let id = id.clone();
                        move |this, _, window, cx| this.add_task(&id, window, cx)
                    })),
            )
            .child(
                Button::new("rename-board")
                    .icon(IconName::Check)
                    .ghost()
                    .small()
                    .compact()
                    .tooltip("Rename to the typed title")
                    .on_click(cx.listener({
                        let id = id.clone();
                        move |this, _, window, cx| this.rename_board(&id, window, cx)
                    })),
            )
            .child(
                Button::new("delete-board")
                    .icon(IconName::Close)
                    .ghost()
                    .small()
                    .compact()
                    .tooltip("Delete board")
                    .on_click(cx.listener({
                        let id = id.clone();
                        move |this, _, window, cx| this.delete_board(&id, window, cx)
                    })),
            );

        let el = div()
            .id(("board", ix))
            .relative()
            .left(px(offset.x))
            .top(px(offset.y))
            .flex_shrink_0()
            .w(px(self.config.board_width))
            .rounded(theme.radius)
            .border_1()
            .border_color(if dragging {
                theme.drag_border
            } else {
                theme.border
            })
            .bg(theme.sidebar)
            .when(dragging, |this| this.shadow_lg())
            .child(header)
            .child(self.render_tasks(board, cx))
            .child(measure);

        if dragging {
            deferred(el).with_priority(1).into_any_element()
        } else {
            el.into_any_element()
        }
    }

    fn render_tasks(&self, board: &Board, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme().clone();
        let board_id = board.item_id();
        let task_height = self.config.task_height;
        let ghost_width = self.config.board_width - 16.;
        let view = cx.entity();

        let measure = {
            let view = view.clone();
            let board_id = board_id.clone();
            canvas(
                move |bounds, _, cx| {
                    view.update(cx, |this, _| this.measure_column(&board_id, bounds))
                },
                |_, _, _, _| {},
            )
            .absolute()
            .top_0()
            .left_0()
            .size_full()
        };

        let mut cards = Vec::new();
        if let Some(column) = self.columns.get(&board_id) {
            for item in column.transition.items() {
                let title = column.titles.get(&item.key).cloned().unwrap_or_default();

                if let Phase::Exiting { pinned } = item.phase {
                    cards.push(
                        div()
                            .absolute()
                            .left(px(pinned.left - column.bounds.left))
                            .top(px(pinned.top - column.bounds.top))
                            .w(px(pinned.width))
                            .h(px(card_height(item.phase, item.progress, pinned.height)))
                            .overflow_hidden()
                            .opacity(item.progress)
                            .flex()
                            .items_center()
                            .px(px(10.))
                            .rounded(px(8.))
                            .border_1()
                            .border_color(theme.border)
                            .bg(theme.background)
                            .text_sm()
                            .child(div().truncate().child(title))
                            .into_any_element(),
                    );
                    continue;
                }

                let Some((index, task)) = board
                    .tasks
                    .iter()
                    .enumerate()
                    .find(|(_, task)| task.id == item.key.as_str())
                else {
                    continue;
                };
                let label: SharedString = if self.pending_tasks.contains(&task.id) {
                    format!("{title} (pending)").into()
                } else {
                    title.clone()
                };
                let entering = item.phase == Phase::Entering;
                let drag_value = DraggedTask {
                    id: task.id.clone(),
                    board_id: board.id.clone(),
                    index,
                    title,
                };

                let measure = {
                    let view = view.clone();
                    let board_id = board_id.clone();
                    let key = item.key.clone();
                    let shift = item.shift;
                    canvas(
                        move |bounds, _, cx| {
                            view.update(cx, |this, cx| {
                                if this.measure_task(&board_id, &key, shift, bounds) {
                                    cx.notify();
                                }
                            })
                        },
                        |_, _, _, _| {},
                    )
                    .absolute()
                    .top_0()
                    .left_0()
                    .size_full()
                };

                cards.push(
                    div()
                        .id(SharedString::from(format!("task-{}", task.id)))
                        .relative()
                        .left(px(item.shift.x))
                        .top(px(item.shift.y))
                        .h(px(card_height(item.phase, item.progress, task_height)))
                        .when(entering, |this| this.overflow_hidden())
                        .opacity(item.progress)
                        .flex()
                        .flex_shrink_0()
                        .items_center()
                        .gap(px(4.))
                        .pl(px(10.))
                        .pr(px(4.))
                        .rounded(px(8.))
                        .border_1()
                        .border_color(theme.border)
                        .bg(theme.background)
                        .cursor(CursorStyle::OpenHand)
                        .child(div().flex_1().truncate().text_sm().child(label))
                        .child(
                            Button::new("rename-task")
                                .icon(IconName::Check)
                                .ghost()
                                .xsmall()
                                .tooltip("Rename to the typed title")
                                .on_click(cx.listener({
                                    let board_id = board_id.clone();
                                    let key = item.key.clone();
                                    move |this, _, window, cx| {
                                        this.rename_task(&board_id, &key, window, cx)
                                    }
                                })),
                        )
                        .child(
                            Button::new("delete-task")
                                .icon(IconName::Close)
                                .ghost()
                                .xsmall()
                                .tooltip("Delete task")
                                .on_click(cx.listener({
                                    let board_id = board_id.clone();
                                    let key = item.key.clone();
                                    move |this, _, window, cx| {
                                        this.delete_task(&board_id, &key, window, cx)
                                    }
                                })),
                        )
                        .on_drag(drag_value, move |drag, _offset, _window, cx: &mut App| {
                            let title = drag.title.clone();
                            cx.new(|_| DragGhost::new(title, ghost_width))
                        })
                        .child(measure)
                        .into_any_element(),
                );
            }
        }

        let drop_target = theme.drop_target;
        v_flex()
            .id(SharedString::from(format!("tasks-{}", board.id)))
            .relative()
            .gap(px(6.))
            .p(px(8.))
            .min_h(px(task_height * 2.))
            .drag_over::<DraggedTask>(move |style, _drag, _window, _cx| {
                style.bg(drop_target.alpha(drop_target.a.max(0.2)))
            })
            .on_drop::<DraggedTask>(cx.listener({
                let board_id = board_id.clone();
                move |this, drag: &DraggedTask, window, cx| {
                    this.drop_task(drag, &board_id, window, cx)
                }
            }))
            .child(measure)
            .children(cards)
            .when(board.tasks.is_empty(), |this| {
                this.child(
                    div()
                        .py(px(8.))
                        .text_sm()
                        .text_color(theme.muted_foreground)
                        .child("No tasks in this board"),
                )
            })
    }
}

impl Render for KanbanBoard {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        if self.tick() {
            window.request_animation_frame();
        }

        let theme = cx.theme().clone();
        let boards = self
            .boards
            .iter()
            .enumerate()
            .map(|(ix, board)| self.render_board(ix, board, cx))
            .collect::<Vec<_>>();

        let toolbar = h_flex()
            .gap(px(8.))
            .px(px(12.))
            .py(px(8.))
            .border_b_1()
            .border_color(theme.border)
            .child(div().w(px(280.)).child(Input::new(&self.title_input).small()))
            .child(
                Button::new("add-board")
                    .icon(IconName::Plus)
                    .label("Board")
                    .small()
                    .on_click(cx.listener(|this, _, window, cx| this.add_board(window, cx))),
            )
            .child(div().flex_1())
            .child(
                div()
                    .text_sm()
                    .text_color(theme.muted_foreground)
                    .child(self.status_line()),
            );

        v_flex()
            .id("kanban")
            .relative()
            .size_full()
            .bg(theme.background)
            .text_color(theme.foreground)
            .child(toolbar)
            .child(
                div()
                    .id("kanban-boards")
                    .flex_1()
                    .min_h(px(0.))
                    .overflow_x_scroll()
                    .child(
                        h_flex()
                            .items_start()
                            .gap(px(12.))
                            .p(px(12.))
                            .children(boards),
                    ),
            )
            .when(self.session.is_dragging(), |this| {
                this.child(self.render_drag_tracker(cx))
            })
    }
}

/// Height of a card along its enter or exit animation.
fn card_height(phase: Phase, progress: f32, full: f32) -> f32 {
    match phase {
        Phase::Present => full,
        Phase::Entering | Phase::Exiting { .. } => full * progress,
    }
}

fn reindex_tasks(tasks: &mut [Task]) {
    for (index, task) in tasks.iter_mut().enumerate() {
        task.index = index;
    }
}

fn point_from(point: gpui::Point<Pixels>) -> Point {
    Point::new(f32::from(point.x), f32::from(point.y))
}

fn rect_from(bounds: Bounds<Pixels>) -> Rect {
    Rect::new(
        f32::from(bounds.origin.x),
        f32::from(bounds.origin.y),
        f32::from(bounds.size.width),
        f32::from(bounds.size.height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::prelude::v1::test;

    fn board(tasks: &[&str]) -> Board {
        let mut board = Board::new("b", "Board", 0);
        for (index, id) in tasks.iter().enumerate() {
            board.tasks.push(Task {
                id: id.to_string(),
                board_id: board.id.clone(),
                title: format!("title {id}"),
                index,
            });
        }
        board
    }

    #[test]
    fn exiting_cards_shrink_with_their_progress() {
        let pinned = Rect::new(0., 0., 200., 40.);
        assert_eq!(card_height(Phase::Exiting { pinned }, 0.25, 40.), 10.);
        assert_eq!(card_height(Phase::Exiting { pinned }, 0., 40.), 0.);
        assert_eq!(card_height(Phase::Entering, 0.5, 44.), 22.);
        assert_eq!(card_height(Phase::Present, 0.5, 44.), 44.);
    }

    #[test]
    fn titles_of_undrawn_removed_tasks_are_dropped() {
        let mut column = Column::new(&board(&["t0", "t1"]), SpringConfig::default());
        assert_eq!(column.titles.len(), 2);

        column.sync(&board(&["t0"]));
        assert!(!column.titles.contains_key(&ItemId::from("t1")));
        assert_eq!(column.titles.len(), 1);
    }

    #[test]
    fn titles_of_drawn_removed_tasks_stay_while_fading() {
        let mut column = Column::new(&board(&["t0", "t1"]), SpringConfig::default());
        column
            .transition
            .measure(&"t1".into(), Rect::new(0., 44., 200., 44.));

        column.sync(&board(&["t0"]));
        assert!(column.titles.contains_key(&ItemId::from("t1")));

        for _ in 0..500 {
            if !column.tick(Duration::from_millis(16)) {
                break;
            }
        }
        assert!(!column.titles.contains_key(&ItemId::from("t1")));
    }
}
