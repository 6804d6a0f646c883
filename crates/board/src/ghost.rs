use gpui::{
    Context, IntoElement, ParentElement as _, Render, SharedString, Styled as _, Window, div, px,
};
use gpui_component::ActiveTheme as _;

/// Payload of a task card being dragged between columns.
#[derive(Clone, Debug)]
pub(crate) struct DraggedTask {
    pub(crate) id: String,
    pub(crate) board_id: String,
    pub(crate) index: usize,
    pub(crate) title: SharedString,
}

pub(crate) struct DragGhost {
    title: SharedString,
    width: f32,
}

impl DragGhost {
    pub(crate) fn new(title: SharedString, width: f32) -> Self {
        Self { title, width }
    }
}

impl Render for DragGhost {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        div()
            .w(px(self.width))
            .px(px(10.))
            .py(px(8.))
            .rounded(px(8.))
            .bg(theme.popover)
            .border_1()
            .border_color(theme.drag_border)
            .shadow_md()
            .opacity(0.9)
            .text_color(theme.popover_foreground)
            .text_sm()
            .truncate()
            .child(self.title.clone())
    }
}

/// Final index of a dropped task.
///
/// `gap` is the slot between cards the pointer was released over, counted in
/// the target column as it is currently drawn. Within the same column the card
/// itself still occupies a slot, so gaps after it shift down by one.
pub(crate) fn drop_index(from: Option<usize>, gap: usize, count: usize) -> usize {
    match from {
        Some(from) => {
            let mut to = gap;
            if to > from {
                to = to.saturating_sub(1);
            }
            to.min(count.saturating_sub(1))
        }
        None => gap.min(count),
    }
}

#[cfg(test)]
mod tests {
    use super::drop_index;

    #[test]
    fn gap_after_the_card_itself_is_a_no_op() {
        assert_eq!(drop_index(Some(1), 1, 3), 1);
        assert_eq!(drop_index(Some(1), 2, 3), 1);
    }

    #[test]
    fn same_column_gaps() {
        assert_eq!(drop_index(Some(2), 0, 3), 0);
        assert_eq!(drop_index(Some(0), 3, 3), 2);
        assert_eq!(drop_index(Some(0), 9, 3), 2);
    }

    #[test]
    fn other_column_inserts_at_gap() {
        assert_eq!(drop_index(None, 0, 0), 0);
        assert_eq!(drop_index(None, 2, 4), 2);
        assert_eq!(drop_index(None, 7, 4), 4);
    }
}
