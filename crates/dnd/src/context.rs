use crate::error::{DndError, Result};
use crate::geometry::{DraggableItem, ItemId, Orientation, Point, Rect, center};

/// The target offset a displaced item should animate to.
#[derive(Clone, Debug, PartialEq)]
pub struct Displacement {
    pub id: ItemId,
    pub offset: Point,
}

/// Shared order state of one orderable list, e.g. the boards row or the tasks
/// of a single board.
///
/// `items` is kept in mount order; `order_index` is what defines display
/// order. Outside of [`DragContext::update_index`] the order indices always
/// form a permutation of `0..len`.
#[derive(Clone, Debug, Default)]
pub struct DragContext {
    orientation: Orientation,
    items: Vec<DraggableItem>,
}

impl DragContext {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            items: Vec::new(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[DraggableItem] {
        &self.items
    }

    pub fn item(&self, id: &ItemId) -> Option<&DraggableItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    /// Item ids in display order.
    pub fn ordered_ids(&self) -> Vec<ItemId> {
        let mut items = self.items.iter().collect::<Vec<_>>();
        items.sort_by_key(|item| item.order_index);
        items.into_iter().map(|item| item.id.clone()).collect()
    }

    /// Start tracking a freshly mounted item at the end of the order.
    ///
    /// Mounting an id that is already tracked only refreshes its box.
    pub fn mount(&mut self, id: ItemId, rect: Rect) -> usize {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.set_rect(rect);
            return item.order_index;
        }
        let order_index = self.items.len();
        self.items.push(DraggableItem::new(id, rect, order_index));
        order_index
    }

    /// Stop tracking an unmounted item, closing the gap it leaves in the order.
    pub fn unmount(&mut self, id: &ItemId) -> Option<DraggableItem> {
        let pos = self.items.iter().position(|item| item.id == *id)?;
        let removed = self.items.remove(pos);
        for item in &mut self.items {
            if item.order_index > removed.order_index {
                item.order_index -= 1;
            }
        }
        Some(removed)
    }

    /// Make the tracked set match `ids`, which are given in display order.
    ///
    /// Every item ends up settled: offsets are folded away and the order index
    /// equals the position in `ids`. New items start with an empty box until
    /// they are measured.
    pub fn reconcile(&mut self, ids: &[ItemId]) {
        self.items.retain(|item| ids.contains(&item.id));
        for (order_index, id) in ids.iter().enumerate() {
            match self.items.iter_mut().find(|item| item.id == *id) {
                Some(item) => {
                    item.order_index = order_index;
                    item.offset_left = 0.;
                    item.offset_top = 0.;
                }
                None => self
                    .items
                    .push(DraggableItem::new(id.clone(), Rect::default(), order_index)),
            }
        }
    }

    /// Record the live layout box of an item. The box must not include the
    /// visual offset currently applied to it.
    pub fn measure(&mut self, id: &ItemId, rect: Rect) -> bool {
        match self.items.iter_mut().find(|item| item.id == *id) {
            Some(item) => {
                item.set_rect(rect);
                true
            }
            None => false,
        }
    }

    /// Zero every offset. Called once the list is re-rendered in order index
    /// order, before the next layout re-measures the boxes.
    pub fn settle_all(&mut self) {
        for item in &mut self.items {
            item.offset_left = 0.;
            item.offset_top = 0.;
        }
    }

    pub fn is_settled(&self) -> bool {
        self.items.iter().all(DraggableItem::is_settled)
    }

    /// Positions into `items`, indexed by order index.
    fn slots(&self) -> Result<Vec<usize>> {
        let len = self.items.len();
        let mut slots = vec![usize::MAX; len];
        for (pos, item) in self.items.iter().enumerate() {
            match slots.get_mut(item.order_index) {
                Some(slot) if *slot == usize::MAX => *slot = pos,
                _ => return Err(DndError::missing_id(&item.id)),
            }
        }
        if let Some(missing) = slots.iter().position(|slot| *slot == usize::MAX) {
            return Err(DndError::missing_index(missing));
        }
        Ok(slots)
    }

    /// Move the item at `current` to `new`, shifting the items in between by
    /// one slot towards the vacated one.
    ///
    /// Only the items between the two indices are touched. The returned
    /// displacements carry the offsets those items, and the moved item, should
    /// animate to.
    pub fn update_index(&mut self, current: usize, new: usize) -> Result<Vec<Displacement>> {
        if current == new {
            return Err(DndError::InvalidMove {
                from: current,
                to: new,
            });
        }
        let len = self.items.len();
        for index in [current, new] {
            if index >= len {
                return Err(DndError::OutOfRange { index, len });
            }
        }

        let slots = self.slots()?;
        let axis = |order_index: usize| {
            self.orientation
                .axis(center(&self.items[slots[order_index]]))
        };

        // Shifts are computed against the centers before any mutation.
        let shifts: Vec<(usize, f32)> = if current > new {
            (new..current)
                .map(|index| (index, axis(index + 1) - axis(index)))
                .collect()
        } else {
            (current + 1..=new)
                .map(|index| (index, axis(index - 1) - axis(index)))
                .collect()
        };

        let mut total = 0.;
        let mut displaced = Vec::with_capacity(shifts.len() + 1);
        for (index, delta) in shifts {
            let item = &mut self.items[slots[index]];
            item.add_offset(self.orientation.along(delta));
            if current > new {
                item.order_index += 1;
            } else {
                item.order_index -= 1;
            }
            total -= delta;
            displaced.push(Displacement {
                id: item.id.clone(),
                offset: item.offset(),
            });
        }

        let dragged = &mut self.items[slots[current]];
        dragged.order_index = new;
        dragged.add_offset(self.orientation.along(total));
        displaced.push(Displacement {
            id: dragged.id.clone(),
            offset: dragged.offset(),
        });

        tracing::debug!(
            current,
            new,
            displaced = displaced.len() - 1,
            "remapped drag order"
        );
        Ok(displaced)
    }

    /// The slot the item at `order_index` would land in if its center were at
    /// `dragged_center`.
    ///
    /// The scan runs over the item's siblings in display order. Anything before
    /// the first sibling's center maps to slot 0 and anything at or past the
    /// last sibling's center maps to the last slot. An interior sibling `k`
    /// owns `[center_k, center_k+1)`, which maps to slot `k + 1`.
    pub fn candidate_index(&self, order_index: usize, dragged_center: Point) -> Result<usize> {
        let slots = self.slots()?;
        let len = slots.len();
        if order_index >= len {
            return Err(DndError::missing_index(order_index));
        }

        let position = self.orientation.axis(dragged_center);
        let siblings = (0..len)
            .filter(|index| *index != order_index)
            .map(|index| self.orientation.axis(center(&self.items[slots[index]])))
            .collect::<Vec<_>>();

        let Some(last) = siblings.len().checked_sub(1) else {
            return Ok(0);
        };
        for (k, sibling) in siblings.iter().enumerate() {
            if k == 0 && position < *sibling {
                return Ok(0);
            }
            if k == last {
                if position >= *sibling {
                    return Ok(last + 1);
                }
            } else if position >= *sibling && position < siblings[k + 1] {
                return Ok(k + 1);
            }
        }
        Ok(order_index)
    }

    /// Insertion slot for an item arriving from another list and dropped at
    /// `point`: the number of items whose center lies before it.
    pub fn slot_for_point(&self, point: Point) -> usize {
        let position = self.orientation.axis(point);
        self.items
            .iter()
            .filter(|item| self.orientation.axis(center(item)) < position)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(count: usize) -> DragContext {
        let mut cx = DragContext::new(Orientation::Horizontal);
        for ix in 0..count {
            cx.mount(
                ItemId::new(format!("b{ix}")),
                Rect::new(ix as f32 * 100., 0., 100., 40.),
            );
        }
        cx
    }

    fn column(count: usize) -> DragContext {
        let mut cx = DragContext::new(Orientation::Vertical);
        for ix in 0..count {
            cx.mount(
                ItemId::new(format!("t{ix}")),
                Rect::new(0., ix as f32 * 50., 200., 50.),
            );
        }
        cx
    }

    fn ids(ids: &[&str]) -> Vec<ItemId> {
        ids.iter().map(|id| ItemId::new(id)).collect()
    }

    fn order(cx: &DragContext, id: &str) -> usize {
        cx.item(&ItemId::new(id)).unwrap().order_index()
    }

    fn center_of(cx: &DragContext, id: &str) -> Point {
        center(cx.item(&ItemId::new(id)).unwrap())
    }

    fn assert_permutation(cx: &DragContext) {
        let mut indices = cx.items().iter().map(|i| i.order_index()).collect::<Vec<_>>();
        indices.sort();
        assert_eq!(indices, (0..cx.len()).collect::<Vec<_>>());
    }

    #[test]
    fn update_index_moves_item_earlier() {
        let mut cx = row(4);
        let displaced = cx.update_index(2, 0).unwrap();

        assert_eq!(order(&cx, "b0"), 1);
        assert_eq!(order(&cx, "b1"), 2);
        assert_eq!(order(&cx, "b2"), 0);
        assert_eq!(order(&cx, "b3"), 3);

        let b3 = cx.item(&ItemId::new("b3")).unwrap();
        assert_eq!(b3.offset(), Point::ZERO);
        assert_eq!(displaced.len(), 3);

        // Displaced items sit on their new slots, the dragged one on the vacated.
        assert_eq!(center_of(&cx, "b0").x, 150.);
        assert_eq!(center_of(&cx, "b1").x, 250.);
        assert_eq!(center_of(&cx, "b2").x, 50.);
        assert_eq!(
            displaced.last().unwrap(),
            &Displacement {
                id: "b2".into(),
                offset: Point::new(-200., 0.),
            }
        );
    }

    #[test]
    fn update_index_moves_item_later_vertically() {
        let mut cx = column(4);
        cx.update_index(0, 2).unwrap();

        assert_eq!(order(&cx, "t0"), 2);
        assert_eq!(order(&cx, "t1"), 0);
        assert_eq!(order(&cx, "t2"), 1);
        assert_eq!(order(&cx, "t3"), 3);
        assert_eq!(center_of(&cx, "t0"), Point::new(100., 125.));
        assert_eq!(center_of(&cx, "t1"), Point::new(100., 25.));
        assert_eq!(cx.item(&"t3".into()).unwrap().offset(), Point::ZERO);
    }

    #[test]
    fn update_index_rejects_same_index() {
        let mut cx = row(3);
        for ix in 0..3 {
            assert_eq!(
                cx.update_index(ix, ix),
                Err(DndError::InvalidMove { from: ix, to: ix })
            );
        }
        assert!(cx.is_settled());
    }

    #[test]
    fn update_index_rejects_out_of_range() {
        let mut cx = row(3);
        assert_eq!(
            cx.update_index(1, 3),
            Err(DndError::OutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn update_index_keeps_permutation() {
        for len in 1..6 {
            for from in 0..len {
                for to in 0..len {
                    if from == to {
                        continue;
                    }
                    let mut cx = row(len);
                    cx.update_index(from, to).unwrap();
                    assert_permutation(&cx);
                }
            }
        }
    }

    #[test]
    fn update_index_round_trip_restores_order() {
        let mut cx = row(5);
        let before = cx.ordered_ids();

        cx.update_index(4, 1).unwrap();
        cx.update_index(1, 4).unwrap();

        assert_eq!(cx.ordered_ids(), before);
        for item in cx.items() {
            assert!(item.offset_left.abs() < 1e-3, "{item:?}");
        }
    }

    #[test]
    fn candidate_index_covers_axis_with_contiguous_ranges() {
        for dragged in 0..4 {
            let cx = row(4);
            let mut seen = Vec::new();
            let mut x = -50.;
            while x <= 450. {
                let candidate = cx.candidate_index(dragged, Point::new(x, 20.)).unwrap();
                if seen.last() != Some(&candidate) {
                    seen.push(candidate);
                }
                x += 0.5;
            }
            assert_eq!(seen, vec![0, 1, 2, 3], "dragged {dragged}");
        }
    }

    #[test]
    fn candidate_index_uses_sibling_centers() {
        let cx = row(3);
        // Past the last sibling's center.
        assert_eq!(cx.candidate_index(1, Point::new(260., 0.)).unwrap(), 2);
        assert_eq!(cx.candidate_index(1, Point::new(250., 0.)).unwrap(), 2);
        assert_eq!(cx.candidate_index(1, Point::new(249., 0.)).unwrap(), 1);
        assert_eq!(cx.candidate_index(1, Point::new(49., 0.)).unwrap(), 0);
        assert_eq!(row(1).candidate_index(0, Point::new(900., 0.)).unwrap(), 0);
    }

    #[test]
    fn candidate_index_requires_tracked_item() {
        let cx = row(2);
        assert!(matches!(
            cx.candidate_index(2, Point::ZERO),
            Err(DndError::NoCurrentItem(_))
        ));
    }

    #[test]
    fn unmount_closes_gap() {
        let mut cx = row(4);
        cx.unmount(&"b1".into()).unwrap();
        assert_eq!(cx.ordered_ids(), ids(&["b0", "b2", "b3"]));
        assert_permutation(&cx);
        assert!(cx.unmount(&"b1".into()).is_none());
        cx.update_index(2, 0).unwrap();
        assert_permutation(&cx);
    }

    #[test]
    fn reconcile_follows_rendered_collection() {
        let mut cx = row(3);
        cx.update_index(0, 2).unwrap();
        cx.reconcile(&ids(&["b2", "new", "b0"]));

        assert_eq!(cx.ordered_ids(), ids(&["b2", "new", "b0"]));
        assert!(cx.item(&"b1".into()).is_none());
        assert!(cx.is_settled());
    }

    #[test]
    fn settle_all_then_measure_resets_offset_and_box() {
        let mut cx = row(2);
        cx.update_index(1, 0).unwrap();
        assert!(!cx.is_settled());

        cx.settle_all();
        assert!(cx.is_settled());
        assert!(cx.measure(&"b1".into(), Rect::new(0., 0., 100., 40.)));
        assert!(cx.measure(&"b0".into(), Rect::new(100., 0., 100., 40.)));
        assert_eq!(center_of(&cx, "b1").x, 50.);
        assert_eq!(order(&cx, "b1"), 0);
        assert!(!cx.measure(&"missing".into(), Rect::default()));
    }

    #[test]
    fn slot_for_point_counts_preceding_centers() {
        let cx = column(3);
        assert_eq!(cx.slot_for_point(Point::new(0., 10.)), 0);
        assert_eq!(cx.slot_for_point(Point::new(0., 60.)), 1);
        assert_eq!(cx.slot_for_point(Point::new(0., 500.)), 3);
        assert_eq!(DragContext::default().slot_for_point(Point::ZERO), 0);
    }
}
