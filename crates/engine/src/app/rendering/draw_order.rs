use crate::app::Entity;

/// Fills `out` with entity indices in paint order: ground layer first, then
/// objects, each by ascending rect center y. The sort is stable, so ties keep
/// spawn order.
pub fn depth_sorted_indices(entities: &[Entity], out: &mut Vec<usize>) {
    out.clear();
    out.extend(0..entities.len());
    out.sort_by(|&a, &b| {
        let left = &entities[a];
        let right = &entities[b];
        left.renderable
            .layer
            .cmp(&right.renderable.layer)
            .then_with(|| left.rect.center().y.total_cmp(&right.rect.center().y))
    });
}
