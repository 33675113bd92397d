use uuid::Uuid;

/// Column order after inserting `task_id` at `index` (clamped to the end).
/// Any existing occurrence of the task in the column is dropped first.
pub fn insert_at(column: &[Uuid], task_id: Uuid, index: usize) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = column.iter().copied().filter(|id| *id != task_id).collect();
    let index = index.min(ids.len());
    ids.insert(index, task_id);
    ids
}

pub fn without(column: &[Uuid], task_id: Uuid) -> Vec<Uuid> {
    column.iter().copied().filter(|id| *id != task_id).collect()
}

/// Dense `0..n` positions for a column order.
pub fn dense_positions(column: &[Uuid]) -> Vec<(Uuid, i32)> {
    column
        .iter()
        .enumerate()
        .map(|(position, id)| (*id, position as i32))
        .collect()
}

/// Position updates for moving a task into `target` at `index`.
///
/// `source` is the task's current column, or `None` when it stays in `target`.
pub fn plan_move(
    source: Option<&[Uuid]>,
    target: &[Uuid],
    task_id: Uuid,
    index: usize,
) -> Vec<(Uuid, i32)> {
    let mut updates = dense_positions(&insert_at(target, task_id, index));
    if let Some(source) = source {
        updates.extend(dense_positions(&without(source, task_id)));
    }
    updates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reorders_within_column() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let order = insert_at(&ids, ids[3], 1);
        assert_eq!(order, vec![ids[0], ids[3], ids[1], ids[2]]);
    }

    #[test]
    fn moves_between_columns_and_renumbers_both() {
        let todo: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let done: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
        let updates = plan_move(Some(&todo), &done, todo[0], 99);

        assert!(updates.contains(&(done[0], 0)));
        assert!(updates.contains(&(done[1], 1)));
        assert!(updates.contains(&(todo[0], 2)));
        assert!(updates.contains(&(todo[1], 0)));
        assert!(updates.contains(&(todo[2], 1)));
        assert_eq!(updates.len(), 5);
    }
}
