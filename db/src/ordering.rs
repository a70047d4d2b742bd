//! Moving one item of a manually ordered list up or down by exchanging its order value with
//! its neighbour's.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderingError {
    #[error("Item is not part of the list")]
    NotFound,

    #[error("Item is already first")]
    AlreadyFirst,

    #[error("Item is already last")]
    AlreadyLast,

    #[error("Item shares its order value with its neighbour")]
    DuplicateOrder,
}

/// Compute the two writes needed to move `target` one step in `direction`.
///
/// `items` holds `(id, order)` pairs in any order. The result assigns the neighbour's order
/// value to the target and the target's value to the neighbour; nothing else in the list
/// changes. Swapping equal values would change nothing, so a target tied with its neighbour
/// is rejected.
pub fn plan_move<ID: Copy + PartialEq>(
    items: &[(ID, i32)],
    target: ID,
    direction: MoveDirection,
) -> Result<[(ID, i32); 2], OrderingError> {
    let mut sorted = items.to_vec();
    sorted.sort_by_key(|(_, order)| *order);

    let pos = sorted
        .iter()
        .position(|(id, _)| *id == target)
        .ok_or(OrderingError::NotFound)?;

    let neighbour_pos = match direction {
        MoveDirection::Up => pos.checked_sub(1).ok_or(OrderingError::AlreadyFirst)?,
        MoveDirection::Down => {
            if pos + 1 >= sorted.len() {
                return Err(OrderingError::AlreadyLast);
            }
            pos + 1
        }
    };

    let (target_id, target_order) = sorted[pos];
    let (neighbour_id, neighbour_order) = sorted[neighbour_pos];
    if target_order == neighbour_order {
        return Err(OrderingError::DuplicateOrder);
    }

    Ok([
        (target_id, neighbour_order),
        (neighbour_id, target_order),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> Vec<(u32, i32)> {
        vec![(1, 10), (2, 20), (3, 30), (4, 40)]
    }

    fn apply(items: &mut [(u32, i32)], writes: [(u32, i32); 2]) {
        for (id, order) in writes {
            if let Some(item) = items.iter_mut().find(|(i, _)| *i == id) {
                item.1 = order;
            }
        }
    }

    #[test]
    fn swap_second_and_third() {
        let mut items = list();
        let writes = plan_move(&items, 2, MoveDirection::Down).unwrap();
        assert_eq!(writes, [(2, 30), (3, 20)]);

        apply(&mut items, writes);
        assert_eq!(items, vec![(1, 10), (2, 30), (3, 20), (4, 40)]);
    }

    #[test]
    fn move_up_takes_previous_slot() {
        let writes = plan_move(&list(), 3, MoveDirection::Up).unwrap();
        assert_eq!(writes, [(3, 20), (2, 30)]);
    }

    #[test]
    fn unsorted_input() {
        let items = vec![(3, 30), (1, 10), (4, 40), (2, 20)];
        let writes = plan_move(&items, 1, MoveDirection::Down).unwrap();
        assert_eq!(writes, [(1, 20), (2, 10)]);
    }

    #[test]
    fn gaps_in_order_values_are_kept() {
        let items = vec![(1, 1), (2, 7), (3, 100)];
        let writes = plan_move(&items, 3, MoveDirection::Up).unwrap();
        assert_eq!(writes, [(3, 7), (2, 100)]);
    }

    #[test]
    fn first_cannot_move_up() {
        assert_eq!(
            plan_move(&list(), 1, MoveDirection::Up),
            Err(OrderingError::AlreadyFirst)
        );
    }

    #[test]
    fn last_cannot_move_down() {
        assert_eq!(
            plan_move(&list(), 4, MoveDirection::Down),
            Err(OrderingError::AlreadyLast)
        );
    }

    #[test]
    fn single_item_cannot_move() {
        let items = vec![(9, 0)];
        assert_eq!(
            plan_move(&items, 9, MoveDirection::Up),
            Err(OrderingError::AlreadyFirst)
        );
        assert_eq!(
            plan_move(&items, 9, MoveDirection::Down),
            Err(OrderingError::AlreadyLast)
        );
    }

    #[test]
    fn missing_item() {
        assert_eq!(
            plan_move(&list(), 99, MoveDirection::Down),
            Err(OrderingError::NotFound)
        );
    }

    #[test]
    fn tied_neighbours_are_rejected() {
        let items = vec![(1, 0), (2, 5), (3, 5), (4, 9)];
        assert_eq!(
            plan_move(&items, 2, MoveDirection::Down),
            Err(OrderingError::DuplicateOrder)
        );
        assert_eq!(
            plan_move(&items, 3, MoveDirection::Up),
            Err(OrderingError::DuplicateOrder)
        );

        // A tie elsewhere in the list does not block an unrelated move.
        let writes = plan_move(&items, 1, MoveDirection::Down).unwrap();
        assert_eq!(writes, [(1, 5), (2, 0)]);
    }

    #[test]
    fn direction_deserializes_lowercase() {
        let dir: MoveDirection = serde_json::from_str(r#""up""#).unwrap();
        assert_eq!(dir, MoveDirection::Up);
        assert!(serde_json::from_str::<MoveDirection>(r#""sideways""#).is_err());
    }
}
