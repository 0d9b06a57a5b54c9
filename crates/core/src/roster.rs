//! Shared roster consistency layer
//!
//! Several aggregates keep a membership list in a JSON column: team
//! members, chat participants, hackathon winners. All of them mutate
//! the list the same way: read the current value inside a write
//! transaction, build a new list, and write the whole value back.
//! The list arithmetic lives here so every call site reports the same
//! conditions; each call site decides which conditions are errors and
//! which are idempotent no-ops.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RosterError {
    #[error("already present")]
    AlreadyPresent,
    #[error("roster is full (max {0})")]
    Full(usize),
    #[error("not present")]
    NotPresent,
    #[error("entry is protected and cannot be removed")]
    Protected,
}

/// Returns a new list with `item` appended. Fails if the item is
/// already present or if `capacity` is set and the list is at it.
pub fn add<T: PartialEq + Clone>(
    list: &[T],
    item: T,
    capacity: Option<usize>,
) -> Result<Vec<T>, RosterError> {
    if list.contains(&item) {
        return Err(RosterError::AlreadyPresent);
    }
    if let Some(cap) = capacity {
        if list.len() >= cap {
            return Err(RosterError::Full(cap));
        }
    }
    let mut next = list.to_vec();
    next.push(item);
    Ok(next)
}

/// Returns a new list with `item` removed. Fails if the item is not
/// present, or if it equals the `protected` entry (a team leader, a
/// project owner).
pub fn remove<T: PartialEq + Clone>(
    list: &[T],
    item: &T,
    protected: Option<&T>,
) -> Result<Vec<T>, RosterError> {
    if let Some(p) = protected {
        if item == p {
            return Err(RosterError::Protected);
        }
    }
    if !list.contains(item) {
        return Err(RosterError::NotPresent);
    }
    Ok(list.iter().filter(|m| *m != item).cloned().collect())
}
