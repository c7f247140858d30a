use std::{error::Error, fmt};

use crate::SlotType;

/// Misuse of the slot API by the host.
///
/// The panicking entry points on [`crate::VM`] abort with the `Display` text
/// of these, the `try_*` variants hand them back instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// slot index is negative or not below the slot count
    SlotOutOfRange { slot: i32, count: usize },
    NotAMap { slot: usize, found: SlotType },
    WrongSlotType {
        slot: usize,
        expected: SlotType,
        found: SlotType,
    },
    UnhashableKey { slot: usize, found: SlotType },
    /// logical map index does not resolve to a live entry
    IndexOutOfBounds { index: i64, count: usize },
    /// the map's count promised more live entries than its table holds
    MapIteratedOutOfBounds { index: usize, capacity: usize },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlotOutOfRange { slot, count } if *slot < 0 => {
                write!(f, "Slot cannot be negative (got {slot}, {count} slots).")
            }
            Self::SlotOutOfRange { slot, count } => {
                write!(f, "Not that many slots (slot {slot}, {count} slots).")
            }
            Self::NotAMap { slot, found } => {
                write!(f, "Slot must hold a map (slot {slot} holds {found}).")
            }
            Self::WrongSlotType {
                slot,
                expected,
                found,
            } => write!(
                f,
                "Slot must hold a {expected} (slot {slot} holds {found})."
            ),
            Self::UnhashableKey { slot, found } => write!(
                f,
                "Key must be a value type (slot {slot} holds {found})."
            ),
            Self::IndexOutOfBounds { index, count } => {
                write!(f, "Index out of bounds ({index} for {count} entries).")
            }
            Self::MapIteratedOutOfBounds { index, capacity } => write!(
                f,
                "Map container iterated OOB (entry {index} not found in {capacity} slots)."
            ),
        }
    }
}

impl Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_and_large_slots_read_differently() {
        let negative = ApiError::SlotOutOfRange { slot: -1, count: 2 };
        let large = ApiError::SlotOutOfRange { slot: 5, count: 2 };
        assert!(negative.to_string().starts_with("Slot cannot be negative"));
        assert!(large.to_string().starts_with("Not that many slots"));
    }

    #[test]
    fn internal_failure_is_distinct_from_bad_index() {
        let oob = ApiError::MapIteratedOutOfBounds {
            index: 1,
            capacity: 16,
        };
        let index = ApiError::IndexOutOfBounds { index: 2, count: 2 };
        assert!(oob.to_string().contains("iterated OOB"));
        assert!(index.to_string().contains("Index out of bounds"));
    }
}
