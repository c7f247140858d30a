use std::fmt;

use crate::{ApiError, Value};

/// Type of the value in a slot, as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotType {
    Bool,
    Num,
    Map,
    Null,
    String,
    Unknown,
}

impl SlotType {
    pub fn is_map(self) -> bool {
        self == Self::Map
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Num => "num",
            Self::Map => "map",
            Self::Null => "null",
            Self::String => "string",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Value exchange array of the current call frame.
///
/// The host addresses slots by index. The array only grows, through
/// [`ApiSlots::ensure`], and fresh slots hold null.
#[derive(Debug, Clone, Default)]
pub struct ApiSlots {
    slots: Vec<Value>,
}

impl ApiSlots {
    #[must_use]
    pub fn with_count(count: usize) -> Self {
        Self {
            slots: vec![Value::Null; count],
        }
    }

    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    /// Grows the array to at least `count` slots
    pub fn ensure(&mut self, count: usize) {
        if count > self.slots.len() {
            self.slots.resize(count, Value::Null);
        }
    }

    /// Checks a host slot index and converts it into an array index
    pub fn validate(&self, slot: i32) -> Result<usize, ApiError> {
        usize::try_from(slot)
            .ok()
            .filter(|&index| index < self.slots.len())
            .ok_or(ApiError::SlotOutOfRange {
                slot,
                count: self.slots.len(),
            })
    }

    /// Value at an already validated index
    #[inline]
    pub fn get(&self, index: usize) -> &Value {
        &self.slots[index]
    }

    /// Stores into an already validated index
    #[inline]
    pub fn set(&mut self, index: usize, value: Value) {
        self.slots[index] = value;
    }

    /// Returns the active slots
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_slots_are_null() {
        let slots = ApiSlots::with_count(3);
        assert_eq!(slots.count(), 3);
        assert!(slots.as_slice().iter().all(|v| *v == Value::Null));
    }

    #[test]
    fn ensure_only_grows() {
        let mut slots = ApiSlots::with_count(4);
        slots.set(3, Value::Num(1.0));
        slots.ensure(2);
        assert_eq!(slots.count(), 4);
        slots.ensure(6);
        assert_eq!(slots.count(), 6);
        assert_eq!(*slots.get(3), Value::Num(1.0));
        assert_eq!(*slots.get(5), Value::Null);
    }

    #[test]
    fn validate_rejects_negative_and_past_end() {
        let slots = ApiSlots::with_count(2);
        assert_eq!(slots.validate(0), Ok(0));
        assert_eq!(slots.validate(1), Ok(1));
        assert_eq!(
            slots.validate(2),
            Err(ApiError::SlotOutOfRange { slot: 2, count: 2 })
        );
        assert_eq!(
            slots.validate(-1),
            Err(ApiError::SlotOutOfRange { slot: -1, count: 2 })
        );
    }

    #[test]
    fn empty_frame_rejects_everything() {
        let slots = ApiSlots::default();
        assert!(slots.validate(0).is_err());
    }
}
