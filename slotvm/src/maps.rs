//! Map half of the slot API.
//!
//! Everything here takes the map from a slot, so the host never holds a map
//! directly. Keys and values are exchanged through further slots.
use crate::{ApiError, Entry, MapObject, MapRef, VM, Value, validate_index, vm::fail_fast};

/// Walks the table in physical order and returns the live entry at `position`
/// among live entries.
///
/// Tombstones and empty entries are skipped. Empty entries may sit between
/// live ones, so the walk never stops early and always covers the whole
/// table before giving up.
pub fn find_element(map: &MapObject, position: usize) -> Option<(&Value, &Value)> {
    let mut seen = 0;
    for entry in map.entries() {
        match entry {
            Entry::Empty | Entry::Tombstone => continue,
            Entry::Live { key, value } => {
                if seen == position {
                    return Some((key, value));
                }
                seen += 1;
            }
        }
    }
    None
}

impl VM {
    fn map_in_slot(&self, slot: i32) -> Result<MapRef, ApiError> {
        let index = self.slots.validate(slot)?;
        match self.slots.get(index) {
            Value::Map(map) => Ok(map.clone()),
            other => Err(ApiError::NotAMap {
                slot: index,
                found: other.slot_type(),
            }),
        }
    }

    fn key_in_slot(&self, slot: i32) -> Result<Value, ApiError> {
        let index = self.slots.validate(slot)?;
        let key = self.slots.get(index);
        if !key.is_hashable() {
            return Err(ApiError::UnhashableKey {
                slot: index,
                found: key.slot_type(),
            });
        }
        Ok(key.clone())
    }

    pub fn try_set_slot_new_map(&mut self, slot: i32) -> Result<(), ApiError> {
        self.try_set_slot(slot, Value::Map(MapRef::new()))
    }

    #[track_caller]
    pub fn set_slot_new_map(&mut self, slot: i32) {
        fail_fast(self.try_set_slot_new_map(slot))
    }

    pub fn try_get_map_count(&self, slot: i32) -> Result<usize, ApiError> {
        Ok(self.map_in_slot(slot)?.read().count())
    }

    #[track_caller]
    pub fn get_map_count(&self, slot: i32) -> usize {
        fail_fast(self.try_get_map_count(slot))
    }

    pub fn try_get_map_contains_key(&self, map_slot: i32, key_slot: i32) -> Result<bool, ApiError> {
        let map = self.map_in_slot(map_slot)?;
        let key = self.key_in_slot(key_slot)?;
        let contains = map.read().contains_key(&key);
        Ok(contains)
    }

    #[track_caller]
    pub fn get_map_contains_key(&self, map_slot: i32, key_slot: i32) -> bool {
        fail_fast(self.try_get_map_contains_key(map_slot, key_slot))
    }

    /// Looks up the key in `key_slot`, a missing key yields null.
    pub fn try_get_map_value(
        &mut self,
        map_slot: i32,
        key_slot: i32,
        value_slot: i32,
    ) -> Result<(), ApiError> {
        let map = self.map_in_slot(map_slot)?;
        let key = self.key_in_slot(key_slot)?;
        let value_slot = self.slots.validate(value_slot)?;

        let value = map.read().get(&key).cloned().unwrap_or(Value::Null);
        self.slots.set(value_slot, value.or_null());
        Ok(())
    }

    #[track_caller]
    pub fn get_map_value(&mut self, map_slot: i32, key_slot: i32, value_slot: i32) {
        fail_fast(self.try_get_map_value(map_slot, key_slot, value_slot))
    }

    pub fn try_set_map_value(
        &mut self,
        map_slot: i32,
        key_slot: i32,
        value_slot: i32,
    ) -> Result<(), ApiError> {
        let map = self.map_in_slot(map_slot)?;
        let key = self.key_in_slot(key_slot)?;
        let value_slot = self.slots.validate(value_slot)?;

        let value = self.slots.get(value_slot).clone();
        map.write().set(key, value);
        Ok(())
    }

    #[track_caller]
    pub fn set_map_value(&mut self, map_slot: i32, key_slot: i32, value_slot: i32) {
        fail_fast(self.try_set_map_value(map_slot, key_slot, value_slot))
    }

    /// Removes the key in `key_slot` and stores the removed value, or null,
    /// in `removed_slot`.
    pub fn try_remove_map_value(
        &mut self,
        map_slot: i32,
        key_slot: i32,
        removed_slot: i32,
    ) -> Result<(), ApiError> {
        let map = self.map_in_slot(map_slot)?;
        let key = self.key_in_slot(key_slot)?;
        let removed_slot = self.slots.validate(removed_slot)?;

        let removed = map.write().remove(&key).unwrap_or(Value::Null);
        self.slots.set(removed_slot, removed.or_null());
        Ok(())
    }

    #[track_caller]
    pub fn remove_map_value(&mut self, map_slot: i32, key_slot: i32, removed_slot: i32) {
        fail_fast(self.try_remove_map_value(map_slot, key_slot, removed_slot))
    }

    /// Copies the key and value of the `index`th live entry of the map in
    /// `map_slot` into `key_slot` and `value_slot`.
    ///
    /// Entries are numbered in table order, which is stable as long as the map
    /// is not modified. Negative indices count from the last entry. A stored
    /// undefined value is handed out as null. Nothing but the two output slots
    /// is written.
    pub fn try_get_map_element(
        &mut self,
        map_slot: i32,
        index: i64,
        key_slot: i32,
        value_slot: i32,
    ) -> Result<(), ApiError> {
        let map_index = self.slots.validate(map_slot)?;
        let key_slot = self.slots.validate(key_slot)?;
        let value_slot = self.slots.validate(value_slot)?;
        let map = match self.slots.get(map_index) {
            Value::Map(map) => map.clone(),
            other => {
                return Err(ApiError::NotAMap {
                    slot: map_index,
                    found: other.slot_type(),
                });
            }
        };

        let (key, value) = {
            let map = map.read();
            let count = map.count();
            let position =
                validate_index(count, index).ok_or(ApiError::IndexOutOfBounds { index, count })?;

            let (key, value) = find_element(&map, position).ok_or_else(|| {
                log::error!(
                    "map claims {count} entries but entry {position} is missing from {} slots",
                    map.capacity()
                );
                ApiError::MapIteratedOutOfBounds {
                    index: position,
                    capacity: map.capacity(),
                }
            })?;
            (key.clone(), value.clone())
        };

        log::trace!("map element {index} -> slots {key_slot}, {value_slot}");
        self.slots.set(key_slot, key);
        self.slots.set(value_slot, value.or_null());
        Ok(())
    }

    /// Aborting variant of [`VM::try_get_map_element`].
    ///
    /// # Panics
    /// On any slot out of range, a non-map in `map_slot`, an index outside
    /// the map, or a map whose count does not match its table.
    #[track_caller]
    pub fn get_map_element(&mut self, map_slot: i32, index: i64, key_slot: i32, value_slot: i32) {
        fail_fast(self.try_get_map_element(map_slot, index, key_slot, value_slot))
    }
}
