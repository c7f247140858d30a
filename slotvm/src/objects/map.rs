use std::{fmt, mem, sync::Arc};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::Value;

/// Capacity a map starts with once it holds anything.
pub const MIN_CAPACITY: usize = 16;

/// The map grows and shrinks by this factor.
pub const GROW_FACTOR: usize = 2;

/// Maximum percentage of live entries before the table grows.
pub const LOAD_PERCENT: usize = 75;

/// One physical slot of the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Entry {
    #[default]
    Empty,
    /// left behind by a removal so probe sequences stay intact
    Tombstone,
    Live { key: Value, value: Value },
}

impl Entry {
    #[inline]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live { .. })
    }
}

/// Open addressed hash table with linear probing.
///
/// capacity is always zero or a power of two, so the probe start is a mask of
/// the key hash. Removed entries turn into tombstones until the next resize.
#[derive(Debug, Default)]
pub struct MapObject {
    entries: Vec<Entry>,
    count: usize,
}

enum Probe {
    Found(usize),
    Vacant(usize),
    Full,
}

impl MapObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// number of live entries
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// number of physical entries, including empty and tombstone ones
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        match find_entry(&self.entries, key) {
            Probe::Found(index) => match &self.entries[index] {
                Entry::Live { value, .. } => Some(value),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or replaces the value for `key`.
    /// Returns the previous value if the key was already present.
    pub fn set(&mut self, key: Value, value: Value) -> Option<Value> {
        debug_assert!(key.is_hashable(), "map keys must be hashable: {key:?}");

        if self.count + 1 > self.capacity() * LOAD_PERCENT / 100 {
            let capacity = (self.capacity() * GROW_FACTOR).max(MIN_CAPACITY);
            self.resize(capacity);
        }

        let previous = insert_entry(&mut self.entries, key, value);
        if previous.is_none() {
            self.count += 1;
        }
        previous
    }

    /// Removes `key`, leaving a tombstone in its place.
    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let Probe::Found(index) = find_entry(&self.entries, key) else {
            return None;
        };

        let removed = mem::replace(&mut self.entries[index], Entry::Tombstone);
        let Entry::Live { value, .. } = removed else {
            unreachable!("probe only reports live entries as found")
        };
        self.count -= 1;

        if self.count == 0 {
            self.clear();
        } else if self.capacity() > MIN_CAPACITY
            && self.count < self.capacity() / GROW_FACTOR * LOAD_PERCENT / 100
        {
            let capacity = (self.capacity() / GROW_FACTOR).max(MIN_CAPACITY);
            self.resize(capacity);
        }

        Some(value)
    }

    pub fn clear(&mut self) {
        log::debug!("clearing map with capacity {}", self.capacity());
        self.entries = Vec::new();
        self.count = 0;
    }

    /// Physical index of the next live entry after `previous`,
    /// or the first live entry if `previous` is `None`.
    pub fn iterate(&self, previous: Option<usize>) -> Option<usize> {
        let start = previous.map_or(0, |index| index + 1);
        (start..self.capacity()).find(|&index| self.entries[index].is_live())
    }

    /// key of the live entry at a physical index
    pub fn key_at(&self, index: usize) -> Option<&Value> {
        match self.entries.get(index)? {
            Entry::Live { key, .. } => Some(key),
            _ => None,
        }
    }

    /// value of the live entry at a physical index
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        match self.entries.get(index)? {
            Entry::Live { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Live entries in physical order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Live { key, value } => Some((key, value)),
            _ => None,
        })
    }

    fn resize(&mut self, capacity: usize) {
        debug_assert!(capacity.is_power_of_two());
        log::debug!(
            "resizing map from {} to {capacity} entries ({} live)",
            self.capacity(),
            self.count
        );

        let old = mem::replace(&mut self.entries, vec![Entry::Empty; capacity]);
        for entry in old {
            if let Entry::Live { key, value } = entry {
                insert_entry(&mut self.entries, key, value);
            }
        }
    }

    /// Builds a map from raw parts, bypassing hashing.
    /// Only used to construct tables in a known physical layout.
    #[cfg(test)]
    pub(crate) fn from_raw_parts(entries: Vec<Entry>, count: usize) -> Self {
        Self { entries, count }
    }
}

fn find_entry(entries: &[Entry], key: &Value) -> Probe {
    let capacity = entries.len();
    if capacity == 0 {
        return Probe::Full;
    }
    let Some(hash) = key.hash_code() else {
        return Probe::Full;
    };

    let mask = capacity - 1;
    let start = hash as usize & mask;
    let mut tombstone = None;
    let mut index = start;
    loop {
        match &entries[index] {
            Entry::Empty => {
                // reuse the first tombstone we passed, if any
                return Probe::Vacant(tombstone.unwrap_or(index));
            }
            Entry::Tombstone => {
                tombstone.get_or_insert(index);
            }
            Entry::Live { key: existing, .. } if existing == key => {
                return Probe::Found(index);
            }
            Entry::Live { .. } => {}
        }

        index = (index + 1) & mask;
        if index == start {
            break;
        }
    }

    // only live entries and tombstones
    match tombstone {
        Some(index) => Probe::Vacant(index),
        None => Probe::Full,
    }
}

fn insert_entry(entries: &mut [Entry], key: Value, value: Value) -> Option<Value> {
    match find_entry(entries, &key) {
        Probe::Found(index) => match &mut entries[index] {
            Entry::Live { value: slot, .. } => Some(mem::replace(slot, value)),
            _ => unreachable!("probe only reports live entries as found"),
        },
        Probe::Vacant(index) => {
            entries[index] = Entry::Live { key, value };
            None
        }
        Probe::Full => unreachable!("map is resized before it can fill up"),
    }
}

/// Shared handle to a map object.
#[derive(Clone, Default)]
pub struct MapRef(Arc<RwLock<MapObject>>);

impl MapRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_object(map: MapObject) -> Self {
        Self(Arc::new(RwLock::new(map)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, MapObject> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, MapObject> {
        self.0.write()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// maps can contain themselves, so don't print the contents
impl fmt::Debug for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MapRef({:p})", Arc::as_ptr(&self.0))
    }
}
