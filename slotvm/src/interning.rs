use std::{collections::HashSet, sync::Arc};

use parking_lot::RwLock;

/// VM wide table of string values.
/// Equal strings handed to the slot API share a single allocation.
#[derive(Debug, Clone, Default)]
pub struct InternedStrings(Arc<RwLock<HashSet<Arc<str>>>>);

impl InternedStrings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, value: &str) -> Arc<str> {
        if let Some(interned) = self.0.read().get(value) {
            return interned.clone();
        }

        let mut table = self.0.write();
        // another handle may have added it between the two locks
        if let Some(interned) = table.get(value) {
            return interned.clone();
        }
        let interned: Arc<str> = Arc::from(value);
        table.insert(interned.clone());
        log::trace!("interned {value:?} ({} strings)", table.len());
        interned
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_string_shares_allocation() {
        let strings = InternedStrings::new();
        let a = strings.intern("hello");
        let b = strings.intern("hello");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(strings.len(), 1);
    }

    #[test]
    fn clones_share_the_table() {
        let strings = InternedStrings::new();
        let other = strings.clone();
        let a = strings.intern("x");
        let b = other.intern("x");
        assert!(Arc::ptr_eq(&a, &b));
        other.intern("y");
        assert_eq!(strings.len(), 2);
        assert!(!strings.is_empty());
    }
}
