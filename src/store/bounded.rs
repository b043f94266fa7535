use std::collections::VecDeque;

use crate::capture::Identified;

/// Insertion-ordered buffer with a hard capacity.
///
/// Newest entries sit at the front. Inserting past capacity evicts from the
/// back, so the store always holds the `capacity` most recent inserts.
#[derive(Debug, Clone)]
pub struct BoundedStore<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T: Identified> BoundedStore<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend a record, returning the evicted one if capacity was exceeded
    pub fn insert(&mut self, record: T) -> Option<T> {
        self.entries.push_front(record);
        if self.entries.len() > self.capacity {
            let evicted = self.entries.pop_back();
            if let Some(evicted) = &evicted {
                tracing::trace!("Evicted {} (capacity {})", evicted.id(), self.capacity);
            }
            return evicted;
        }
        None
    }

    pub fn find_by_id(&self, id: &str) -> Option<&T> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut T> {
        self.entries.iter_mut().find(|entry| entry.id() == id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent first
    /// Newest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.entries.iter()
    }
}

impl<T: Identified + Clone> BoundedStore<T> {
    /// Snapshot, most recent first
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}
