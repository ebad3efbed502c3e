use std::collections::VecDeque;
use std::hash::Hash;

use hashbrown::HashSet;

/// FIFO that holds each value at most once.
///
/// Enqueueing a value that is already waiting is a no-op, so a value keeps the
/// position of its first enqueue until it is dequeued.
#[derive(Clone, Debug)]
pub struct UniqueQueue<T> {
    order: VecDeque<T>,
    members: HashSet<T>,
}

impl<T> Default for UniqueQueue<T> {
    fn default() -> Self {
        Self {
            order: VecDeque::new(),
            members: HashSet::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> UniqueQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the value was not already queued.
    pub fn enqueue(&mut self, value: T) -> bool {
        if !self.members.insert(value.clone()) {
            return false;
        }
        self.order.push_back(value);
        true
    }

    pub fn try_dequeue(&mut self) -> Option<T> {
        let value = self.order.pop_front()?;
        self.members.remove(&value);
        Some(value)
    }

    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.order.front()
    }

    #[inline]
    pub fn contains(&self, value: &T) -> bool {
        self.members.contains(value)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Queued values front to back.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, T> {
        self.order.iter()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}

impl<T: Eq + Hash + Clone> Extend<T> for UniqueQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.enqueue(v);
        }
    }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for UniqueQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut q = UniqueQueue::new();
        q.extend(iter);
        q
    }
}
