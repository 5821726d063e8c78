//! FIFO work queue with coalescing of adjacent superseded items.
//!
//! The engine loop drains every command available in one wake-up into
//! the queue. An item that supersedes the one queued right before it
//! takes its place; the replaced item rides along in the batch so its
//! caller still gets an answer.

use std::collections::VecDeque;

/// Whether a later item makes an adjacent earlier one redundant.
pub trait Coalesce {
    fn supersedes(&self, earlier: &Self) -> bool;
}

/// One unit of work: the item to process plus the items it replaced,
/// oldest first.
#[derive(Debug)]
pub struct Batch<T> {
    pub item: T,
    pub superseded: Vec<T>,
}

#[derive(Debug)]
pub struct WorkQueue<T> {
    batches: VecDeque<Batch<T>>,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self {
            batches: VecDeque::new(),
        }
    }
}

impl<T: Coalesce> WorkQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) {
        if let Some(last) = self.batches.back_mut() {
            if item.supersedes(&last.item) {
                let earlier = std::mem::replace(&mut last.item, item);
                last.superseded.push(earlier);
                return;
            }
        }
        self.batches.push_back(Batch {
            item,
            superseded: Vec::new(),
        });
    }

    pub fn pop(&mut self) -> Option<Batch<T>> {
        self.batches.pop_front()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}
