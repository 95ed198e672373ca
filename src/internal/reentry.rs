//! Per-thread record of the materializers a thread is currently resolving
//! through, so a factory calling back into its own materializer is caught
//! instead of waiting on a lock its own thread holds.

use std::cell::RefCell;

thread_local! {
    static ACTIVE: RefCell<Vec<usize>> = RefCell::new(Vec::new());
}

/// Marks a materializer as in flight on this thread until dropped.
pub(crate) struct ActiveGuard {
    id: usize,
}

impl ActiveGuard {
    pub(crate) fn enter(id: usize) -> Self {
        ACTIVE.with(|active| active.borrow_mut().push(id));
        Self { id }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if let Some(pos) = active.iter().rposition(|&id| id == self.id) {
                active.remove(pos);
            }
        });
    }
}

/// Whether the current thread is inside a request on materializer `id`.
pub(crate) fn is_active(id: usize) -> bool {
    ACTIVE.with(|active| active.borrow().contains(&id))
}
