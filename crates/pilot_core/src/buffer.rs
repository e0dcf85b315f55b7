use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::actions::Action;

#[derive(Default)]
struct Slots {
    actions: Vec<Action>,
    sealed: bool,
}

/// Pending actions shared between the embedding app and the coordination
/// loop. Pops return the most recently pushed action.
///
/// Once sealed, pushes are refused; whatever was accepted before stays
/// poppable, so a drained sealed buffer stays empty for good.
#[derive(Default)]
pub struct ActionBuffer {
    slots: Mutex<Slots>,
}

impl ActionBuffer {
    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands the action back when the buffer is sealed.
    pub fn push(&self, action: Action) -> Result<(), Action> {
        let mut slots = self.lock();
        if slots.sealed {
            return Err(action);
        }
        slots.actions.push(action);
        Ok(())
    }

    pub fn pop(&self) -> Option<Action> {
        self.lock().actions.pop()
    }

    pub fn seal(&self) {
        self.lock().sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    pub fn len(&self) -> usize {
        self.lock().actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().actions.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/buffer_tests.rs"]
mod tests;
