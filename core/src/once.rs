//! At-most-once delivery of a completion callback.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

type Callback<T> = Box<dyn FnOnce(T) + Send>;

/// A cloneable handle around a callback that runs at most once.
///
/// Every clone shares the same slot. The first `complete` takes the callback
/// out under the lock and runs it after the lock is released; later calls
/// from any clone or thread find the slot empty and drop their value.
pub struct Completion<T> {
    slot: Arc<Mutex<Option<Callback<T>>>>,
}

impl<T> Completion<T> {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        Self {
            slot: Arc::new(Mutex::new(Some(Box::new(callback)))),
        }
    }

    /// Deliver `value`. Returns `false` if the callback already ran.
    pub fn complete(&self, value: T) -> bool {
        let callback = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match callback {
            Some(callback) => {
                callback(value);
                true
            }
            None => {
                trace!("completion already delivered, dropping value");
                false
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("complete", &self.is_complete())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn runs_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let completion = Completion::new(move |n: u32| {
            assert_eq!(n, 1);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(completion.complete(1));
        assert!(!completion.complete(2));
        assert!(!completion.clone().complete(3));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(completion.is_complete());
    }

    #[test]
    fn concurrent_completions_fire_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let completion = Completion::new(move |_: usize| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let completion = completion.clone();
                std::thread::spawn(move || completion.complete(i))
            })
            .collect();
        let delivered = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(delivered, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
