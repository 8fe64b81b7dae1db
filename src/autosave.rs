//! Debounced saving for text fields.
//!
//! Typing into a field should not hit the store on every keystroke. Each field
//! owns one [`Debouncer`]: an edit schedules a pending write a short delay in
//! the future, a further edit replaces the value and pushes the deadline out,
//! and the write happens once the field has been quiet for the whole delay.
//! Leaving the field (blur, navigation, teardown) flushes immediately so no
//! edit is lost. Saves are last-write-wins, so dropping intermediate values is
//! harmless.
//!
//! Time is passed in by the caller; nothing here spawns timers or threads.

use crate::constants::SAVE_DEBOUNCE_MS;
use std::time::{Duration, Instant};
use tracing::debug;

/// Idle, or holding a value that should be written at `deadline`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending<T> {
    Idle,
    Write { value: T, deadline: Instant },
}

/// Trailing-edge debounce over values of type `T`.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Pending<T>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Debouncer::new(Duration::from_millis(SAVE_DEBOUNCE_MS))
    }
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            pending: Pending::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.pending, Pending::Write { .. })
    }

    /// Replace any pending value with `value`, due `delay` after `now`.
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Pending::Write {
            value,
            deadline: now + self.delay,
        };
    }

    /// The pending value, if its deadline has passed at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = matches!(&self.pending, Pending::Write { deadline, .. } if now >= *deadline);
        if due {
            self.flush()
        } else {
            None
        }
    }

    /// The pending value right away, leaving the debouncer idle.
    pub fn flush(&mut self) -> Option<T> {
        match std::mem::replace(&mut self.pending, Pending::Idle) {
            Pending::Write { value, .. } => Some(value),
            Pending::Idle => None,
        }
    }

    /// Drop the pending value without writing it.
    pub fn cancel(&mut self) {
        self.pending = Pending::Idle;
    }
}

/// One text field bound to its save callback.
///
/// Flushes on drop, so a field going out of scope never loses its last edit.
///
/// ```
/// use devotions::autosave::FieldAutosave;
/// use std::cell::RefCell;
/// use std::time::{Duration, Instant};
///
/// let saved = RefCell::new(Vec::new());
/// {
///     let mut field = FieldAutosave::new(Duration::from_millis(400), |text: &str| {
///         saved.borrow_mut().push(text.to_string())
///     });
///     let start = Instant::now();
///     field.edit("h".to_string(), start);
///     field.edit("hi".to_string(), start + Duration::from_millis(100));
///     assert!(saved.borrow().is_empty());
/// }
/// assert_eq!(*saved.borrow(), vec!["hi".to_string()]);
/// ```
pub struct FieldAutosave<F: FnMut(&str)> {
    debouncer: Debouncer<String>,
    save: F,
}

impl<F: FnMut(&str)> FieldAutosave<F> {
    pub fn new(delay: Duration, save: F) -> Self {
        FieldAutosave {
            debouncer: Debouncer::new(delay),
            save,
        }
    }

    /// Record the field's new contents at `now`; saves later.
    pub fn edit(&mut self, text: String, now: Instant) {
        self.debouncer.schedule(text, now);
    }

    /// Save if the field has been quiet long enough. Returns whether it saved.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(text) => {
                debug!("Debounced save of {} bytes", text.len());
                (self.save)(&text);
                true
            }
            None => false,
        }
    }

    /// Save any pending edit immediately. Returns whether it saved.
    pub fn flush(&mut self) -> bool {
        match self.debouncer.flush() {
            Some(text) => {
                debug!("Flushing pending save of {} bytes", text.len());
                (self.save)(&text);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

impl<F: FnMut(&str)> Drop for FieldAutosave<F> {
    fn drop(&mut self) {
        self.flush();
    }
}
