//! Trailing-edge debounce
//!
//! Each firing cancels the pending timer and arms a new one; when the timer
//! finally runs, the action receives the event of the last firing.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use fos_dom::Event;
use fos_js::{TimerId, TimerManager};

/// Per-binding debounce state
#[derive(Debug)]
pub struct Debouncer {
    wait: Duration,
    timers: TimerManager,
    pending: RefCell<Option<TimerId>>,
}

impl Debouncer {
    pub fn new(wait: Duration, timers: TimerManager) -> Rc<Self> {
        Rc::new(Self {
            wait,
            timers,
            pending: RefCell::new(None),
        })
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// (Re)arm the timer for `event`
    pub fn schedule(self: &Rc<Self>, event: Event, action: impl FnOnce(Event) + 'static) {
        self.cancel();

        let weak = Rc::downgrade(self);
        let id = self.timers.set_timeout(self.wait, move || {
            // Dropped with its binding: nothing to run.
            let Some(debouncer) = weak.upgrade() else {
                return;
            };
            debouncer.pending.borrow_mut().take();
            action(event);
        });
        *self.pending.borrow_mut() = Some(id);
    }

    /// Drop the pending invocation, if any
    pub fn cancel(&self) -> bool {
        match self.pending.borrow_mut().take() {
            Some(id) => self.timers.clear(id),
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(id) = self.pending.get_mut().take() {
            self.timers.clear(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_dom::KeyboardEventInit;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_burst_collapses_to_last_event() {
        let timers = TimerManager::new();
        let debouncer = Debouncer::new(ms(100), timers.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));

        for key in ["a", "b", "c"] {
            let seen = Rc::clone(&seen);
            debouncer.schedule(Event::key_down(KeyboardEventInit::key(key)), move |event| {
                seen.borrow_mut().push(event.key().map(str::to_string));
            });
            timers.advance(ms(50));
        }
        assert!(seen.borrow().is_empty());
        assert!(debouncer.is_pending());

        timers.advance(ms(50));
        assert_eq!(*seen.borrow(), vec![Some("c".to_string())]);
        assert!(!debouncer.is_pending());
        assert_eq!(timers.now_ms(), 200);
    }

    #[test]
    fn test_spaced_firings_each_run() {
        let timers = TimerManager::new();
        let debouncer = Debouncer::new(ms(100), timers.clone());
        let count = Rc::new(RefCell::new(0));

        for _ in 0..2 {
            let count = Rc::clone(&count);
            debouncer.schedule(Event::new("input"), move |_| *count.borrow_mut() += 1);
            timers.advance(ms(100));
        }
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_cancel_and_drop() {
        let timers = TimerManager::new();
        let debouncer = Debouncer::new(ms(10), timers.clone());
        debouncer.schedule(Event::new("input"), |_| panic!("cancelled"));
        assert!(debouncer.cancel());
        assert!(!timers.has_pending());

        debouncer.schedule(Event::new("input"), |_| panic!("dropped"));
        drop(debouncer);
        assert!(!timers.has_pending());
        timers.advance(ms(20));
    }
}
