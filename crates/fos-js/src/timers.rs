//! Timer APIs
//!
//! setTimeout / clearTimeout over a virtual clock. Time only moves when the
//! host calls `advance`, so debounced work runs at deterministic instants.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Timer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u32);

impl TimerId {
    pub fn get(self) -> u32 {
        self.0
    }
}

type TimerCallback = Box<dyn FnOnce()>;

/// Timer entry
struct Timer {
    id: TimerId,
    due_at: u64,
    /// Insertion order breaks ties between timers due at the same instant
    order: u64,
    callback: TimerCallback,
}

#[derive(Default)]
struct TimerQueue {
    now_ms: u64,
    timers: Vec<Timer>,
    next_id: u32,
    next_order: u64,
}

impl TimerQueue {
    /// Remove and return the earliest timer due at or before `limit`
    fn pop_due(&mut self, limit: u64) -> Option<Timer> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_at <= limit)
            .min_by_key(|(_, t)| (t.due_at, t.order))
            .map(|(i, _)| i)?;
        Some(self.timers.swap_remove(index))
    }
}

/// Timer manager
///
/// Cloning shares the same queue.
#[derive(Clone, Default)]
pub struct TimerManager {
    queue: Rc<RefCell<TimerQueue>>,
}

impl fmt::Debug for TimerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.queue.borrow();
        f.debug_struct("TimerManager")
            .field("now_ms", &queue.now_ms)
            .field("pending", &queue.timers.len())
            .finish()
    }
}

impl TimerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.queue.borrow().now_ms
    }

    /// Add a timeout
    pub fn set_timeout(&self, delay: Duration, callback: impl FnOnce() + 'static) -> TimerId {
        let mut queue = self.queue.borrow_mut();
        queue.next_id += 1;
        queue.next_order += 1;
        let id = TimerId(queue.next_id);
        let due_at = queue.now_ms.saturating_add(delay.as_millis() as u64);
        let order = queue.next_order;
        queue.timers.push(Timer {
            id,
            due_at,
            order,
            callback: Box::new(callback),
        });
        id
    }

    /// Clear a timer; returns false if it already ran or was cleared
    pub fn clear(&self, id: TimerId) -> bool {
        let mut queue = self.queue.borrow_mut();
        let before = queue.timers.len();
        queue.timers.retain(|t| t.id != id);
        queue.timers.len() != before
    }

    /// Check if there are pending timers
    pub fn has_pending(&self) -> bool {
        !self.queue.borrow().timers.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.borrow().timers.len()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue.borrow().timers.iter().any(|t| t.id == id)
    }

    /// Get time until next timer fires
    pub fn time_until_next(&self) -> Option<Duration> {
        let queue = self.queue.borrow();
        queue
            .timers
            .iter()
            .map(|t| t.due_at.saturating_sub(queue.now_ms))
            .min()
            .map(Duration::from_millis)
    }

    /// Move the clock forward, running every timer that falls due
    ///
    /// Returns the number of callbacks run. Timers armed by callbacks run in
    /// the same call if they fall due within the window.
    pub fn advance(&self, delta: Duration) -> usize {
        let target = self.now_ms().saturating_add(delta.as_millis() as u64);
        self.advance_to(target)
    }

    /// Move the clock to an absolute time (never backwards)
    pub fn advance_to(&self, target_ms: u64) -> usize {
        let mut ran = 0;
        loop {
            let timer = {
                let mut queue = self.queue.borrow_mut();
                match queue.pop_due(target_ms) {
                    Some(timer) => {
                        queue.now_ms = queue.now_ms.max(timer.due_at);
                        timer
                    }
                    None => {
                        queue.now_ms = queue.now_ms.max(target_ms);
                        break;
                    }
                }
            };
            tracing::trace!("Running timer {:?} at {}ms", timer.id, timer.due_at);
            (timer.callback)();
            ran += 1;
        }
        ran
    }

    /// Run timers until none remain, up to `max_steps` callbacks
    pub fn run_until_idle(&self, max_steps: usize) -> usize {
        let mut ran = 0;
        while ran < max_steps {
            let Some(next) = self.queue.borrow().timers.iter().map(|t| t.due_at).min() else {
                break;
            };
            let timer = {
                let mut queue = self.queue.borrow_mut();
                match queue.pop_due(next) {
                    Some(timer) => {
                        queue.now_ms = queue.now_ms.max(timer.due_at);
                        timer
                    }
                    None => break,
                }
            };
            (timer.callback)();
            ran += 1;
        }
        if ran == max_steps && self.has_pending() {
            tracing::warn!("Timer queue still busy after {} steps", max_steps);
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_timeout_fires_when_due() {
        let timers = TimerManager::new();
        let fired = Rc::new(RefCell::new(false));
        let f = Rc::clone(&fired);
        timers.set_timeout(ms(100), move || *f.borrow_mut() = true);

        assert_eq!(timers.advance(ms(99)), 0);
        assert!(!*fired.borrow());
        assert_eq!(timers.advance(ms(1)), 1);
        assert!(*fired.borrow());
        assert_eq!(timers.now_ms(), 100);
    }

    #[test]
    fn test_clear_cancels() {
        let timers = TimerManager::new();
        let id = timers.set_timeout(ms(10), || panic!("cleared timer ran"));
        assert!(timers.clear(id));
        assert!(!timers.clear(id));
        assert_eq!(timers.advance(ms(50)), 0);
    }

    #[test]
    fn test_order_and_clock_inside_callbacks() {
        let timers = TimerManager::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (delay, label) in [(30, "c"), (10, "a"), (10, "b")] {
            let log = Rc::clone(&log);
            let clock = timers.clone();
            timers.set_timeout(ms(delay), move || log.borrow_mut().push((label, clock.now_ms())));
        }
        timers.advance(ms(100));

        assert_eq!(*log.borrow(), vec![("a", 10), ("b", 10), ("c", 30)]);
        assert_eq!(timers.now_ms(), 100);
    }

    #[test]
    fn test_nested_timer_in_window() {
        let timers = TimerManager::new();
        let count = Rc::new(RefCell::new(0));
        let inner_timers = timers.clone();
        let c = Rc::clone(&count);
        timers.set_timeout(ms(10), move || {
            let c = Rc::clone(&c);
            inner_timers.set_timeout(ms(10), move || *c.borrow_mut() += 1);
        });

        assert_eq!(timers.advance(ms(25)), 2);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_time_until_next() {
        let timers = TimerManager::new();
        assert_eq!(timers.time_until_next(), None);
        timers.set_timeout(ms(250), || {});
        timers.advance(ms(100));
        assert_eq!(timers.time_until_next(), Some(ms(150)));
        assert_eq!(timers.run_until_idle(10), 1);
        assert_eq!(timers.now_ms(), 250);
    }
}
