//! Deferred invocation
//!
//! Callbacks scheduled to run after a number of ticks, or right after an
//! inner [`Sequence`] completes. Pending work dies with the invoker, and work
//! bound to an [`OwnerToken`] is dropped unfired once the token is gone.

use std::sync::{Arc, Weak};

use stagehand_core::Callback;

use crate::Tick;

/// Outcome of advancing a sequence by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStatus {
    /// Needs more ticks
    Pending,
    /// Finished on this tick
    Complete,
}

/// Multi-tick task advanced once per tick until it completes
pub trait Sequence: Send {
    /// Advance by one tick
    fn advance(&mut self) -> SequenceStatus;
}

impl<F> Sequence for F
where
    F: FnMut() -> SequenceStatus + Send,
{
    fn advance(&mut self) -> SequenceStatus {
        self()
    }
}

/// Sequence that completes after a fixed number of ticks
///
/// Zero behaves like one: completion always lands on a later tick, never the
/// tick that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTicks {
    remaining: u32,
}

impl WaitTicks {
    /// Wait `ticks` ticks
    pub fn new(ticks: u32) -> Self {
        Self {
            remaining: ticks.max(1),
        }
    }

    /// Ticks left
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl Sequence for WaitTicks {
    fn advance(&mut self) -> SequenceStatus {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            SequenceStatus::Complete
        } else {
            SequenceStatus::Pending
        }
    }
}

/// Liveness token held by the component that owns scheduled work
#[derive(Debug, Default)]
pub struct OwnerToken {
    alive: Arc<()>,
}

impl OwnerToken {
    /// Create a live token
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer that goes dead when this token drops
    pub fn watch(&self) -> OwnerWatch {
        OwnerWatch(Arc::downgrade(&self.alive))
    }
}

/// Weak view of an [`OwnerToken`]
#[derive(Debug, Clone)]
pub struct OwnerWatch(Weak<()>);

impl OwnerWatch {
    /// Check if the owner still exists
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

/// Identifier of a scheduled callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw ID
    pub fn id(&self) -> u64 {
        self.0
    }
}

enum Trigger {
    Ticks(WaitTicks),
    Sequence(Box<dyn Sequence>),
}

impl Trigger {
    fn advance(&mut self) -> SequenceStatus {
        match self {
            Trigger::Ticks(wait) => wait.advance(),
            Trigger::Sequence(seq) => seq.advance(),
        }
    }
}

struct DeferredTask {
    id: TaskId,
    trigger: Trigger,
    callback: Callback,
    owner: Option<OwnerWatch>,
}

/// Scheduler for callbacks that fire on a later tick
#[derive(Default)]
pub struct DeferredInvoker {
    tasks: Vec<DeferredTask>,
    next_id: u64,
}

impl DeferredInvoker {
    /// Create an empty invoker
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` once `ticks` ticks have elapsed
    ///
    /// `after(0, ..)` and `after(1, ..)` both fire on the next tick.
    pub fn after<F>(&mut self, ticks: u32, callback: F) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule(Trigger::Ticks(WaitTicks::new(ticks)), Box::new(callback), None)
    }

    /// Run `callback` right after `sequence` completes
    pub fn after_sequence<S, F>(&mut self, sequence: S, callback: F) -> TaskId
    where
        S: Sequence + 'static,
        F: FnOnce() + Send + 'static,
    {
        self.schedule(
            Trigger::Sequence(Box::new(sequence)),
            Box::new(callback),
            None,
        )
    }

    /// Like [`after`](Self::after), suppressed if `owner` is dropped first
    pub fn after_owned<F>(&mut self, owner: &OwnerToken, ticks: u32, callback: F) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule(
            Trigger::Ticks(WaitTicks::new(ticks)),
            Box::new(callback),
            Some(owner.watch()),
        )
    }

    /// Like [`after_sequence`](Self::after_sequence), suppressed if `owner` is dropped first
    pub fn after_sequence_owned<S, F>(&mut self, owner: &OwnerToken, sequence: S, callback: F) -> TaskId
    where
        S: Sequence + 'static,
        F: FnOnce() + Send + 'static,
    {
        self.schedule(
            Trigger::Sequence(Box::new(sequence)),
            Box::new(callback),
            Some(owner.watch()),
        )
    }

    fn schedule(&mut self, trigger: Trigger, callback: Callback, owner: Option<OwnerWatch>) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.tasks.push(DeferredTask {
            id,
            trigger,
            callback,
            owner,
        });
        id
    }

    /// Drop a pending callback unfired
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            log::debug!("Deferred task {} cancelled", id.0);
        }
        removed
    }

    /// Drop every pending callback unfired
    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    /// Check if a callback is still waiting
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    /// Number of waiting callbacks
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Advance every task once, firing callbacks in scheduling order.
    /// Returns the number fired.
    pub fn advance(&mut self) -> usize {
        let mut fired = 0;
        let tasks = std::mem::take(&mut self.tasks);

        for mut task in tasks {
            if task.owner.as_ref().is_some_and(|owner| !owner.is_alive()) {
                log::debug!("Deferred task {} dropped, owner destroyed", task.id.0);
                continue;
            }
            match task.trigger.advance() {
                SequenceStatus::Complete => {
                    (task.callback)();
                    fired += 1;
                }
                SequenceStatus::Pending => self.tasks.push(task),
            }
        }

        fired
    }
}

impl Tick for DeferredInvoker {
    fn tick(&mut self) {
        self.advance();
    }
}

impl std::fmt::Debug for DeferredInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredInvoker")
            .field("pending", &self.tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn flag() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        (hits, move || {
            h.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_after_zero_fires_next_tick() {
        let (hits, cb) = flag();
        let mut invoker = DeferredInvoker::new();
        invoker.after(0, cb);

        // Scheduling alone never fires
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        invoker.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(invoker.pending(), 0);
    }

    #[test]
    fn test_after_n_ticks() {
        let (hits, cb) = flag();
        let mut invoker = DeferredInvoker::new();
        invoker.after(3, cb);

        invoker.tick();
        invoker.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        invoker.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        invoker.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_after_sequence() {
        let (hits, cb) = flag();
        let mut invoker = DeferredInvoker::new();

        let mut steps = 0;
        invoker.after_sequence(
            move || {
                steps += 1;
                if steps == 5 {
                    SequenceStatus::Complete
                } else {
                    SequenceStatus::Pending
                }
            },
            cb,
        );

        for _ in 0..4 {
            invoker.tick();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        invoker.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(invoker.pending(), 0);
    }

    #[test]
    fn test_owner_drop_suppresses() {
        let (hits, cb) = flag();
        let mut invoker = DeferredInvoker::new();
        let owner = OwnerToken::new();
        invoker.after_owned(&owner, 0, cb);

        drop(owner);
        invoker.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(invoker.pending(), 0);
    }

    #[test]
    fn test_owner_drop_mid_sequence_suppresses() {
        let (hits, cb) = flag();
        let (kept_hits, kept_cb) = flag();
        let mut invoker = DeferredInvoker::new();
        let owner = OwnerToken::new();
        invoker.after_sequence_owned(&owner, WaitTicks::new(3), cb);
        let kept = OwnerToken::new();
        invoker.after_sequence_owned(&kept, WaitTicks::new(3), kept_cb);

        invoker.tick();
        assert_eq!(invoker.pending(), 2);

        drop(owner);
        invoker.tick();
        invoker.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(kept_hits.load(Ordering::SeqCst), 1);
        assert_eq!(invoker.pending(), 0);
    }

    #[test]
    fn test_dropping_invoker_suppresses() {
        let (hits, cb) = flag();
        let mut invoker = DeferredInvoker::new();
        invoker.after(0, cb);
        drop(invoker);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel() {
        let (hits, cb) = flag();
        let mut invoker = DeferredInvoker::new();
        let id = invoker.after(1, cb);
        assert!(invoker.is_pending(id));

        assert!(invoker.cancel(id));
        assert!(!invoker.cancel(id));
        invoker.tick();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fires_in_schedule_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut invoker = DeferredInvoker::new();
        for n in 0..3 {
            let order = order.clone();
            invoker.after(1, move || order.lock().unwrap().push(n));
        }

        assert_eq!(invoker.advance(), 3);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_wait_ticks() {
        let mut wait = WaitTicks::new(2);
        assert_eq!(wait.advance(), SequenceStatus::Pending);
        assert_eq!(wait.advance(), SequenceStatus::Complete);
        assert_eq!(WaitTicks::new(0).remaining(), 1);
    }
}
