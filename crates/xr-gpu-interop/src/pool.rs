//! Reusable command lists for queues without an immediate context.
//!
//! Each list is either available (reset on the next acquire) or pending on a
//! value of the pool's private fence. A pending list becomes available again
//! only once the fence has completed its value. The lock is held across
//! acquire and submit only, never across a GPU wait.

use std::collections::VecDeque;
use std::mem::ManuallyDrop;
use std::ops::Deref;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};
use xr_interop_core::Result;

/// The native half of a [`CommandListPool`].
pub trait CommandBackend {
    /// A command allocator paired with a command list.
    type List;

    /// Create a new allocator and list, open for recording.
    fn allocate(&self) -> Result<Self::List>;

    /// Reset an idle list so it can record again.
    fn reset(&self, list: &Self::List) -> Result<()>;

    /// Close the list and submit it to the queue.
    fn execute(&self, list: &Self::List) -> Result<()>;

    /// Enqueue a signal of the pool fence.
    fn signal(&self, value: u64) -> Result<()>;

    /// The pool fence's completed value.
    fn completed_value(&self) -> u64;

    /// Block until the pool fence reaches `value`.
    fn wait(&self, value: u64) -> Result<()>;

    /// Close a list that was recorded into but never submitted.
    fn discard(&self, list: &Self::List) -> Result<()>;
}

/// Entry counts, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub available: usize,
    pub pending: usize,
    pub checked_out: usize,
    pub allocated: usize,
}

/// A list handed out by [`CommandListPool::acquire`], ready to record into.
///
/// Give it back with [`CommandListPool::submit`]. Dropping it unsubmitted
/// closes it and returns it to the pool; nothing it recorded reaches the queue.
#[must_use = "an acquired command list must be submitted back to its pool"]
pub struct PooledCommandList<'a, B: CommandBackend> {
    pool: &'a CommandListPool<B>,
    list: ManuallyDrop<B::List>,
}

impl<B: CommandBackend> PooledCommandList<'_, B> {
    fn into_inner(self) -> B::List {
        let mut this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the list is moved out once.
        unsafe { ManuallyDrop::take(&mut this.list) }
    }
}

impl<B: CommandBackend> Deref for PooledCommandList<'_, B> {
    type Target = B::List;

    fn deref(&self) -> &B::List {
        &self.list
    }
}

impl<B: CommandBackend> Drop for PooledCommandList<'_, B> {
    fn drop(&mut self) {
        // SAFETY: drop runs once and `into_inner` skips it.
        let list = unsafe { ManuallyDrop::take(&mut self.list) };
        self.pool.abandon(list);
    }
}

struct PoolState<L> {
    available: VecDeque<L>,
    pending: VecDeque<(L, u64)>,
    fence_value: u64,
    allocated: usize,
    checked_out: usize,
}

impl<L> PoolState<L> {
    /// Move every pending list whose value has completed to `available`.
    fn recycle(&mut self, completed: u64) {
        // Values are assigned in submission order, so pending is sorted.
        while let Some((_, value)) = self.pending.front() {
            if *value > completed {
                break;
            }
            if let Some((list, _)) = self.pending.pop_front() {
                self.available.push_back(list);
            }
        }
    }
}

pub struct CommandListPool<B: CommandBackend> {
    backend: B,
    state: Mutex<PoolState<B::List>>,
}

impl<B: CommandBackend> CommandListPool<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: Mutex::new(PoolState {
                available: VecDeque::new(),
                pending: VecDeque::new(),
                fence_value: 0,
                allocated: 0,
                checked_out: 0,
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Take a list ready for recording, recycling or allocating as needed.
    pub fn acquire(&self) -> Result<PooledCommandList<'_, B>> {
        let mut state = self.state.lock();
        state.recycle(self.backend.completed_value());

        let list = match state.available.pop_front() {
            Some(list) => {
                if let Err(e) = self.backend.reset(&list) {
                    state.available.push_back(list);
                    return Err(e);
                }
                list
            }
            None => {
                let list = self.backend.allocate()?;
                state.allocated += 1;
                debug!("Command list pool grew to {} lists", state.allocated);
                list
            }
        };
        state.checked_out += 1;
        Ok(PooledCommandList {
            pool: self,
            list: ManuallyDrop::new(list),
        })
    }

    /// Submit a recorded list and gate its reuse on a new fence value.
    pub fn submit(&self, list: PooledCommandList<'_, B>) -> Result<()> {
        let list = list.into_inner();
        let mut state = self.state.lock();
        state.checked_out -= 1;

        if let Err(e) = self.backend.execute(&list) {
            // Never reached the queue; the next acquire resets it.
            state.available.push_back(list);
            return Err(e);
        }

        state.fence_value += 1;
        let value = state.fence_value;
        // Keep the list pending even if the signal fails: it is already on the
        // queue, and any later signal covers it.
        state.pending.push_back((list, value));
        trace!(value, "Command list submitted");
        self.backend.signal(value)
    }

    /// Take back a list that was acquired but never submitted.
    fn abandon(&self, list: B::List) {
        if let Err(e) = self.backend.discard(&list) {
            warn!("Failed to close abandoned command list: {e}");
        }
        let mut state = self.state.lock();
        state.checked_out -= 1;
        state.available.push_back(list);
        debug!("Unsubmitted command list returned to the pool");
    }

    /// Block until everything submitted so far has executed, then recycle.
    pub fn flush(&self) -> Result<()> {
        let value = {
            let mut state = self.state.lock();
            if state.pending.is_empty() {
                return Ok(());
            }
            state.fence_value += 1;
            let value = state.fence_value;
            self.backend.signal(value)?;
            value
        };

        self.backend.wait(value)?;

        let mut state = self.state.lock();
        state.recycle(self.backend.completed_value());
        Ok(())
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            available: state.available.len(),
            pending: state.pending.len(),
            checked_out: state.checked_out,
            allocated: state.allocated,
        }
    }
}
