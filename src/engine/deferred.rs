// src/engine/deferred.rs
//
// One-shot completion channel between a worker and the submitting caller.
//
// The worker holds a `Completer`, the caller a `Deferred`. `Completer::complete`
// consumes the completer, so a task can resolve its handle at most once. A
// completer dropped without completing (a worker that unwound past it) fails
// the handle with `InternalPanic` instead of leaving the caller waiting.
//
// The handle can be observed by blocking (`wait`, `wait_timeout`), by polling
// (`try_take`), or by awaiting it as a `Future` on any executor.

use crate::error::{CimgresError, Result};
use parking_lot::{Condvar, Mutex};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

/// Lifecycle of an asynchronous request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Submitted, waiting for a worker
    Queued,
    /// A worker is executing the transform
    Running,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

struct Slot {
    state: TaskState,
    result: Option<Result<Vec<u8>>>,
    /// Set once the result has been handed to the caller
    taken: bool,
    waker: Option<Waker>,
}

struct Shared {
    slot: Mutex<Slot>,
    ready: Condvar,
}

/// Create a connected completer/handle pair in the `Queued` state.
pub fn channel() -> (Completer, Deferred) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot {
            state: TaskState::Queued,
            result: None,
            taken: false,
            waker: None,
        }),
        ready: Condvar::new(),
    });
    (
        Completer {
            shared: Arc::clone(&shared),
            resolved: false,
        },
        Deferred { shared },
    )
}

/// Worker side of the channel.
pub struct Completer {
    shared: Arc<Shared>,
    resolved: bool,
}

impl Completer {
    /// Mark the task as picked up by a worker.
    pub fn start(&self) {
        let mut slot = self.shared.slot.lock();
        if slot.state == TaskState::Queued {
            slot.state = TaskState::Running;
        }
    }

    /// Deliver the outcome. The output buffer moves into the slot; the
    /// worker keeps no reference to it.
    pub fn complete(mut self, result: Result<Vec<u8>>) {
        self.resolve(result);
    }

    fn resolve(&mut self, result: Result<Vec<u8>>) {
        let waker = {
            let mut slot = self.shared.slot.lock();
            slot.state = if result.is_ok() {
                TaskState::Completed
            } else {
                TaskState::Failed
            };
            slot.result = Some(result);
            slot.waker.take()
        };
        self.resolved = true;
        self.shared.ready.notify_all();
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

impl Drop for Completer {
    fn drop(&mut self) {
        if !self.resolved {
            self.resolve(Err(CimgresError::internal_panic(
                "worker exited without completing the task",
            )));
        }
    }
}

/// Caller side of the channel: resolves exactly once with the output bytes or
/// the error that failed the task.
pub struct Deferred {
    shared: Arc<Shared>,
}

impl Deferred {
    pub fn state(&self) -> TaskState {
        self.shared.slot.lock().state
    }

    /// Block until the task finishes.
    ///
    /// Do not call this from a job running on the pool that will complete
    /// the handle: the waiting job holds a worker, and with a single-thread
    /// pool the task it waits for never gets to run. Use `try_take` or
    /// `wait_timeout` there instead.
    pub fn wait(self) -> Result<Vec<u8>> {
        let mut slot = self.shared.slot.lock();
        while !slot.state.is_terminal() {
            self.shared.ready.wait(&mut slot);
        }
        take_result(&mut slot)
    }

    /// Block for at most `timeout`. Gives the handle back if the task is
    /// still pending; the task itself keeps running.
    pub fn wait_timeout(self, timeout: Duration) -> std::result::Result<Result<Vec<u8>>, Self> {
        let deadline = Instant::now() + timeout;
        {
            let mut slot = self.shared.slot.lock();
            while !slot.state.is_terminal() {
                if self.shared.ready.wait_until(&mut slot, deadline).timed_out() {
                    break;
                }
            }
            if slot.state.is_terminal() {
                return Ok(take_result(&mut slot));
            }
        }
        Err(self)
    }

    /// Take the outcome if the task already finished, without blocking.
    pub fn try_take(self) -> std::result::Result<Result<Vec<u8>>, Self> {
        {
            let mut slot = self.shared.slot.lock();
            if slot.state.is_terminal() {
                return Ok(take_result(&mut slot));
            }
        }
        Err(self)
    }
}

fn take_result(slot: &mut Slot) -> Result<Vec<u8>> {
    slot.taken = true;
    slot.result.take().unwrap_or_else(|| {
        Err(CimgresError::internal_panic(
            "task result was already taken",
        ))
    })
}

impl Future for Deferred {
    type Output = Result<Vec<u8>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.shared.slot.lock();
        if slot.state.is_terminal() {
            return Poll::Ready(take_result(&mut slot));
        }
        match &slot.waker {
            Some(waker) if waker.will_wake(cx.waker()) => {}
            _ => slot.waker = Some(cx.waker().clone()),
        }
        Poll::Pending
    }
}

impl std::fmt::Debug for Deferred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.shared.slot.lock();
        f.debug_struct("Deferred")
            .field("state", &slot.state)
            .field("taken", &slot.taken)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Wake;
    use std::thread;

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_state_transitions() {
        let (completer, deferred) = channel();
        assert_eq!(deferred.state(), TaskState::Queued);
        completer.start();
        assert_eq!(deferred.state(), TaskState::Running);
        completer.complete(Ok(vec![1, 2, 3]));
        assert_eq!(deferred.state(), TaskState::Completed);
        assert_eq!(deferred.wait().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_failure_is_delivered() {
        let (completer, deferred) = channel();
        completer.complete(Err(CimgresError::decode_failed("truncated")));
        assert_eq!(deferred.state(), TaskState::Failed);
        assert!(matches!(
            deferred.wait(),
            Err(CimgresError::DecodeFailed { .. })
        ));
    }

    #[test]
    fn test_dropped_completer_fails_handle() {
        let (completer, deferred) = channel();
        drop(completer);
        assert_eq!(deferred.state(), TaskState::Failed);
        assert!(matches!(
            deferred.wait(),
            Err(CimgresError::InternalPanic { .. })
        ));
    }

    #[test]
    fn test_wait_across_threads() {
        let (completer, deferred) = channel();
        let worker = thread::spawn(move || {
            completer.start();
            thread::sleep(Duration::from_millis(20));
            completer.complete(Ok(vec![7; 16]));
        });
        assert_eq!(deferred.wait().unwrap(), vec![7; 16]);
        worker.join().unwrap();
    }

    #[test]
    fn test_try_take_and_timeout_return_pending_handle() {
        let (completer, deferred) = channel();
        let deferred = deferred.try_take().unwrap_err();
        let deferred = deferred
            .wait_timeout(Duration::from_millis(10))
            .unwrap_err();
        completer.complete(Ok(vec![9]));
        let result = deferred.wait_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result.unwrap(), vec![9]);
    }

    #[test]
    fn test_future_wakes_on_completion() {
        let (completer, mut deferred) = channel();
        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker = Waker::from(Arc::clone(&counter));
        let mut cx = Context::from_waker(&waker);

        assert!(Pin::new(&mut deferred).poll(&mut cx).is_pending());
        completer.complete(Ok(vec![4, 2]));
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        match Pin::new(&mut deferred).poll(&mut cx) {
            Poll::Ready(result) => assert_eq!(result.unwrap(), vec![4, 2]),
            Poll::Pending => panic!("handle should be ready"),
        }
        // A second poll reports an error rather than blocking forever
        assert!(matches!(
            Pin::new(&mut deferred).poll(&mut cx),
            Poll::Ready(Err(CimgresError::InternalPanic { .. }))
        ));
    }
}
