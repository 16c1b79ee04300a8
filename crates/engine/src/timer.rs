use std::sync::Arc;

use log::warn;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::controller::ControllerInner;
use crate::session::{Step, Tick};

/// Owns a spawned countdown task.
///
/// Dropping the handle aborts the task. A task that replaces its own handle
/// survives the abort because it has no await point left before returning;
/// any tick that slips through anyway is caught by the generation check.
#[derive(Debug)]
pub(crate) struct TimerHandle {
    handle: JoinHandle<()>,
}

impl TimerHandle {
    fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// What the countdown loop should do after a tick was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickFlow {
    /// Keep ticking the same question.
    Continue,
    /// Another question took over with its own countdown task.
    NextStarted,
    /// The session left this countdown behind.
    Stop,
}

/// Spawn the countdown task for one question.
///
/// The task sleeps for one tick interval, applies the tick under the session
/// lock, and repeats until the question is over or the tick turns out to be
/// stale. When the expiry starts the next question, the task spawns the next
/// countdown itself before exiting.
pub(crate) fn spawn_countdown(inner: Arc<ControllerInner>, generation: u64) -> TimerHandle {
    let interval = inner.tick_interval();
    let handle = tokio::spawn(async move {
        loop {
            sleep(interval).await;
            match run_tick(&inner, generation) {
                TickFlow::Continue => {}
                TickFlow::NextStarted | TickFlow::Stop => break,
            }
        }
    });
    TimerHandle::new(handle)
}

fn run_tick(inner: &Arc<ControllerInner>, generation: u64) -> TickFlow {
    let Ok(mut session) = inner.lock_session() else {
        return TickFlow::Stop;
    };

    match session.apply_tick(generation, inner.now()) {
        Ok(Tick::Stale) => TickFlow::Stop,
        Ok(Tick::Counted { .. }) => {
            inner.publish(&session);
            TickFlow::Continue
        }
        Ok(Tick::Expired(Step::Next { generation: next })) => {
            // Installing the next countdown replaces this task's own handle;
            // see `TimerHandle` for why that is safe.
            let handle = spawn_countdown(Arc::clone(inner), next);
            let installed = inner.install_timer(handle).is_ok();
            inner.publish(&session);
            if installed {
                TickFlow::NextStarted
            } else {
                TickFlow::Stop
            }
        }
        Ok(Tick::Expired(Step::Finished)) => {
            // This task's finished handle stays in the slot; it is inert.
            inner.publish(&session);
            TickFlow::Stop
        }
        Err(error) => {
            warn!("countdown tick was not applied: {error}");
            TickFlow::Stop
        }
    }
}
