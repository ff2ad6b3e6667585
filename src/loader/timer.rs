use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// One-shot, restartable countdown that flips the loading indicator.
///
/// The action runs under the timer lock and only if no `debounce` or
/// `stop` happened since it was armed, so once `stop` returns the action
/// can no longer fire.
pub struct LoadingTimer {
    delay: Duration,
    state: Arc<Mutex<TimerState>>,
}

#[derive(Default)]
struct TimerState {
    epoch: u64,
    handle: Option<JoinHandle<()>>,
}

impl LoadingTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: Arc::new(Mutex::new(TimerState::default())),
        }
    }

    /// (Re)starts the countdown. Must be called inside a tokio runtime.
    pub fn debounce<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.state.lock();
        state.epoch = state.epoch.wrapping_add(1);
        if let Some(handle) = state.handle.take() {
            handle.abort();
        }

        let epoch = state.epoch;
        let delay = self.delay;
        let shared = Arc::clone(&self.state);
        state.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = shared.lock();
            if state.epoch == epoch {
                state.handle = None;
                action();
            }
        }));
    }

    pub fn stop(&self) {
        let mut state = self.state.lock();
        state.epoch = state.epoch.wrapping_add(1);
        if let Some(handle) = state.handle.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state.lock().handle.is_some()
    }
}

impl Drop for LoadingTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
