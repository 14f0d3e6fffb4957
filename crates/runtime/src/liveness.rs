use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Owner side of a liveness scope.
///
/// Async work captures a [`LivenessToken`] and checks it before touching
/// state owned by the scope. Dropping the scope or calling [`Liveness::kill`]
/// turns every outstanding token dead; there is no way back.
#[derive(Debug)]
pub struct Liveness {
    alive: Arc<AtomicBool>,
}

/// Cheap, cloneable view of a [`Liveness`] scope.
#[derive(Debug, Clone)]
pub struct LivenessToken {
    alive: Arc<AtomicBool>,
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn token(&self) -> LivenessToken {
        LivenessToken {
            alive: Arc::clone(&self.alive),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn kill(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Liveness {
    fn drop(&mut self) {
        self.kill();
    }
}

impl LivenessToken {
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Runs `f` only while the scope is alive.
    pub fn run_if_alive<T>(&self, f: impl FnOnce() -> T) -> Option<T> {
        if self.is_alive() {
            Some(f())
        } else {
            None
        }
    }
}
