//! Re-initialization loop for single-page navigation.
//!
//! The host never fires a usable "diff view appeared" event, so the toggler
//! is re-probed on a fixed period. `PollLoop` is the timer-free half: one
//! `tick()` runs the task once. The browser drives ticks through
//! `web::IntervalHandle`; tests call `tick()` directly.

/// Whether the loop still runs its task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Active,
    Cancelled,
}

pub struct PollLoop<F> {
    task: F,
    state: PollState,
    ticks: u64,
    successes: u64,
}

impl<F: FnMut() -> bool> PollLoop<F> {
    pub fn new(task: F) -> Self {
        Self {
            task,
            state: PollState::Active,
            ticks: 0,
            successes: 0,
        }
    }

    /// Run the task once. `None` once cancelled.
    pub fn tick(&mut self) -> Option<bool> {
        if self.state == PollState::Cancelled {
            return None;
        }

        self.ticks += 1;
        let ran = (self.task)();
        if ran {
            self.successes += 1;
            tracing::debug!("PollLoop: tick {} initialized the page", self.ticks);
        }
        Some(ran)
    }

    /// Stop for good; later ticks are no-ops.
    pub fn cancel(&mut self) {
        if self.state == PollState::Active {
            tracing::debug!("PollLoop: cancelled after {} ticks", self.ticks);
        }
        self.state = PollState::Cancelled;
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == PollState::Cancelled
    }

    /// Ticks that ran the task.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks whose task returned true.
    pub fn successes(&self) -> u64 {
        self.successes
    }
}
