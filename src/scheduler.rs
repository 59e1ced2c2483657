/// Single-slot timer for the next simulation step.
///
/// At most one deadline is pending. Each schedule or cancel bumps the
/// generation, so a deadline handed out earlier can never fire after the
/// slot was cleared or replaced.
#[derive(Debug, Clone, Default)]
pub struct StepTimer {
    pending: Option<PendingStep>,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingStep {
    pub due_ms: u64,
    pub generation: u64,
}

impl StepTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending step with one due at `now_ms + delay_ms`
    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64) -> PendingStep {
        self.generation += 1;
        let step = PendingStep {
            due_ms: now_ms + delay_ms,
            generation: self.generation,
        };
        self.pending = Some(step);
        step
    }

    /// Drop the pending step, if any. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.generation += 1;
        self.pending.take().is_some()
    }

    pub fn pending(&self) -> Option<PendingStep> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending step if it is due at `now_ms`
    pub fn take_due(&mut self, now_ms: u64) -> Option<PendingStep> {
        match self.pending {
            Some(step) if step.due_ms <= now_ms && step.generation == self.generation => {
                self.pending = None;
                Some(step)
            }
            _ => None,
        }
    }
}
