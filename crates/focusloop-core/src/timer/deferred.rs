//! Cancellable delayed actions owned by the engine.

/// One pending delayed action slot.
///
/// Scheduling replaces whatever was pending; a cancelled slot never fires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeferredAction {
    due_ms: Option<u64>,
}

impl DeferredAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot for `due_ms`.
    pub fn schedule(&mut self, due_ms: u64) {
        self.due_ms = Some(due_ms);
    }

    /// Returns true if something was pending.
    pub fn cancel(&mut self) -> bool {
        self.due_ms.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.due_ms.is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.due_ms
    }

    /// Consume the action if its deadline has passed.
    pub fn fire_if_due(&mut self, now_ms: u64) -> bool {
        match self.due_ms {
            Some(due) if now_ms >= due => {
                self.due_ms = None;
                true
            }
            _ => false,
        }
    }
}
