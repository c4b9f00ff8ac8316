//! Quotation manager lifecycle states.

/// Manager operational state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// Created, loop never started.
    Idle,
    /// Reconciliation loop is running.
    Running,
    /// Shutdown requested, waiting for the in-flight iteration.
    Stopping,
    /// Loop has exited.
    Stopped,
}

impl ManagerState {
    /// Check if the reconciliation loop is running.
    pub fn is_running(&self) -> bool {
        matches!(self, ManagerState::Running)
    }

    /// Check if the loop may be started from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, ManagerState::Idle | ManagerState::Stopped)
    }
}
