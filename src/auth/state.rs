/// Phases of one interactive device flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    RequestingCode,
    AwaitingUser,
    Polling,
    Succeeded,
    Failed,
}

impl FlowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    fn allows(self, next: FlowState) -> bool {
        use FlowState::*;
        matches!(
            (self, next),
            (RequestingCode, AwaitingUser)
                | (RequestingCode, Failed)
                | (AwaitingUser, Polling)
                | (AwaitingUser, Failed)
                | (Polling, Succeeded)
                | (Polling, Failed)
        )
    }
}

/// Tracks a flow's state and latches once it settles.
///
/// After a terminal state is reached every further transition is refused,
/// so an outcome that arrives late (an in-flight poll finishing after the
/// flow already resolved) is discarded instead of settling the flow twice.
#[derive(Debug)]
pub struct FlowTracker {
    client_id: String,
    state: FlowState,
}

impl FlowTracker {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            state: FlowState::RequestingCode,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn is_settled(&self) -> bool {
        self.state.is_terminal()
    }

    /// Move to `next`. Returns `false` and leaves the state alone when the
    /// transition is not allowed.
    pub fn advance(&mut self, next: FlowState) -> bool {
        if !self.state.allows(next) {
            tracing::debug!(
                client_id = %self.client_id,
                from = ?self.state,
                to = ?next,
                "Ignoring device flow transition"
            );
            return false;
        }
        tracing::debug!(client_id = %self.client_id, from = ?self.state, to = ?next, "Device flow transition");
        self.state = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        let mut flow = FlowTracker::new("client");
        assert!(flow.advance(FlowState::AwaitingUser));
        assert!(flow.advance(FlowState::Polling));
        assert!(flow.advance(FlowState::Succeeded));
        assert!(flow.is_settled());
    }

    #[test]
    fn code_failure_skips_polling() {
        let mut flow = FlowTracker::new("client");
        assert!(flow.advance(FlowState::Failed));
        assert!(!flow.advance(FlowState::Polling));
        assert_eq!(flow.state(), FlowState::Failed);
    }

    #[test]
    fn settled_flow_discards_late_outcomes() {
        let mut flow = FlowTracker::new("client");
        flow.advance(FlowState::AwaitingUser);
        flow.advance(FlowState::Polling);
        assert!(flow.advance(FlowState::Succeeded));
        assert!(!flow.advance(FlowState::Failed));
        assert!(!flow.advance(FlowState::Succeeded));
        assert_eq!(flow.state(), FlowState::Succeeded);
    }

    #[test]
    fn cannot_poll_before_prompting() {
        let mut flow = FlowTracker::new("client");
        assert!(!flow.advance(FlowState::Polling));
        assert!(!flow.advance(FlowState::Succeeded));
        assert_eq!(flow.state(), FlowState::RequestingCode);
    }
}
