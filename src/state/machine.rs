use super::error::{StateError, StateResult};
use super::{SessionEvent, SessionState, StateTransition};

#[derive(Debug)]
pub struct StateMachine {
    state: SessionState,
    transition_history: Vec<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn can_transition(&self, event: SessionEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent::*;
        match (self.state, event) {
            // A new image supersedes whatever was loaded or in flight.
            (_, ImageLoaded) => Some(SessionState::Ready),
            (SessionState::Ready | SessionState::Processed, RemovalStarted) => {
                Some(SessionState::Processing)
            }
            (SessionState::Processing, RemovalFinished) => Some(SessionState::Processed),
            // A failed re-run keeps the earlier result on screen.
            (SessionState::Processing, RemovalFailed) => Some(self.state_before_removal()),
            _ => None,
        }
    }

    fn state_before_removal(&self) -> SessionState {
        self.transition_history
            .iter()
            .rev()
            .find(|record| record.event == SessionEvent::RemovalStarted)
            .map_or(SessionState::Ready, |record| record.from)
    }

    pub fn transition(&mut self, event: SessionEvent) -> StateResult<SessionState> {
        tracing::debug!(from = ?self.state, event = ?event, "request state transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid state transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        let record = StateTransition::new(self.state, event, next);
        self.state = next;
        self.transition_history.push(record);

        Ok(self.state)
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionState::{:?}", self.state)
    }
}
