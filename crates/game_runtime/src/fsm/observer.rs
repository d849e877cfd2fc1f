//! Read-only view of an FSM

use super::state::StateType;

/// Read-only FSM capability handed to external callers
pub trait FsmObserver {
    /// FSM name
    fn name(&self) -> &str;

    /// Fully qualified owner type name
    fn owner_type_name(&self) -> &'static str;

    /// Number of registered states
    fn state_count(&self) -> usize;

    /// Whether a state is current
    fn is_running(&self) -> bool;

    /// Whether the FSM has been cleared (or was never created)
    fn is_destroyed(&self) -> bool;

    /// Type of the current state
    fn current_state_type(&self) -> Option<StateType>;

    /// Fully qualified name of the current state type
    fn current_state_name(&self) -> Option<&'static str> {
        self.current_state_type().map(|t| t.name())
    }

    /// Seconds of logic time spent in the current state
    fn current_state_time(&self) -> f32;
}
