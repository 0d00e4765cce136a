/// Raised when an entity's current state does not allow the requested move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} {entity} {id} while it is {from}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub id: String,
    pub from: &'static str,
    pub action: &'static str,
}
