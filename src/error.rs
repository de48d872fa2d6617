//! Structured error taxonomy for the approval workflow
//!
//! Every failure carries an explicit kind; callers branch on variants, never
//! on message text.
use super::lifecycle::{RequestEvent, RequestStatus};
use super::roles::Role;

/// A state change that violates the lifecycle guards. Advisory when checked
/// client-side, authoritative when raised by the service layer.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum TransitionError {
    #[error("request is {status} which is terminal")]
    Terminal { status: RequestStatus },
    #[error("{event:?} does not apply to a request in {from}")]
    NotApplicable {
        from: RequestStatus,
        event: RequestEvent,
    },
    #[error("{role} takes no turn in the approval workflow")]
    NotAWorkflowRole { role: Role },
    #[error("{role} has already recorded a decision on this request")]
    AlreadyDecided { role: Role },
    #[error("it is {expected}'s turn to decide, not {role}'s")]
    OutOfTurn { role: Role, expected: Role },
    #[error("the approval chain is already complete")]
    WorkflowExhausted,
    #[error("{role} may not fund requests")]
    RoleNotPermitted { role: Role },
}

/// Malformed input to an action, reported before anything is persisted.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum ValidationError {
    #[error("request title is missing")]
    MissingTitle,
    #[error("request description is missing")]
    MissingDescription,
    #[error("resource type is not set")]
    MissingResourceType,
    #[error("quantity must be at least one")]
    ZeroQuantity,
    #[error("estimated cost must be greater than zero")]
    ZeroEstimatedCost,
    #[error("priority is not set")]
    MissingPriority,
    #[error("department is not set")]
    MissingDepartment,
    #[error("funding requires a payment reference")]
    MissingPaymentReference,
}

/// Failures raised by the service layer while arbitrating an action.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum ServiceError {
    #[error("user {user_id} is not authorized to {action} this request")]
    NotAuthorized { user_id: String, action: &'static str },
    /// The caller acted on a stale copy of the request: another decision
    /// landed first or the chain moved past their role. Clients surface this
    /// as "updated elsewhere, refresh".
    #[error("request {request_id} was updated elsewhere; refresh and retry")]
    ApprovalConflict { request_id: String },
    #[error("no request found under id {request_id}")]
    RequestNotFound { request_id: String },
}
