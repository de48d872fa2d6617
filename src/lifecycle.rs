//! Request lifecycle state machine
//!
//! Status is never stored; it is derived by replaying a request's action log
//! through [`advance`]. The same function doubles as pre-flight validation
//! for callers about to issue an action.
use std::fmt;

use super::error::TransitionError;
use super::roles::{APPROVAL_WORKFLOW, Role};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RequestStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Funded,
    Fulfilled,
    Cancelled,
}

impl RequestStatus {
    /// Terminal statuses admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Fulfilled | Self::Cancelled)
    }

    /// Statuses in which the approval chain is still collecting decisions.
    pub fn is_awaiting_decision(&self) -> bool {
        matches!(self, Self::Submitted | Self::UnderReview)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RequestStatus::Draft => "Draft",
            RequestStatus::Submitted => "Submitted",
            RequestStatus::UnderReview => "Under Review",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
            RequestStatus::Funded => "Funded",
            RequestStatus::Fulfilled => "Fulfilled",
            RequestStatus::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

/// A state-changing action, carrying the acting role where the guards need it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RequestEvent {
    Submit,
    Approve(Role),
    Reject(Role),
    Fund(Role),
    Fulfil,
    Cancel,
}

/// The next role expected to decide: the first canonical role without a
/// recorded approval. Membership rather than positional indexing, so a
/// damaged log cannot authorize the wrong role or index past the end.
pub fn next_in_workflow(approved: &[Role]) -> Option<Role> {
    APPROVAL_WORKFLOW
        .iter()
        .find(|role| !approved.contains(role))
        .cloned()
}

/// Validate one transition. `approved` is the ordered set of roles whose
/// approvals were applied before this event. Returns the status the request
/// would move to; performs no mutation.
pub fn advance(
    current: RequestStatus,
    event: &RequestEvent,
    approved: &[Role],
) -> Result<RequestStatus, TransitionError> {
    if current.is_terminal() {
        return Err(TransitionError::Terminal { status: current });
    }

    match event {
        RequestEvent::Submit => match current {
            RequestStatus::Draft => Ok(RequestStatus::Submitted),
            _ => Err(not_applicable(current, event)),
        },
        RequestEvent::Approve(role) => {
            check_turn(&current, event, role, approved)?;
            let chain_complete = APPROVAL_WORKFLOW
                .iter()
                .all(|r| r == role || approved.contains(r));
            if chain_complete {
                Ok(RequestStatus::Approved)
            } else {
                Ok(RequestStatus::UnderReview)
            }
        }
        RequestEvent::Reject(role) => {
            check_turn(&current, event, role, approved)?;
            Ok(RequestStatus::Rejected)
        }
        RequestEvent::Fund(role) => {
            if current != RequestStatus::Approved {
                return Err(not_applicable(current, event));
            }
            if !matches!(role, Role::Finance | Role::Admin) {
                return Err(TransitionError::RoleNotPermitted { role: role.clone() });
            }
            Ok(RequestStatus::Funded)
        }
        RequestEvent::Fulfil => match current {
            RequestStatus::Funded => Ok(RequestStatus::Fulfilled),
            _ => Err(not_applicable(current, event)),
        },
        RequestEvent::Cancel => match current {
            RequestStatus::Draft
            | RequestStatus::Submitted
            | RequestStatus::UnderReview
            | RequestStatus::Approved => Ok(RequestStatus::Cancelled),
            _ => Err(not_applicable(current, event)),
        },
    }
}

fn not_applicable(from: RequestStatus, event: &RequestEvent) -> TransitionError {
    TransitionError::NotApplicable {
        from,
        event: event.clone(),
    }
}

// The sequencing guards shared by approve and reject: a decision is valid
// only while the chain is open and only from the next unapproved role.
fn check_turn(
    current: &RequestStatus,
    event: &RequestEvent,
    role: &Role,
    approved: &[Role],
) -> Result<(), TransitionError> {
    if !current.is_awaiting_decision() {
        return Err(not_applicable(current.clone(), event));
    }
    if !role.is_workflow_role() {
        return Err(TransitionError::NotAWorkflowRole { role: role.clone() });
    }
    if approved.contains(role) {
        return Err(TransitionError::AlreadyDecided { role: role.clone() });
    }
    match next_in_workflow(approved) {
        None => Err(TransitionError::WorkflowExhausted),
        Some(expected) if expected != *role => Err(TransitionError::OutOfTurn {
            role: role.clone(),
            expected,
        }),
        Some(_) => Ok(()),
    }
}
