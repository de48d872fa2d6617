//! Approval authorization engine
//!
//! Pure predicates over `(user, request)` used to gate UI actions and
//! pre-validate backend calls. Absence of permission is `false`, never an
//! error; an unauthenticated caller (`None`) is denied everything. The
//! service layer evaluates the same predicates authoritatively.
use super::context::RequestContext;
use super::lifecycle::RequestStatus;
use super::roles::{Role, User};

/// Whether it is this user's turn to approve or reject. Enforces the strict
/// sequential chain: non-skippable, non-repeatable, closed once the request
/// leaves review.
pub fn can_approve(user: Option<&User>, request: &RequestContext) -> bool {
    let Some(user) = user else { return false };
    if !user.role.is_workflow_role() {
        return false;
    }
    if !request.current_status().is_awaiting_decision() {
        return false;
    }
    // a user, or a role, that already decided is done with this request
    for decision in request.decisions() {
        if decision.actor_id == user.id || decision.actor_role == user.role {
            return false;
        }
    }
    match request.next_approver_role() {
        Some(expected) => expected == user.role,
        None => false,
    }
}

/// Drafts may be edited by their requester; admins may edit anything.
/// Post-submission edits are otherwise refused so that what was approved is
/// what was asked for.
pub fn can_edit(user: Option<&User>, request: &RequestContext) -> bool {
    let Some(user) = user else { return false };
    if user.role == Role::Admin {
        return true;
    }
    is_requester(user, request) && request.current_status() == RequestStatus::Draft
}

/// Requester or admin may withdraw a request at any point before fulfilment.
pub fn can_cancel(user: Option<&User>, request: &RequestContext) -> bool {
    let Some(user) = user else { return false };
    if request.current_status() == RequestStatus::Fulfilled {
        return false;
    }
    user.role == Role::Admin || is_requester(user, request)
}

pub fn can_create_request(user: Option<&User>) -> bool {
    matches!(
        user,
        Some(user) if matches!(
            user.role,
            Role::Employee | Role::Manager | Role::DepartmentHead
        )
    )
}

pub fn can_manage_funding(user: Option<&User>) -> bool {
    matches!(user, Some(user) if matches!(user.role, Role::Finance | Role::Admin))
}

pub fn can_view_all_requests(user: Option<&User>) -> bool {
    matches!(user, Some(user) if matches!(user.role, Role::Finance | Role::Admin))
}

pub fn can_manage_users(user: Option<&User>) -> bool {
    matches!(user, Some(user) if user.role == Role::Admin)
}

pub fn can_manage_departments(user: Option<&User>) -> bool {
    matches!(user, Some(user) if user.role == Role::Admin)
}

pub fn can_view_audit_logs(user: Option<&User>) -> bool {
    matches!(user, Some(user) if user.role == Role::Admin)
}

pub fn can_override_approvals(user: Option<&User>) -> bool {
    matches!(user, Some(user) if user.role == Role::Admin)
}

fn is_requester(user: &User, request: &RequestContext) -> bool {
    request.requester_id().is_some_and(|id| id == user.id)
}
