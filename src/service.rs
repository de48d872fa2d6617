//! Service layer API for request workflow operations
//!
//! `RequestService` is the authoritative arbiter standing in for the remote
//! backend: it re-checks every action against the persisted record log,
//! appends exactly one record on success and persists nothing on failure.
use super::authorize;
use super::context::{ActionKind, ActionRecord, RequestContext};
use super::error::{ServiceError, ValidationError};
use super::lifecycle::{self, RequestEvent};
use super::request::{RequestDetails, TimeStamp};
use super::roles::User;
use sled::Batch;
use std::sync::Arc;

pub struct RequestService {
    instance: Arc<sled::Db>,
    // in future we could add a config for per-department approval constraints
}

impl RequestService {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }

    /// Load a request's record log from the database
    fn load_request_context(&self, request_id: &str) -> anyhow::Result<RequestContext> {
        RequestContext::load_from_db(&self.instance, request_id)
    }

    pub fn get_request(&self, request_id: &str) -> anyhow::Result<RequestContext> {
        self.load_request_context(request_id)
    }

    /// Open a new draft request for the requester
    pub fn create_request(
        &self,
        details: RequestDetails,
        requester: &User,
    ) -> anyhow::Result<RequestContext> {
        if !authorize::can_create_request(Some(requester)) {
            return Err(not_authorized(requester, "create"));
        }

        // Validate and serialize the details document
        let (details_hash, details_cbor) = details.validate_and_finalise()?;

        let mut ctx = RequestContext::new()?;
        let record = ActionRecord::new(
            ctx.request_id.clone(),
            requester.id.clone(),
            requester.role.clone(),
            TimeStamp::new(),
            ActionKind::Create {
                details_hash: details_hash.clone(),
                requester_id: requester.id.clone(),
                department_id: requester.department_id.clone(),
            },
        );
        ctx.insert_record(record);

        // Batch insert: details document and the record log that references it
        let mut batch = Batch::default();
        batch.insert(details_hash.as_bytes(), details_cbor);
        batch.insert(ctx.request_id.as_bytes(), minicbor::to_vec(&ctx)?);
        self.instance.apply_batch(batch)?;

        tracing::info!(
            request_id = %ctx.request_id,
            requester = %requester.id,
            "request created"
        );
        Ok(ctx)
    }

    /// Replace a draft's details document (requires edit permission)
    pub fn revise_request(
        &self,
        request_id: String,
        details: RequestDetails,
        user: &User,
    ) -> anyhow::Result<RequestContext> {
        let mut ctx = self.load_request_context(&request_id)?;

        if !authorize::can_edit(Some(user), &ctx) {
            return Err(not_authorized(user, "edit"));
        }

        let (details_hash, details_cbor) = details.validate_and_finalise()?;

        ctx.insert_record(ActionRecord::new(
            request_id,
            user.id.clone(),
            user.role.clone(),
            TimeStamp::new(),
            ActionKind::Revise {
                details_hash: details_hash.clone(),
            },
        ));

        let mut batch = Batch::default();
        batch.insert(details_hash.as_bytes(), details_cbor);
        batch.insert(ctx.request_id.as_bytes(), minicbor::to_vec(&ctx)?);
        self.instance.apply_batch(batch)?;

        tracing::info!(request_id = %ctx.request_id, editor = %user.id, "request revised");
        Ok(ctx)
    }

    /// Send a draft into the approval chain
    pub fn submit_request(&self, request_id: String, user: &User) -> anyhow::Result<RequestContext> {
        let mut ctx = self.load_request_context(&request_id)?;

        // only the original requester sends a draft into the chain
        if ctx.requester_id() != Some(user.id.as_str()) {
            return Err(not_authorized(user, "submit"));
        }

        let status = lifecycle::advance(
            ctx.current_status(),
            &RequestEvent::Submit,
            &ctx.approved_roles(),
        )?;

        ctx.insert_record(ActionRecord::new(
            request_id,
            user.id.clone(),
            user.role.clone(),
            TimeStamp::new(),
            ActionKind::Submit,
        ));
        ctx.save_to_db(&self.instance)?;

        tracing::info!(request_id = %ctx.request_id, status = %status, "request submitted");
        Ok(ctx)
    }

    /// Record an approval from the next role in the workflow
    pub fn approve_request(
        &self,
        request_id: String,
        user: &User,
        comment: Option<String>,
    ) -> anyhow::Result<RequestContext> {
        let mut ctx = self.load_request_context(&request_id)?;

        if !user.role.is_workflow_role() {
            return Err(not_authorized(user, "approve"));
        }
        if !authorize::can_approve(Some(user), &ctx) {
            // the caller's copy was stale: another decision landed first, or
            // the chain has moved past this role
            tracing::warn!(
                request_id = %ctx.request_id,
                user = %user.id,
                role = %user.role,
                "approval conflict"
            );
            return Err(ServiceError::ApprovalConflict {
                request_id: ctx.request_id.clone(),
            }
            .into());
        }

        ctx.insert_record(ActionRecord::new(
            request_id,
            user.id.clone(),
            user.role.clone(),
            TimeStamp::new(),
            ActionKind::Approve { comment },
        ));
        ctx.save_to_db(&self.instance)?;

        tracing::info!(
            request_id = %ctx.request_id,
            role = %user.role,
            status = %ctx.current_status(),
            "approval recorded"
        );
        Ok(ctx)
    }

    /// Record a rejection from the next role in the workflow, terminating the
    /// request
    pub fn reject_request(
        &self,
        request_id: String,
        user: &User,
        comment: Option<String>,
    ) -> anyhow::Result<RequestContext> {
        let mut ctx = self.load_request_context(&request_id)?;

        if !user.role.is_workflow_role() {
            return Err(not_authorized(user, "reject"));
        }
        // rejection is gated by the same turn rules as approval
        if !authorize::can_approve(Some(user), &ctx) {
            tracing::warn!(
                request_id = %ctx.request_id,
                user = %user.id,
                role = %user.role,
                "rejection conflict"
            );
            return Err(ServiceError::ApprovalConflict {
                request_id: ctx.request_id.clone(),
            }
            .into());
        }

        ctx.insert_record(ActionRecord::new(
            request_id,
            user.id.clone(),
            user.role.clone(),
            TimeStamp::new(),
            ActionKind::Reject { comment },
        ));
        ctx.save_to_db(&self.instance)?;

        tracing::info!(request_id = %ctx.request_id, role = %user.role, "request rejected");
        Ok(ctx)
    }

    /// Attach a discussion comment; never changes status or consumes a turn
    pub fn add_comment(
        &self,
        request_id: String,
        user: &User,
        text: String,
    ) -> anyhow::Result<RequestContext> {
        let mut ctx = self.load_request_context(&request_id)?;

        let status = ctx.current_status();
        if status.is_terminal() {
            return Err(super::error::TransitionError::Terminal { status }.into());
        }

        ctx.insert_record(ActionRecord::new(
            request_id,
            user.id.clone(),
            user.role.clone(),
            TimeStamp::new(),
            ActionKind::Comment { text },
        ));
        ctx.save_to_db(&self.instance)?;

        Ok(ctx)
    }

    /// Commit funding for a fully approved request
    pub fn fund_request(
        &self,
        request_id: String,
        user: &User,
        payment_reference: String,
    ) -> anyhow::Result<RequestContext> {
        let mut ctx = self.load_request_context(&request_id)?;

        if !authorize::can_manage_funding(Some(user)) {
            return Err(not_authorized(user, "fund"));
        }
        if payment_reference.trim().is_empty() {
            return Err(ValidationError::MissingPaymentReference.into());
        }

        lifecycle::advance(
            ctx.current_status(),
            &RequestEvent::Fund(user.role.clone()),
            &ctx.approved_roles(),
        )?;

        ctx.insert_record(ActionRecord::new(
            request_id,
            user.id.clone(),
            user.role.clone(),
            TimeStamp::new(),
            ActionKind::Fund {
                payment_reference: payment_reference.clone(),
            },
        ));
        ctx.save_to_db(&self.instance)?;

        tracing::info!(
            request_id = %ctx.request_id,
            payment_reference = %payment_reference,
            "request funded"
        );
        Ok(ctx)
    }

    /// Mark a funded request as procured and delivered
    pub fn fulfil_request(&self, request_id: String, user: &User) -> anyhow::Result<RequestContext> {
        let mut ctx = self.load_request_context(&request_id)?;

        if !authorize::can_manage_funding(Some(user)) {
            return Err(not_authorized(user, "fulfil"));
        }

        lifecycle::advance(
            ctx.current_status(),
            &RequestEvent::Fulfil,
            &ctx.approved_roles(),
        )?;

        ctx.insert_record(ActionRecord::new(
            request_id,
            user.id.clone(),
            user.role.clone(),
            TimeStamp::new(),
            ActionKind::Fulfil,
        ));
        ctx.save_to_db(&self.instance)?;

        tracing::info!(request_id = %ctx.request_id, "request fulfilled");
        Ok(ctx)
    }

    /// Withdraw a request on behalf of its requester or an admin
    pub fn cancel_request(&self, request_id: String, user: &User) -> anyhow::Result<RequestContext> {
        let mut ctx = self.load_request_context(&request_id)?;

        if !authorize::can_cancel(Some(user), &ctx) {
            return Err(not_authorized(user, "cancel"));
        }

        lifecycle::advance(
            ctx.current_status(),
            &RequestEvent::Cancel,
            &ctx.approved_roles(),
        )?;

        ctx.insert_record(ActionRecord::new(
            request_id,
            user.id.clone(),
            user.role.clone(),
            TimeStamp::new(),
            ActionKind::Cancel,
        ));
        ctx.save_to_db(&self.instance)?;

        tracing::info!(request_id = %ctx.request_id, by = %user.id, "request cancelled");
        Ok(ctx)
    }
}

fn not_authorized(user: &User, action: &'static str) -> anyhow::Error {
    ServiceError::NotAuthorized {
        user_id: user.id.clone(),
        action,
    }
    .into()
}
