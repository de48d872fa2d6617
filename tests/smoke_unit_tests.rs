//! Smoke Screen Unit tests for the resource approval system components
//!
//! These test are unit tests that span the codebase, testing behavior in
//! isolation from integration scenarios. These are intended as smoke-screen
//! and generally test the happy-path.
//!
use resource_approval::{
    authorize,
    context::{ActionKind, ActionRecord, RequestContext},
    lifecycle::RequestStatus,
    request::{Priority, RequestDetails, ResourceType, TimeStamp},
    roles::{APPROVAL_WORKFLOW, Role, User},
    utils::new_uuid_to_bech32,
};

fn user(name: &str, role: Role) -> User {
    User::new(name, role, "dept_test").unwrap()
}

fn record_by(request_id: &str, actor: &User, action: ActionKind) -> ActionRecord {
    ActionRecord::new(
        request_id.to_string(),
        actor.id.clone(),
        actor.role.clone(),
        TimeStamp::new(),
        action,
    )
}

/// A request created by `requester` and already submitted into the chain.
fn submitted_request(requester: &User) -> RequestContext {
    let mut ctx = RequestContext::new_with("req_smoke".to_string());
    ctx.insert_record(record_by(
        "req_smoke",
        requester,
        ActionKind::Create {
            details_hash: "hash_details".to_string(),
            requester_id: requester.id.clone(),
            department_id: requester.department_id.clone(),
        },
    ));
    ctx.insert_record(record_by("req_smoke", requester, ActionKind::Submit));
    ctx
}

// UTILS MODULE TESTS
#[cfg(test)]
mod utils_tests {
    use super::*;

    /// new_uuid_to_bech32 renders ids with the requested human-readable
    /// prefix
    #[test]
    fn generates_valid_bech32_with_hrp() {
        let result = new_uuid_to_bech32("req_");
        assert!(result.is_ok());

        let encoded = result.unwrap();
        assert!(encoded.starts_with("req_1"));
        assert!(encoded.len() > 10); // UUID should produce substantial output
    }

    /// Empty prefixes are refused rather than silently accepted
    #[test]
    fn handles_empty_hrp() {
        let result = new_uuid_to_bech32("");
        assert!(result.is_err());
    }

    /// Repeated calls mint unique identifiers
    #[test]
    fn generates_unique_ids() {
        let id1 = new_uuid_to_bech32("req_").unwrap();
        let id2 = new_uuid_to_bech32("req_").unwrap();
        let id3 = new_uuid_to_bech32("req_").unwrap();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }
}

// REQUEST MODULE TESTS
#[cfg(test)]
mod request_tests {
    use super::*;
    use resource_approval::error::ValidationError;

    fn complete_details() -> RequestDetails {
        RequestDetails::new()
            .set_title("Conference AV kit")
            .set_description("Portable projector and speakers for the sales floor")
            .set_resource_type(ResourceType::Equipment)
            .set_quantity(1)
            .set_estimated_cost(85_000)
            .set_priority(Priority::Medium)
            .set_department("dept_sales")
    }

    /// A fully populated draft validates and is content-addressed
    #[test]
    fn complete_details_finalise() {
        let (hash, cbor) = complete_details().validate_and_finalise().unwrap();
        assert_eq!(hash.len(), 64);
        assert!(!cbor.is_empty());
    }

    /// Finalising twice yields the same hash: the encoding is deterministic
    #[test]
    fn finalise_is_deterministic() {
        let details = complete_details();
        let (hash1, _) = details.validate_and_finalise().unwrap();
        let (hash2, _) = details.validate_and_finalise().unwrap();
        assert_eq!(hash1, hash2);
    }

    /// Each missing required field is reported with its own variant
    #[test]
    fn missing_fields_are_named() {
        let no_title = RequestDetails::new()
            .set_description("desc")
            .set_resource_type(ResourceType::Other)
            .set_quantity(1)
            .set_estimated_cost(1)
            .set_priority(Priority::Low)
            .set_department("dept_x");
        let err = no_title.validate_and_finalise().unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::MissingTitle)
        );

        let no_quantity = complete_details().set_quantity(0);
        let err = no_quantity.validate_and_finalise().unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::ZeroQuantity)
        );

        let free_of_charge = complete_details().set_estimated_cost(0);
        let err = free_of_charge.validate_and_finalise().unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::ZeroEstimatedCost)
        );
    }

    /// Whitespace-only text fields count as missing
    #[test]
    fn blank_title_is_missing() {
        let blank = complete_details().set_title("   ");
        let err = blank.validate_and_finalise().unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::MissingTitle)
        );
    }
}

// CONTEXT MODULE TESTS
#[cfg(test)]
mod context_tests {
    use super::*;

    /// An empty record log derives the Draft status
    #[test]
    fn new_context_is_draft() {
        let ctx = RequestContext::new().unwrap();
        assert!(ctx.record_set.is_empty());
        assert!(ctx.request_id.starts_with("req_"));
        assert_eq!(ctx.current_status(), RequestStatus::Draft);
    }

    /// new_with keeps the caller's id
    #[test]
    fn new_with_uses_provided_request_id() {
        let ctx = RequestContext::new_with("req_custom123".to_string());
        assert_eq!(ctx.request_id, "req_custom123");
        assert!(ctx.record_set.is_empty());
    }

    /// Submitting moves the derived status forward and opens the chain
    #[test]
    fn submitted_request_awaits_the_manager() {
        let requester = user("Priya", Role::Employee);
        let ctx = submitted_request(&requester);

        assert_eq!(ctx.current_status(), RequestStatus::Submitted);
        assert!(ctx.requires_approval());
        assert_eq!(ctx.next_approver_role(), Some(Role::Manager));
        assert_eq!(ctx.requester_id(), Some(requester.id.as_str()));
    }

    /// Approvals advance the chain in canonical order until fully approved
    #[test]
    fn chain_of_four_approvals_reaches_approved() {
        let requester = user("Priya", Role::Employee);
        let mut ctx = submitted_request(&requester);

        for (stage, role) in APPROVAL_WORKFLOW.into_iter().enumerate() {
            let approver = user("Approver", role.clone());
            ctx.insert_record(record_by(
                "req_smoke",
                &approver,
                ActionKind::Approve { comment: None },
            ));
            if stage + 1 < APPROVAL_WORKFLOW.len() {
                assert_eq!(ctx.current_status(), RequestStatus::UnderReview);
            }
        }

        assert_eq!(ctx.current_status(), RequestStatus::Approved);
        assert_eq!(ctx.approved_roles(), APPROVAL_WORKFLOW.to_vec());
        assert_eq!(ctx.next_approver_role(), None);
    }

    /// A rejection from the role whose turn it is terminates the request
    #[test]
    fn rejection_is_terminal() {
        let requester = user("Priya", Role::Employee);
        let mut ctx = submitted_request(&requester);

        let manager = user("Marco", Role::Manager);
        ctx.insert_record(record_by(
            "req_smoke",
            &manager,
            ActionKind::Approve { comment: None },
        ));

        let head = user("Dana", Role::DepartmentHead);
        ctx.insert_record(record_by(
            "req_smoke",
            &head,
            ActionKind::Reject {
                comment: Some("not this quarter".to_string()),
            },
        ));
        assert_eq!(ctx.current_status(), RequestStatus::Rejected);

        // records appended after the terminal decision change nothing
        let finance = user("Felix", Role::Finance);
        ctx.insert_record(record_by(
            "req_smoke",
            &finance,
            ActionKind::Approve { comment: None },
        ));
        assert_eq!(ctx.current_status(), RequestStatus::Rejected);
    }

    /// Comments are recorded without touching the derived status
    #[test]
    fn comments_do_not_change_status() {
        let requester = user("Priya", Role::Employee);
        let mut ctx = submitted_request(&requester);

        let manager = user("Marco", Role::Manager);
        ctx.insert_record(record_by(
            "req_smoke",
            &manager,
            ActionKind::Comment {
                text: "is the old hardware written off?".to_string(),
            },
        ));

        assert_eq!(ctx.current_status(), RequestStatus::Submitted);
        assert_eq!(ctx.next_approver_role(), Some(Role::Manager));
    }

    /// CBOR round-trip preserves the record log and the derived state
    #[test]
    fn cbor_roundtrip_preserves_log() {
        let requester = user("Priya", Role::Employee);
        let ctx = submitted_request(&requester);

        let (_hash, cbor) = ctx.serialize_with_hash().unwrap();
        let decoded: RequestContext = minicbor::decode(&cbor).unwrap();

        assert_eq!(decoded, ctx);
        assert_eq!(decoded.current_status(), ctx.current_status());
    }
}

// AUTHORIZE MODULE TESTS
#[cfg(test)]
mod authorize_tests {
    use super::*;

    /// Scenario A: fresh submission — the manager may act, finance may not
    #[test]
    fn first_turn_belongs_to_the_manager() {
        let requester = user("Priya", Role::Employee);
        let ctx = submitted_request(&requester);

        let manager = user("Marco", Role::Manager);
        let finance = user("Felix", Role::Finance);

        assert!(authorize::can_approve(Some(&manager), &ctx));
        assert!(!authorize::can_approve(Some(&finance), &ctx));
    }

    /// Scenario B: after the manager's approval the department head is next,
    /// and the manager cannot act twice
    #[test]
    fn second_turn_belongs_to_the_department_head() {
        let requester = user("Priya", Role::Employee);
        let mut ctx = submitted_request(&requester);

        let manager = user("Marco", Role::Manager);
        ctx.insert_record(record_by(
            "req_smoke",
            &manager,
            ActionKind::Approve { comment: None },
        ));

        let head = user("Dana", Role::DepartmentHead);
        assert!(authorize::can_approve(Some(&head), &ctx));
        assert!(!authorize::can_approve(Some(&manager), &ctx));

        // another user holding the manager role is equally barred
        let second_manager = user("Mia", Role::Manager);
        assert!(!authorize::can_approve(Some(&second_manager), &ctx));
    }

    /// Scenario C: a fully approved request accepts no further approvals
    #[test]
    fn exhausted_chain_refuses_everyone() {
        let requester = user("Priya", Role::Employee);
        let mut ctx = submitted_request(&requester);

        for role in APPROVAL_WORKFLOW {
            let approver = user("Approver", role);
            ctx.insert_record(record_by(
                "req_smoke",
                &approver,
                ActionKind::Approve { comment: None },
            ));
        }
        assert_eq!(ctx.current_status(), RequestStatus::Approved);

        for role in [
            Role::Employee,
            Role::Manager,
            Role::DepartmentHead,
            Role::Finance,
            Role::Admin,
        ] {
            let candidate = user("Late", role);
            assert!(!authorize::can_approve(Some(&candidate), &ctx));
        }
    }

    /// Scenario D: drafts are editable by their requester, submissions are not
    #[test]
    fn editing_closes_at_submission() {
        let requester = user("Priya", Role::Employee);

        let mut draft = RequestContext::new_with("req_smoke".to_string());
        draft.insert_record(record_by(
            "req_smoke",
            &requester,
            ActionKind::Create {
                details_hash: "hash_details".to_string(),
                requester_id: requester.id.clone(),
                department_id: requester.department_id.clone(),
            },
        ));
        assert!(authorize::can_edit(Some(&requester), &draft));

        draft.insert_record(record_by("req_smoke", &requester, ActionKind::Submit));
        assert!(!authorize::can_edit(Some(&requester), &draft));

        // admins may edit regardless of status
        let admin = user("Alma", Role::Admin);
        assert!(authorize::can_edit(Some(&admin), &draft));

        // and a colleague may never edit someone else's draft
        let colleague = user("Noor", Role::Employee);
        assert!(!authorize::can_edit(Some(&colleague), &draft));
    }

    /// Scenario E: nobody cancels a fulfilled request, not even an admin
    #[test]
    fn fulfilment_bars_cancellation() {
        let requester = user("Priya", Role::Employee);
        let mut ctx = submitted_request(&requester);

        for role in APPROVAL_WORKFLOW {
            let approver = user("Approver", role);
            ctx.insert_record(record_by(
                "req_smoke",
                &approver,
                ActionKind::Approve { comment: None },
            ));
        }
        let finance = user("Felix", Role::Finance);
        ctx.insert_record(record_by(
            "req_smoke",
            &finance,
            ActionKind::Fund {
                payment_reference: "pay_123".to_string(),
            },
        ));

        // the predicate stays permissive while merely funded; the state
        // machine is the arbiter for that case
        assert!(authorize::can_cancel(Some(&requester), &ctx));

        ctx.insert_record(record_by("req_smoke", &finance, ActionKind::Fulfil));
        assert_eq!(ctx.current_status(), RequestStatus::Fulfilled);

        let admin = user("Alma", Role::Admin);
        assert!(!authorize::can_cancel(Some(&admin), &ctx));
        assert!(!authorize::can_cancel(Some(&requester), &ctx));
    }

    /// An unauthenticated caller is denied every predicate
    #[test]
    fn null_user_is_denied_everything() {
        let requester = user("Priya", Role::Employee);
        let ctx = submitted_request(&requester);

        assert!(!authorize::can_approve(None, &ctx));
        assert!(!authorize::can_edit(None, &ctx));
        assert!(!authorize::can_cancel(None, &ctx));
        assert!(!authorize::can_create_request(None));
        assert!(!authorize::can_manage_funding(None));
        assert!(!authorize::can_view_all_requests(None));
        assert!(!authorize::can_manage_users(None));
        assert!(!authorize::can_manage_departments(None));
        assert!(!authorize::can_view_audit_logs(None));
        assert!(!authorize::can_override_approvals(None));
    }

    /// The screen-level permissions follow the role table
    #[test]
    fn role_gated_permissions() {
        let employee = user("Priya", Role::Employee);
        let finance = user("Felix", Role::Finance);
        let admin = user("Alma", Role::Admin);

        assert!(authorize::can_create_request(Some(&employee)));
        assert!(!authorize::can_create_request(Some(&finance)));

        assert!(authorize::can_manage_funding(Some(&finance)));
        assert!(authorize::can_manage_funding(Some(&admin)));
        assert!(!authorize::can_manage_funding(Some(&employee)));

        assert!(authorize::can_view_all_requests(Some(&finance)));
        assert!(!authorize::can_view_all_requests(Some(&employee)));

        assert!(authorize::can_manage_users(Some(&admin)));
        assert!(!authorize::can_manage_users(Some(&finance)));
        assert!(authorize::can_manage_departments(Some(&admin)));
        assert!(authorize::can_view_audit_logs(Some(&admin)));
        assert!(authorize::can_override_approvals(Some(&admin)));
        assert!(!authorize::can_override_approvals(Some(&finance)));
    }
}
