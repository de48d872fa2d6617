//! Request action log and the workflow state derived from it
//!
//! A request owns an append-only log of [`ActionRecord`]s; status and the
//! approval sequence are always derived by replaying the log, never stored.
use super::error::ServiceError;
use super::lifecycle::{self, RequestEvent, RequestStatus};
use super::request::TimeStamp;
use super::roles::Role;
use super::utils;
use chrono::Utc;

#[derive(Debug, Clone, Eq, PartialEq, minicbor::Encode, minicbor::Decode)]
pub struct RequestContext {
    #[n(0)]
    pub request_id: String, // uuid7, bech32 encoded with a "req_" prefix
    #[n(1)]
    pub record_set: Vec<ActionRecord>,
}

/// One immutable entry of a request's audit trail.
#[derive(Debug, Clone, Eq, PartialEq, minicbor::Encode, minicbor::Decode)]
pub struct ActionRecord {
    #[n(0)]
    pub request_id: String,
    #[n(1)]
    pub actor_id: String,
    #[n(2)]
    pub actor_role: Role, // the role held when the action was taken
    #[n(3)]
    pub timestamp_utc: TimeStamp<Utc>,
    #[n(4)]
    pub action: ActionKind,
}

#[derive(Debug, Clone, Eq, PartialEq, minicbor::Encode, minicbor::Decode)]
pub enum ActionKind {
    #[n(0)]
    Create {
        #[n(0)]
        details_hash: String, // hash of a request-details document
        #[n(1)]
        requester_id: String,
        #[n(2)]
        department_id: String,
    },
    #[n(1)]
    Revise {
        #[n(0)]
        details_hash: String,
    },
    #[n(2)]
    Submit,
    #[n(3)]
    Approve {
        #[n(0)]
        comment: Option<String>,
    },
    #[n(4)]
    Reject {
        #[n(0)]
        comment: Option<String>,
    },
    #[n(5)]
    Comment {
        #[n(0)]
        text: String,
    },
    #[n(6)]
    Fund {
        #[n(0)]
        payment_reference: String,
    },
    #[n(7)]
    Fulfil,
    #[n(8)]
    Cancel,
}

impl ActionRecord {
    pub fn new(
        request_id: String,
        actor_id: String,
        actor_role: Role,
        timestamp_utc: TimeStamp<Utc>,
        action: ActionKind,
    ) -> Self {
        Self {
            request_id,
            actor_id,
            actor_role,
            timestamp_utc,
            action,
        }
    }
}

// What a replay of the record log settles on.
struct Replay {
    status: RequestStatus,
    approved: Vec<Role>,
}

impl RequestContext {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self::new_with(utils::new_uuid_to_bech32("req_")?))
    }

    pub fn new_with(request_id: String) -> Self {
        Self {
            request_id,
            record_set: vec![],
        }
    }

    pub fn insert_record(&mut self, record: ActionRecord) {
        self.record_set.push(record);
    }

    // Replays every record through the lifecycle transition function.
    // Records that fail the transition check are skipped instead of poisoning
    // the log: derivation stays total and deterministic even over stale or
    // out-of-order data, and a terminal status can never be overridden.
    fn replay(&self) -> Replay {
        let mut status = RequestStatus::Draft;
        let mut approved: Vec<Role> = Vec::new();

        for record in &self.record_set {
            let event = match &record.action {
                ActionKind::Create { .. }
                | ActionKind::Revise { .. }
                | ActionKind::Comment { .. } => continue,
                ActionKind::Submit => RequestEvent::Submit,
                ActionKind::Approve { .. } => RequestEvent::Approve(record.actor_role.clone()),
                ActionKind::Reject { .. } => RequestEvent::Reject(record.actor_role.clone()),
                ActionKind::Fund { .. } => RequestEvent::Fund(record.actor_role.clone()),
                ActionKind::Fulfil => RequestEvent::Fulfil,
                ActionKind::Cancel => RequestEvent::Cancel,
            };

            if let Ok(next) = lifecycle::advance(status.clone(), &event, &approved) {
                if let RequestEvent::Approve(role) = event {
                    approved.push(role);
                }
                status = next;
            }
        }

        Replay { status, approved }
    }

    pub fn current_status(&self) -> RequestStatus {
        self.replay().status
    }

    /// Roles whose approvals were applied, in workflow order.
    pub fn approved_roles(&self) -> Vec<Role> {
        self.replay().approved
    }

    /// The role whose turn it is, or `None` when the chain is closed or
    /// exhausted.
    pub fn next_approver_role(&self) -> Option<Role> {
        let replay = self.replay();
        if !replay.status.is_awaiting_decision() {
            return None;
        }
        lifecycle::next_in_workflow(&replay.approved)
    }

    pub fn requires_approval(&self) -> bool {
        self.current_status().is_awaiting_decision()
    }

    /// Every approve/reject record, in append order.
    pub fn decisions(&self) -> Vec<&ActionRecord> {
        self.record_set
            .iter()
            .filter(|record| {
                matches!(
                    record.action,
                    ActionKind::Approve { .. } | ActionKind::Reject { .. }
                )
            })
            .collect()
    }

    pub fn requester_id(&self) -> Option<&str> {
        self.record_set.iter().find_map(|record| match &record.action {
            ActionKind::Create { requester_id, .. } => Some(requester_id.as_str()),
            _ => None,
        })
    }

    pub fn department_id(&self) -> Option<&str> {
        self.record_set.iter().find_map(|record| match &record.action {
            ActionKind::Create { department_id, .. } => Some(department_id.as_str()),
            _ => None,
        })
    }

    /// Hash of the details document currently describing this request, the
    /// last Create or Revise wins.
    pub fn current_details_hash(&self) -> Option<&str> {
        self.record_set
            .iter()
            .rev()
            .find_map(|record| match &record.action {
                ActionKind::Create { details_hash, .. } | ActionKind::Revise { details_hash } => {
                    Some(details_hash.as_str())
                }
                _ => None,
            })
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.record_set
            .iter()
            .rev()
            .find_map(|record| match &record.action {
                ActionKind::Fund { payment_reference } => Some(payment_reference.as_str()),
                _ => None,
            })
    }

    pub fn serialize_with_hash(&self) -> anyhow::Result<(String, Vec<u8>)> {
        let cbor = minicbor::to_vec(self)?;
        let hash = sha256::digest(&cbor);

        Ok((hash, cbor))
    }

    pub fn save_to_db(&self, db: &sled::Db) -> anyhow::Result<()> {
        db.insert(self.request_id.as_bytes(), minicbor::to_vec(self)?)?;
        Ok(())
    }

    pub fn load_from_db(db: &sled::Db, request_id: &str) -> anyhow::Result<Self> {
        match db.get(request_id.as_bytes())? {
            Some(bytes) => Ok(minicbor::decode(bytes.as_ref())?),
            None => Err(ServiceError::RequestNotFound {
                request_id: request_id.to_string(),
            }
            .into()),
        }
    }

    /// Emit the audit trail as structured log events.
    pub fn view_history(&self) {
        for record in &self.record_set {
            tracing::info!(
                request_id = %record.request_id,
                actor = %record.actor_id,
                role = %record.actor_role,
                action = ?record.action,
                at = %record.timestamp_utc.to_datetime_utc(),
                "request history entry"
            );
        }
    }
}
