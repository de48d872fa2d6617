//! Role vocabulary shared by the lifecycle and authorization engines
use std::fmt;

use super::utils;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Eq, PartialEq)]
pub enum Role {
    #[n(0)]
    Employee,
    #[n(1)]
    Manager,
    #[n(2)]
    DepartmentHead,
    #[n(3)]
    Finance,
    #[n(4)]
    Admin,
}

/// The canonical approval order. A request collects exactly one approval from
/// each of these roles, in this sequence. Both the state machine and the
/// authorization predicates read from this single constant.
pub const APPROVAL_WORKFLOW: [Role; 4] = [
    Role::Manager,
    Role::DepartmentHead,
    Role::Finance,
    Role::Admin,
];

impl Role {
    /// Whether this role takes a turn in the approval chain.
    pub fn is_workflow_role(&self) -> bool {
        APPROVAL_WORKFLOW.contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Employee => "Employee",
            Role::Manager => "Manager",
            Role::DepartmentHead => "Department Head",
            Role::Finance => "Finance",
            Role::Admin => "Admin",
        };
        f.write_str(label)
    }
}

/// An authenticated actor. Holds exactly one role and belongs to exactly one
/// department; role changes are an administration concern outside this crate.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct User {
    pub id: String, // uuid7, bech32 encoded with a "user_" prefix
    pub name: String,
    pub role: Role,
    pub department_id: String,
    pub is_active: bool,
}

impl User {
    pub fn new(name: &str, role: Role, department_id: &str) -> anyhow::Result<Self> {
        Ok(Self {
            id: utils::new_uuid_to_bech32("user_")?,
            name: name.to_string(),
            role,
            department_id: department_id.to_string(),
            is_active: true,
        })
    }
}
