use std::fmt;

use serde::{Deserialize, Serialize};

use crate::workflows::directory::{Caller, Employee, EmployeeId, Role};

/// One step of an approval chain: a named person or anyone holding a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ApproverRef {
    Person(EmployeeId),
    Role(Role),
}

impl ApproverRef {
    pub fn is_held_by(&self, caller: &Caller) -> bool {
        match self {
            ApproverRef::Person(id) => *id == caller.employee_id,
            ApproverRef::Role(role) => *role == caller.role,
        }
    }
}

impl fmt::Display for ApproverRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApproverRef::Person(id) => write!(f, "{id}"),
            ApproverRef::Role(role) => write!(f, "{role}"),
        }
    }
}

/// Current-approver field of a leave request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ApprovalPointer {
    Person(EmployeeId),
    Role(Role),
    /// Sentinel stored once the last step approved.
    Completed,
}

impl ApprovalPointer {
    pub fn approver(&self) -> Option<ApproverRef> {
        match self {
            ApprovalPointer::Person(id) => Some(ApproverRef::Person(id.clone())),
            ApprovalPointer::Role(role) => Some(ApproverRef::Role(*role)),
            ApprovalPointer::Completed => None,
        }
    }

    pub fn points_at(&self, approver: &ApproverRef) -> bool {
        match (self, approver) {
            (ApprovalPointer::Person(left), ApproverRef::Person(right)) => left == right,
            (ApprovalPointer::Role(left), ApproverRef::Role(right)) => left == right,
            _ => false,
        }
    }

    pub fn is_held_by(&self, caller: &Caller) -> bool {
        self.approver()
            .map(|approver| approver.is_held_by(caller))
            .unwrap_or(false)
    }
}

impl From<ApproverRef> for ApprovalPointer {
    fn from(value: ApproverRef) -> Self {
        match value {
            ApproverRef::Person(id) => ApprovalPointer::Person(id),
            ApproverRef::Role(role) => ApprovalPointer::Role(role),
        }
    }
}

impl fmt::Display for ApprovalPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalPointer::Person(id) => write!(f, "{id}"),
            ApprovalPointer::Role(role) => write!(f, "{role}"),
            ApprovalPointer::Completed => f.write_str("COMPLETED"),
        }
    }
}

/// Ordered approvers for one requester, resolved from current configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalChain(Vec<ApproverRef>);

impl ApprovalChain {
    pub fn new(steps: Vec<ApproverRef>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[ApproverRef] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ApproverRef> {
        self.0.get(index)
    }

    pub fn first(&self) -> Option<&ApproverRef> {
        self.0.first()
    }

    pub fn position(&self, pointer: &ApprovalPointer) -> Option<usize> {
        self.0.iter().position(|step| pointer.points_at(step))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ApproverRef> {
        self.0.iter()
    }
}

/// Builds approval chains. Never cached: call it whenever a chain is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApprovalChainResolver;

impl ApprovalChainResolver {
    /// Explicit approver slots in order with gaps removed, falling back to the
    /// role default when no slot is set. Slots naming the employee themself
    /// are dropped.
    pub fn resolve(&self, employee: &Employee) -> ApprovalChain {
        let explicit: Vec<ApproverRef> = employee
            .approvers
            .iter()
            .flatten()
            .filter(|approver| **approver != employee.id)
            .cloned()
            .map(ApproverRef::Person)
            .collect();

        if explicit.is_empty() {
            Self::default_chain(employee.role)
        } else {
            ApprovalChain::new(explicit)
        }
    }

    pub fn default_chain(role: Role) -> ApprovalChain {
        let roles: &[Role] = match role {
            Role::Employee => &[Role::Supervisor, Role::OfficeManager, Role::Ceo],
            Role::Supervisor => &[Role::OfficeManager, Role::Ceo],
            _ => &[Role::Ceo],
        };
        ApprovalChain::new(roles.iter().copied().map(ApproverRef::Role).collect())
    }
}
