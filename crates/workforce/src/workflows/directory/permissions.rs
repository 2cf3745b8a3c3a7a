use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::domain::Role;

/// Privileges that relax the default workflow rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Check in without satisfying any location zone.
    BypassGeofence,
    /// Approve or reject a pending leave request on any step.
    OverrideApproval,
}

/// Capability grants indexed by role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionTable {
    grants: BTreeMap<Role, BTreeSet<Capability>>,
}

impl PermissionTable {
    /// Empty table: no role holds any capability.
    pub fn empty() -> Self {
        Self {
            grants: BTreeMap::new(),
        }
    }

    /// CEO and ADMIN bypass the geofence; CEO, ADMIN and OFFICE_MANAGER may
    /// override approvals.
    pub fn standard() -> Self {
        Self::empty()
            .grant(Role::Ceo, Capability::BypassGeofence)
            .grant(Role::Admin, Capability::BypassGeofence)
            .grant(Role::Ceo, Capability::OverrideApproval)
            .grant(Role::Admin, Capability::OverrideApproval)
            .grant(Role::OfficeManager, Capability::OverrideApproval)
    }

    pub fn grant(mut self, role: Role, capability: Capability) -> Self {
        self.grants.entry(role).or_default().insert(capability);
        self
    }

    /// Replace the set of roles holding `capability`.
    pub fn with_holders(mut self, capability: Capability, roles: &[Role]) -> Self {
        for granted in self.grants.values_mut() {
            granted.remove(&capability);
        }
        for role in roles {
            self.grants.entry(*role).or_default().insert(capability);
        }
        self.grants.retain(|_, granted| !granted.is_empty());
        self
    }

    pub fn allows(&self, role: Role, capability: Capability) -> bool {
        self.grants
            .get(&role)
            .map(|granted| granted.contains(&capability))
            .unwrap_or(false)
    }

    pub fn holders(&self, capability: Capability) -> Vec<Role> {
        self.grants
            .iter()
            .filter(|(_, granted)| granted.contains(&capability))
            .map(|(role, _)| *role)
            .collect()
    }
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::standard()
    }
}
