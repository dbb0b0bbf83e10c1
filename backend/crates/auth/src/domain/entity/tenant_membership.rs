//! Tenant Membership Entity
//!
//! The (user, tenant) relation with the roles and permissions granted inside
//! that tenant.

use std::collections::BTreeSet;

use kernel::id::TenantId;
use serde::{Deserialize, Serialize};

use crate::domain::value_object::permission::PermissionSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub tenant_id: TenantId,
    pub roles: BTreeSet<String>,
    pub permissions: PermissionSet,
}

impl TenantMembership {
    /// Membership with no roles or grants
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            roles: BTreeSet::new(),
            permissions: PermissionSet::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_permission(mut self, permission: &str) -> Self {
        self.permissions.grant(permission);
        self
    }

    /// Exact, case-sensitive match
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.allows(permission)
    }
}
