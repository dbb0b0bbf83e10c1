//! Tenant Permission Evaluator
//!
//! Role and permission queries are always scoped to one tenant. A user
//! without a membership in that tenant is simply not authorized there; no
//! grant from another tenant ever applies.

use kernel::id::TenantId;

use crate::domain::entity::user::User;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct TenantPermissionEvaluator;

impl TenantPermissionEvaluator {
    pub fn belongs_to_tenant(&self, user: &User, tenant: &TenantId) -> bool {
        user.membership(tenant).is_some()
    }

    pub fn has_role(&self, user: &User, role: &str, tenant: &TenantId) -> bool {
        user.membership(tenant)
            .is_some_and(|membership| membership.has_role(role))
    }

    pub fn has_permission(&self, user: &User, permission: &str, tenant: &TenantId) -> bool {
        user.membership(tenant)
            .is_some_and(|membership| membership.has_permission(permission))
    }

    /// Like [`Self::has_permission`], telling the two refusals apart
    pub fn authorize(&self, user: &User, permission: &str, tenant: &TenantId) -> AuthResult<()> {
        let membership = user
            .membership(tenant)
            .ok_or_else(|| AuthError::TenantNotAuthorized {
                tenant: tenant.to_string(),
            })?;
        if membership.has_permission(permission) {
            Ok(())
        } else {
            Err(AuthError::AuthorizationDenied {
                permission: permission.to_string(),
                tenant: tenant.to_string(),
            })
        }
    }
}
