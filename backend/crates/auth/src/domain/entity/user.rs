//! User Entity
//!
//! The authenticatable record handed out by the user provider.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kernel::id::{TenantId, UserId};

use crate::domain::entity::tenant_membership::TenantMembership;
use crate::domain::value_object::{
    remember_token::RememberToken, user_password::UserPassword, user_status::UserStatus,
};

/// Role written into bearer tokens when none is set
pub const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// Login identifier (the value of [`User::IDENTIFIER_FIELD`])
    pub identifier: String,
    pub password: UserPassword,
    pub remember_token: Option<RememberToken>,
    pub status: UserStatus,
    /// Account-level role carried in bearer tokens
    pub role: String,
    pub memberships: BTreeMap<TenantId, TenantMembership>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name of the identifier field in the user store
    pub const IDENTIFIER_FIELD: &'static str = "email";
    /// Name of the remember-token field in the user store
    pub const REMEMBER_TOKEN_FIELD: &'static str = "remember_token";

    pub fn new(id: UserId, identifier: impl Into<String>, password: UserPassword) -> Self {
        let now = Utc::now();
        Self {
            id,
            identifier: identifier.into(),
            password,
            remember_token: None,
            status: UserStatus::default(),
            role: DEFAULT_ROLE.to_string(),
            memberships: BTreeMap::new(),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    /// Add or replace the membership for its tenant
    pub fn with_membership(mut self, membership: TenantMembership) -> Self {
        self.join(membership);
        self
    }

    pub fn join(&mut self, membership: TenantMembership) {
        self.memberships
            .insert(membership.tenant_id.clone(), membership);
        self.updated_at = Utc::now();
    }

    pub fn leave(&mut self, tenant: &TenantId) -> Option<TenantMembership> {
        let removed = self.memberships.remove(tenant);
        if removed.is_some() {
            self.updated_at = Utc::now();
        }
        removed
    }

    pub fn membership(&self, tenant: &TenantId) -> Option<&TenantMembership> {
        self.memberships.get(tenant)
    }

    pub fn can_login(&self) -> bool {
        self.status.can_login()
    }

    pub fn set_remember_token(&mut self, token: RememberToken) {
        self.remember_token = Some(token);
        self.updated_at = Utc::now();
    }

    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.last_login_at = Some(at);
        self.updated_at = at;
    }
}
