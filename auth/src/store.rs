use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::Error;

pub type PrincipalId = Uuid;
pub type OrganizationId = Uuid;

/// The lookups that permission resolution needs from the data store.
///
/// Each method answers one predicate query and does no interpretation of its own.
/// Implementations must read current state on every call.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// `Some(active)` for a known principal, `None` if no such principal exists.
    async fn principal_status(&self, principal: PrincipalId) -> Result<Option<bool>, Error>;

    /// Codes granted through every system permission group the principal belongs to.
    async fn system_permission_codes(&self, principal: PrincipalId) -> Result<Vec<String>, Error>;

    /// Codes granted through template group memberships recorded for this organization.
    async fn template_permission_codes(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
    ) -> Result<Vec<String>, Error>;

    /// Codes granted through custom groups owned by this organization.
    async fn custom_permission_codes(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
    ) -> Result<Vec<String>, Error>;
}

/// A set of permission codes held by a principal in one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    pub fn extend(&mut self, codes: impl IntoIterator<Item = String>) {
        self.0.extend(codes);
    }
}

impl FromIterator<String> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        PermissionSet(iter.into_iter().collect())
    }
}
