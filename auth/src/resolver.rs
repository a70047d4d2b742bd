use std::sync::Arc;

use tracing::{event, instrument, Level};

use crate::{
    store::{OrganizationId, PermissionSet, PermissionStore, PrincipalId},
    Error,
};

/// Computes the complete set of codes a principal holds, before any single check is made.
#[derive(Clone)]
pub struct MembershipResolver {
    store: Arc<dyn PermissionStore>,
}

impl MembershipResolver {
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        MembershipResolver { store }
    }

    /// Unknown principals count as inactive.
    pub async fn is_active(&self, principal: PrincipalId) -> Result<bool, Error> {
        let status = self.store.principal_status(principal).await?;
        Ok(status.unwrap_or(false))
    }

    /// Resolve the system-scope codes for the principal.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve_system(&self, principal: PrincipalId) -> Result<PermissionSet, Error> {
        if !self.is_active(principal).await? {
            event!(Level::DEBUG, "principal is inactive or unknown");
            return Ok(PermissionSet::default());
        }

        let set = self.collect_system(principal).await?;
        event!(Level::DEBUG, count = set.len(), "resolved system permissions");
        Ok(set)
    }

    /// Resolve the organization-scope codes for the principal in one organization.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve_org(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
    ) -> Result<PermissionSet, Error> {
        if !self.is_active(principal).await? {
            event!(Level::DEBUG, "principal is inactive or unknown");
            return Ok(PermissionSet::default());
        }

        let set = self.collect_org(principal, organization).await?;
        event!(Level::DEBUG, count = set.len(), "resolved organization permissions");
        Ok(set)
    }

    /// System group memberships only. Callers must have checked that the principal is active.
    pub(crate) async fn collect_system(
        &self,
        principal: PrincipalId,
    ) -> Result<PermissionSet, Error> {
        let codes = self.store.system_permission_codes(principal).await?;
        Ok(codes.into_iter().collect())
    }

    /// Template and custom group memberships for the organization. Callers must have checked
    /// that the principal is active.
    pub(crate) async fn collect_org(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
    ) -> Result<PermissionSet, Error> {
        let (template, custom) = futures::try_join!(
            self.store.template_permission_codes(principal, organization),
            self.store.custom_permission_codes(principal, organization),
        )?;

        let mut set = PermissionSet::default();
        set.extend(template);
        set.extend(custom);
        Ok(set)
    }
}

impl std::fmt::Debug for MembershipResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipResolver").finish_non_exhaustive()
    }
}
