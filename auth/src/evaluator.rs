use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OnceCell};

use crate::{
    registry::{OrgCode, SystemCode, SUPERADMIN},
    resolver::MembershipResolver,
    store::{OrganizationId, PermissionSet, PermissionStore, PrincipalId},
    Error,
};

/// Answers whether a principal holds a permission code.
///
/// The evaluator holds no state besides the store handle, so it can be shared freely. Each
/// check reads current membership state.
#[derive(Clone, Debug)]
pub struct PermissionEvaluator {
    resolver: MembershipResolver,
}

impl PermissionEvaluator {
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        PermissionEvaluator {
            resolver: MembershipResolver::new(store),
        }
    }

    pub async fn has_system_permission(
        &self,
        principal: PrincipalId,
        code: &str,
    ) -> Result<bool, Error> {
        self.for_principal(principal).has_system(code).await
    }

    pub async fn has_org_permission(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
        code: &str,
    ) -> Result<bool, Error> {
        self.for_principal(principal)
            .has_org(organization, code)
            .await
    }

    /// Create a memo for checks made on behalf of a single principal. This should live no
    /// longer than the request that created it.
    pub fn for_principal(&self, principal: PrincipalId) -> RequestPermissions {
        RequestPermissions {
            principal,
            resolver: self.resolver.clone(),
            active: OnceCell::new(),
            system: OnceCell::new(),
            orgs: Mutex::new(HashMap::new()),
        }
    }
}

/// Permission checks for one principal, with each scope resolved at most once.
pub struct RequestPermissions {
    principal: PrincipalId,
    resolver: MembershipResolver,
    active: OnceCell<bool>,
    system: OnceCell<Arc<PermissionSet>>,
    orgs: Mutex<HashMap<OrganizationId, Arc<PermissionSet>>>,
}

impl RequestPermissions {
    pub fn principal(&self) -> PrincipalId {
        self.principal
    }

    async fn active(&self) -> Result<bool, Error> {
        self.active
            .get_or_try_init(|| self.resolver.is_active(self.principal))
            .await
            .copied()
    }

    /// The principal's system codes. Empty for an inactive principal.
    pub async fn system_permissions(&self) -> Result<Arc<PermissionSet>, Error> {
        if !self.active().await? {
            return Ok(Arc::new(PermissionSet::default()));
        }

        self.system
            .get_or_try_init(|| async {
                self.resolver
                    .collect_system(self.principal)
                    .await
                    .map(Arc::new)
            })
            .await
            .cloned()
    }

    /// The principal's codes in one organization. Empty for an inactive principal.
    pub async fn org_permissions(
        &self,
        organization: OrganizationId,
    ) -> Result<Arc<PermissionSet>, Error> {
        if !self.active().await? {
            return Ok(Arc::new(PermissionSet::default()));
        }

        let mut orgs = self.orgs.lock().await;
        if let Some(set) = orgs.get(&organization) {
            return Ok(set.clone());
        }

        let set = Arc::new(
            self.resolver
                .collect_org(self.principal, organization)
                .await?,
        );
        orgs.insert(organization, set.clone());
        Ok(set)
    }

    pub async fn is_superadmin(&self) -> Result<bool, Error> {
        Ok(self.system_permissions().await?.contains(SUPERADMIN))
    }

    pub async fn has_system(&self, code: &str) -> Result<bool, Error> {
        let system = self.system_permissions().await?;
        Ok(system.contains(SUPERADMIN) || system.contains(code))
    }

    pub async fn has_org(&self, organization: OrganizationId, code: &str) -> Result<bool, Error> {
        if self.is_superadmin().await? {
            return Ok(true);
        }

        Ok(self.org_permissions(organization).await?.contains(code))
    }

    pub async fn require_system(&self, code: SystemCode) -> Result<(), Error> {
        if self.has_system(code.as_str()).await? {
            Ok(())
        } else {
            Err(Error::MissingPermission(code.to_string()))
        }
    }

    pub async fn require_org(
        &self,
        organization: OrganizationId,
        code: OrgCode,
    ) -> Result<(), Error> {
        if self.has_org(organization, code.as_str()).await? {
            Ok(())
        } else {
            Err(Error::MissingPermission(code.to_string()))
        }
    }
}

impl std::fmt::Debug for RequestPermissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPermissions")
            .field("principal", &self.principal)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use uuid::Uuid;

    use super::PermissionEvaluator;
    use crate::{
        memory::MemoryStore,
        registry::{OrgCode, SystemCode, SUPERADMIN},
        Error,
    };

    fn setup() -> (Arc<MemoryStore>, PermissionEvaluator) {
        let store = Arc::new(MemoryStore::new());
        let evaluator = PermissionEvaluator::new(store.clone());
        (store, evaluator)
    }

    #[tokio::test]
    async fn inactive_principal_holds_nothing() {
        let (store, evaluator) = setup();
        let org = Uuid::new_v4();
        let user = store.add_principal(true);

        let sys = store.add_system_group(&[SUPERADMIN, "system.users.view"]);
        store.assign_system_group(sys, user);
        let template = store.add_template_group(&["org.info.view"]);
        store.assign_template_group(template, user, org);

        assert!(evaluator
            .has_system_permission(user, "system.users.view")
            .await
            .unwrap());

        store.set_active(user, false);

        for code in ["system.users.view", SUPERADMIN, "system.anything"] {
            assert!(
                !evaluator.has_system_permission(user, code).await.unwrap(),
                "{code} denied after deactivation"
            );
        }
        assert!(!evaluator
            .has_org_permission(user, org, "org.info.view")
            .await
            .unwrap());
        assert!(!evaluator
            .has_org_permission(user, Uuid::new_v4(), "org.news.edit")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn unknown_principal_holds_nothing() {
        let (_store, evaluator) = setup();
        let user = Uuid::new_v4();
        assert!(!evaluator
            .has_system_permission(user, "system.users.view")
            .await
            .unwrap());
        assert!(!evaluator
            .has_org_permission(user, Uuid::new_v4(), "org.info.view")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn superadmin_bypasses_everything() {
        let (store, evaluator) = setup();
        let user = store.add_principal(true);
        let sys = store.add_system_group(&[SUPERADMIN]);
        store.assign_system_group(sys, user);

        for code in ["system.users.manage", "system.not.registered"] {
            assert!(evaluator.has_system_permission(user, code).await.unwrap());
        }

        for _ in 0..3 {
            let org = Uuid::new_v4();
            for code in ["org.info.edit", "org.news.delete", "org.unlisted"] {
                assert!(evaluator.has_org_permission(user, org, code).await.unwrap());
            }
        }
    }

    #[tokio::test]
    async fn revoking_one_of_two_grants_keeps_access() {
        let (store, evaluator) = setup();
        let org = Uuid::new_v4();
        let user = store.add_principal(true);

        let template = store.add_template_group(&["org.news.edit"]);
        let custom = store.add_custom_group(org, &["org.news.edit"]);
        store.assign_template_group(template, user, org);
        store.assign_custom_group(custom, user);

        store.remove_template_member(template, user, org);
        assert!(evaluator
            .has_org_permission(user, org, "org.news.edit")
            .await
            .unwrap());

        store.remove_custom_member(custom, user);
        assert!(
            !evaluator
                .has_org_permission(user, org, "org.news.edit")
                .await
                .unwrap(),
            "revocation applies on the next check"
        );
    }

    #[tokio::test]
    async fn two_custom_groups_union() {
        let (store, evaluator) = setup();
        let org = Uuid::new_v4();
        let user = store.add_principal(true);

        let g1 = store.add_custom_group(org, &["org.info.view"]);
        let g2 = store.add_custom_group(org, &["org.info.view", "org.info.edit"]);
        store.assign_custom_group(g1, user);
        store.assign_custom_group(g2, user);

        store.remove_custom_member(g1, user);
        assert!(evaluator
            .has_org_permission(user, org, "org.info.view")
            .await
            .unwrap());
        assert!(evaluator
            .has_org_permission(user, org, "org.info.edit")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn org_grant_does_not_leak_to_other_organizations() {
        let (store, evaluator) = setup();
        let o1 = Uuid::new_v4();
        let o2 = Uuid::new_v4();
        let user = store.add_principal(true);

        let template = store.add_template_group(&["org.info.edit"]);
        store.assign_template_group(template, user, o1);

        assert!(evaluator
            .has_org_permission(user, o1, "org.info.edit")
            .await
            .unwrap());
        assert!(!evaluator
            .has_org_permission(user, o2, "org.info.edit")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn org_grant_never_satisfies_system_check() {
        let (store, evaluator) = setup();
        let org = Uuid::new_v4();
        let user = store.add_principal(true);

        // A code that is spelled like a system code, granted through an org group.
        let custom = store.add_custom_group(
            org,
            &["org.users.view", "system.users.view", "org.info.edit"],
        );
        store.assign_custom_group(custom, user);

        for code in ["system.users.view", "org.users.view", "org.info.edit", SUPERADMIN] {
            assert!(!evaluator.has_system_permission(user, code).await.unwrap());
        }
    }

    #[tokio::test]
    async fn system_grant_never_satisfies_org_check() {
        let (store, evaluator) = setup();
        let user = store.add_principal(true);
        let sys = store.add_system_group(&["org.info.view", "system.organizations.manage"]);
        store.assign_system_group(sys, user);

        assert!(!evaluator
            .has_org_permission(user, Uuid::new_v4(), "org.info.view")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn editors_scenario() {
        let (store, evaluator) = setup();
        let org = Uuid::new_v4();
        let user = store.add_principal(true);
        let editors = store.add_custom_group(org, &["org.news.edit"]);
        store.assign_custom_group(editors, user);

        assert!(evaluator
            .has_org_permission(user, org, "org.news.edit")
            .await
            .unwrap());
        assert!(!evaluator
            .has_org_permission(user, org, "org.news.delete")
            .await
            .unwrap());
        assert!(!evaluator
            .has_system_permission(user, "system.organizations.manage")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn request_memo_resolves_each_scope_once() {
        let (store, evaluator) = setup();
        let org = Uuid::new_v4();
        let user = store.add_principal(true);
        let sys = store.add_system_group(&["system.users.view"]);
        store.assign_system_group(sys, user);
        let template = store.add_template_group(&["org.info.view"]);
        store.assign_template_group(template, user, org);

        let perms = evaluator.for_principal(user);
        for code in OrgCode::ALL {
            perms.has_org(org, code.as_str()).await.unwrap();
        }
        for code in SystemCode::ALL {
            perms.has_system(code.as_str()).await.unwrap();
        }

        // One status lookup, one system lookup, and one template plus one custom lookup.
        assert_eq!(store.status_lookups(), 1);
        assert_eq!(store.membership_lookups(), 3);

        // A new request sees new state.
        store.remove_template_member(template, user, org);
        assert!(!evaluator
            .for_principal(user)
            .has_org(org, "org.info.view")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn require_reports_missing_code() {
        let (store, evaluator) = setup();
        let user = store.add_principal(true);
        let perms = evaluator.for_principal(user);

        let err = perms
            .require_system(SystemCode::OrganizationsManage)
            .await
            .unwrap_err();
        assert_matches!(err, Error::MissingPermission(code) if code == "system.organizations.manage");

        let err = perms
            .require_org(Uuid::new_v4(), OrgCode::NewsDelete)
            .await
            .unwrap_err();
        assert_matches!(err, Error::MissingPermission(code) if code == "org.news.delete");
    }

    #[tokio::test]
    async fn store_outage_is_an_error_not_a_grant() {
        let (store, evaluator) = setup();
        let user = store.add_principal(true);
        let sys = store.add_system_group(&[SUPERADMIN]);
        store.assign_system_group(sys, user);
        store.set_unavailable(true);

        let err = evaluator
            .has_system_permission(user, "system.users.view")
            .await
            .unwrap_err();
        assert_matches!(err, Error::StoreUnavailable(_));

        let err = evaluator
            .has_org_permission(user, Uuid::new_v4(), "org.info.view")
            .await
            .unwrap_err();
        assert_matches!(err, Error::StoreUnavailable(_));
    }
}
