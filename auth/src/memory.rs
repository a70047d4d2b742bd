//! An in-memory permission store, used in tests in place of the database.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex, MutexGuard,
    },
};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    registry::{PermissionCatalog, PermissionInfo},
    session::SessionLookup,
    store::{OrganizationId, PermissionStore, PrincipalId},
    Error,
};

#[derive(Default)]
struct Data {
    principals: HashMap<PrincipalId, bool>,
    system_permissions: BTreeMap<String, String>,
    org_permissions: BTreeMap<String, String>,
    system_groups: HashMap<Uuid, Vec<String>>,
    system_members: Vec<(Uuid, PrincipalId)>,
    template_groups: HashMap<Uuid, Vec<String>>,
    template_members: Vec<(Uuid, PrincipalId, OrganizationId)>,
    custom_groups: HashMap<Uuid, (OrganizationId, Vec<String>)>,
    custom_members: Vec<(Uuid, PrincipalId)>,
    sessions: HashMap<String, PrincipalId>,
}

#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<Data>,
    unavailable: AtomicBool,
    status_lookups: AtomicUsize,
    membership_lookups: AtomicUsize,
}

fn to_codes(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> MutexGuard<'_, Data> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> Result<(), Error> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(Error::store(anyhow::anyhow!("memory store marked unavailable")))
        } else {
            Ok(())
        }
    }

    /// Make every lookup fail, as if the database could not be reached.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn status_lookups(&self) -> usize {
        self.status_lookups.load(Ordering::SeqCst)
    }

    pub fn membership_lookups(&self) -> usize {
        self.membership_lookups.load(Ordering::SeqCst)
    }

    pub fn add_principal(&self, active: bool) -> PrincipalId {
        let id = Uuid::new_v4();
        self.data().principals.insert(id, active);
        id
    }

    pub fn set_active(&self, principal: PrincipalId, active: bool) {
        self.data().principals.insert(principal, active);
    }

    pub fn add_system_permission(&self, code: &str, description: &str) {
        self.data()
            .system_permissions
            .insert(code.to_string(), description.to_string());
    }

    pub fn add_org_permission(&self, code: &str, description: &str) {
        self.data()
            .org_permissions
            .insert(code.to_string(), description.to_string());
    }

    pub fn add_system_group(&self, codes: &[&str]) -> Uuid {
        let id = Uuid::new_v4();
        self.data().system_groups.insert(id, to_codes(codes));
        id
    }

    pub fn assign_system_group(&self, group: Uuid, principal: PrincipalId) {
        self.data().system_members.push((group, principal));
    }

    pub fn remove_system_member(&self, group: Uuid, principal: PrincipalId) {
        self.data()
            .system_members
            .retain(|m| *m != (group, principal));
    }

    pub fn add_template_group(&self, codes: &[&str]) -> Uuid {
        let id = Uuid::new_v4();
        self.data().template_groups.insert(id, to_codes(codes));
        id
    }

    pub fn assign_template_group(
        &self,
        group: Uuid,
        principal: PrincipalId,
        organization: OrganizationId,
    ) {
        self.data()
            .template_members
            .push((group, principal, organization));
    }

    pub fn remove_template_member(
        &self,
        group: Uuid,
        principal: PrincipalId,
        organization: OrganizationId,
    ) {
        self.data()
            .template_members
            .retain(|m| *m != (group, principal, organization));
    }

    pub fn add_custom_group(&self, organization: OrganizationId, codes: &[&str]) -> Uuid {
        let id = Uuid::new_v4();
        self.data()
            .custom_groups
            .insert(id, (organization, to_codes(codes)));
        id
    }

    pub fn assign_custom_group(&self, group: Uuid, principal: PrincipalId) {
        self.data().custom_members.push((group, principal));
    }

    pub fn remove_custom_member(&self, group: Uuid, principal: PrincipalId) {
        self.data()
            .custom_members
            .retain(|m| *m != (group, principal));
    }

    pub fn add_session(&self, token: &str, principal: PrincipalId) {
        self.data().sessions.insert(token.to_string(), principal);
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn principal_status(&self, principal: PrincipalId) -> Result<Option<bool>, Error> {
        self.check_available()?;
        self.status_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.data().principals.get(&principal).copied())
    }

    async fn system_permission_codes(&self, principal: PrincipalId) -> Result<Vec<String>, Error> {
        self.check_available()?;
        self.membership_lookups.fetch_add(1, Ordering::SeqCst);
        let data = self.data();
        let codes = data
            .system_members
            .iter()
            .filter(|(_, p)| *p == principal)
            .filter_map(|(g, _)| data.system_groups.get(g))
            .flatten()
            .cloned()
            .collect();
        Ok(codes)
    }

    async fn template_permission_codes(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
    ) -> Result<Vec<String>, Error> {
        self.check_available()?;
        self.membership_lookups.fetch_add(1, Ordering::SeqCst);
        let data = self.data();
        let codes = data
            .template_members
            .iter()
            .filter(|(_, p, o)| *p == principal && *o == organization)
            .filter_map(|(g, _, _)| data.template_groups.get(g))
            .flatten()
            .cloned()
            .collect();
        Ok(codes)
    }

    async fn custom_permission_codes(
        &self,
        principal: PrincipalId,
        organization: OrganizationId,
    ) -> Result<Vec<String>, Error> {
        self.check_available()?;
        self.membership_lookups.fetch_add(1, Ordering::SeqCst);
        let data = self.data();
        let codes = data
            .custom_members
            .iter()
            .filter(|(_, p)| *p == principal)
            .filter_map(|(g, _)| data.custom_groups.get(g))
            .filter(|(org, _)| *org == organization)
            .flat_map(|(_, codes)| codes)
            .cloned()
            .collect();
        Ok(codes)
    }
}

#[async_trait]
impl PermissionCatalog for MemoryStore {
    async fn system_permissions(&self) -> Result<Vec<PermissionInfo>, Error> {
        self.check_available()?;
        Ok(self
            .data()
            .system_permissions
            .iter()
            .rev()
            .map(|(code, desc)| PermissionInfo::new(code, desc))
            .collect())
    }

    async fn org_permissions(&self) -> Result<Vec<PermissionInfo>, Error> {
        self.check_available()?;
        Ok(self
            .data()
            .org_permissions
            .iter()
            .rev()
            .map(|(code, desc)| PermissionInfo::new(code, desc))
            .collect())
    }
}

#[async_trait]
impl SessionLookup for MemoryStore {
    async fn principal_for_session(&self, token: &str) -> Result<Option<PrincipalId>, Error> {
        self.check_available()?;
        Ok(self.data().sessions.get(token).copied())
    }
}
