use std::{fmt::Display, ops::Deref, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;

use crate::Error;

/// Holding this system permission satisfies every system and organization check.
pub const SUPERADMIN: &str = "system.superadmin";

/// The system permission codes that the console itself checks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SystemCode {
    Superadmin,
    UsersView,
    UsersManage,
    OrganizationsView,
    OrganizationsManage,
    PermissionsView,
    PermissionsManage,
    GroupsView,
    GroupsManage,
    TemplateGroupsView,
    TemplateGroupsManage,
    CustomGroupsManage,
}

impl SystemCode {
    pub const ALL: [SystemCode; 12] = [
        SystemCode::Superadmin,
        SystemCode::UsersView,
        SystemCode::UsersManage,
        SystemCode::OrganizationsView,
        SystemCode::OrganizationsManage,
        SystemCode::PermissionsView,
        SystemCode::PermissionsManage,
        SystemCode::GroupsView,
        SystemCode::GroupsManage,
        SystemCode::TemplateGroupsView,
        SystemCode::TemplateGroupsManage,
        SystemCode::CustomGroupsManage,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            SystemCode::Superadmin => SUPERADMIN,
            SystemCode::UsersView => "system.users.view",
            SystemCode::UsersManage => "system.users.manage",
            SystemCode::OrganizationsView => "system.organizations.view",
            SystemCode::OrganizationsManage => "system.organizations.manage",
            SystemCode::PermissionsView => "system.permissions.view",
            SystemCode::PermissionsManage => "system.permissions.manage",
            SystemCode::GroupsView => "system.groups.view",
            SystemCode::GroupsManage => "system.groups.manage",
            SystemCode::TemplateGroupsView => "system.template_groups.view",
            SystemCode::TemplateGroupsManage => "system.template_groups.manage",
            SystemCode::CustomGroupsManage => "system.custom_groups.manage",
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            SystemCode::Superadmin => "Unrestricted access to every console",
            SystemCode::UsersView => "View system users",
            SystemCode::UsersManage => "Create, edit and deactivate system users",
            SystemCode::OrganizationsView => "View organizations",
            SystemCode::OrganizationsManage => "Create, edit and delete organizations",
            SystemCode::PermissionsView => "View permission codes",
            SystemCode::PermissionsManage => "Create and delete permission codes",
            SystemCode::GroupsView => "View system permission groups",
            SystemCode::GroupsManage => "Manage system permission groups and their members",
            SystemCode::TemplateGroupsView => "View organization template groups",
            SystemCode::TemplateGroupsManage => {
                "Manage organization template groups and their members"
            }
            SystemCode::CustomGroupsManage => {
                "Manage organization custom groups and their members"
            }
        }
    }
}

/// The organization permission codes that the console itself checks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OrgCode {
    InfoView,
    InfoEdit,
    GroupsView,
    DepartmentsView,
    DepartmentsEdit,
    DepartmentsDelete,
    NewsView,
    NewsEdit,
    NewsDelete,
}

impl OrgCode {
    pub const ALL: [OrgCode; 9] = [
        OrgCode::InfoView,
        OrgCode::InfoEdit,
        OrgCode::GroupsView,
        OrgCode::DepartmentsView,
        OrgCode::DepartmentsEdit,
        OrgCode::DepartmentsDelete,
        OrgCode::NewsView,
        OrgCode::NewsEdit,
        OrgCode::NewsDelete,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrgCode::InfoView => "org.info.view",
            OrgCode::InfoEdit => "org.info.edit",
            OrgCode::GroupsView => "org.groups.view",
            OrgCode::DepartmentsView => "org.departments.view",
            OrgCode::DepartmentsEdit => "org.departments.edit",
            OrgCode::DepartmentsDelete => "org.departments.delete",
            OrgCode::NewsView => "org.news.view",
            OrgCode::NewsEdit => "org.news.edit",
            OrgCode::NewsDelete => "org.news.delete",
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            OrgCode::InfoView => "View organization details",
            OrgCode::InfoEdit => "Edit organization details",
            OrgCode::GroupsView => "View the organization's permission groups",
            OrgCode::DepartmentsView => "View departments",
            OrgCode::DepartmentsEdit => "Create, edit and reorder departments",
            OrgCode::DepartmentsDelete => "Delete departments",
            OrgCode::NewsView => "View news",
            OrgCode::NewsEdit => "Create and edit news",
            OrgCode::NewsDelete => "Delete news",
        }
    }
}

macro_rules! code_traits {
    ($t: ty) => {
        impl Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Deref for $t {
            type Target = str;

            fn deref(&self) -> &'static Self::Target {
                self.as_str()
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }
    };
}

code_traits!(SystemCode);
code_traits!(OrgCode);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionInfo {
    pub code: String,
    pub description: String,
}

impl PermissionInfo {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        PermissionInfo {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// Read access to the permission codes stored in the database.
#[async_trait]
pub trait PermissionCatalog: Send + Sync {
    async fn system_permissions(&self) -> Result<Vec<PermissionInfo>, Error>;
    async fn org_permissions(&self) -> Result<Vec<PermissionInfo>, Error>;
}

#[derive(Clone)]
pub struct PermissionRegistry {
    catalog: Arc<dyn PermissionCatalog>,
}

impl PermissionRegistry {
    pub fn new(catalog: Arc<dyn PermissionCatalog>) -> Self {
        PermissionRegistry { catalog }
    }

    pub async fn list_system_permissions(&self) -> Result<Vec<PermissionInfo>, Error> {
        let mut perms = self.catalog.system_permissions().await?;
        perms.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(perms)
    }

    pub async fn list_org_permissions(&self) -> Result<Vec<PermissionInfo>, Error> {
        let mut perms = self.catalog.org_permissions().await?;
        perms.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(perms)
    }

    /// The system codes that every installation starts with.
    pub fn builtin_system_permissions() -> Vec<PermissionInfo> {
        SystemCode::ALL
            .iter()
            .map(|c| PermissionInfo::new(c.as_str(), c.description()))
            .collect()
    }

    /// The organization codes that every installation starts with.
    pub fn builtin_org_permissions() -> Vec<PermissionInfo> {
        OrgCode::ALL
            .iter()
            .map(|c| PermissionInfo::new(c.as_str(), c.description()))
            .collect()
    }
}

impl std::fmt::Debug for PermissionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionRegistry").finish_non_exhaustive()
    }
}
