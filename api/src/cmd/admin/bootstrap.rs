use clap::Args;
use diesel::prelude::*;
use eyre::{eyre, Result};

use db::{
    object_id::{OrgPermissionId, SystemGroupId, SystemPermissionId, UserId},
    permissions::{org_permissions, system_permissions, NewOrgPermission, NewSystemPermission},
    system_groups::{NewSystemGroup, SystemGroupMember},
    users::NewUser,
};
use orgdesk_auth::{PermissionRegistry, SUPERADMIN};
use orgdesk_db as db;

const GROUP_NAME: &str = "Superadmins";

#[derive(Debug, Args)]
pub struct BootstrapArgs {
    /// The email of the user to promote. The user is created if it does not exist.
    #[clap(long)]
    email: String,
    /// Display name for a newly created user
    #[clap(long, default_value_t = String::from("Administrator"))]
    name: String,
}

pub fn bootstrap(conn: &mut PgConnection, args: BootstrapArgs) -> Result<()> {
    let applied = db::run_migrations(conn).map_err(|e| eyre!(e))?;
    for version in applied {
        println!("Applied migration {version}");
    }

    let user_id = conn.transaction(|conn| {
        let added = seed_builtin_permissions(conn)?;
        if added > 0 {
            println!("Added {added} missing built-in permission codes");
        }

        let user_id = find_or_create_user(conn, &args)?;
        let group_id = find_or_create_group(conn)?;

        diesel::insert_into(db::system_groups::system_group_members::table)
            .values(SystemGroupMember {
                system_group_id: group_id,
                user_id,
            })
            .on_conflict_do_nothing()
            .execute(conn)?;

        Ok::<_, eyre::Report>(user_id)
    })?;

    println!("{user_id}");
    Ok(())
}

/// Insert any built-in code that the permission tables lack, such as codes added to the
/// registry after the database was created. Existing rows are left alone.
fn seed_builtin_permissions(conn: &mut PgConnection) -> Result<usize> {
    let system = PermissionRegistry::builtin_system_permissions()
        .into_iter()
        .map(|p| NewSystemPermission {
            system_permission_id: SystemPermissionId::new(),
            code: p.code,
            description: p.description,
        })
        .collect::<Vec<_>>();

    let org = PermissionRegistry::builtin_org_permissions()
        .into_iter()
        .map(|p| NewOrgPermission {
            org_permission_id: OrgPermissionId::new(),
            code: p.code,
            description: p.description,
        })
        .collect::<Vec<_>>();

    let system_added = diesel::insert_into(system_permissions::table)
        .values(&system)
        .on_conflict(system_permissions::code)
        .do_nothing()
        .execute(conn)?;

    let org_added = diesel::insert_into(org_permissions::table)
        .values(&org)
        .on_conflict(org_permissions::code)
        .do_nothing()
        .execute(conn)?;

    Ok(system_added + org_added)
}

fn find_or_create_user(conn: &mut PgConnection, args: &BootstrapArgs) -> Result<UserId> {
    let existing = db::users::table
        .select(db::users::user_id)
        .filter(db::users::email.eq(&args.email))
        .first::<UserId>(conn)
        .optional()?;

    if let Some(user_id) = existing {
        diesel::update(db::users::table)
            .filter(db::users::user_id.eq(user_id))
            .set(db::users::active.eq(true))
            .execute(conn)?;
        return Ok(user_id);
    }

    let user_id = UserId::new();
    diesel::insert_into(db::users::table)
        .values(NewUser {
            user_id,
            email: args.email.clone(),
            name: args.name.clone(),
            active: true,
        })
        .execute(conn)?;
    Ok(user_id)
}

/// The group is matched by name; its bundle is reset to the superadmin code either way.
fn find_or_create_group(conn: &mut PgConnection) -> Result<SystemGroupId> {
    let existing = db::system_groups::table
        .select(db::system_groups::system_group_id)
        .filter(db::system_groups::name.eq(GROUP_NAME))
        .first::<SystemGroupId>(conn)
        .optional()?;

    let group_id = match existing {
        Some(id) => id,
        None => {
            let id = SystemGroupId::new();
            diesel::insert_into(db::system_groups::table)
                .values(NewSystemGroup {
                    system_group_id: id,
                    name: GROUP_NAME.to_string(),
                    description: "Full access to both consoles".to_string(),
                })
                .execute(conn)?;
            id
        }
    };

    let (ids, missing) = db::permissions::system_permission_ids(conn, &[SUPERADMIN.to_string()])?;
    if !missing.is_empty() {
        return Err(eyre!("{SUPERADMIN} is missing from the permission table"));
    }
    db::system_groups::set_permissions(conn, group_id, &ids)?;

    Ok(group_id)
}
