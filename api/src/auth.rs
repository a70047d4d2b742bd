use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use diesel::prelude::*;
use orgdesk_auth::{
    AuthenticatedPrincipal, AuthenticationLayer, OrgCode, PermissionCatalog, PermissionInfo,
    PermissionStore, PrincipalId, RequestPermissions, SessionLookup, SystemCode,
};
use orgdesk_db::{
    self as db,
    object_id::{OrganizationId, SessionId, UserId},
    PoolExt,
};
use tracing::{event, Level};

use crate::{shared_state::AppState, Error};

/// The Postgres implementation of the lookups the authorization model needs.
#[derive(Clone)]
pub struct DbPermissionStore {
    pub db: db::Pool,
}

impl DbPermissionStore {
    pub fn new(db: db::Pool) -> Self {
        DbPermissionStore { db }
    }

    async fn query<F, T>(&self, f: F) -> Result<T, orgdesk_auth::Error>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        self.db.interact(f).await.map_err(orgdesk_auth::Error::store)
    }
}

#[async_trait]
impl PermissionStore for DbPermissionStore {
    async fn principal_status(
        &self,
        principal: PrincipalId,
    ) -> Result<Option<bool>, orgdesk_auth::Error> {
        self.query(move |conn| {
            db::users::active_status(conn, UserId::from_uuid(principal)).map_err(Error::from)
        })
        .await
    }

    async fn system_permission_codes(
        &self,
        principal: PrincipalId,
    ) -> Result<Vec<String>, orgdesk_auth::Error> {
        self.query(move |conn| {
            db::system_groups::codes_for_user(conn, UserId::from_uuid(principal))
                .map_err(Error::from)
        })
        .await
    }

    async fn template_permission_codes(
        &self,
        principal: PrincipalId,
        organization: orgdesk_auth::OrganizationId,
    ) -> Result<Vec<String>, orgdesk_auth::Error> {
        self.query(move |conn| {
            db::template_groups::codes_for_user_in_org(
                conn,
                UserId::from_uuid(principal),
                OrganizationId::from_uuid(organization),
            )
            .map_err(Error::from)
        })
        .await
    }

    async fn custom_permission_codes(
        &self,
        principal: PrincipalId,
        organization: orgdesk_auth::OrganizationId,
    ) -> Result<Vec<String>, orgdesk_auth::Error> {
        self.query(move |conn| {
            db::custom_groups::codes_for_user_in_org(
                conn,
                UserId::from_uuid(principal),
                OrganizationId::from_uuid(organization),
            )
            .map_err(Error::from)
        })
        .await
    }
}

#[async_trait]
impl PermissionCatalog for DbPermissionStore {
    async fn system_permissions(&self) -> Result<Vec<PermissionInfo>, orgdesk_auth::Error> {
        use db::permissions::system_permissions::dsl;
        self.query(|conn| {
            dsl::system_permissions
                .select((dsl::code, dsl::description))
                .load::<(String, String)>(conn)
                .map_err(Error::from)
        })
        .await
        .map(|rows| {
            rows.into_iter()
                .map(|(code, desc)| PermissionInfo::new(code, desc))
                .collect()
        })
    }

    async fn org_permissions(&self) -> Result<Vec<PermissionInfo>, orgdesk_auth::Error> {
        use db::permissions::org_permissions::dsl;
        self.query(|conn| {
            dsl::org_permissions
                .select((dsl::code, dsl::description))
                .load::<(String, String)>(conn)
                .map_err(Error::from)
        })
        .await
        .map(|rows| {
            rows.into_iter()
                .map(|(code, desc)| PermissionInfo::new(code, desc))
                .collect()
        })
    }
}

#[async_trait]
impl SessionLookup for DbPermissionStore {
    async fn principal_for_session(
        &self,
        token: &str,
    ) -> Result<Option<PrincipalId>, orgdesk_auth::Error> {
        // A token that does not even parse cannot match a session.
        let Ok(session_id) = SessionId::from_str(token) else {
            return Ok(None);
        };

        self.query(move |conn| {
            db::sessions::user_for_session(conn, session_id)
                .map(|user| user.map(UserId::into_inner))
                .map_err(Error::from)
        })
        .await
    }
}

pub fn auth_layer(sessions: Arc<dyn SessionLookup>) -> AuthenticationLayer {
    AuthenticationLayer::new(sessions)
}

/// The guard for every protected route. Extracting this fails with 401 when the request
/// carried no valid session. Handlers then call one of the `require_*` methods with the code
/// for their operation before touching the database.
pub struct Authenticated(pub RequestPermissions);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Error> {
        let principal = parts
            .extensions
            .get::<AuthenticatedPrincipal>()
            .ok_or(Error::Unauthenticated)?;

        Ok(Authenticated(state.evaluator.for_principal(principal.0)))
    }
}

impl Authenticated {
    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(self.0.principal())
    }

    pub async fn require_system(&self, code: SystemCode) -> Result<(), Error> {
        self.0
            .require_system(code)
            .await
            .map_err(|e| self.log_failure(e, None))
    }

    pub async fn require_org(
        &self,
        organization: OrganizationId,
        code: OrgCode,
    ) -> Result<(), Error> {
        self.0
            .require_org(organization.into_inner(), code)
            .await
            .map_err(|e| self.log_failure(e, Some(organization)))
    }

    fn log_failure(
        &self,
        err: orgdesk_auth::Error,
        organization: Option<OrganizationId>,
    ) -> Error {
        let principal = self.user_id();
        match &err {
            orgdesk_auth::Error::MissingPermission(code) => {
                event!(Level::INFO, %principal, ?organization, %code, "permission denied");
            }
            _ => {
                event!(Level::ERROR, %principal, ?organization, error = %err, "permission check failed");
            }
        }
        Error::from(err)
    }
}
