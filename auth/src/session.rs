use async_trait::async_trait;

use crate::{store::PrincipalId, Error};

/// The identity collaborator: maps an opaque session token to the principal it belongs to.
#[async_trait]
pub trait SessionLookup: Send + Sync {
    /// `None` when the token is unknown or expired.
    async fn principal_for_session(&self, token: &str) -> Result<Option<PrincipalId>, Error>;
}
