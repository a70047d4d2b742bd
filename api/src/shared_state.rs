use std::sync::Arc;

use orgdesk_auth::{PermissionEvaluator, PermissionRegistry};

pub struct InnerState {
    pub production: bool,
    pub db: orgdesk_db::Pool,
    pub evaluator: PermissionEvaluator,
    pub registry: PermissionRegistry,
}

pub type AppState = Arc<InnerState>;
