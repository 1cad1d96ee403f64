use serde::de::DeserializeOwned;

use crate::auth;
use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use crate::model::{Role, Session};
use crate::state::StateContainer;
use crate::store::Store;
use crate::sync::SyncHandle;

/// Split borrows over the daemon state for one handler invocation.
pub struct Ctx<'a> {
    pub store: &'a Store,
    pub sync: &'a SyncHandle,
    pub container: &'a mut StateContainer,
}

pub fn ctx(state: &mut AppState) -> Result<Ctx<'_>, HandlerErr> {
    let Some(store) = state.store.as_ref() else {
        return Err(HandlerErr::no_workspace());
    };
    Ok(Ctx {
        store,
        sync: &state.sync,
        container: &mut state.container,
    })
}

impl Ctx<'_> {
    /// Role gate for a scoped operation; on mismatch the session is cleared
    /// so the host falls back to the login screen.
    pub fn require_role(&mut self, expected: Role) -> Result<Session, HandlerErr> {
        auth::require_role(self.store, self.sync, self.container, expected).map_err(|e| e.into())
    }

    pub fn require_session(&self) -> Result<Session, HandlerErr> {
        auth::require_session(self.container).map_err(|e| e.into())
    }

    /// The class an operation is scoped to: teachers always act on their
    /// own class; other callers must name one.
    pub fn scoped_class(
        &self,
        session: &Session,
        requested: Option<String>,
    ) -> Result<String, HandlerErr> {
        if let Some(active) = session.class_assigned.as_ref() {
            if let Some(req) = requested {
                if &req != active {
                    return Err(HandlerErr {
                        code: "unauthorized",
                        message: "operation limited to the assigned class".to_string(),
                        details: None,
                    });
                }
            }
            return Ok(active.clone());
        }
        requested.ok_or_else(|| HandlerErr::bad_params("missing class"))
    }
}

pub fn required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

pub fn required_i64(params: &serde_json::Value, key: &str) -> Result<i64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Decode the request params into a typed record.
pub fn parse_params<T: DeserializeOwned>(params: &serde_json::Value) -> Result<T, HandlerErr> {
    serde_json::from_value(params.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid params: {}", e)))
}
