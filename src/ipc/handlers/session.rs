use serde_json::json;

use crate::auth;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{ctx, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{Role, Teacher};
use crate::repo::Repository;
use crate::store::keys;

fn parse_role(raw: &str) -> Result<Role, HandlerErr> {
    match raw {
        "principal" => Ok(Role::Principal),
        "teacher" => Ok(Role::Teacher),
        _ => Err(HandlerErr::bad_params("role must be principal or teacher")),
    }
}

fn handle_login(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    let mobile = required_str(&req.params, "mobile")?;
    let password = required_str(&req.params, "password")?;
    let role = parse_role(&required_str(&req.params, "role")?)?;

    let session = auth::login(c.store, c.sync, c.container, &mobile, &password, role)?;
    Ok(json!({ "user": session }))
}

fn handle_logout(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let c = ctx(state)?;
    auth::logout(c.store, c.sync, c.container);
    Ok(json!({ "loggedOut": true }))
}

fn handle_session(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let c = ctx(state)?;
    Ok(json!({ "user": c.container.snapshot().user }))
}

/// Mobile-as-password makes a reset a statement, not a mutation: the
/// teacher's password is their registered mobile, always. The principal
/// uses this to confirm a teacher exists before telling them so.
fn handle_reset_password(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    c.require_role(Role::Principal)?;
    let mobile = required_str(&req.params, "mobile")?;

    let repo = Repository::<Teacher>::open(c.store, c.sync, keys::TEACHERS);
    let Some(teacher) = repo.find_by(|t| t.mobile == mobile && t.is_active) else {
        return Err(HandlerErr::not_found("no teacher with that mobile"));
    };
    Ok(json!({
        "reset": true,
        "teacher": teacher.name,
        "note": "the password is the registered mobile number"
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(respond(&req.id, handle_login(state, req))),
        "auth.logout" => Some(respond(&req.id, handle_logout(state, req))),
        "auth.session" => Some(respond(&req.id, handle_session(state, req))),
        "auth.resetPassword" => Some(respond(&req.id, handle_reset_password(state, req))),
        _ => None,
    }
}
