use serde_json::json;

use crate::error::{ValidationError, Violation};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{ctx, parse_params, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{digits, Role, SchoolProfile};
use crate::state::Action;
use crate::store::keys;

/// One-time school setup. The profile is a singleton: once configured it
/// can only change through the credential-change operation.
fn handle_setup(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;

    let existing: Option<SchoolProfile> = c.store.read_or(keys::SCHOOL_SETUP, None);
    if existing.is_some() {
        return Err(HandlerErr::conflict("school setup already completed"));
    }

    let profile: SchoolProfile = parse_params(&req.params)?;
    let violations = profile.field_violations();
    if !violations.is_empty() {
        return Err(ValidationError::new(violations).into());
    }

    c.store.write(keys::SCHOOL_SETUP, &profile);
    c.sync.push_document("school/setup", keys::SCHOOL_SETUP, &profile);
    c.container.dispatch(c.store, Action::SetSchoolData(profile.clone()));

    Ok(json!({ "schoolName": profile.school_name }))
}

fn handle_get(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let c = ctx(state)?;
    let profile: Option<SchoolProfile> = c.store.read_or(keys::SCHOOL_SETUP, None);
    Ok(json!({ "school": profile }))
}

/// Rewrites the principal's mobile, which is also the login credential.
/// This is the only mutation the profile allows after setup.
fn handle_change_credential(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    let session = c.require_role(Role::Principal)?;

    let current = required_str(&req.params, "currentMobile")?;
    let new = required_str(&req.params, "newMobile")?;
    let confirm = required_str(&req.params, "confirmMobile")?;

    let mut violations = Vec::new();
    if !digits(&current, 10) {
        violations.push(Violation::new("currentMobile", "currentMobile must be exactly 10 digits"));
    }
    if !digits(&new, 10) {
        violations.push(Violation::new("newMobile", "newMobile must be exactly 10 digits"));
    }
    if new != confirm {
        violations.push(Violation::new("confirmMobile", "mobile numbers do not match"));
    }
    if !violations.is_empty() {
        return Err(ValidationError::new(violations).into());
    }

    let profile: Option<SchoolProfile> = c.store.read_or(keys::SCHOOL_SETUP, None);
    let Some(mut profile) = profile else {
        return Err(HandlerErr::not_found("school setup not found"));
    };
    if current != profile.principal_mobile {
        return Err(ValidationError::new(vec![Violation::new(
            "currentMobile",
            "current mobile number is incorrect",
        )])
        .into());
    }

    profile.principal_mobile = new.clone();
    c.store.write(keys::SCHOOL_SETUP, &profile);
    c.sync.push_document("school/setup", keys::SCHOOL_SETUP, &profile);
    c.container.dispatch(c.store, Action::SetSchoolData(profile));

    // Keep the live session usable under the new credential.
    let mut session = session;
    session.mobile = new;
    c.store.write(keys::USER, &session);
    c.sync.set_bearer(Some(session.mobile.clone()));
    c.container.dispatch(c.store, Action::SetUser(Some(session)));

    Ok(json!({ "changed": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "school.setup" => Some(respond(&req.id, handle_setup(state, req))),
        "school.get" => Some(respond(&req.id, handle_get(state, req))),
        "school.changeCredential" => {
            Some(respond(&req.id, handle_change_credential(state, req)))
        }
        _ => None,
    }
}
