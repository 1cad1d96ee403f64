use serde_json::json;

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{ctx, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceSheet, Role};
use crate::state::Action;
use crate::store::keys;

/// Save one class's attendance for one day. The sheet is a full overwrite:
/// whatever was stored for that (class, date) before is replaced, never
/// merged.
fn handle_save(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    let session = c.require_role(Role::Teacher)?;
    let class = c.scoped_class(&session, optional_str(&req.params, "class"))?;
    let date = required_str(&req.params, "date")?;

    let Some(entries) = req.params.get("entries") else {
        return Err(HandlerErr::bad_params("missing entries"));
    };
    let sheet: AttendanceSheet = serde_json::from_value(entries.clone())
        .map_err(|e| HandlerErr::bad_params(format!("entries must map student ids to booleans: {}", e)))?;

    let key = keys::attendance(&class, &date);
    c.store.write(&key, &sheet);
    c.sync.push_document("attendance", &key, &sheet);
    c.container.dispatch(c.store, Action::SetAttendance(sheet.clone()));

    Ok(json!({ "class": class, "date": date, "saved": sheet.len() }))
}

fn handle_get(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let c = ctx(state)?;
    let session = c.require_session()?;
    let class = c.scoped_class(&session, optional_str(&req.params, "class"))?;
    let date = required_str(&req.params, "date")?;

    let sheet: AttendanceSheet = c
        .store
        .read_or(&keys::attendance(&class, &date), AttendanceSheet::new());
    Ok(json!({ "class": class, "date": date, "entries": sheet }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.save" => Some(respond(&req.id, handle_save(state, req))),
        "attendance.get" => Some(respond(&req.id, handle_get(state, req))),
        _ => None,
    }
}
