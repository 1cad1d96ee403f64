use serde_json::json;

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{ctx, required_i64, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{RegisterNumbers, Role, Student};
use crate::repo::Repository;
use crate::store::keys;

fn handle_get(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let c = ctx(state)?;
    c.require_session()?;
    let numbers: RegisterNumbers = c.store.read_or(keys::GENERAL_REGISTER, RegisterNumbers::new());
    Ok(json!({ "numbers": numbers }))
}

/// Assign or overwrite one student's general register number. The map is
/// keyed by student id and saved whole.
fn handle_set(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    c.require_role(Role::Principal)?;

    let student_id = required_i64(&req.params, "studentId")?;
    let number = required_str(&req.params, "number")?;
    if number.trim().is_empty() {
        return Err(HandlerErr::bad_params("number must not be empty"));
    }

    let students = Repository::<Student>::open(c.store, c.sync, keys::STUDENTS);
    if students.find_by(|s| s.id == student_id).is_none() {
        return Err(HandlerErr::not_found("student not found"));
    }

    let mut numbers: RegisterNumbers =
        c.store.read_or(keys::GENERAL_REGISTER, RegisterNumbers::new());
    numbers.insert(student_id.to_string(), number.trim().to_string());
    c.store.write(keys::GENERAL_REGISTER, &numbers);
    c.sync.push_document("register", keys::GENERAL_REGISTER, &numbers);

    Ok(json!({ "numbers": numbers }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "register.get" => Some(respond(&req.id, handle_get(state, req))),
        "register.set" => Some(respond(&req.id, handle_set(state, req))),
        _ => None,
    }
}
