use std::collections::BTreeMap;

use serde_json::json;

use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{ctx, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{MarksRecord, Role};
use crate::store::keys;

/// Save marks for one (class, exam type, subject) sitting. Like attendance,
/// the record is a full overwrite of whatever was stored before.
fn handle_save(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut c = ctx(state)?;
    let session = c.require_role(Role::Teacher)?;
    let class = c.scoped_class(&session, optional_str(&req.params, "class"))?;
    let exam_type = required_str(&req.params, "examType")?;
    let subject = required_str(&req.params, "subject")?;

    let Some(raw) = req.params.get("marks") else {
        return Err(HandlerErr::bad_params("missing marks"));
    };
    let marks: BTreeMap<String, f64> = serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::bad_params(format!("marks must map student ids to numbers: {}", e)))?;
    let max_marks = req
        .params
        .get("maxMarks")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| HandlerErr::bad_params("missing maxMarks"))?;

    let mut record = MarksRecord {
        marks,
        max_marks,
        updated_at: String::new(),
    };
    record.stamp();

    let key = keys::marks(&class, &exam_type, &subject);
    c.store.write(&key, &record);
    c.sync.push_document("marks", &key, &record);

    Ok(json!({
        "class": class,
        "examType": exam_type,
        "subject": subject,
        "saved": record.marks.len(),
        "updatedAt": record.updated_at,
    }))
}

fn handle_get(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let c = ctx(state)?;
    let session = c.require_session()?;
    let class = c.scoped_class(&session, optional_str(&req.params, "class"))?;
    let exam_type = required_str(&req.params, "examType")?;
    let subject = required_str(&req.params, "subject")?;

    let record: Option<MarksRecord> = c.store.read_or(&keys::marks(&class, &exam_type, &subject), None);
    Ok(json!({
        "class": class,
        "examType": exam_type,
        "subject": subject,
        "record": record,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "marks.save" => Some(respond(&req.id, handle_save(state, req))),
        "marks.get" => Some(respond(&req.id, handle_get(state, req))),
        _ => None,
    }
}
