use std::cell::RefCell;
use std::sync::mpsc::{self, Sender};
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::model::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncVerb {
    Create,
    Update,
    Delete,
    /// Full overwrite of a keyed document (attendance, marks, setup).
    Replace,
}

/// One mirrored operation. Carries everything the worker needs so the
/// mutation path never has to be consulted again.
#[derive(Debug, Clone)]
pub struct SyncOp {
    /// Idempotency key for the remote mirror.
    pub op_id: String,
    pub kind: String,
    pub verb: SyncVerb,
    pub record_id: Option<RecordId>,
    pub payload: serde_json::Value,
    pub bearer: Option<String>,
}

/// Best-effort mirror of repository writes to a remote API. Operations are
/// one-way messages to a detached worker thread; the worker logs failures
/// and drops them. No retry, no backlog, and nothing ever comes back to the
/// caller — the local store stays authoritative.
pub struct SyncHandle {
    tx: Option<Sender<SyncOp>>,
    bearer: RefCell<Option<String>>,
}

impl SyncHandle {
    /// Shim that drops everything. Used when no sync URL is configured.
    pub fn disabled() -> Self {
        SyncHandle {
            tx: None,
            bearer: RefCell::new(None),
        }
    }

    pub fn spawn(base_url: String) -> Self {
        let (tx, rx) = mpsc::channel::<SyncOp>();
        std::thread::spawn(move || {
            let agent = ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(10))
                .build();
            for op in rx {
                if let Err(e) = deliver(&agent, &base_url, &op) {
                    tracing::warn!(
                        kind = %op.kind,
                        op_id = %op.op_id,
                        error = %e,
                        "remote sync failed; local copy is authoritative"
                    );
                }
            }
        });
        SyncHandle {
            tx: Some(tx),
            bearer: RefCell::new(None),
        }
    }

    /// Credential attached to subsequent operations, set at login and
    /// cleared at logout.
    pub fn set_bearer(&self, bearer: Option<String>) {
        *self.bearer.borrow_mut() = bearer;
    }

    pub fn push_record<T: Serialize>(&self, kind: &str, verb: SyncVerb, id: RecordId, record: &T) {
        let payload = match serde_json::to_value(record) {
            Ok(v) => v,
            Err(_) => return,
        };
        self.push(SyncOp {
            op_id: Uuid::new_v4().to_string(),
            kind: kind.to_string(),
            verb,
            record_id: Some(id),
            payload,
            bearer: self.bearer.borrow().clone(),
        });
    }

    pub fn push_delete(&self, kind: &str, id: RecordId) {
        self.push(SyncOp {
            op_id: Uuid::new_v4().to_string(),
            kind: kind.to_string(),
            verb: SyncVerb::Delete,
            record_id: Some(id),
            payload: serde_json::Value::Null,
            bearer: self.bearer.borrow().clone(),
        });
    }

    /// Mirror a keyed document overwrite, e.g. an attendance sheet or the
    /// school setup.
    pub fn push_document<T: Serialize>(&self, kind: &str, key: &str, value: &T) {
        let payload = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(_) => return,
        };
        self.push(SyncOp {
            op_id: Uuid::new_v4().to_string(),
            kind: kind.to_string(),
            verb: SyncVerb::Replace,
            record_id: None,
            payload: serde_json::json!({ "key": key, "value": payload }),
            bearer: self.bearer.borrow().clone(),
        });
    }

    fn push(&self, op: SyncOp) {
        if let Some(tx) = self.tx.as_ref() {
            // A closed channel means the worker is gone; the op is dropped.
            let _ = tx.send(op);
        }
    }
}

fn deliver(agent: &ureq::Agent, base_url: &str, op: &SyncOp) -> Result<(), ureq::Error> {
    let base = base_url.trim_end_matches('/');
    let mut req = match (op.verb, op.record_id) {
        (SyncVerb::Create, _) | (SyncVerb::Replace, _) => {
            agent.post(&format!("{}/api/{}", base, op.kind))
        }
        (SyncVerb::Update, Some(id)) => agent.put(&format!("{}/api/{}/{}", base, op.kind, id)),
        (SyncVerb::Delete, Some(id)) => agent.delete(&format!("{}/api/{}/{}", base, op.kind, id)),
        // Update/delete without an id never leaves the repository layer.
        _ => return Ok(()),
    };
    req = req.set("X-Sync-Op", &op.op_id);
    if let Some(bearer) = op.bearer.as_deref() {
        req = req.set("Authorization", &format!("Bearer {}", bearer));
    }
    match op.verb {
        SyncVerb::Delete => req.call()?,
        _ => req.send_json(op.payload.clone())?,
    };
    Ok(())
}
