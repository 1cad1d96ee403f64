use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const DB_FILE: &str = "shaala.sqlite3";

/// Well-known storage keys. Composite keys are built through the helper
/// functions so every module spells them the same way.
pub mod keys {
    pub const SCHOOL_SETUP: &str = "schoolSetup";
    pub const USER: &str = "user";
    pub const APP_STATE: &str = "appState";
    pub const STUDENTS: &str = "students";
    pub const TEACHERS: &str = "teachers";
    pub const NOTICES: &str = "notices";
    pub const HOLIDAYS: &str = "holidays";
    pub const EVENTS: &str = "events";
    pub const MEAL_PLANS: &str = "meal_plans";
    pub const GENERAL_REGISTER: &str = "general_register_numbers";

    pub fn homework(class: &str) -> String {
        format!("homework_{}", class)
    }

    pub fn attendance(class: &str, date: &str) -> String {
        format!("attendance_{}_{}", class, date)
    }

    pub fn marks(class: &str, exam_type: &str, subject: &str) -> String {
        format!("marks_{}_{}_{}", class, exam_type, subject)
    }
}

/// Key/value document store over the workspace database. Values are whole
/// JSON documents; every write replaces the full value under its key.
///
/// Reads never fail: a missing or unparsable entry yields the caller's
/// default. Writes that cannot reach disk land in an in-memory overlay so
/// the session keeps working, memory-only, until restart.
pub struct Store {
    conn: Option<Connection>,
    overlay: RefCell<HashMap<String, String>>,
}

impl Store {
    pub fn open(workspace: &Path) -> anyhow::Result<Store> {
        std::fs::create_dir_all(workspace)?;
        let conn = Connection::open(workspace.join(DB_FILE))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv(
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Store {
            conn: Some(conn),
            overlay: RefCell::new(HashMap::new()),
        })
    }

    /// Store with no disk backing. Used by tests and as the degraded mode.
    pub fn in_memory() -> Store {
        Store {
            conn: None,
            overlay: RefCell::new(HashMap::new()),
        }
    }

    pub fn read_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(text) = self.get_text(key) else {
            return default;
        };
        match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding corrupt stored value");
                default
            }
        }
    }

    pub fn write<T: Serialize>(&self, key: &str, value: &T) {
        let text = match serde_json::to_string(value) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to serialize value; write dropped");
                return;
            }
        };
        self.set_text(key, text);
    }

    pub fn remove(&self, key: &str) {
        self.overlay.borrow_mut().remove(key);
        if let Some(conn) = self.conn.as_ref() {
            if let Err(e) = conn.execute("DELETE FROM kv WHERE key = ?", [key]) {
                tracing::warn!(key, error = %e, "failed to remove stored value");
            }
        }
    }

    fn get_text(&self, key: &str) -> Option<String> {
        if let Some(v) = self.overlay.borrow().get(key) {
            return Some(v.clone());
        }
        let conn = self.conn.as_ref()?;
        match conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |r| r.get(0))
            .optional()
        {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read stored value");
                None
            }
        }
    }

    pub(crate) fn set_text(&self, key: &str, text: String) {
        if let Some(conn) = self.conn.as_ref() {
            let res = conn.execute(
                "INSERT INTO kv(key, value) VALUES(?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                (key, &text),
            );
            match res {
                Ok(_) => {
                    // Disk now holds the newest value; the overlay copy would
                    // otherwise shadow later disk writes.
                    self.overlay.borrow_mut().remove(key);
                    return;
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "disk write failed; keeping value in memory");
                }
            }
        }
        self.overlay.borrow_mut().insert(key.to_string(), text);
    }
}
