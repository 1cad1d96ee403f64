use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Violation;
use crate::repo::Record;

/// Epoch-millis identifier, assigned once at creation and stable for the
/// record's lifetime.
pub type RecordId = i64;

pub(crate) fn digits(s: &str, n: usize) -> bool {
    s.len() == n && s.bytes().all(|b| b.is_ascii_digit())
}

fn require(violations: &mut Vec<Violation>, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        violations.push(Violation::new(field, message));
    }
}

fn require_digits(violations: &mut Vec<Violation>, field: &str, value: &str, n: usize) {
    if !digits(value, n) {
        violations.push(Violation::new(field, format!("{} must be exactly {} digits", field, n)));
    }
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Principal,
    Teacher,
}

/// The authenticated identity. Exactly one session exists at a time; it is
/// owned by the state container and persisted under the `user` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: RecordId,
    pub mobile: String,
    pub role: Role,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_assigned: Option<String>,
}

/// Singleton school identity, written once at setup. Field names follow the
/// stored `schoolSetup` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolProfile {
    pub school_name: String,
    /// 11-digit registration code.
    pub udise_code: String,
    pub address: String,
    pub pin_code: String,
    pub phone: String,
    pub principal_name: String,
    /// Doubles as the principal's password (mobile-as-password).
    pub principal_mobile: String,
}

impl SchoolProfile {
    pub fn field_violations(&self) -> Vec<Violation> {
        let mut v = Vec::new();
        require(&mut v, "schoolName", &self.school_name, "school name is required");
        require_digits(&mut v, "udiseCode", &self.udise_code, 11);
        require(&mut v, "address", &self.address, "address is required");
        require_digits(&mut v, "pinCode", &self.pin_code, 6);
        require_digits(&mut v, "phone", &self.phone, 10);
        require(&mut v, "principalName", &self.principal_name, "principal name is required");
        require_digits(&mut v, "principalMobile", &self.principal_mobile, 10);
        v
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    #[serde(default)]
    pub id: RecordId,
    pub name: String,
    /// 10 digits, unique across all teachers; doubles as the password.
    pub mobile: String,
    pub subject: String,
    pub class_assigned: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Record for Teacher {
    const KIND: &'static str = "teachers";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field_violations(&self) -> Vec<Violation> {
        let mut v = Vec::new();
        require(&mut v, "name", &self.name, "teacher name is required");
        require_digits(&mut v, "mobile", &self.mobile, 10);
        require(&mut v, "subject", &self.subject, "subject is required");
        require(&mut v, "class_assigned", &self.class_assigned, "assigned class is required");
        v
    }

    fn conflict_with(&self, other: &Self) -> Option<Violation> {
        (self.mobile == other.mobile)
            .then(|| Violation::new("mobile", "this mobile number is already in use"))
    }

    fn stamp_created(&mut self) {
        if self.created_at.is_empty() {
            self.created_at = now_iso();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(default)]
    pub id: RecordId,
    pub name: String,
    pub class: String,
    /// Unique within the class, not globally.
    pub roll_number: String,
    pub father_name: String,
    #[serde(default)]
    pub mother_name: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Record for Student {
    const KIND: &'static str = "students";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field_violations(&self) -> Vec<Violation> {
        let mut v = Vec::new();
        require(&mut v, "name", &self.name, "student name is required");
        require(&mut v, "class", &self.class, "class is required");
        require(&mut v, "roll_number", &self.roll_number, "roll number is required");
        require(&mut v, "father_name", &self.father_name, "father's name is required");
        if !self.mobile.is_empty() && !digits(&self.mobile, 10) {
            v.push(Violation::new("mobile", "mobile must be exactly 10 digits"));
        }
        v
    }

    fn conflict_with(&self, other: &Self) -> Option<Violation> {
        (self.class == other.class && self.roll_number == other.roll_number).then(|| {
            Violation::new("roll_number", "this roll number is already used in this class")
        })
    }

    fn stamp_created(&mut self) {
        if self.created_at.is_empty() {
            self.created_at = now_iso();
        }
    }
}

/// Per-class homework entry, stored under `homework_<class>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Homework {
    #[serde(default)]
    pub id: RecordId,
    pub subject: String,
    pub description: String,
    pub date: String,
    #[serde(default, rename = "createdAt")]
    pub created_at: String,
}

impl Record for Homework {
    const KIND: &'static str = "homework";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field_violations(&self) -> Vec<Violation> {
        let mut v = Vec::new();
        require(&mut v, "subject", &self.subject, "subject is required");
        require(&mut v, "description", &self.description, "description is required");
        require(&mut v, "date", &self.date, "date is required");
        v
    }

    fn stamp_created(&mut self) {
        if self.created_at.is_empty() {
            self.created_at = now_iso();
        }
    }
}

/// School-wide notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    #[serde(default)]
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub date: String,
    #[serde(default, rename = "createdAt")]
    pub created_at: String,
    #[serde(default, rename = "createdBy")]
    pub created_by: String,
}

impl Record for Notice {
    const KIND: &'static str = "notices";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field_violations(&self) -> Vec<Violation> {
        let mut v = Vec::new();
        require(&mut v, "title", &self.title, "title is required");
        require(&mut v, "description", &self.description, "description is required");
        require(&mut v, "date", &self.date, "date is required");
        v
    }

    fn stamp_created(&mut self) {
        if self.created_at.is_empty() {
            self.created_at = now_iso();
        }
    }
}

/// Holidays and events are separate collections; both may fall on the same
/// date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holiday {
    #[serde(default)]
    pub id: RecordId,
    pub date: String,
    pub name: String,
}

impl Record for Holiday {
    const KIND: &'static str = "holidays";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field_violations(&self) -> Vec<Violation> {
        let mut v = Vec::new();
        require(&mut v, "date", &self.date, "date is required");
        require(&mut v, "name", &self.name, "holiday name is required");
        v
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: RecordId,
    pub date: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Record for CalendarEvent {
    const KIND: &'static str = "events";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field_violations(&self) -> Vec<Violation> {
        let mut v = Vec::new();
        require(&mut v, "date", &self.date, "date is required");
        require(&mut v, "title", &self.title, "event title is required");
        v
    }
}

/// School week for meal planning; Sunday has no plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    #[serde(default)]
    pub id: RecordId,
    pub day: MealDay,
    pub breakfast: String,
    pub lunch: String,
    #[serde(default)]
    pub comments: String,
}

impl Record for MealPlan {
    const KIND: &'static str = "meal_plans";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn field_violations(&self) -> Vec<Violation> {
        let mut v = Vec::new();
        require(&mut v, "breakfast", &self.breakfast, "breakfast description is required");
        require(&mut v, "lunch", &self.lunch, "lunch description is required");
        v
    }

    fn conflict_with(&self, other: &Self) -> Option<Violation> {
        (self.day == other.day)
            .then(|| Violation::new("day", "a meal plan for this day already exists"))
    }
}

/// One class's attendance for one calendar day: student id to present.
/// Saved as a full overwrite, never merged.
pub type AttendanceSheet = BTreeMap<String, bool>;

/// Marks for one (class, exam type, subject) sitting, full overwrite per
/// save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarksRecord {
    pub marks: BTreeMap<String, f64>,
    #[serde(rename = "maxMarks")]
    pub max_marks: f64,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: String,
}

impl MarksRecord {
    pub fn stamp(&mut self) {
        self.updated_at = now_iso();
    }
}

/// General register numbers, student id to assigned number.
pub type RegisterNumbers = BTreeMap<String, String>;
