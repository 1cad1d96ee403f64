use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Holiday, Homework, Notice, SchoolProfile, Session, Student, Teacher};
use crate::store::{keys, Store};

/// The full application state: session, school profile, active class, and
/// cached entity collections. Written to storage whole on every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSnapshot {
    #[serde(default)]
    pub user: Option<Session>,
    #[serde(default, rename = "schoolData")]
    pub school_data: Option<SchoolProfile>,
    #[serde(default, rename = "currentClass")]
    pub current_class: Option<String>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub attendance: BTreeMap<String, bool>,
    #[serde(default)]
    pub homework: Vec<Homework>,
    #[serde(default)]
    pub notices: Vec<Notice>,
    #[serde(default)]
    pub holidays: Vec<Holiday>,
}

/// The closed set of state transitions.
#[derive(Debug, Clone)]
pub enum Action {
    SetUser(Option<Session>),
    SetSchoolData(SchoolProfile),
    SetCurrentClass(Option<String>),
    SetStudents(Vec<Student>),
    AddStudent(Student),
    UpdateStudent(Student),
    SetTeachers(Vec<Teacher>),
    AddTeacher(Teacher),
    SetAttendance(BTreeMap<String, bool>),
    AddHomework(Homework),
    AddNotice(Notice),
    AddHoliday(Holiday),
    Logout,
}

/// Pure transition function; persistence is attached afterwards by
/// [`StateContainer::dispatch`], never interleaved here.
fn reduce(mut state: AppSnapshot, action: Action) -> AppSnapshot {
    match action {
        Action::SetUser(user) => state.user = user,
        Action::SetSchoolData(profile) => state.school_data = Some(profile),
        Action::SetCurrentClass(class) => state.current_class = class,
        Action::SetStudents(students) => state.students = students,
        Action::AddStudent(student) => state.students.push(student),
        Action::UpdateStudent(student) => {
            for slot in state.students.iter_mut() {
                if slot.id == student.id {
                    *slot = student.clone();
                }
            }
        }
        Action::SetTeachers(teachers) => state.teachers = teachers,
        Action::AddTeacher(teacher) => state.teachers.push(teacher),
        Action::SetAttendance(sheet) => state.attendance = sheet,
        Action::AddHomework(entry) => state.homework.push(entry),
        Action::AddNotice(notice) => state.notices.push(notice),
        Action::AddHoliday(holiday) => state.holidays.push(holiday),
        Action::Logout => {
            state.user = None;
            state.current_class = None;
        }
    }
    state
}

/// Reducer-style container. Every dispatch recomputes the snapshot and
/// writes it whole under `appState`.
#[derive(Debug, Default)]
pub struct StateContainer {
    snapshot: AppSnapshot,
}

impl StateContainer {
    /// Load the last snapshot from the store. A missing or corrupt snapshot
    /// becomes the empty initial state; startup never fails on it.
    pub fn rehydrate(store: &Store) -> Self {
        StateContainer {
            snapshot: store.read_or(keys::APP_STATE, AppSnapshot::default()),
        }
    }

    pub fn snapshot(&self) -> &AppSnapshot {
        &self.snapshot
    }

    pub fn dispatch(&mut self, store: &Store, action: Action) {
        self.snapshot = reduce(std::mem::take(&mut self.snapshot), action);
        store.write(keys::APP_STATE, &self.snapshot);
    }
}
