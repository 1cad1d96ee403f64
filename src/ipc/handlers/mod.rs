pub mod attendance;
pub mod calendar;
pub mod core;
pub mod homework;
pub mod marks;
pub mod notices;
pub mod nutrition;
pub mod register;
pub mod school;
pub mod session;
pub mod students;
pub mod teachers;
