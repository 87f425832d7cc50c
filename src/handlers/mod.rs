// src/handlers/mod.rs

pub mod choices;
pub mod exams;
pub mod import;
pub mod questions;
pub mod roles;
pub mod schedules;
pub mod subjects;
pub mod submissions;
pub mod user_subjects;
pub mod users;
