// src/models/mod.rs

pub mod choice;
pub mod exam;
pub mod exam_schedule;
pub mod question;
pub mod role;
pub mod subject;
pub mod submission;
pub mod user;
pub mod user_subject;
