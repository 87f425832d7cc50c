// src/models/user_subject.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const USER_SUBJECT_SELECT: &str = "SELECT us.id, us.user_id, u.username, us.subject_id, \
    s.name AS subject_name, us.assigned_date \
    FROM user_subjects us \
    JOIN users u ON u.id = us.user_id \
    JOIN subjects s ON s.id = us.subject_id";

/// Assignment of a user to a subject, joined with both display names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserSubject {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub subject_id: i64,
    pub subject_name: String,
    pub assigned_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserSubjectRequest {
    pub user_id: i64,
    pub subject_id: i64,
}
