// src/models/exam_schedule.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

pub const SCHEDULE_COLUMNS: &str = "id, exam_id, start_time, end_time";

/// Represents the 'exam_schedules' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamSchedule {
    pub id: i64,
    pub exam_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = validate_window))]
pub struct CreateScheduleRequest {
    pub exam_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    pub exam_id: Option<i64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

fn validate_window(req: &CreateScheduleRequest) -> Result<(), ValidationError> {
    if req.start_time >= req.end_time {
        return Err(ValidationError::new("start_time_must_precede_end_time"));
    }
    Ok(())
}
