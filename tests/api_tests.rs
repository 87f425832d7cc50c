// tests/api_tests.rs

mod common;

use common::{spawn_app, unique};
use quizmaster::error::AppError;
use serde_json::{Value, json};

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn default_roles_are_seeded() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let roles: Vec<Value> = client
        .get(format!("{}/api/roles", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    for name in ["Candidate", "Exam Administrator", "Question Manager", "Admin"] {
        assert!(roles.iter().any(|r| r["name"] == name), "missing role {name}");
    }
}

async fn candidate_role_id(client: &reqwest::Client, address: &str) -> i64 {
    let roles: Vec<Value> = client
        .get(format!("{}/api/roles", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    roles
        .iter()
        .find(|r| r["name"] == "Candidate")
        .and_then(|r| r["id"].as_i64())
        .expect("Candidate role is seeded")
}

#[tokio::test]
async fn user_lifecycle_hides_password_and_hashes_it() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let role_id = candidate_role_id(&client, &app.address).await;
    let username = unique("u");

    // Create
    let response = client
        .post(format!("{}/api/users", app.address))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "password123",
            "role_id": role_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    // Read: role name joined, password never serialized
    let user: Value = client
        .get(format!("{}/api/users/{}", app.address, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(user["username"], username);
    assert_eq!(user["role_name"], "Candidate");
    assert_eq!(user["is_active"], true);
    assert!(user.get("password").is_none());

    let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE id = $1")
        .bind(id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert!(stored.starts_with("$argon2"));

    // Duplicate username
    let response = client
        .post(format!("{}/api/users", app.address))
        .json(&json!({
            "username": username,
            "email": format!("other_{username}@example.com"),
            "password": "password123",
            "role_id": role_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // Update
    let response = client
        .put(format!("{}/api/users/{}", app.address, id))
        .json(&json!({ "is_active": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // Delete, then delete again
    let response = client
        .delete(format!("{}/api/users/{}", app.address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);
    let response = client
        .delete(format!("{}/api/users/{}", app.address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn create_user_fails_validation() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/users", app.address))
        .json(&json!({
            "username": "yo",
            "email": "not-an-email",
            "password": "password123",
            "role_id": 1,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_subject_name_conflicts() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let name = unique("Biology");

    let first = client
        .post(format!("{}/api/subjects", app.address))
        .json(&json!({ "name": name }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/subjects", app.address))
        .json(&json!({ "name": name }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn question_choice_and_correct_answer_flow() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let subject: Value = client
        .post(format!("{}/api/subjects", app.address))
        .json(&json!({ "name": unique("Algebra") }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let question: Value = client
        .post(format!("{}/api/questions", app.address))
        .json(&json!({
            "question_text": "1 + 1 = ?",
            "mark": 1.5,
            "subject_id": subject["id"],
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let question_id = question["id"].as_i64().unwrap();

    let mut choice_ids = Vec::new();
    for (code, text) in [("A", "1"), ("b", "2")] {
        let response = client
            .post(format!("{}/api/choices", app.address))
            .json(&json!({ "question_id": question_id, "choice_text": text, "option_code": code }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        choice_ids.push(response.json::<Value>().await.unwrap()["id"].as_i64().unwrap());
    }

    // Option codes are unique per question, whatever the case
    let response = client
        .post(format!("{}/api/choices", app.address))
        .json(&json!({ "question_id": question_id, "choice_text": "again", "option_code": "a" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // Set, then replace, the correct answer
    for choice_id in [choice_ids[0], choice_ids[1]] {
        let response = client
            .put(format!("{}/api/questions/{}/correct-answer", app.address, question_id))
            .json(&json!({ "choice_id": choice_id }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let detail: Value = client
        .get(format!("{}/api/questions/{}", app.address, question_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["mark"], 1.5);
    assert_eq!(detail["choices"].as_array().unwrap().len(), 2);
    assert_eq!(detail["choices"][0]["option_code"], "a");
    assert_eq!(detail["correct_choice_id"], choice_ids[1]);

    let choices: Vec<Value> = client
        .get(format!("{}/api/choices?question_id={}", app.address, question_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(choices.len(), 2);

    // A choice from a different question is rejected
    let response = client
        .put(format!("{}/api/questions/{}/correct-answer", app.address, question_id))
        .json(&json!({ "choice_id": 9_000_000_000_000i64 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Soft delete hides the question from the default listing
    let response = client
        .put(format!("{}/api/questions/{}", app.address, question_id))
        .json(&json!({ "is_deleted": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let visible: Vec<Value> = client
        .get(format!("{}/api/questions?subject_id={}", app.address, subject["id"]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(visible.is_empty());

    let all: Vec<Value> = client
        .get(format!(
            "{}/api/questions?subject_id={}&include_deleted=true",
            app.address, subject["id"]
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn exam_schedule_and_submission_flow() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let role_id = candidate_role_id(&client, &app.address).await;

    let subject: Value = client
        .post(format!("{}/api/subjects", app.address))
        .json(&json!({ "name": unique("Geometry") }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let exam_code = unique("GEO");
    let exam: Value = client
        .post(format!("{}/api/exams", app.address))
        .json(&json!({
            "exam_code": exam_code,
            "duration": 60,
            "num_questions": 10,
            "subject_id": subject["id"],
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let exam_id = exam["id"].as_i64().unwrap();

    // Exam codes are unique
    let response = client
        .post(format!("{}/api/exams", app.address))
        .json(&json!({
            "exam_code": exam_code,
            "duration": 60,
            "num_questions": 10,
            "subject_id": subject["id"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // Schedule window must be ordered
    let response = client
        .post(format!("{}/api/exam-schedules", app.address))
        .json(&json!({
            "exam_id": exam_id,
            "start_time": "2025-03-01T10:00:00Z",
            "end_time": "2025-03-01T09:00:00Z",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(format!("{}/api/exam-schedules", app.address))
        .json(&json!({
            "exam_id": exam_id,
            "start_time": "2025-03-01T09:00:00Z",
            "end_time": "2025-03-01T10:00:00Z",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let schedule_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    // Moving the end before the start violates the table constraint
    let response = client
        .put(format!("{}/api/exam-schedules/{}", app.address, schedule_id))
        .json(&json!({ "end_time": "2025-03-01T08:00:00Z" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Submissions
    let username = unique("s");
    let user: Value = client
        .post(format!("{}/api/users", app.address))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "password123",
            "role_id": role_id,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/submissions", app.address))
        .json(&json!({
            "score": 7.5,
            "answers": "{\"1\":\"a\"}",
            "exam_id": exam_id,
            "user_id": user["id"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let submissions: Vec<Value> = client
        .get(format!(
            "{}/api/submissions?exam_id={}&user_id={}",
            app.address, exam_id, user["id"]
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0]["score"], 7.5);

    // Unknown exam is a foreign-key violation
    let response = client
        .post(format!("{}/api/submissions", app.address))
        .json(&json!({
            "score": 1.0,
            "answers": "{}",
            "exam_id": 9_000_000_000_000i64,
            "user_id": user["id"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Deleting the exam cascades to schedules and submissions
    let response = client
        .delete(format!("{}/api/exams/{}", app.address, exam_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = client
        .get(format!("{}/api/exam-schedules/{}", app.address, schedule_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn empty_update_is_a_no_op_and_missing_rows_are_404() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let response = client
        .put(format!("{}/api/subjects/{}", app.address, 9_000_000_000_000i64))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .put(format!("{}/api/subjects/{}", app.address, 9_000_000_000_000i64))
        .json(&json!({ "lecturer": "Nobody" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn user_subject_assignment_is_unique() {
    let Some(app) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let role_id = candidate_role_id(&client, &app.address).await;
    let username = unique("t");

    let user: Value = client
        .post(format!("{}/api/users", app.address))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "password123",
            "role_id": role_id,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let subject_name = unique("Music");
    let subject: Value = client
        .post(format!("{}/api/subjects", app.address))
        .json(&json!({ "name": subject_name }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let payload = json!({ "user_id": user["id"], "subject_id": subject["id"] });
    let first = client
        .post(format!("{}/api/user-subjects", app.address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);
    let assignment_id = first.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let second = client
        .post(format!("{}/api/user-subjects", app.address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);

    let assignments: Vec<Value> = client
        .get(format!("{}/api/user-subjects", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let assignment = assignments
        .iter()
        .find(|a| a["id"] == assignment_id)
        .expect("assignment is listed");
    assert_eq!(assignment["username"], username);
    assert_eq!(assignment["subject_name"], subject_name);
}

#[tokio::test]
async fn values_too_long_for_their_column_are_bad_requests() {
    let Some(app) = spawn_app().await else { return };

    let err = sqlx::query("INSERT INTO subjects (name) VALUES ($1)")
        .bind("x".repeat(150))
        .execute(&app.pool)
        .await
        .unwrap_err();

    match AppError::from(err) {
        AppError::BadRequest(message) => assert!(message.starts_with("Value too long")),
        other => panic!("unexpected error: {other:?}"),
    }
}
