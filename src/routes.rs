// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    routing::{delete, get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{
        choices, exams, import, questions, roles, schedules, subjects, submissions, user_subjects,
        users,
    },
    state::AppState,
};

/// Assembles the main application router.
///
/// * All routes live under `/api`.
/// * The two document import routes accept bodies up to `MAX_UPLOAD_MB`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let import_routes = Router::new()
        .route("/import-docx", post(import::import_legacy_docx))
        .route("/exam-import-docx", post(import::import_exam_docx))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes()));

    let crud_routes = Router::new()
        .route("/roles", get(roles::list_roles).post(roles::create_role))
        .route(
            "/roles/{id}",
            get(roles::get_role).put(roles::update_role).delete(roles::delete_role),
        )
        .route("/subjects", get(subjects::list_subjects).post(subjects::create_subject))
        .route(
            "/subjects/{id}",
            get(subjects::get_subject)
                .put(subjects::update_subject)
                .delete(subjects::delete_subject),
        )
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route(
            "/user-subjects",
            get(user_subjects::list_user_subjects).post(user_subjects::create_user_subject),
        )
        .route(
            "/user-subjects/{id}",
            delete(user_subjects::delete_user_subject),
        )
        .route("/exams", get(exams::list_exams).post(exams::create_exam))
        .route(
            "/exams/{id}",
            get(exams::get_exam).put(exams::update_exam).delete(exams::delete_exam),
        )
        .route(
            "/exam-questions",
            get(exams::list_exam_questions).post(exams::create_exam_question),
        )
        .route(
            "/exam-questions/{id}",
            delete(exams::delete_exam_question),
        )
        .route(
            "/exam-schedules",
            get(schedules::list_schedules).post(schedules::create_schedule),
        )
        .route(
            "/exam-schedules/{id}",
            get(schedules::get_schedule)
                .put(schedules::update_schedule)
                .delete(schedules::delete_schedule),
        )
        .route(
            "/questions",
            get(questions::list_questions).post(questions::create_question),
        )
        .route(
            "/questions/{id}",
            get(questions::get_question)
                .put(questions::update_question)
                .delete(questions::delete_question),
        )
        .route("/questions/{id}/correct-answer", put(questions::set_correct_answer))
        .route("/choices", get(choices::list_choices).post(choices::create_choice))
        .route(
            "/choices/{id}",
            get(choices::get_choice)
                .put(choices::update_choice)
                .delete(choices::delete_choice),
        )
        .route(
            "/submissions",
            get(submissions::list_submissions).post(submissions::create_submission),
        )
        .route(
            "/submissions/{id}",
            get(submissions::get_submission).delete(submissions::delete_submission),
        );

    Router::new()
        .nest("/api", crud_routes.merge(import_routes))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
