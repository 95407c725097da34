use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::config::get_timezone;
use crate::form::{StatusForm, TaskForm, Validation, ValidationError};
use crate::server::AppState;
use crate::task::{case_number, Task};
use crate::view_model::{build_view_model, ListQuery};
use crate::views::{self, EditView, HomeView};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks_index).post(create_task))
        .route("/{id}/edit", get(edit_task).post(save_task))
        .route("/{id}/status", post(update_status))
        .route("/{id}/delete", post(delete_task))
}

/// Static record shown on the landing page, due 17 October 2025 local time.
fn example_task(tz: Tz) -> Task {
    let due_date = NaiveDate::from_ymd_opt(2025, 10, 17)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
        .map(|due| due.with_timezone(&Utc).to_rfc3339())
        .unwrap_or_default();

    Task {
        id: 1,
        title: "Emma vs Build Pipeline".to_string(),
        description: "Troubleshooting Yarn PnP and SCSS extraction".to_string(),
        status: "In Progress".to_string(),
        due_date,
    }
}

// GET / - Landing page with an example task
pub async fn homepage() -> Html<String> {
    let tz = get_timezone();
    let example = example_task(tz);
    Html(views::render_home(
        &HomeView {
            example: Some(&example),
            ..Default::default()
        },
        tz,
    ))
}

// GET /tasks - Filtered and sorted task list
async fn tasks_index(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Html<String> {
    match state.api.list().await {
        Ok(tasks) => {
            let tasks = build_view_model(tasks, &query);
            Html(views::render_home(
                &HomeView {
                    tasks: &tasks,
                    query: Some(&query),
                    ..Default::default()
                },
                get_timezone(),
            ))
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to load tasks");
            home_with_errors(&[ValidationError::general("Error loading tasks")], None)
        }
    }
}

// POST /tasks - Create a task
async fn create_task(State(state): State<AppState>, Form(form): Form<TaskForm>) -> Response {
    let validation = form.validate(get_timezone());
    let due_date = match validation.due_date {
        Some(due_date) if validation.is_valid() => due_date,
        _ => return home_with_errors(&validation.errors, Some(&form)).into_response(),
    };

    match state.api.create(&form.to_payload(due_date)).await {
        Ok(task) => {
            tracing::info!(task_id = task.id, "created task");
            Redirect::to("/tasks").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to create task");
            home_with_errors(&[ValidationError::general("Error creating task")], Some(&form))
                .into_response()
        }
    }
}

// GET /tasks/:id/edit - Edit form prefilled from the API
async fn edit_task(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(task_id) = id.parse::<i64>() else {
        return task_not_found();
    };

    match state.api.get(task_id).await {
        Ok(task) => {
            let values = TaskForm::from_task(&task, get_timezone());
            Html(views::render_edit_task(&EditView {
                task_id: task.id,
                title: &task.title,
                case_number: &task.case_number(),
                values: &values,
                errors: &[],
            }))
            .into_response()
        }
        Err(e) if e.is_not_found() => task_not_found(),
        Err(e) => {
            tracing::error!(task_id, error = %e, "failed to load task");
            (
                StatusCode::BAD_GATEWAY,
                Html(views::render_error(StatusCode::BAD_GATEWAY.as_u16(), "Error loading task")),
            )
                .into_response()
        }
    }
}

// POST /tasks/:id/edit - Save the whole record
async fn save_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<TaskForm>,
) -> Response {
    let Ok(task_id) = id.parse::<i64>() else {
        return task_not_found();
    };

    let validation = form.validate(get_timezone());
    let due_date = match validation.due_date {
        Some(due_date) if validation.is_valid() => due_date,
        _ => return edit_with_errors(task_id, &form, &validation),
    };

    match state.api.update(task_id, &form.to_payload(due_date)).await {
        Ok(_) => {
            tracing::info!(task_id, "updated task");
            Redirect::to("/tasks").into_response()
        }
        Err(e) => {
            tracing::error!(task_id, error = %e, "failed to update task");
            let failed = Validation {
                errors: vec![ValidationError::general("Error updating task")],
                due_date: Some(due_date),
            };
            edit_with_errors(task_id, &form, &failed)
        }
    }
}

// POST /tasks/:id/status - Change only the status
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Response {
    let Ok(task_id) = id.parse::<i64>() else {
        return task_not_found();
    };

    if form.status.trim().is_empty() {
        return home_with_errors(&[ValidationError::new("Select a status", "#status")], None)
            .into_response();
    }

    match state.api.update_status(task_id, &form.status).await {
        Ok(_) => {
            tracing::info!(task_id, status = %form.status, "updated task status");
            Redirect::to("/tasks").into_response()
        }
        Err(e) => {
            tracing::error!(task_id, error = %e, "failed to update task status");
            home_with_errors(&[ValidationError::general("Error updating task status")], None)
                .into_response()
        }
    }
}

// POST /tasks/:id/delete - Delete a task
async fn delete_task(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(task_id) = id.parse::<i64>() else {
        return task_not_found();
    };

    match state.api.delete(task_id).await {
        Ok(()) => {
            tracing::info!(task_id, "deleted task");
            Redirect::to("/tasks").into_response()
        }
        Err(e) => {
            tracing::error!(task_id, error = %e, "failed to delete task");
            home_with_errors(&[ValidationError::general("Error deleting task")], None)
                .into_response()
        }
    }
}

fn home_with_errors(errors: &[ValidationError], values: Option<&TaskForm>) -> Html<String> {
    Html(views::render_home(
        &HomeView {
            errors,
            values,
            ..Default::default()
        },
        get_timezone(),
    ))
}

/// Re-render the edit form from the submitted values. The stored record
/// isn't refetched, so the case number uses the submitted year when it is
/// a number.
fn edit_with_errors(task_id: i64, form: &TaskForm, validation: &Validation) -> Response {
    let due_year = validation
        .due_date
        .map(|due| due.with_timezone(&Utc).year())
        .or_else(|| form.due_year.trim().parse().ok());

    Html(views::render_edit_task(&EditView {
        task_id,
        title: &form.title,
        case_number: &case_number(task_id, due_year),
        values: form,
        errors: &validation.errors,
    }))
    .into_response()
}

fn task_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(views::render_error(StatusCode::NOT_FOUND.as_u16(), "Task not found")),
    )
        .into_response()
}
