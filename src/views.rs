use chrono_tz::Tz;
use hypertext::{prelude::*, Raw};

use crate::form::{TaskForm, ValidationError};
use crate::task::{Task, STATUS_OPTIONS};
use crate::view_model::{ListQuery, SortKey, SortOrder};

// ============================================================================
// View models
// ============================================================================

/// Everything the `home` template can show.
#[derive(Default)]
pub struct HomeView<'a> {
    pub tasks: &'a [Task],
    pub query: Option<&'a ListQuery>,
    pub errors: &'a [ValidationError],
    pub values: Option<&'a TaskForm>,
    pub example: Option<&'a Task>,
}

pub struct EditView<'a> {
    pub task_id: i64,
    /// Title for the heading; blank falls back to a plain "Edit task".
    pub title: &'a str,
    pub case_number: &'a str,
    pub values: &'a TaskForm,
    pub errors: &'a [ValidationError],
}

// ============================================================================
// Pages
// ============================================================================

fn render_page(title: &str, body_html: &str) -> String {
    maud! {
        !DOCTYPE
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " - Task manager" }
                link rel="stylesheet" href="/static/app.css";
            }
            body {
                header .app-header {
                    a .app-header-link href="/" { "Task manager" }
                    " | "
                    a .app-header-link href="/tasks" { "All tasks" }
                }
                main .app-main {
                    (Raw::dangerously_create(body_html))
                }
            }
        }
    }
    .render()
    .into_inner()
}

/// The `home` template: example card, filters, task table and create form.
pub fn render_home(view: &HomeView<'_>, tz: Tz) -> String {
    let default_query = ListQuery::default();
    let query = view.query.unwrap_or(&default_query);
    let empty_form = TaskForm::default();
    let values = view.values.unwrap_or(&empty_form);

    let summary_html = render_error_summary(view.errors);
    let example_html = view.example.map(|task| render_example(task, tz)).unwrap_or_default();
    let filters_html = render_filters(query);
    let table_html = render_task_table(view.tasks, tz);
    let fields_html = render_task_fields(values, view.errors);

    let body = maud! {
        h1 { "Tasks" }
        (Raw::dangerously_create(&summary_html))
        (Raw::dangerously_create(&example_html))

        section .task-section {
            h2 { "Your tasks" }
            (Raw::dangerously_create(&filters_html))
            (Raw::dangerously_create(&table_html))
        }

        section .task-section id="create-task" {
            h2 { "Create a new task" }
            form method="post" action="/tasks" {
                (Raw::dangerously_create(&fields_html))
                button .govuk-button type="submit" { "Create task" }
            }
        }
    }
    .render()
    .into_inner();

    render_page("Tasks", &body)
}

/// The `edit-task` template.
pub fn render_edit_task(view: &EditView<'_>) -> String {
    let action = format!("/tasks/{}/edit", view.task_id);
    let heading = match view.title.trim() {
        "" => "Edit task".to_string(),
        title => format!("Edit task: {title}"),
    };
    let case_number = view.case_number;
    let summary_html = render_error_summary(view.errors);
    let fields_html = render_task_fields(view.values, view.errors);

    let body = maud! {
        h1 { (heading) }
        p .govuk-caption { (case_number) }
        (Raw::dangerously_create(&summary_html))
        form method="post" action=(action) {
            (Raw::dangerously_create(&fields_html))
            div .button-group {
                button .govuk-button type="submit" { "Save changes" }
                a .govuk-link href="/tasks" { "Cancel" }
            }
        }
    }
    .render()
    .into_inner();

    render_page("Edit task", &body)
}

/// The `error` template.
pub fn render_error(status: u16, message: &str) -> String {
    let status_line = format!("Status {}", status);

    let body = maud! {
        h1 { (message) }
        p .govuk-body { (status_line) }
        p .govuk-body {
            a .govuk-link href="/tasks" { "Back to tasks" }
        }
    }
    .render()
    .into_inner();

    render_page("Error", &body)
}

// ============================================================================
// Fragments
// ============================================================================

fn render_error_summary(errors: &[ValidationError]) -> String {
    if errors.is_empty() {
        return String::new();
    }

    maud! {
        div .govuk-error-summary {
            h2 .govuk-error-summary-title { "There is a problem" }
            ul .govuk-error-summary-list {
                @for error in errors {
                    li {
                        a href=(error.href) { (error.text) }
                    }
                }
            }
        }
    }
    .render()
    .into_inner()
}

fn render_example(task: &Task, tz: Tz) -> String {
    let case_number = task.case_number();
    let due = task.due_display(tz);

    maud! {
        section .task-section.example-task {
            h2 { "Example task" }
            dl .govuk-summary-list {
                div .govuk-summary-list-row {
                    dt { "Case number" }
                    dd { (case_number) }
                }
                div .govuk-summary-list-row {
                    dt { "Title" }
                    dd { (task.title) }
                }
                div .govuk-summary-list-row {
                    dt { "Description" }
                    dd { (task.description) }
                }
                div .govuk-summary-list-row {
                    dt { "Status" }
                    dd { (task.status) }
                }
                div .govuk-summary-list-row {
                    dt { "Due" }
                    dd { (due) }
                }
            }
        }
    }
    .render()
    .into_inner()
}

fn render_filters(query: &ListQuery) -> String {
    let current_status = query.status.clone().unwrap_or_default();
    let mut status_options = vec![(String::new(), "All statuses".to_string())];
    status_options.extend(status_choices(&current_status));
    let status_html = render_options(&status_options, &current_status);

    let sort_options: Vec<(String, String)> = SortKey::ALL
        .iter()
        .map(|key| (key.as_str().to_string(), key.label().to_string()))
        .collect();
    let sort_html = render_options(&sort_options, &query.sort);

    let order_options = vec![
        (SortOrder::Asc.as_str().to_string(), "Ascending".to_string()),
        (SortOrder::Desc.as_str().to_string(), "Descending".to_string()),
    ];
    let order_html = render_options(&order_options, query.sort_order().as_str());

    maud! {
        form .list-controls method="get" action="/tasks" {
            label for="filter-status" { "Status" }
            select id="filter-status" name="status" {
                (Raw::dangerously_create(&status_html))
            }
            label for="filter-sort" { "Sort by" }
            select id="filter-sort" name="sort" {
                (Raw::dangerously_create(&sort_html))
            }
            label for="filter-order" { "Order" }
            select id="filter-order" name="order" {
                (Raw::dangerously_create(&order_html))
            }
            button .govuk-button.govuk-button-secondary type="submit" { "Apply" }
        }
    }
    .render()
    .into_inner()
}

fn render_task_table(tasks: &[Task], tz: Tz) -> String {
    if tasks.is_empty() {
        return maud! {
            div .empty-list {
                p { "No tasks found." }
            }
        }
        .render()
        .into_inner();
    }

    let rows: Vec<String> = tasks.iter().map(|task| render_task_row(task, tz)).collect();

    maud! {
        table .govuk-table {
            thead {
                tr {
                    th { "Case" }
                    th { "Title" }
                    th { "Description" }
                    th { "Status" }
                    th { "Due" }
                    th { "Actions" }
                }
            }
            tbody {
                (Raw::dangerously_create(&rows.join("\n")))
            }
        }
    }
    .render()
    .into_inner()
}

fn render_task_row(task: &Task, tz: Tz) -> String {
    let edit_url = format!("/tasks/{}/edit", task.id);
    let status_url = format!("/tasks/{}/status", task.id);
    let delete_url = format!("/tasks/{}/delete", task.id);
    let select_id = format!("status-{}", task.id);
    let options_html = render_options(&status_choices(&task.status), &task.status);
    let case_number = task.case_number();
    let due = task.due_display(tz);

    maud! {
        tr .task-row {
            td { (case_number) }
            td { (task.title) }
            td { (task.description) }
            td { (task.status) }
            td { (due) }
            td .task-actions {
                a .govuk-link href=(edit_url) { "Edit" }
                form .inline-form method="post" action=(status_url) {
                    label .visually-hidden for=(select_id) { "Status" }
                    select id=(select_id) name="status" {
                        (Raw::dangerously_create(&options_html))
                    }
                    button .govuk-button.govuk-button-secondary type="submit" { "Update" }
                }
                form .inline-form method="post" action=(delete_url) {
                    button .govuk-button.govuk-button-warning type="submit" { "Delete" }
                }
            }
        }
    }
    .render()
    .into_inner()
}

/// Inputs shared by the create and edit forms, with inline errors and the
/// user's previous input.
fn render_task_fields(values: &TaskForm, errors: &[ValidationError]) -> String {
    let title_error = field_error(errors, "#title");
    let description_error = field_error(errors, "#description");
    let status_error = field_error(errors, "#status");
    let due_error = field_error(errors, "#due-date");

    let mut status_options = vec![(String::new(), "Select a status".to_string())];
    status_options.extend(status_choices(&values.status));
    let status_html = render_options(&status_options, &values.status);

    maud! {
        div class=(group_class(title_error)) {
            label .govuk-label for="title" { "Title" }
            @if title_error.is_some() {
                p .govuk-error-message { (title_error.unwrap_or_default()) }
            }
            input .govuk-input type="text" id="title" name="title" value=(values.title);
        }

        div class=(group_class(description_error)) {
            label .govuk-label for="description" { "Description (optional)" }
            @if description_error.is_some() {
                p .govuk-error-message { (description_error.unwrap_or_default()) }
            }
            textarea .govuk-textarea id="description" name="description" rows="3" {
                (values.description)
            }
        }

        div class=(group_class(status_error)) {
            label .govuk-label for="status" { "Status" }
            @if status_error.is_some() {
                p .govuk-error-message { (status_error.unwrap_or_default()) }
            }
            select .govuk-select id="status" name="status" {
                (Raw::dangerously_create(&status_html))
            }
        }

        div class=(group_class(due_error)) id="due-date" {
            fieldset .govuk-fieldset {
                legend .govuk-fieldset-legend { "Due date" }
                p .govuk-hint { "For example, 27 3 2026" }
                @if due_error.is_some() {
                    p .govuk-error-message { (due_error.unwrap_or_default()) }
                }
                div .govuk-date-input {
                    div .govuk-date-input-item {
                        label .govuk-label for="dueDate-day" { "Day" }
                        input .govuk-input.govuk-input-width-2 type="text" id="dueDate-day" name="dueDate-day" value=(values.due_day);
                    }
                    div .govuk-date-input-item {
                        label .govuk-label for="dueDate-month" { "Month" }
                        input .govuk-input.govuk-input-width-2 type="text" id="dueDate-month" name="dueDate-month" value=(values.due_month);
                    }
                    div .govuk-date-input-item {
                        label .govuk-label for="dueDate-year" { "Year" }
                        input .govuk-input.govuk-input-width-4 type="text" id="dueDate-year" name="dueDate-year" value=(values.due_year);
                    }
                }
            }
        }
    }
    .render()
    .into_inner()
}

fn render_options(options: &[(String, String)], current: &str) -> String {
    maud! {
        @for (value, label) in options {
            @if value.as_str() == current {
                option value=(value) selected { (label) }
            } @else {
                option value=(value) { (label) }
            }
        }
    }
    .render()
    .into_inner()
}

/// The standard statuses, plus `current` when the API holds something else.
fn status_choices(current: &str) -> Vec<(String, String)> {
    let mut choices: Vec<(String, String)> = STATUS_OPTIONS
        .iter()
        .map(|s| (s.to_string(), s.to_string()))
        .collect();
    if !current.is_empty() && !STATUS_OPTIONS.contains(&current) {
        choices.push((current.to_string(), current.to_string()));
    }
    choices
}

fn field_error<'a>(errors: &'a [ValidationError], href: &str) -> Option<&'a str> {
    errors
        .iter()
        .find(|e| e.href == href)
        .map(|e| e.text.as_str())
}

fn group_class(error: Option<&str>) -> &'static str {
    if error.is_some() {
        "govuk-form-group govuk-form-group-error"
    } else {
        "govuk-form-group"
    }
}
