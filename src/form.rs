use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskPayload};

const TITLE_MAX_CHARS: usize = 100;
const DESCRIPTION_MAX_CHARS: usize = 500;

/// A message shown to the user, linked to the field it is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub text: String,
    pub href: String,
}

impl ValidationError {
    pub fn new(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: href.into(),
        }
    }

    /// An error that isn't tied to any one field.
    pub fn general(text: impl Into<String>) -> Self {
        Self::new(text, "#")
    }
}

/// Fields submitted by the create and edit forms. Echoed back verbatim when
/// validation fails.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "dueDate-day", default)]
    pub due_day: String,
    #[serde(rename = "dueDate-month", default)]
    pub due_month: String,
    #[serde(rename = "dueDate-year", default)]
    pub due_year: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: String,
}

/// Outcome of checking a submitted form.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub errors: Vec<ValidationError>,
    /// Local midnight of the submitted due date, when it is a real day.
    pub due_date: Option<DateTime<Tz>>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_for(&self, href: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.href == href)
    }
}

impl TaskForm {
    /// Prefill the edit form from a stored task.
    pub fn from_task(task: &Task, tz: Tz) -> Self {
        let (due_day, due_month, due_year) = task.due_parts(tz).unwrap_or_default();
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status.clone(),
            due_day,
            due_month,
            due_year,
        }
    }

    /// Check every field and collect all problems at once.
    pub fn validate(&self, tz: Tz) -> Validation {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(ValidationError::new("Enter a title", "#title"));
        } else if self.title.chars().count() > TITLE_MAX_CHARS {
            errors.push(ValidationError::new(
                format!("Title must be {TITLE_MAX_CHARS} characters or fewer"),
                "#title",
            ));
        }

        if self.description.chars().count() > DESCRIPTION_MAX_CHARS {
            errors.push(ValidationError::new(
                format!("Description must be {DESCRIPTION_MAX_CHARS} characters or fewer"),
                "#description",
            ));
        }

        if self.status.trim().is_empty() {
            errors.push(ValidationError::new("Select a status", "#status"));
        }

        let due_date = self.due_date(tz);
        if due_date.is_none() {
            errors.push(ValidationError::new("Enter a valid due date", "#due-date"));
        }

        Validation { errors, due_date }
    }

    /// Local midnight of the entered date, or `None` if any part is missing,
    /// not a number, or the parts don't name a real calendar day.
    fn due_date(&self, tz: Tz) -> Option<DateTime<Tz>> {
        let day: u32 = self.due_day.trim().parse().ok()?;
        let month: u32 = self.due_month.trim().parse().ok()?;
        let year: i32 = self.due_year.trim().parse().ok()?;

        // from_ymd_opt rejects day 31 in a 30-day month instead of rolling over.
        let midnight = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
        tz.from_local_datetime(&midnight)
            .earliest()
            .or_else(|| Some(tz.from_utc_datetime(&midnight)))
    }

    /// Build the API payload once validation has passed.
    pub fn to_payload(&self, due_date: DateTime<Tz>) -> TaskPayload {
        TaskPayload {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            status: self.status.clone(),
            due_date: due_date.with_timezone(&Utc),
        }
    }
}
