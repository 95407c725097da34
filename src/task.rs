use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};

/// Statuses offered by the forms. The API accepts any string, so values
/// outside this list are still displayed and kept selectable.
pub const STATUS_OPTIONS: [&str; 3] = ["Not Started", "In Progress", "Completed"];

/// A task record as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub status: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub due_date: String,
}

/// Body sent when creating or fully updating a task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub title: String,
    pub description: String,
    pub status: String,
    pub due_date: DateTime<Utc>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Task {
    /// Parse the due date as an instant. Timestamps without an offset are read as UTC.
    pub fn due_instant(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.due_date)
    }

    /// The due date in the display timezone. The API keeps the UTC instant
    /// it was sent but drops the offset, so naive values are UTC here too.
    pub fn due_local(&self, tz: Tz) -> Option<DateTime<Tz>> {
        self.due_instant().map(|due| due.with_timezone(&tz))
    }

    /// Due date in the "1 January 2025" form; the raw value when it can't be parsed.
    pub fn due_display(&self, tz: Tz) -> String {
        match self.due_local(tz) {
            Some(due) => due.format("%-d %B %Y").to_string(),
            None => self.due_date.clone(),
        }
    }

    /// Display label derived from the API-assigned id.
    pub fn case_number(&self) -> String {
        case_number(self.id, self.due_instant().map(|due| due.year()))
    }

    /// Day, month and year strings for prefilling the date inputs.
    pub fn due_parts(&self, tz: Tz) -> Option<(String, String, String)> {
        self.due_local(tz)
            .map(|due| (due.day().to_string(), due.month().to_string(), due.year().to_string()))
    }
}

/// `CASE-{year}-{id:03}`, or `CASE-{id:03}` when the due year is unknown.
pub fn case_number(id: i64, due_year: Option<i32>) -> String {
    match due_year {
        Some(year) => format!("CASE-{}-{:03}", year, id),
        None => format!("CASE-{:03}", id),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
pub(crate) fn sample(id: i64, title: &str, status: &str, due_date: &str) -> Task {
    Task {
        id,
        title: title.to_string(),
        description: String::new(),
        status: status.to_string(),
        due_date: due_date.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn deserializes_api_record() {
        let json = r#"{
            "id": 7,
            "title": "File bundle",
            "description": null,
            "status": "In Progress",
            "dueDate": "2025-03-04T00:00:00"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, 7);
        assert_eq!(task.description, "");
        assert_eq!(task.due_date, "2025-03-04T00:00:00");
    }

    #[test]
    fn missing_description_is_empty() {
        let json = r#"{"id":1,"title":"a","status":"Completed","dueDate":"2025-01-01T00:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.description, "");
    }

    #[test]
    fn payload_uses_camel_case() {
        let payload = TaskPayload {
            title: "X".into(),
            description: "".into(),
            status: "Open".into(),
            due_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["dueDate"], "2025-01-01T00:00:00Z");
        assert!(value.get("due_date").is_none());
    }

    #[test]
    fn due_instant_accepts_offsets_and_naive_values() {
        let with_offset = sample(1, "a", "Open", "2025-01-01T01:00:00+01:00");
        let naive = sample(2, "b", "Open", "2025-01-01T00:00:00");
        assert_eq!(with_offset.due_instant(), naive.due_instant());

        let broken = sample(3, "c", "Open", "next tuesday");
        assert_eq!(broken.due_instant(), None);
    }

    #[test]
    fn due_display_formats_day_month_year() {
        let task = sample(1, "a", "Open", "2025-01-09T00:00:00");
        assert_eq!(task.due_display(chrono_tz::UTC), "9 January 2025");

        let broken = sample(2, "b", "Open", "soon");
        assert_eq!(broken.due_display(chrono_tz::UTC), "soon");
    }

    #[test]
    fn due_display_converts_offsets_to_local_time() {
        let task = sample(1, "a", "Open", "2025-06-30T23:30:00Z");
        assert_eq!(task.due_display(chrono_tz::Europe::London), "1 July 2025");
    }

    #[test]
    fn naive_values_are_utc_instants_in_local_display() {
        // London midnight on 1 July, stored without its offset.
        let task = sample(1, "a", "Open", "2025-06-30T23:00:00");
        assert_eq!(task.due_display(chrono_tz::Europe::London), "1 July 2025");
        assert_eq!(
            task.due_parts(chrono_tz::Europe::London),
            Some(("1".to_string(), "7".to_string(), "2025".to_string()))
        );
    }

    #[test]
    fn case_number_uses_id() {
        let task = sample(1, "a", "Open", "2025-02-01T00:00:00Z");
        assert_eq!(task.case_number(), "CASE-2025-001");

        let undated = sample(42, "a", "Open", "");
        assert_eq!(undated.case_number(), "CASE-042");
    }

    #[test]
    fn due_parts_for_prefill() {
        let task = sample(1, "a", "Open", "2025-12-05T00:00:00");
        assert_eq!(
            task.due_parts(chrono_tz::UTC),
            Some(("5".to_string(), "12".to_string(), "2025".to_string()))
        );
    }
}
