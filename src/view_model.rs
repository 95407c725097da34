use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Query parameters accepted by the task list.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_order")]
    pub order: String,
}

fn default_sort() -> String {
    "id".to_string()
}

fn default_order() -> String {
    "asc".to_string()
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            status: None,
            sort: default_sort(),
            order: default_order(),
        }
    }
}

impl ListQuery {
    /// The status filter, if one was given and isn't blank.
    pub fn status_filter(&self) -> Option<&str> {
        self.status.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn sort_key(&self) -> Option<SortKey> {
        SortKey::parse(&self.sort)
    }

    pub fn sort_order(&self) -> SortOrder {
        SortOrder::parse(&self.order)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Title,
    DueDate,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Id, SortKey::Title, SortKey::DueDate];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "id" => Some(SortKey::Id),
            "title" => Some(SortKey::Title),
            "dueDate" => Some(SortKey::DueDate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Title => "title",
            SortKey::DueDate => "dueDate",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Id => "ID",
            SortKey::Title => "Title",
            SortKey::DueDate => "Due date",
        }
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::Title => compare_titles(&a.title, &b.title),
            // Unparseable dates go after every real date.
            SortKey::DueDate => match (a.due_instant(), b.due_instant()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than "desc" sorts ascending.
    pub fn parse(value: &str) -> Self {
        if value == "desc" {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Case-insensitive first, then by the raw text so the order is total.
fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Filter and sort the tasks fetched from the API for display.
///
/// The sort is stable, so tasks with equal keys keep the order the API
/// returned them in, whichever direction is chosen. An unknown sort key
/// leaves the filtered order untouched.
pub fn build_view_model(tasks: Vec<Task>, query: &ListQuery) -> Vec<Task> {
    let mut tasks: Vec<Task> = match query.status_filter() {
        Some(status) => tasks.into_iter().filter(|t| t.status == status).collect(),
        None => tasks,
    };

    if let Some(key) = query.sort_key() {
        let order = query.sort_order();
        tasks.sort_by(|a, b| {
            let ordering = key.compare(a, b);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }

    tasks
}
