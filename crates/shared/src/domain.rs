use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(TodoId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub completed: bool,
}

/// Changes applied by an update. Fields left as `None` are kept as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            completed: None,
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            title: None,
            completed: Some(completed),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }
}

/// Read filter. Every set field must match; an empty query matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TodoId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TodoQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: TodoId) -> Self {
        Self {
            id: Some(id),
            completed: None,
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            id: None,
            completed: Some(completed),
        }
    }

    pub fn matches(&self, todo: &Todo) -> bool {
        self.id.map_or(true, |id| id == todo.id)
            && self.completed.map_or(true, |c| c == todo.completed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoCounts {
    pub active: usize,
    pub completed: usize,
    pub total: usize,
}

impl TodoCounts {
    pub fn tally<'a>(todos: impl IntoIterator<Item = &'a Todo>) -> Self {
        let mut counts = Self::default();
        for todo in todos {
            counts.total += 1;
            if todo.completed {
                counts.completed += 1;
            } else {
                counts.active += 1;
            }
        }
        counts
    }

    /// True when nothing is left to complete, including the empty list.
    pub fn all_completed(&self) -> bool {
        self.completed == self.total
    }
}

/// Display mode selected by the location hash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    /// Parses a location hash such as `#/active`. Only the first path segment
    /// counts; anything unrecognised falls back to [`Filter::All`].
    pub fn from_route(route: &str) -> Self {
        let segment = route.trim().split('/').nth(1).unwrap_or_default();
        match segment {
            "active" => Self::Active,
            "completed" => Self::Completed,
            _ => Self::All,
        }
    }

    /// The filter string handed to `setFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    pub fn query(&self) -> TodoQuery {
        match self {
            Self::All => TodoQuery::all(),
            Self::Active => TodoQuery::completed(false),
            Self::Completed => TodoQuery::completed(true),
        }
    }
}
