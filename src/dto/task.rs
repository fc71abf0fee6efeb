use crate::domain;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// The lifecycle state of a task as it appears on the wire
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema)]
#[cfg_attr(test, derive(PartialEq, Eq))]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Draft,
    Todo,
    Doing,
    Done,
    Trash,
}

impl From<TaskState> for domain::todo::TaskState {
    fn from(value: TaskState) -> Self {
        match value {
            TaskState::Draft => domain::todo::TaskState::Draft,
            TaskState::Todo => domain::todo::TaskState::Todo,
            TaskState::Doing => domain::todo::TaskState::Doing,
            TaskState::Done => domain::todo::TaskState::Done,
            TaskState::Trash => domain::todo::TaskState::Trash,
        }
    }
}

impl From<domain::todo::TaskState> for TaskState {
    fn from(value: domain::todo::TaskState) -> Self {
        match value {
            domain::todo::TaskState::Draft => TaskState::Draft,
            domain::todo::TaskState::Todo => TaskState::Todo,
            domain::todo::TaskState::Doing => TaskState::Doing,
            domain::todo::TaskState::Done => TaskState::Done,
            domain::todo::TaskState::Trash => TaskState::Trash,
        }
    }
}

/// DTO for creating a new task via the API. The task's owner comes from the caller's
/// access token, not the request body.
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct NewTask {
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Buy groceries")]
    pub title: String,
    #[validate(length(max = 2000))]
    #[schema(example = "milk and eggs")]
    #[serde(default)]
    pub description: String,
    /// Defaults to "draft" when omitted
    pub state: Option<TaskState>,
}

impl From<NewTask> for domain::todo::NewTask {
    fn from(value: NewTask) -> Self {
        domain::todo::NewTask {
            title: value.title,
            description: value.description,
            state: value
                .state
                .map(domain::todo::TaskState::from)
                .unwrap_or(domain::todo::TaskState::Draft),
        }
    }
}

/// DTO for a returned task on the API
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq, Eq))]
pub struct TodoTask {
    #[schema(example = 10)]
    pub id: i32,
    #[schema(example = "Buy groceries")]
    pub title: String,
    #[schema(example = "milk and eggs")]
    pub description: String,
    pub state: TaskState,
}

impl From<domain::todo::TodoTask> for TodoTask {
    fn from(value: domain::todo::TodoTask) -> Self {
        TodoTask {
            id: value.id,
            title: value.title,
            description: value.item_desc,
            state: value.state.into(),
        }
    }
}

/// DTO for partially updating a task's content via the API. Omitted fields keep
/// their current value.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub state: Option<TaskState>,
}

impl From<UpdateTask> for domain::todo::UpdateTask {
    fn from(value: UpdateTask) -> Self {
        domain::todo::UpdateTask {
            title: value.title,
            description: value.description,
            state: value.state.map(domain::todo::TaskState::from),
        }
    }
}

/// DTO for a newly created task
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct InsertedTask {
    #[schema(example = 5)]
    pub id: i32,
}

/// Query parameters accepted when listing tasks. Pagination is capped so a caller
/// can't request an unbounded page.
#[derive(Deserialize, Validate, IntoParams)]
#[cfg_attr(test, derive(Serialize))]
#[into_params(parameter_in = Query)]
pub struct TaskListQuery {
    /// Number of tasks to skip (defaults to 0)
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
    /// Maximum number of tasks to return (defaults to 20, at most 100)
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    /// Only return tasks whose title contains this text
    pub title: Option<String>,
    /// Only return tasks whose description contains this text
    pub description: Option<String>,
    /// Only return tasks currently in this state
    #[param(inline)]
    pub state: Option<TaskState>,
}

impl TaskListQuery {
    /// Splits the query parameters into the domain's filter and pagination halves
    pub fn into_filter_and_page(self) -> (domain::todo::TaskFilter, domain::todo::Pagination) {
        let default_page = domain::todo::Pagination::default();
        let filter = domain::todo::TaskFilter {
            title: self.title,
            description: self.description,
            state: self.state.map(domain::todo::TaskState::from),
        };
        let page = domain::todo::Pagination {
            offset: self.offset.unwrap_or(default_page.offset),
            limit: self.limit.unwrap_or(default_page.limit),
        };

        (filter, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod new_task {
        use super::*;

        #[test]
        fn empty_title_gets_rejected() {
            let bad_task = NewTask {
                title: String::new(),
                description: "something".to_owned(),
                state: None,
            };
            let validation_result = bad_task.validate();
            assert!(validation_result.is_err());
            let validation_errors = validation_result.unwrap_err();
            let field_validations = validation_errors.field_errors();
            assert!(field_validations.contains_key("title"));
        }

        #[test]
        fn omitted_state_defaults_to_draft() {
            let task = NewTask {
                title: "Something to do".to_owned(),
                description: String::new(),
                state: None,
            };

            let domain_task = domain::todo::NewTask::from(task);
            assert_eq!(domain::todo::TaskState::Draft, domain_task.state);
        }
    }

    mod task_list_query {
        use super::*;

        #[test]
        fn oversized_limit_gets_rejected() {
            let bad_query = TaskListQuery {
                offset: None,
                limit: Some(500),
                title: None,
                description: None,
                state: None,
            };
            let validation_result = bad_query.validate();
            assert!(validation_result.is_err());
            let validation_errors = validation_result.unwrap_err();
            let field_validations = validation_errors.field_errors();
            assert!(field_validations.contains_key("limit"));
        }

        #[test]
        fn missing_pagination_uses_defaults() {
            let query = TaskListQuery {
                offset: None,
                limit: None,
                title: Some("groceries".to_owned()),
                description: None,
                state: Some(TaskState::Todo),
            };

            let (filter, page) = query.into_filter_and_page();
            assert_eq!(0, page.offset);
            assert_eq!(20, page.limit);
            assert_eq!(Some("groceries".to_owned()), filter.title);
            assert_eq!(Some(domain::todo::TaskState::Todo), filter.state);
        }

        #[test]
        fn state_deserializes_from_lowercase() {
            let state: TaskState =
                serde_json::from_str("\"doing\"").expect("state should deserialize");
            assert_eq!(TaskState::Doing, state);
        }
    }
}
