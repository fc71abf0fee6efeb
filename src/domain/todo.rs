use crate::domain;
use crate::domain::todo::driven_ports::{TaskReader, TaskWriter};
use crate::domain::todo::driving_ports::TaskError;
use crate::external_connections::ExternalConnectivity;
use derive_more::Display;
use log::error;
use std::str::FromStr;
use thiserror::Error;

/// The lifecycle state of a task. Tasks start in [Draft](TaskState::Draft) and only ever
/// hold one of these five values.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum TaskState {
    #[display("draft")]
    Draft,
    #[display("todo")]
    Todo,
    #[display("doing")]
    Doing,
    #[display("done")]
    Done,
    #[display("trash")]
    Trash,
}

#[derive(Debug, Error)]
#[error("unknown task state \"{0}\"")]
pub struct UnknownTaskState(String);

impl FromStr for TaskState {
    type Err = UnknownTaskState;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "draft" => Ok(TaskState::Draft),
            "todo" => Ok(TaskState::Todo),
            "doing" => Ok(TaskState::Doing),
            "done" => Ok(TaskState::Done),
            "trash" => Ok(TaskState::Trash),
            other => Err(UnknownTaskState(other.to_owned())),
        }
    }
}

/// A task owned by exactly one user. Tasks are only ever visible to their owner.
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TodoTask {
    pub id: i32,
    pub owner_user_id: i32,
    pub title: String,
    pub item_desc: String,
    pub state: TaskState,
}

#[cfg_attr(test, derive(Clone, Debug, PartialEq, Eq))]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub state: TaskState,
}

/// A partial update to a task. Fields left as [None] keep their current value.
#[cfg_attr(test, derive(Clone, Debug, PartialEq, Eq))]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub state: Option<TaskState>,
}

/// Optional criteria narrowing a task listing. Title and description match on substring,
/// state matches exactly. Absent criteria match everything.
#[derive(Default)]
#[cfg_attr(test, derive(Clone, Debug, PartialEq, Eq))]
pub struct TaskFilter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub state: Option<TaskState>,
}

#[cfg_attr(test, derive(Clone, Debug, PartialEq, Eq))]
pub struct Pagination {
    pub offset: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            offset: 0,
            limit: 20,
        }
    }
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait TaskReader {
        /// Lists a user's tasks matching [filter], one [page] at a time
        async fn list_for_user(
            &self,
            user_id: i32,
            filter: &TaskFilter,
            page: &Pagination,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TodoTask>, anyhow::Error>;

        /// Fetches one of a user's tasks. Tasks owned by other users are invisible.
        async fn user_task_by_id(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<TodoTask>, anyhow::Error>;
    }

    pub trait TaskWriter {
        async fn create_task_for_user(
            &self,
            user_id: i32,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error>;

        /// Updates one of a user's tasks, reporting whether a task was actually touched
        async fn update_task_for_user(
            &self,
            user_id: i32,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;

        /// Deletes one of a user's tasks, reporting whether a task was actually removed
        async fn delete_task_for_user(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::domain;
    use crate::external_connections::ExternalConnectivity;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("The specified user did not exist.")]
        UserDoesNotExist,
        #[error("The specified task did not exist.")]
        TaskNotFound,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    impl From<domain::user::UserExistsErr> for TaskError {
        fn from(value: domain::user::UserExistsErr) -> Self {
            match value {
                domain::user::UserExistsErr::UserDoesNotExist(user_id) => {
                    error!("User {} didn't exist when touching tasks.", user_id);
                    TaskError::UserDoesNotExist
                }
                domain::user::UserExistsErr::PortError(err) => {
                    TaskError::from(err.context("Checking task owner"))
                }
            }
        }
    }


    pub trait TaskPort {
        async fn tasks_for_user(
            &self,
            user_id: i32,
            filter: &TaskFilter,
            page: &Pagination,
            ext_cxn: &mut impl ExternalConnectivity,
            u_detect: &impl domain::user::driven_ports::DetectUser,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<TodoTask>, TaskError>;

        async fn user_task_by_id(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            u_detect: &impl domain::user::driven_ports::DetectUser,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Option<TodoTask>, TaskError>;

        async fn create_task_for_user(
            &self,
            user_id: i32,
            task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            u_detect: &impl domain::user::driven_ports::DetectUser,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<i32, TaskError>;

        async fn update_task_for_user(
            &self,
            user_id: i32,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;

        async fn delete_task_for_user(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;
    }
}

pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    async fn tasks_for_user(
        &self,
        user_id: i32,
        filter: &TaskFilter,
        page: &Pagination,
        ext_cxn: &mut impl ExternalConnectivity,
        u_detect: &impl domain::user::driven_ports::DetectUser,
        task_read: &impl TaskReader,
    ) -> Result<Vec<TodoTask>, TaskError> {
        domain::user::verify_user_exists(user_id, &mut *ext_cxn, u_detect).await?;
        let tasks_result = task_read
            .list_for_user(user_id, filter, page, &mut *ext_cxn)
            .await?;

        Ok(tasks_result)
    }

    async fn user_task_by_id(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        u_detect: &impl domain::user::driven_ports::DetectUser,
        task_read: &impl TaskReader,
    ) -> Result<Option<TodoTask>, TaskError> {
        domain::user::verify_user_exists(user_id, &mut *ext_cxn, u_detect).await?;
        let task_result = task_read
            .user_task_by_id(user_id, task_id, &mut *ext_cxn)
            .await?;

        Ok(task_result)
    }

    async fn create_task_for_user(
        &self,
        user_id: i32,
        task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        u_detect: &impl domain::user::driven_ports::DetectUser,
        task_write: &impl TaskWriter,
    ) -> Result<i32, TaskError> {
        domain::user::verify_user_exists(user_id, &mut *ext_cxn, u_detect).await?;
        let created_task_id = task_write
            .create_task_for_user(user_id, task, &mut *ext_cxn)
            .await?;

        Ok(created_task_id)
    }

    async fn update_task_for_user(
        &self,
        user_id: i32,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        let task_was_touched = task_write
            .update_task_for_user(user_id, task_id, update, &mut *ext_cxn)
            .await?;
        if !task_was_touched {
            return Err(TaskError::TaskNotFound);
        }

        Ok(())
    }

    async fn delete_task_for_user(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        let task_was_removed = task_write
            .delete_task_for_user(user_id, task_id, &mut *ext_cxn)
            .await?;
        if !task_was_removed {
            return Err(TaskError::TaskNotFound);
        }

        Ok(())
    }
}
