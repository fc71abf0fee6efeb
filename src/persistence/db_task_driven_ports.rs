use crate::domain;
use crate::domain::todo::{NewTask, Pagination, TaskFilter, TaskState, TodoTask, UpdateTask};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use sqlx::prelude::FromRow;
use sqlx::{Postgres, QueryBuilder};
use std::str::FromStr;

pub struct DbTaskReader;

#[derive(FromRow)]
struct TodoItemRow {
    id: i32,
    user_id: i32,
    title: String,
    item_desc: String,
    state: String,
}

impl TryFrom<TodoItemRow> for TodoTask {
    type Error = anyhow::Error;

    fn try_from(value: TodoItemRow) -> Result<Self, Self::Error> {
        let state = TaskState::from_str(&value.state)
            .context("mapping a task row's lifecycle state")?;

        Ok(TodoTask {
            id: value.id,
            owner_user_id: value.user_id,
            title: value.title,
            item_desc: value.item_desc,
            state,
        })
    }
}

/// Builds an ILIKE pattern matching [filter_text] anywhere in a column, escaping
/// characters LIKE treats specially
fn contains_pattern(filter_text: &str) -> String {
    let escaped = filter_text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    format!("%{escaped}%")
}

impl domain::todo::driven_ports::TaskReader for DbTaskReader {
    async fn list_for_user(
        &self,
        user_id: i32,
        filter: &TaskFilter,
        page: &Pagination,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<TodoTask>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let mut list_query = QueryBuilder::<Postgres>::new(
            "SELECT ti.id, ti.user_id, ti.title, ti.item_desc, ti.state \
             FROM todo_item ti WHERE ti.user_id = ",
        );
        list_query.push_bind(user_id);
        if let Some(ref title) = filter.title {
            list_query.push(" AND ti.title ILIKE ");
            list_query.push_bind(contains_pattern(title));
        }
        if let Some(ref description) = filter.description {
            list_query.push(" AND ti.item_desc ILIKE ");
            list_query.push_bind(contains_pattern(description));
        }
        if let Some(state) = filter.state {
            list_query.push(" AND ti.state = ");
            list_query.push_bind(state.to_string());
        }
        list_query.push(" ORDER BY ti.id OFFSET ");
        list_query.push_bind(page.offset);
        list_query.push(" LIMIT ");
        list_query.push_bind(page.limit);

        let task_rows: Vec<TodoItemRow> = list_query
            .build_query_as()
            .fetch_all(cxn.borrow_connection())
            .await
            .context("trying to fetch todo items for a user")?;

        task_rows
            .into_iter()
            .map(TodoTask::try_from)
            .collect::<Result<Vec<_>, _>>()
    }

    async fn user_task_by_id(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<TodoTask>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let task_row: Option<TodoItemRow> = sqlx::query_as(
            "SELECT ti.id, ti.user_id, ti.title, ti.item_desc, ti.state \
             FROM todo_item ti WHERE ti.user_id = $1 AND ti.id = $2",
        )
        .bind(user_id)
        .bind(task_id)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to fetch a todo item by ID")?;

        task_row.map(TodoTask::try_from).transpose()
    }
}

pub struct DbTaskWriter;

impl domain::todo::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task_for_user(
        &self,
        user_id: i32,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let new_id: super::NewId = sqlx::query_as(
            "INSERT INTO todo_item(user_id, title, item_desc, state) \
             VALUES ($1, $2, $3, $4) RETURNING todo_item.id",
        )
        .bind(user_id)
        .bind(&new_task.title)
        .bind(&new_task.description)
        .bind(new_task.state.to_string())
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to insert a new task into the database")?;

        Ok(new_id.id)
    }

    async fn update_task_for_user(
        &self,
        user_id: i32,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let update_result = sqlx::query(
            "UPDATE todo_item SET \
                title = COALESCE($1, title), \
                item_desc = COALESCE($2, item_desc), \
                state = COALESCE($3, state) \
             WHERE id = $4 AND user_id = $5",
        )
        .bind(update.title.as_deref())
        .bind(update.description.as_deref())
        .bind(update.state.map(|state| state.to_string()))
        .bind(task_id)
        .bind(user_id)
        .execute(cxn.borrow_connection())
        .await
        .context("trying to update a task in the database")?;

        Ok(update_result.rows_affected() > 0)
    }

    async fn delete_task_for_user(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let delete_result = sqlx::query("DELETE FROM todo_item WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a task from the database")?;

        Ok(delete_result.rows_affected() > 0)
    }
}
