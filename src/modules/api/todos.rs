use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::error::ApiError;
use super::gateway::Gateway;
use super::request::ApiRequest;

const TODOS_PATH: &str = "/todos/";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    #[default]
    Pending,
    InProgress,
    Done,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::Done => "done",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("Unknown priority '{}', expected low/medium/high", other)),
        }
    }
}

impl FromStr for TodoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "pending" => Ok(TodoStatus::Pending),
            "in_progress" => Ok(TodoStatus::InProgress),
            "done" => Ok(TodoStatus::Done),
            other => Err(format!(
                "Unknown status '{}', expected pending/in_progress/done",
                other
            )),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TodoStatus,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_overdue: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body for create and full update
#[derive(Serialize, Debug, Clone, Default)]
pub struct TodoInput {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TodoStatus>,
    pub category: String,
    pub due_date: Option<NaiveDate>,
}

/// Server-side list filters
#[derive(Debug, Clone, Default)]
pub struct TodoFilter {
    pub status: Option<TodoStatus>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub id: i64,
    pub status: TodoStatus,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct StatusCount {
    pub status: TodoStatus,
    pub count: u32,
}

fn todo_path(id: i64) -> String {
    format!("{}{}/", TODOS_PATH, id)
}

pub async fn list(gateway: &Gateway, filter: &TodoFilter) -> Result<Vec<Todo>, ApiError> {
    let request = ApiRequest::get(TODOS_PATH)
        .query_opt("status", filter.status)
        .query_opt("priority", filter.priority)
        .query_opt("category", filter.category.as_deref())
        .query_opt("search", filter.search.as_deref())
        .query_opt("ordering", filter.ordering.as_deref());
    gateway.send_json(&request).await
}

pub async fn create(gateway: &Gateway, input: &TodoInput) -> Result<Todo, ApiError> {
    let request = ApiRequest::post(TODOS_PATH).json(input)?;
    gateway.send_json(&request).await
}

pub async fn update(gateway: &Gateway, id: i64, input: &TodoInput) -> Result<Todo, ApiError> {
    let request = ApiRequest::put(todo_path(id)).json(input)?;
    gateway.send_json(&request).await
}

pub async fn delete(gateway: &Gateway, id: i64) -> Result<(), ApiError> {
    gateway.send_empty(&ApiRequest::delete(todo_path(id))).await
}

/// Advance pending -> in_progress -> done -> pending
pub async fn toggle_status(gateway: &Gateway, id: i64) -> Result<StatusChange, ApiError> {
    let request = ApiRequest::patch(format!("{}toggle_status/", todo_path(id)));
    gateway.send_json(&request).await
}

pub async fn summary(gateway: &Gateway) -> Result<Vec<StatusCount>, ApiError> {
    let request = ApiRequest::get(format!("{}summary/", TODOS_PATH));
    gateway.send_json(&request).await
}

pub async fn overdue(gateway: &Gateway) -> Result<Vec<Todo>, ApiError> {
    let request = ApiRequest::get(format!("{}overdue/", TODOS_PATH));
    gateway.send_json(&request).await
}
