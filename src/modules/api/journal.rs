use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::error::ApiError;
use super::gateway::Gateway;
use super::request::ApiRequest;

const ENTRIES_PATH: &str = "/journal/entries/";
pub const MAX_TAGS: usize = 10;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Great,
    Good,
    #[default]
    Neutral,
    Bad,
    Terrible,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Great => "great",
            Mood::Good => "good",
            Mood::Neutral => "neutral",
            Mood::Bad => "bad",
            Mood::Terrible => "terrible",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "great" => Ok(Mood::Great),
            "good" => Ok(Mood::Good),
            "neutral" => Ok(Mood::Neutral),
            "bad" => Ok(Mood::Bad),
            "terrible" => Ok(Mood::Terrible),
            other => Err(format!(
                "Unknown mood '{}', expected great/good/neutral/bad/terrible",
                other
            )),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct JournalEntry {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub mood: Mood,
    #[serde(default)]
    pub tags: Vec<String>,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub word_count: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct EntryInput {
    pub title: String,
    pub content: String,
    pub mood: Mood,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl EntryInput {
    /// Catch the tag limit locally instead of waiting for a 400
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.tags.len() > MAX_TAGS {
            return Err(ApiError::Validation {
                status: 400,
                errors: serde_json::json!({
                    "tags": [format!("Maximum {} tags allowed.", MAX_TAGS)]
                }),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct JournalFilter {
    pub mood: Option<Mood>,
    pub date: Option<NaiveDate>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct MoodCount {
    pub mood: Mood,
    pub count: u32,
}

fn entry_path(id: i64) -> String {
    format!("{}{}/", ENTRIES_PATH, id)
}

pub async fn list(gateway: &Gateway, filter: &JournalFilter) -> Result<Vec<JournalEntry>, ApiError> {
    let request = ApiRequest::get(ENTRIES_PATH)
        .query_opt("mood", filter.mood)
        .query_opt("date", filter.date)
        .query_opt("search", filter.search.as_deref())
        .query_opt("ordering", filter.ordering.as_deref());
    gateway.send_json(&request).await
}

pub async fn get(gateway: &Gateway, id: i64) -> Result<JournalEntry, ApiError> {
    gateway.send_json(&ApiRequest::get(entry_path(id))).await
}

pub async fn create(gateway: &Gateway, input: &EntryInput) -> Result<JournalEntry, ApiError> {
    input.validate()?;
    let request = ApiRequest::post(ENTRIES_PATH).json(input)?;
    gateway.send_json(&request).await
}

pub async fn update(gateway: &Gateway, id: i64, input: &EntryInput) -> Result<JournalEntry, ApiError> {
    input.validate()?;
    let request = ApiRequest::put(entry_path(id)).json(input)?;
    gateway.send_json(&request).await
}

pub async fn delete(gateway: &Gateway, id: i64) -> Result<(), ApiError> {
    gateway.send_empty(&ApiRequest::delete(entry_path(id))).await
}

pub async fn mood_summary(gateway: &Gateway) -> Result<Vec<MoodCount>, ApiError> {
    let request = ApiRequest::get(format!("{}moods/", ENTRIES_PATH));
    gateway.send_json(&request).await
}
