use itertools::Itertools;
use std::cmp::Reverse;

use crate::modules::api::interviews::{CompanyRounds, Interview, InterviewSummary};
use crate::modules::api::journal::{JournalEntry, MoodCount};
use crate::modules::api::todos::{StatusCount, Todo};
use crate::modules::utils::time::{format_due, utc_to_local};

/// Client-side ordering for `todos list --sort`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoSort {
    Due,
    Priority,
    Title,
}

impl TodoSort {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "due" => Some(TodoSort::Due),
            "priority" => Some(TodoSort::Priority),
            "title" => Some(TodoSort::Title),
            _ => None,
        }
    }
}

/// Undated todos sort last; high priority first
pub fn sort_todos(todos: Vec<Todo>, sort: TodoSort) -> Vec<Todo> {
    match sort {
        TodoSort::Due => todos
            .into_iter()
            .sorted_by_key(|t| (t.due_date.is_none(), t.due_date, t.id))
            .collect(),
        TodoSort::Priority => todos
            .into_iter()
            .sorted_by_key(|t| (Reverse(t.priority), t.id))
            .collect(),
        TodoSort::Title => todos
            .into_iter()
            .sorted_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            .collect(),
    }
}

pub fn todo_line(todo: &Todo) -> String {
    let flag = if todo.is_overdue { " !overdue" } else { "" };
    let category = if todo.category.is_empty() {
        String::new()
    } else {
        format!(" [{}]", todo.category)
    };
    format!(
        "#{:<4} {:<11} {:<6} due {:<10} {}{}{}",
        todo.id,
        todo.status,
        todo.priority,
        format_due(todo.due_date),
        todo.title,
        category,
        flag
    )
}

pub fn status_counts(counts: &[StatusCount]) -> String {
    counts
        .iter()
        .map(|c| format!("{}: {}", c.status, c.count))
        .join(", ")
}

pub fn entry_line(entry: &JournalEntry) -> String {
    let tags = if entry.tags.is_empty() {
        String::new()
    } else {
        format!(" #{}", entry.tags.iter().join(" #"))
    };
    format!(
        "#{:<4} {} {:<8} {} ({} words){}",
        entry.id,
        format_due(entry.date),
        entry.mood,
        entry.title,
        entry.word_count,
        tags
    )
}

pub fn mood_counts(counts: &[MoodCount]) -> String {
    counts
        .iter()
        .sorted_by_key(|c| Reverse(c.count))
        .map(|c| format!("{}: {}", c.mood, c.count))
        .join(", ")
}

pub fn interview_line(interview: &Interview) -> String {
    format!(
        "#{:<4} {} {} / {} round {} ({}, {}) {} {}",
        interview.id,
        utc_to_local(&interview.scheduled_at),
        interview.company_name,
        interview.role,
        interview.round_number,
        interview.round_type,
        interview.mode,
        interview.status,
        interview.result
    )
}

pub fn interview_summary(summary: &InterviewSummary) -> String {
    format!(
        "total: {}, scheduled: {}, completed: {}, selected: {}, rejected: {}, on hold: {}",
        summary.total,
        summary.scheduled,
        summary.completed,
        summary.selected,
        summary.rejected,
        summary.on_hold
    )
}

pub fn company_lines(companies: &[CompanyRounds]) -> Vec<String> {
    companies
        .iter()
        .map(|c| format!("{:<30} {} round(s)", c.company_name, c.total_rounds))
        .collect()
}
