use clap::ArgMatches;
use log::info;
use rpassword::prompt_password;
use std::str::FromStr;
use thiserror::Error;

use super::display::{self, TodoSort};
use crate::modules::api::interviews::{
    self, FeedbackInput, InterviewFilter, InterviewResult, InterviewStatus,
};
use crate::modules::api::journal::{self, EntryInput, JournalFilter};
use crate::modules::api::todos::{self, TodoFilter, TodoInput};
use crate::modules::api::ApiError;
use crate::modules::session::{AccessClaims, RegisterForm, SessionManager, UserProfile};
use crate::modules::utils::io::{is_valid_email, prompt, prompt_with_confirmation};
use crate::modules::utils::time::{format_duration, get_current_timestamp, parse_date};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("Not logged in. Run `lifeos login` first.")]
    NotLoggedIn,

    #[error("Input error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CliError {
    /// Message for the terminal, preferring the server's own wording
    pub fn user_message(&self) -> String {
        match self {
            CliError::Api(e) => match e.first_message() {
                Some(message) => message,
                None => e.to_string(),
            },
            other => other.to_string(),
        }
    }
}

/// Read an optional argument through `FromStr`
fn parsed<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>, CliError>
where
    T: FromStr<Err = String>,
{
    matches
        .get_one::<String>(name)
        .map(|value| value.parse::<T>().map_err(CliError::Usage))
        .transpose()
}

fn text(matches: &ArgMatches, name: &str) -> Option<String> {
    matches.get_one::<String>(name).cloned()
}

fn require_user(manager: &SessionManager) -> Result<UserProfile, CliError> {
    manager
        .snapshot()
        .user()
        .cloned()
        .ok_or(CliError::NotLoggedIn)
}

/// Dispatch a parsed command line against an initialized session
pub async fn run(matches: &ArgMatches, manager: &SessionManager) -> Result<(), CliError> {
    match matches.subcommand() {
        Some(("login", sub)) => login(sub, manager).await,
        Some(("register", _)) => register(manager).await,
        Some(("google", sub)) => google(sub, manager).await,
        Some(("logout", _)) => logout(manager).await,
        Some(("whoami", _)) => whoami(manager),
        Some(("todos", sub)) => {
            require_user(manager)?;
            todos_command(sub, manager).await
        }
        Some(("journal", sub)) => {
            require_user(manager)?;
            journal_command(sub, manager).await
        }
        Some(("interviews", sub)) => {
            require_user(manager)?;
            interviews_command(sub, manager).await
        }
        _ => Err(CliError::Usage("Unknown command. Try `lifeos --help`.".into())),
    }
}

fn ensure_logged_out(manager: &SessionManager) -> Result<(), CliError> {
    match manager.snapshot().user() {
        Some(user) => Err(CliError::Usage(format!(
            "Already logged in as {}. Run `lifeos logout` first.",
            user.display_name()
        ))),
        None => Ok(()),
    }
}

fn read_email(matches: Option<&ArgMatches>) -> Result<String, CliError> {
    let email = match matches.and_then(|m| text(m, "email")) {
        Some(email) => email,
        None => prompt("Email")?,
    };
    if !is_valid_email(&email) {
        return Err(CliError::Usage(format!("'{}' is not a valid email address", email)));
    }
    Ok(email)
}

async fn login(matches: &ArgMatches, manager: &SessionManager) -> Result<(), CliError> {
    ensure_logged_out(manager)?;
    let email = read_email(Some(matches))?;
    let password = prompt_password("Password: ")?;

    let user = manager.sign_in(&email, &password).await?;
    println!("Welcome back, {}!", user.display_name());
    Ok(())
}

async fn register(manager: &SessionManager) -> Result<(), CliError> {
    ensure_logged_out(manager)?;
    let name = prompt("Full name")?;
    let username = prompt("Username")?;
    let email = read_email(None)?;
    let password = prompt_password("Password: ")?;
    let password2 = prompt_password("Confirm password: ")?;
    if password != password2 {
        return Err(CliError::Usage("Passwords do not match.".into()));
    }

    let form = RegisterForm {
        name,
        username,
        email,
        password,
        password2,
    };
    let user = manager.sign_up(&form).await?;
    println!("Account created. Logged in as {}.", user.display_name());
    Ok(())
}

async fn google(matches: &ArgMatches, manager: &SessionManager) -> Result<(), CliError> {
    ensure_logged_out(manager)?;
    let token = text(matches, "token").ok_or_else(|| CliError::Usage("--token is required".into()))?;
    let user = manager.sign_in_with_google(&token).await?;
    println!("Logged in as {}.", user.display_name());
    Ok(())
}

async fn logout(manager: &SessionManager) -> Result<(), CliError> {
    if !manager.snapshot().is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }
    manager.sign_out().await?;
    println!("Logged out.");
    Ok(())
}

fn whoami(manager: &SessionManager) -> Result<(), CliError> {
    let user = require_user(manager)?;
    println!("{} <{}>", user.display_name(), user.email);
    if !user.username.is_empty() {
        println!("Username: {}", user.username);
    }

    let claims = manager
        .gateway()
        .store()
        .access_token()
        .and_then(|token| AccessClaims::decode(&token));
    if let Some(expires_at) = claims.as_ref().and_then(AccessClaims::expires_at) {
        let remaining = expires_at.timestamp() - get_current_timestamp();
        if remaining > 0 {
            println!("Access token expires in {}", format_duration(remaining));
        } else {
            println!("Access token expired; it will be refreshed on the next request");
        }
    }
    Ok(())
}

async fn todos_command(matches: &ArgMatches, manager: &SessionManager) -> Result<(), CliError> {
    let gateway = manager.gateway();
    match matches.subcommand() {
        Some(("list", sub)) => {
            let filter = TodoFilter {
                status: parsed(sub, "status")?,
                priority: parsed(sub, "priority")?,
                category: text(sub, "category"),
                search: text(sub, "search"),
                ordering: None,
            };
            let mut items = todos::list(gateway, &filter).await?;
            if let Some(sort) = sub.get_one::<String>("sort").and_then(|s| TodoSort::parse(s)) {
                items = display::sort_todos(items, sort);
            }
            if items.is_empty() {
                println!("No todos found.");
            }
            for todo in &items {
                println!("{}", display::todo_line(todo));
            }
        }
        Some(("add", sub)) => {
            let input = TodoInput {
                title: text(sub, "title").unwrap_or_default(),
                description: text(sub, "description").unwrap_or_default(),
                priority: parsed(sub, "priority")?.unwrap_or_default(),
                status: None,
                category: text(sub, "category").unwrap_or_default(),
                due_date: sub
                    .get_one::<String>("due")
                    .map(|d| parse_date(d))
                    .transpose()
                    .map_err(CliError::Usage)?,
            };
            let todo = todos::create(gateway, &input).await?;
            info!("Created todo {}", todo.id);
            println!("Added: {}", display::todo_line(&todo));
        }
        Some(("toggle", sub)) => {
            let id = id_of(sub)?;
            let change = todos::toggle_status(gateway, id).await?;
            println!("Todo #{} is now {}", change.id, change.status);
        }
        Some(("delete", sub)) => {
            let id = id_of(sub)?;
            if !confirm_delete(sub, &format!("todo #{}", id))? {
                println!("Kept todo #{}", id);
                return Ok(());
            }
            todos::delete(gateway, id).await?;
            println!("Deleted todo #{}", id);
        }
        Some(("summary", _)) => {
            let counts = todos::summary(gateway).await?;
            println!("{}", display::status_counts(&counts));
        }
        Some(("overdue", _)) => {
            let items = todos::overdue(gateway).await?;
            if items.is_empty() {
                println!("Nothing overdue.");
            }
            for todo in &items {
                println!("{}", display::todo_line(todo));
            }
        }
        _ => return Err(CliError::Usage("Unknown todos command".into())),
    }
    Ok(())
}

async fn journal_command(matches: &ArgMatches, manager: &SessionManager) -> Result<(), CliError> {
    let gateway = manager.gateway();
    match matches.subcommand() {
        Some(("list", sub)) => {
            let filter = JournalFilter {
                mood: parsed(sub, "mood")?,
                search: text(sub, "search"),
                ..Default::default()
            };
            let entries = journal::list(gateway, &filter).await?;
            if entries.is_empty() {
                println!("No entries found.");
            }
            for entry in &entries {
                println!("{}", display::entry_line(entry));
            }
        }
        Some(("add", sub)) => {
            let input = EntryInput {
                title: text(sub, "title").unwrap_or_default(),
                content: text(sub, "content").unwrap_or_default(),
                mood: parsed(sub, "mood")?.unwrap_or_default(),
                tags: sub
                    .get_many::<String>("tags")
                    .map(|tags| {
                        tags.map(|t| t.trim().to_string())
                            .filter(|t| !t.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
                date: sub
                    .get_one::<String>("date")
                    .map(|d| parse_date(d))
                    .transpose()
                    .map_err(CliError::Usage)?,
            };
            let entry = journal::create(gateway, &input).await?;
            println!("Saved: {}", display::entry_line(&entry));
        }
        Some(("delete", sub)) => {
            let id = id_of(sub)?;
            if !confirm_delete(sub, &format!("journal entry #{}", id))? {
                println!("Kept entry #{}", id);
                return Ok(());
            }
            journal::delete(gateway, id).await?;
            println!("Deleted entry #{}", id);
        }
        Some(("moods", _)) => {
            let counts = journal::mood_summary(gateway).await?;
            println!("{}", display::mood_counts(&counts));
        }
        _ => return Err(CliError::Usage("Unknown journal command".into())),
    }
    Ok(())
}

async fn interviews_command(matches: &ArgMatches, manager: &SessionManager) -> Result<(), CliError> {
    let gateway = manager.gateway();
    match matches.subcommand() {
        Some(("list", sub)) => {
            let filter = InterviewFilter {
                status: parsed(sub, "status")?,
                result: parsed(sub, "result")?,
                search: text(sub, "search"),
                ..Default::default()
            };
            let rounds = interviews::list(gateway, &filter).await?;
            if rounds.is_empty() {
                println!("No interviews found.");
            }
            for interview in &rounds {
                println!("{}", display::interview_line(interview));
            }
        }
        Some(("upcoming", _)) => {
            let rounds = interviews::upcoming(gateway).await?;
            if rounds.is_empty() {
                println!("No interviews in the next 7 days.");
            }
            for interview in &rounds {
                println!("{}", display::interview_line(interview));
            }
        }
        Some(("summary", _)) => {
            let summary = interviews::summary(gateway).await?;
            println!("{}", display::interview_summary(&summary));
        }
        Some(("companies", _)) => {
            for line in display::company_lines(&interviews::by_company(gateway).await?) {
                println!("{}", line);
            }
        }
        Some(("feedback", sub)) => {
            let id = id_of(sub)?;
            let result: Option<InterviewResult> = parsed(sub, "result")?;
            let mut status: Option<InterviewStatus> = parsed(sub, "status")?;
            // A verdict implies the round took place
            if status.is_none() && result.map_or(false, |r| r.requires_completion()) {
                status = Some(InterviewStatus::Completed);
            }
            let input = FeedbackInput {
                feedback: text(sub, "text"),
                result,
                status,
            };
            let interview = interviews::add_feedback(gateway, id, &input).await?;
            println!("Updated: {}", display::interview_line(&interview));
        }
        _ => return Err(CliError::Usage("Unknown interviews command".into())),
    }
    Ok(())
}

/// `--yes` skips the question
fn confirm_delete(matches: &ArgMatches, what: &str) -> Result<bool, CliError> {
    if matches.get_flag("yes") {
        return Ok(true);
    }
    Ok(prompt_with_confirmation(
        &format!("This permanently deletes {}.", what),
        "Continue?",
    )?)
}

fn id_of(matches: &ArgMatches) -> Result<i64, CliError> {
    matches
        .get_one::<i64>("id")
        .copied()
        .ok_or_else(|| CliError::Usage("An id is required".into()))
}
