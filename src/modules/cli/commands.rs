use clap::{value_parser, Arg, ArgAction, Command};

/// Define the command-line interface
pub fn build_cli() -> Command {
    Command::new("lifeos")
        .about("Command-line client for the LifeOS todo, journal and interview tracker")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("ephemeral")
                .long("ephemeral")
                .help("Keep credentials in memory only for this run")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("login")
                .about("Log in with email and password")
                .arg(Arg::new("email").long("email").value_name("EMAIL")),
        )
        .subcommand(Command::new("register").about("Create a new account"))
        .subcommand(
            Command::new("google")
                .about("Log in with a Google ID token")
                .arg(
                    Arg::new("token")
                        .long("token")
                        .value_name("ID_TOKEN")
                        .required(true),
                ),
        )
        .subcommand(Command::new("logout").about("Log out and forget stored credentials"))
        .subcommand(Command::new("whoami").about("Show the logged-in user"))
        .subcommand(todos_command())
        .subcommand(journal_command())
        .subcommand(interviews_command())
}

fn yes_arg() -> Arg {
    Arg::new("yes")
        .short('y')
        .long("yes")
        .help("Delete without asking")
        .action(ArgAction::SetTrue)
}

fn id_arg() -> Arg {
    Arg::new("id")
        .help("Record id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn todos_command() -> Command {
    Command::new("todos")
        .about("Manage todos")
        .subcommand_required(true)
        .subcommand(
            Command::new("list")
                .about("List todos")
                .arg(Arg::new("status").long("status").help("pending, in_progress or done"))
                .arg(Arg::new("priority").long("priority").help("low, medium or high"))
                .arg(Arg::new("category").long("category"))
                .arg(Arg::new("search").long("search"))
                .arg(
                    Arg::new("sort")
                        .long("sort")
                        .help("Sort by due date, priority or title")
                        .value_parser(["due", "priority", "title"]),
                ),
        )
        .subcommand(
            Command::new("add")
                .about("Add a todo")
                .arg(Arg::new("title").required(true))
                .arg(Arg::new("description").long("description"))
                .arg(Arg::new("priority").long("priority"))
                .arg(Arg::new("due").long("due").value_name("YYYY-MM-DD"))
                .arg(Arg::new("category").long("category")),
        )
        .subcommand(
            Command::new("toggle")
                .about("Advance a todo to its next status")
                .arg(id_arg()),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a todo")
                .arg(id_arg())
                .arg(yes_arg()),
        )
        .subcommand(Command::new("summary").about("Count todos by status"))
        .subcommand(Command::new("overdue").about("List unfinished todos past their due date"))
}

fn journal_command() -> Command {
    Command::new("journal")
        .about("Manage journal entries")
        .subcommand_required(true)
        .subcommand(
            Command::new("list")
                .about("List entries")
                .arg(Arg::new("mood").long("mood"))
                .arg(Arg::new("search").long("search")),
        )
        .subcommand(
            Command::new("add")
                .about("Write an entry")
                .arg(Arg::new("title").required(true))
                .arg(Arg::new("content").required(true))
                .arg(Arg::new("mood").long("mood"))
                .arg(
                    Arg::new("tags")
                        .long("tags")
                        .help("Comma-separated tags")
                        .value_delimiter(','),
                )
                .arg(Arg::new("date").long("date").value_name("YYYY-MM-DD")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete an entry")
                .arg(id_arg())
                .arg(yes_arg()),
        )
        .subcommand(Command::new("moods").about("Count entries by mood"))
}

fn interviews_command() -> Command {
    Command::new("interviews")
        .about("Track interview rounds")
        .subcommand_required(true)
        .subcommand(
            Command::new("list")
                .about("List interviews")
                .arg(Arg::new("status").long("status"))
                .arg(Arg::new("result").long("result"))
                .arg(Arg::new("search").long("search")),
        )
        .subcommand(Command::new("upcoming").about("Rounds scheduled in the next 7 days"))
        .subcommand(Command::new("summary").about("Totals by status and result"))
        .subcommand(Command::new("companies").about("Rounds per company"))
        .subcommand(
            Command::new("feedback")
                .about("Record feedback after a round")
                .arg(id_arg())
                .arg(Arg::new("text").required(true))
                .arg(Arg::new("result").long("result"))
                .arg(Arg::new("status").long("status")),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_parse_todos_list() {
        let matches = build_cli()
            .try_get_matches_from(["lifeos", "--ephemeral", "todos", "list", "--sort", "due"])
            .unwrap();
        assert!(matches.get_flag("ephemeral"));

        let (name, todos) = matches.subcommand().unwrap();
        assert_eq!(name, "todos");
        let (_, list) = todos.subcommand().unwrap();
        assert_eq!(list.get_one::<String>("sort").map(String::as_str), Some("due"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(build_cli()
            .try_get_matches_from(["lifeos", "todos", "list", "--sort", "size"])
            .is_err());
        assert!(build_cli()
            .try_get_matches_from(["lifeos", "todos", "toggle", "abc"])
            .is_err());
    }

    #[test]
    fn test_journal_tags_split() {
        let matches = build_cli()
            .try_get_matches_from(["lifeos", "journal", "add", "Day", "Text", "--tags", "a,b"])
            .unwrap();
        let (_, journal) = matches.subcommand().unwrap();
        let (_, add) = journal.subcommand().unwrap();
        let tags: Vec<&String> = add.get_many::<String>("tags").unwrap().collect();
        assert_eq!(tags, ["a", "b"]);
    }
}
