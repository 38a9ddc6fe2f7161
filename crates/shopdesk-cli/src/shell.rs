//! Interactive shell.
//!
//! Reads one command per line from stdin. The prompt shows the current route
//! and the auth indicator, which follows session changes such as a 401
//! clearing the token mid-session.

use std::io::Write;
use std::str::FromStr;

use anyhow::Result;
use shopdesk_core::Route;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::app::{App, Outcome};
use crate::commands::{choose_username, prompt_password, sign_in, sign_out, status};

const HELP: &str = "\
Commands:
  open PATH [PAGE]   open a page, e.g. open /pages/admin/users
  PATH [PAGE]        same as open
  next | prev        move through a paged list
  reload             reload the current page
  login [USERNAME]   sign in and return to where you were headed
  logout             sign out
  status             show backend and session state
  routes             list every page
  help               show this help
  quit               leave the shell
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    Open(Route, u32),
    Next,
    Prev,
    Reload,
    Login(Option<String>),
    Logout,
    Status,
    Routes,
    Help,
    Quit,
}

fn parse_page(arg: Option<&str>) -> Result<u32, String> {
    match arg {
        None => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| format!("Invalid page number: {}", raw)),
    }
}

fn parse_open(path: &str, page: Option<&str>) -> Result<ShellCommand, String> {
    let route = Route::from_str(path).map_err(|e| e.to_string())?;
    Ok(ShellCommand::Open(route, parse_page(page)?))
}

impl FromStr for ShellCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Ok(ShellCommand::Empty);
        };
        let second = words.next();

        match first {
            "open" => match second {
                Some(path) => parse_open(path, words.next()),
                None => Err("Usage: open PATH [PAGE]".to_string()),
            },
            path if path.starts_with('/') => parse_open(path, second),
            "next" => Ok(ShellCommand::Next),
            "prev" => Ok(ShellCommand::Prev),
            "reload" => Ok(ShellCommand::Reload),
            "login" => Ok(ShellCommand::Login(second.map(str::to_string))),
            "logout" => Ok(ShellCommand::Logout),
            "status" => Ok(ShellCommand::Status),
            "routes" => Ok(ShellCommand::Routes),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
            other => Err(format!("Unknown command: {} (try `help`)", other)),
        }
    }
}

/// Position in a paged list shown last, for `next`/`prev`/`reload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Viewing {
    route: Route,
    page: u32,
    has_next: bool,
}

impl Viewing {
    fn after(outcome: &Outcome, page: u32) -> Option<Self> {
        match outcome {
            Outcome::Rendered { route, screen } => {
                let (page, has_next) = screen.page_position().unwrap_or((page, false));
                Some(Self {
                    route: *route,
                    page,
                    has_next,
                })
            }
            _ => None,
        }
    }
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>, prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}

async fn open(app: &mut App, viewing: &mut Option<Viewing>, route: Route, page: u32) {
    let outcome = app.open(route, page).await;
    print!("{}", outcome.render());
    if let Some(next) = Viewing::after(&outcome, page) {
        *viewing = Some(next);
    }
}

pub async fn run(app: &mut App) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut viewing: Option<Viewing> = None;

    println!("shopdesk shell - type `help` for commands");

    loop {
        if app.refresh_indicator() {
            let state = if app.is_authenticated() {
                "Signed in."
            } else {
                "Signed out."
            };
            println!("{}", state);
        }

        let marker = if app.is_authenticated() { "*" } else { "" };
        let prompt = format!("shopdesk{} {}> ", marker, app.navigator().route());
        let Some(line) = read_line(&mut lines, &prompt).await? else {
            break;
        };

        let command = match line.parse::<ShellCommand>() {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match command {
            ShellCommand::Empty => {}
            ShellCommand::Open(route, page) => open(app, &mut viewing, route, page).await,
            ShellCommand::Next => match viewing {
                Some(v) if v.has_next => open(app, &mut viewing, v.route, v.page + 1).await,
                Some(_) => println!("Already on the last page."),
                None => println!("Nothing to page through."),
            },
            ShellCommand::Prev => match viewing {
                Some(v) if v.page > 0 => open(app, &mut viewing, v.route, v.page - 1).await,
                Some(_) => println!("Already on the first page."),
                None => println!("Nothing to page through."),
            },
            ShellCommand::Reload => {
                let (route, page) = viewing
                    .map(|v| (v.route, v.page))
                    .unwrap_or((app.navigator().route(), 0));
                open(app, &mut viewing, route, page).await;
            }
            ShellCommand::Login(username) => {
                app.begin_login(None);
                let username = match username {
                    Some(u) => u,
                    None => {
                        let prompt = match app.last_username() {
                            Some(last) => format!("Username [{}]: ", last),
                            None => "Username: ".to_string(),
                        };
                        let Some(input) = read_line(&mut lines, &prompt).await? else {
                            break;
                        };
                        choose_username(&input, app.last_username())
                    }
                };
                let password = prompt_password()?;
                if sign_in(app, username, password).await? {
                    viewing = None;
                }
            }
            ShellCommand::Logout => {
                sign_out(app).await;
                viewing = None;
            }
            ShellCommand::Status => print!("{}", status(app)),
            ShellCommand::Routes => {
                for route in Route::all() {
                    let lock = if route.needs_session() { " (login)" } else { "" };
                    println!("  {:<28} {}{}", route.path(), route.title(), lock);
                }
            }
            ShellCommand::Help => print!("{}", HELP),
            ShellCommand::Quit => break,
        }
    }

    Ok(())
}
