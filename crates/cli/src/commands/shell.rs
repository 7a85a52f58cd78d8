//! Interactive dashboard shell.

use std::io::Write;
use std::num::NonZeroUsize;
use std::str::FromStr;

use little_sun_core::{
    ParseSortColumnError, ParseSortDirectionError, Route, SortColumn, SortDirection, SortSpec,
};
use little_sun_dashboard::components::{DataTableConfig, customer_records_table_config};
use little_sun_dashboard::services::SearchOutcome;
use little_sun_dashboard::{Dashboard, DashboardConfig, DashboardError};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CommandError, render};

const HELP: &str = "\
Commands:
  login <credential>        verify an identity-provider credential
  search <customer>         search customer records
  sort <column> [asc|desc]  sort the table (sort none to reset)
  page <n>                  show page n
  size <n>                  rows per page
  show                      show the current page
  go <path>                 navigate (/table, /dashboard, /address-form, /login)
  whoami [--remote]         show the signed-in user
  logout                    log out
  quit                      leave the shell";

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Help,
    Login(String),
    Search(String),
    Sort(SortSpec),
    Page(NonZeroUsize),
    Size(NonZeroUsize),
    Show,
    Go(String),
    WhoAmI { remote: bool },
    Logout,
    Quit,
}

/// Errors parsing a shell line.
#[derive(Debug, Error, PartialEq, Eq)]
enum ParseCommandError {
    #[error("")]
    Blank,

    #[error("unknown command: {0} (try help)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Column(#[from] ParseSortColumnError),

    #[error(transparent)]
    Direction(#[from] ParseSortDirectionError),
}

impl FromStr for ShellCommand {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        let number = |usage| {
            rest.parse::<NonZeroUsize>()
                .map_err(|_| ParseCommandError::Usage(usage))
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Err(ParseCommandError::Blank),
            "help" | "?" => Ok(Self::Help),
            "login" if !rest.is_empty() => Ok(Self::Login(rest.to_string())),
            "login" => Err(ParseCommandError::Usage("login <credential>")),
            // The dispatcher validates the term
            "search" => Ok(Self::Search(rest.to_string())),
            "sort" => parse_sort(rest).map(Self::Sort),
            "page" => number("page <n>").map(Self::Page),
            "size" => number("size <n>").map(Self::Size),
            "show" => Ok(Self::Show),
            "go" if !rest.is_empty() => Ok(Self::Go(rest.to_string())),
            "go" => Err(ParseCommandError::Usage("go <path>")),
            "whoami" => Ok(Self::WhoAmI {
                remote: rest == "--remote",
            }),
            "logout" => Ok(Self::Logout),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(ParseCommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_sort(args: &str) -> Result<SortSpec, ParseCommandError> {
    let mut parts = args.split_whitespace();
    let column = parts
        .next()
        .ok_or(ParseCommandError::Usage("sort <column> [asc|desc]"))?;
    if column.eq_ignore_ascii_case("none") {
        return Ok(SortSpec::UNSORTED);
    }

    let column: SortColumn = column.parse()?;
    let direction = match parts.next() {
        Some(direction) => direction.parse()?,
        None => SortDirection::Ascending,
    };
    Ok(SortSpec {
        column: Some(column),
        direction,
    })
}

/// Whether the shell keeps reading.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Run the shell until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if the dashboard cannot be opened or the terminal fails.
pub async fn run(config: DashboardConfig) -> Result<(), CommandError> {
    let (dashboard, store) = Dashboard::open(config)?;
    let _watch = dashboard.watch_storage();
    let table_config = customer_records_table_config();

    let mut out = std::io::stdout();
    writeln!(out, "{}", banner(&dashboard))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(out, "{}> ", dashboard.current_route())?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        // Pick up sessions changed by another process
        if let Err(e) = store.reload() {
            tracing::warn!(error = %e, "Failed to reload session storage");
        }

        let command = match line.parse::<ShellCommand>() {
            Ok(command) => command,
            Err(ParseCommandError::Blank) => continue,
            Err(e) => {
                writeln!(out, "{e}")?;
                continue;
            }
        };

        if execute(&dashboard, &table_config, command, &mut out).await? == Flow::Quit {
            break;
        }
    }

    Ok(())
}

/// Greeting shown when the shell starts.
///
/// A logged-out user is told where to obtain a credential.
fn banner(dashboard: &Dashboard) -> String {
    let config = dashboard.config();
    let mut banner = format!(
        "Little Sun dashboard ({}) - {}",
        config.env_name,
        dashboard.api().base_url()
    );
    if let Some(user) = dashboard.session().current_user() {
        banner.push_str(&format!("\nLogged in as {}", user.name));
    } else {
        match &config.google_client_id {
            Some(client_id) => banner.push_str(&format!(
                "\nSign in with Google (client {client_id}), then: login <credential>"
            )),
            None => banner.push_str(
                "\nGoogle sign-in is not configured; paste a credential: login <credential>",
            ),
        }
    }
    banner.push_str("\nType help for commands.");
    banner
}

async fn execute(
    dashboard: &Dashboard,
    table_config: &DataTableConfig,
    command: ShellCommand,
    out: &mut impl Write,
) -> Result<Flow, CommandError> {
    match command {
        ShellCommand::Help => writeln!(out, "{HELP}")?,
        ShellCommand::Quit => return Ok(Flow::Quit),
        ShellCommand::Login(credential) => match dashboard.login(&credential).await {
            Ok(user) => writeln!(out, "Welcome, {}", user.name)?,
            Err(e) => show_error(out, &e)?,
        },
        ShellCommand::Search(term) => {
            if enter_table(dashboard, out)? {
                match dashboard.search(&term).await {
                    Ok(SearchOutcome::Stale) => {}
                    Ok(_) => show_page(dashboard, table_config, out)?,
                    Err(e) => show_error(out, &e)?,
                }
            }
        }
        ShellCommand::Sort(sort) => {
            if enter_table(dashboard, out)? {
                dashboard.table().set_sort(sort);
                show_page(dashboard, table_config, out)?;
            }
        }
        ShellCommand::Page(page) => {
            if enter_table(dashboard, out)? {
                dashboard.table().set_page_index(page.get() - 1);
                show_page(dashboard, table_config, out)?;
            }
        }
        ShellCommand::Size(size) => {
            if enter_table(dashboard, out)? {
                if !table_config.page_size_options.contains(&size.get()) {
                    writeln!(
                        out,
                        "Page size must be one of {:?}",
                        table_config.page_size_options
                    )?;
                    return Ok(Flow::Continue);
                }
                dashboard.table().set_page_size(size);
                show_page(dashboard, table_config, out)?;
            }
        }
        ShellCommand::Show => {
            if enter_table(dashboard, out)? {
                show_page(dashboard, table_config, out)?;
            }
        }
        ShellCommand::Go(path) => {
            let route = navigate(dashboard, &path, out)?;
            writeln!(out, "Now at {route}")?;
        }
        ShellCommand::WhoAmI { remote: false } => {
            let display = dashboard.profile().display();
            if display.is_logged_in {
                writeln!(out, "{} ({})", display.user_name, display.user_picture)?;
            } else {
                writeln!(out, "Not logged in")?;
            }
        }
        ShellCommand::WhoAmI { remote: true } => match dashboard.api().profile().await {
            Ok(profile) => writeln!(
                out,
                "{} <{}>, {} active session(s)",
                profile.name, profile.email, profile.active_sessions
            )?,
            Err(e) => show_error(out, &DashboardError::from(e))?,
        },
        ShellCommand::Logout => match dashboard.logout().await {
            Ok(()) => writeln!(out, "Logged out")?,
            Err(e) => show_error(out, &e)?,
        },
    }
    Ok(Flow::Continue)
}

/// Navigate, reporting any failure inline. Returns the route shown afterwards.
fn navigate(
    dashboard: &Dashboard,
    path: &str,
    out: &mut impl Write,
) -> Result<Route, CommandError> {
    match dashboard.navigate(path) {
        Ok(route) => Ok(route),
        Err(e) => {
            show_error(out, &e)?;
            Ok(dashboard.current_route())
        }
    }
}

/// Enter the table view, explaining when the gate refuses.
fn enter_table(dashboard: &Dashboard, out: &mut impl Write) -> Result<bool, CommandError> {
    if navigate(dashboard, Route::Table.path(), out)? == Route::Table {
        return Ok(true);
    }
    writeln!(out, "Please log in first: login <credential>")?;
    Ok(false)
}

fn show_page(
    dashboard: &Dashboard,
    table_config: &DataTableConfig,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let table = dashboard.table();
    let rows = table.visible_rows();
    write!(out, "{}", render::table(table_config, &rows, &table.sort()))?;
    if !table.is_empty() {
        writeln!(
            out,
            "{}",
            render::pager(&table.page(), table.page_count(), table.len())
        )?;
    }
    Ok(())
}

fn show_error(out: &mut impl Write, error: &DashboardError) -> Result<(), CommandError> {
    error.report();
    writeln!(out, "{}", error.user_message())?;
    Ok(())
}
