use std::io::Write;

use chrono::{Local, NaiveDate};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::cli::{SESSION_HELP, SessionCommand, parse_session_line};
use crate::error::TimecardError;
use crate::handlers::submit::print_report;
use crate::service::TimeEntryService;
use crate::types::entry::parse_date;

const PROMPT: &str = "> ";

/// Read entries line by line until `:quit` or end of input.
pub async fn run_session<R, W>(
    service: &mut TimeEntryService,
    input: R,
    out: &mut W,
) -> Result<(), TimecardError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    session_loop(service, input, out, || Local::now().date_naive()).await
}

async fn session_loop<R, W, F>(
    service: &mut TimeEntryService,
    input: R,
    out: &mut W,
    today: F,
) -> Result<(), TimecardError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    F: Fn() -> NaiveDate,
{
    writeln!(
        out,
        "Logging as {} on {}. Type :help for commands.",
        service.settings().member_id,
        service.settings().site_url
    )?;

    let mut lines = input.lines();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        let command = match parse_session_line(&line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "{}", e.user_message())?;
                continue;
            }
        };
        debug!(?command, "session command");

        match command {
            SessionCommand::Empty => {}
            SessionCommand::Help => writeln!(out, "{SESSION_HELP}")?,
            SessionCommand::Quit => break,
            SessionCommand::Log => {
                if service.log().is_empty() {
                    writeln!(out, "no entries yet")?;
                }
                for entry in service.log().entries() {
                    writeln!(out, "{entry}")?;
                }
            }
            SessionCommand::Next(date) => {
                let date = match date.as_deref().map(parse_date).transpose() {
                    Ok(date) => date.unwrap_or_else(&today),
                    Err(e) => {
                        writeln!(out, "{}", e.user_message())?;
                        continue;
                    }
                };
                writeln!(out, "next start on {date}: {}", service.next_start(date))?;
            }
            SessionCommand::Entry(form) => {
                let report = service.submit_at(&form, today()).await;
                print_report(&report, out)?;
            }
        }
    }

    let log = service.log();
    writeln!(
        out,
        "{} entries this session, {} failed",
        log.len(),
        log.failures()
    )?;
    Ok(())
}
