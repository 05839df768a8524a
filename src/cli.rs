use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::TimecardError;
use crate::settings::{BillableOption, Settings};
use crate::types::EntryForm;
use crate::types::entry::parse_date;

/// Top-level CLI parser for the `cwm-timecard` binary.
#[derive(Debug, Parser)]
#[command(
    name = "cwm-timecard",
    version,
    about = "Log time entries against ConnectWise Manage service tickets"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Extra TOML configuration file
    #[arg(long, global = true, env = "CWM_CONFIG")]
    pub config: Option<PathBuf>,

    /// PIN protecting the stored API keys
    #[arg(long, global = true, env = "CWM_PIN", hide_env_values = true)]
    pub pin: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Update stored settings and credentials
    Configure(ConfigureArgs),
    /// Print the stored settings with keys redacted
    Show,
    /// Submit one time entry
    Submit(SubmitArgs),
    /// Interactive session: one entry per line on stdin
    Session,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ConfigureArgs {
    #[arg(long)]
    pub company_id: Option<String>,
    #[arg(long)]
    pub public_key: Option<String>,
    #[arg(long)]
    pub private_key: Option<String>,
    #[arg(long)]
    pub site_url: Option<String>,
    /// ConnectWise member identifier, e.g. `amora`
    #[arg(long)]
    pub member_id: Option<String>,
    #[arg(long)]
    pub work_type: Option<String>,
    /// Billable, DoNotBill, NoCharge or NoDefault
    #[arg(long)]
    pub billable: Option<BillableOption>,
    #[arg(long)]
    pub client_id: Option<String>,
    /// Hours from UTC, e.g. -4 for Puerto Rico, -5 for Colombia
    #[arg(long, allow_negative_numbers = true)]
    pub timezone_offset: Option<f64>,

    #[arg(long)]
    pub detail_description: Option<bool>,
    #[arg(long)]
    pub internal_analysis: Option<bool>,
    #[arg(long)]
    pub resolution: Option<bool>,
    #[arg(long)]
    pub email_resource: Option<bool>,
    #[arg(long)]
    pub email_contact: Option<bool>,
    #[arg(long)]
    pub email_cc: Option<bool>,

    /// Encrypt the keys with a new PIN (fresh salt)
    #[arg(long, conflicts_with = "remove_pin")]
    pub new_pin: Option<String>,
    /// Store the keys unencrypted
    #[arg(long)]
    pub remove_pin: bool,
}

impl ConfigureArgs {
    /// Copy every given option into `settings`.
    pub fn apply(&self, settings: &mut Settings) -> Result<(), TimecardError> {
        let text_fields = [
            (&self.company_id, &mut settings.company_id),
            (&self.public_key, &mut settings.public_key),
            (&self.private_key, &mut settings.private_key),
            (&self.site_url, &mut settings.site_url),
            (&self.member_id, &mut settings.member_id),
            (&self.work_type, &mut settings.work_type),
            (&self.client_id, &mut settings.client_id),
        ];
        for (given, slot) in text_fields {
            if let Some(value) = given {
                *slot = value.trim().to_string();
            }
        }

        if let Some(billable) = self.billable {
            settings.billable_option = billable;
        }
        if let Some(offset) = self.timezone_offset {
            settings.set_timezone_offset(offset)?;
        }

        let flags = &mut settings.flags;
        let flag_fields = [
            (self.detail_description, &mut flags.detail_description),
            (self.internal_analysis, &mut flags.internal_analysis),
            (self.resolution, &mut flags.resolution),
            (self.email_resource, &mut flags.email_resource),
            (self.email_contact, &mut flags.email_contact),
            (self.email_cc, &mut flags.email_cc),
        ];
        for (given, slot) in flag_fields {
            if let Some(value) = given {
                *slot = value;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Args)]
pub struct SubmitArgs {
    /// Service ticket to charge the time to
    #[arg(short, long)]
    pub ticket: String,
    /// Hours worked, greater than 0 and at most 8
    #[arg(long)]
    pub hours: String,
    /// Description of the work
    #[arg(short, long)]
    pub notes: String,
    /// YYYY-MM-DD, defaults to today
    #[arg(short, long)]
    pub date: Option<String>,
    /// HH:MM start (24h), defaults to the first free slot of the day
    #[arg(short, long)]
    pub start: Option<String>,
}

impl From<&SubmitArgs> for EntryForm {
    fn from(args: &SubmitArgs) -> Self {
        EntryForm {
            ticket_id: args.ticket.clone(),
            hours: args.hours.clone(),
            notes: args.notes.clone(),
            date: args.date.clone(),
            start: args.start.clone(),
        }
    }
}

/// One line typed into an interactive session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Entry(EntryForm),
    Log,
    Next(Option<String>),
    Help,
    Quit,
    Empty,
}

pub const SESSION_HELP: &str = "\
<ticket> <hours> [@HH:MM] [YYYY-MM-DD] <notes...>   submit an entry
:next [YYYY-MM-DD]                                  next start time for a day
:log                                                show this session's log
:help                                               this help
:quit                                               leave the session";

/// Parse `<ticket> <hours> [@HH:MM] [YYYY-MM-DD] <notes...>` or a `:command`.
pub fn parse_session_line(line: &str) -> Result<SessionCommand, TimecardError> {
    let mut tokens = line.split_whitespace();
    let Some(first) = tokens.next() else {
        return Ok(SessionCommand::Empty);
    };

    if let Some(cmd) = first.strip_prefix(':') {
        return match cmd {
            "log" => Ok(SessionCommand::Log),
            "next" => Ok(SessionCommand::Next(tokens.next().map(str::to_string))),
            "help" | "h" | "?" => Ok(SessionCommand::Help),
            "quit" | "q" | "exit" => Ok(SessionCommand::Quit),
            other => Err(TimecardError::invalid(format!(
                "Unknown command ':{other}', try :help"
            ))),
        };
    }

    let hours = tokens
        .next()
        .ok_or_else(|| TimecardError::invalid("Expected: <ticket> <hours> [@HH:MM] [YYYY-MM-DD] <notes>"))?;

    let mut form = EntryForm {
        ticket_id: first.to_string(),
        hours: hours.to_string(),
        ..EntryForm::default()
    };

    let mut notes: Vec<&str> = Vec::new();
    for token in tokens {
        if notes.is_empty() {
            if let Some(start) = token.strip_prefix('@') {
                form.start = Some(start.to_string());
                continue;
            }
            if form.date.is_none() && parse_date(token).is_ok() {
                form.date = Some(token.to_string());
                continue;
            }
        }
        notes.push(token);
    }
    form.notes = notes.join(" ");
    Ok(SessionCommand::Entry(form))
}
