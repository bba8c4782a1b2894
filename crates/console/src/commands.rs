//! Line commands accepted by the console.

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;

use triage_core::filter::{DateRange, SortKey};
use triage_core::ticket::Priority;
use triage_core::{QueueKind, Tab, TicketStatus};

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    /// Print the visible queues (or the open ticket).
    Show,
    Refresh,
    Tab(Tab),
    Search(QueueKind, String),
    Sort(QueueKind, SortKey),
    StatusFilter(QueueKind, Option<TicketStatus>),
    Range(DateRange),
    Page(QueueKind, u32),
    Limit(QueueKind, u32),
    /// Assign through the ticket's button.
    Claim(String),
    /// Drop a ticket from one queue onto another.
    Move {
        ticket_id: String,
        source: QueueKind,
        target: QueueKind,
    },
    Open(String),
    Back,
    Comment(String),
    Resolve(String),
    SetStatus(TicketStatus, Option<String>),
    SetPriority(Priority),
    Dismiss,
    Notifications,
}

pub const HELP: &str = "\
dashboard:
  show | refresh | tab active|closed
  search <u|m|c> <text>      sort <u|m|c> <key>       status <m|c> <status|any>
  range <from|-> <to|->      page <u|m|c> <n>         limit <u|m|c> <n>
  claim <id>                 move <id> <from> <to>    open <id>
ticket:
  comment <text> | resolve <text> | set-status <status> [reason] | priority <level>
  dismiss | back
  notifications | help | quit";

fn queue(token: Option<&str>) -> Result<QueueKind> {
    match token {
        Some("u") | Some("unassigned") => Ok(QueueKind::Unassigned),
        Some("m") | Some("mine") => Ok(QueueKind::Mine),
        Some("c") | Some("closed") => Ok(QueueKind::Closed),
        Some(other) => bail!("unknown queue '{}'", other),
        None => bail!("missing queue"),
    }
}

fn number(token: Option<&str>) -> Result<u32> {
    let token = token.ok_or_else(|| anyhow!("missing number"))?;
    token
        .parse()
        .map_err(|_| anyhow!("'{}' is not a number", token))
}

fn ticket_id(token: Option<&str>) -> Result<String> {
    token
        .map(str::to_string)
        .ok_or_else(|| anyhow!("missing ticket id"))
}

fn status(token: Option<&str>) -> Result<TicketStatus> {
    let token = token.ok_or_else(|| anyhow!("missing status"))?;
    TicketStatus::parse(token).ok_or_else(|| anyhow!("unknown status '{}'", token))
}

fn date(token: Option<&str>) -> Result<Option<NaiveDate>> {
    match token {
        None | Some("-") => Ok(None),
        Some(t) => NaiveDate::parse_from_str(t, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| anyhow!("'{}' is not a YYYY-MM-DD date", t)),
    }
}

/// Parse a non-empty input line.
pub fn parse(line: &str) -> Result<Command> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let mut args = rest.split_whitespace();

    let command = match word {
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "show" | "ls" => Command::Show,
        "refresh" => Command::Refresh,
        "tab" => {
            let name = args.next().unwrap_or_default();
            Command::Tab(Tab::parse(name).ok_or_else(|| anyhow!("unknown tab '{}'", name))?)
        }
        "search" => {
            let kind = queue(args.next())?;
            let text = rest.split_once(' ').map(|(_, t)| t.trim()).unwrap_or("");
            Command::Search(kind, text.to_string())
        }
        "sort" => {
            let kind = queue(args.next())?;
            let key = args.next().ok_or_else(|| anyhow!("missing sort key"))?;
            let sort = SortKey::parse(key).ok_or_else(|| anyhow!("unknown sort key '{}'", key))?;
            Command::Sort(kind, sort)
        }
        "status" => {
            let kind = queue(args.next())?;
            match args.next() {
                Some("any") => Command::StatusFilter(kind, None),
                token => Command::StatusFilter(kind, Some(status(token)?)),
            }
        }
        "range" => Command::Range(DateRange::new(date(args.next())?, date(args.next())?)),
        "page" => Command::Page(queue(args.next())?, number(args.next())?),
        "limit" => Command::Limit(queue(args.next())?, number(args.next())?),
        "claim" => Command::Claim(ticket_id(args.next())?),
        "move" => Command::Move {
            ticket_id: ticket_id(args.next())?,
            source: queue(args.next())?,
            target: queue(args.next())?,
        },
        "open" => Command::Open(ticket_id(args.next())?),
        "back" => Command::Back,
        "comment" => Command::Comment(rest.to_string()),
        "resolve" => Command::Resolve(rest.to_string()),
        "set-status" => {
            let status = status(args.next())?;
            let reason = rest.split_once(' ').map(|(_, r)| r.trim().to_string());
            Command::SetStatus(status, reason.filter(|r| !r.is_empty()))
        }
        "priority" => {
            let level = args.next().unwrap_or_default();
            Command::SetPriority(
                Priority::parse(level).ok_or_else(|| anyhow!("unknown priority '{}'", level))?,
            )
        }
        "dismiss" => Command::Dismiss,
        "notifications" => Command::Notifications,
        other => bail!("unknown command '{}', try 'help'", other),
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dashboard_commands() {
        assert_eq!(parse("tab closed").unwrap(), Command::Tab(Tab::Closed));
        assert_eq!(
            parse("search u printer on fire").unwrap(),
            Command::Search(QueueKind::Unassigned, "printer on fire".to_string())
        );
        assert_eq!(
            parse("status m any").unwrap(),
            Command::StatusFilter(QueueKind::Mine, None)
        );
        assert_eq!(
            parse("move t-1 u m").unwrap(),
            Command::Move {
                ticket_id: "t-1".to_string(),
                source: QueueKind::Unassigned,
                target: QueueKind::Mine,
            }
        );
        assert_eq!(
            parse("range 2024-03-31 2024-03-01").unwrap(),
            Command::Range(DateRange::new(
                NaiveDate::from_ymd_opt(2024, 3, 1),
                NaiveDate::from_ymd_opt(2024, 3, 31)
            ))
        );
    }

    #[test]
    fn test_parse_ticket_commands() {
        assert_eq!(
            parse("set-status resolved customer confirmed").unwrap(),
            Command::SetStatus(TicketStatus::Resolved, Some("customer confirmed".to_string()))
        );
        assert_eq!(
            parse("set-status in_progress").unwrap(),
            Command::SetStatus(TicketStatus::InProgress, None)
        );
        assert_eq!(
            parse("priority urgent").unwrap(),
            Command::SetPriority(Priority::Urgent)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("page x 2").is_err());
        assert!(parse("page u two").is_err());
        assert!(parse("sort c created_at").is_err());
        assert!(parse("launch").is_err());
    }
}
