//! Interactive command grammar. Anything that is not a known command word is
//! treated as a search keyword.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::preferences::Theme;
use crate::search::{CloudType, ParamsPatch, ResultKind, SourceKind};

#[derive(Debug, Clone, PartialEq)]
pub enum KeysCommand {
    List,
    Create { ttl_hours: i64, description: String },
    Delete { key: String },
    Extend { key: String, hours: i64 },
    Expire { key: String, at: DateTime<Utc> },
    BatchCreate { count: u32, ttl_hours: i64, prefix: Option<String> },
    BatchDelete { keys: Vec<String> },
    BatchExtend { hours: i64, keys: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThemeCommand {
    Show,
    Toggle,
    Set(Theme),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search(String),
    More,
    History,
    HistoryRemove(String),
    HistoryClear,
    Set(ParamsPatch),
    Params,
    Options,
    Login(String),
    AdminLogin { username: Option<String>, password: String },
    Logout,
    Status,
    Keys(KeysCommand),
    Theme(ThemeCommand),
    Share,
    Open(String),
    Clear,
    Reset,
    Help,
    Exit,
}

fn usage(msg: &str) -> String { format!("usage: {}", msg) }

fn parse_num<T: std::str::FromStr>(raw: Option<&str>, what: &str) -> Result<T, String> {
    let raw = raw.ok_or_else(|| format!("missing {}", what))?;
    raw.parse::<T>().map_err(|_| format!("invalid {} '{}'", what, raw))
}

fn csv_set(raw: &str) -> BTreeSet<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

fn parse_set(rest: &str) -> Result<ParamsPatch, String> {
    let mut it = rest.splitn(2, char::is_whitespace);
    let field = it.next().unwrap_or("").to_ascii_lowercase();
    let value = it.next().map(str::trim).unwrap_or("");
    if value.is_empty() {
        return Err(usage("set <source|result|conc|types|channels|plugins|refresh> <value>"));
    }
    let none = value.eq_ignore_ascii_case("none");
    let mut patch = ParamsPatch::default();
    match field.as_str() {
        "source" | "src" => patch.source = Some(value.parse::<SourceKind>()?),
        "result" | "res" => patch.result_type = Some(value.parse::<ResultKind>()?),
        "conc" | "concurrency" => patch.concurrency = Some(if none { None } else { Some(parse_num::<u32>(Some(value), "concurrency")?) }),
        "types" | "cloud" => {
            let types: BTreeSet<CloudType> = if value.eq_ignore_ascii_case("all") {
                CloudType::all()
            } else {
                csv_set(value).iter().map(|t| t.parse::<CloudType>()).collect::<Result<_, _>>()?
            };
            patch.cloud_types = Some(types);
        }
        "channels" => patch.channels = Some(if none { BTreeSet::new() } else { csv_set(value) }),
        "plugins" => patch.plugins = Some(if none { BTreeSet::new() } else { csv_set(value) }),
        "refresh" => {
            patch.refresh = Some(match value.to_ascii_lowercase().as_str() {
                "on" | "true" | "yes" => true,
                "off" | "false" | "no" => false,
                other => return Err(format!("invalid refresh '{}', expected on|off", other)),
            })
        }
        other => return Err(format!("unknown parameter '{}'", other)),
    }
    Ok(patch)
}

fn parse_keys(rest: &str) -> Result<KeysCommand, String> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let Some(sub) = parts.first() else { return Ok(KeysCommand::List) };
    match sub.to_ascii_lowercase().as_str() {
        "list" | "ls" => Ok(KeysCommand::List),
        "create" | "new" => Ok(KeysCommand::Create {
            ttl_hours: parse_num(parts.get(1).copied(), "ttl hours")?,
            description: parts.get(2..).map(|d| d.join(" ")).unwrap_or_default(),
        }),
        "rm" | "delete" => match parts.get(1) {
            Some(k) => Ok(KeysCommand::Delete { key: k.to_string() }),
            None => Err(usage("keys rm <key>")),
        },
        "extend" => {
            let key = parts.get(1).ok_or_else(|| usage("keys extend <key> <hours>"))?;
            Ok(KeysCommand::Extend { key: key.to_string(), hours: parse_num(parts.get(2).copied(), "hours")? })
        }
        "expire" => {
            let key = parts.get(1).ok_or_else(|| usage("keys expire <key> <rfc3339-time>"))?;
            let raw = parts.get(2).ok_or_else(|| usage("keys expire <key> <rfc3339-time>"))?;
            let at = DateTime::parse_from_rfc3339(raw).map_err(|e| format!("invalid time '{}': {}", raw, e))?;
            Ok(KeysCommand::Expire { key: key.to_string(), at: at.with_timezone(&Utc) })
        }
        "batch-create" => Ok(KeysCommand::BatchCreate {
            count: parse_num(parts.get(1).copied(), "count")?,
            ttl_hours: parse_num(parts.get(2).copied(), "ttl hours")?,
            prefix: parts.get(3..).filter(|p| !p.is_empty()).map(|p| p.join(" ")),
        }),
        "batch-rm" | "batch-delete" => Ok(KeysCommand::BatchDelete { keys: parts[1..].iter().map(|s| s.to_string()).collect() }),
        "batch-extend" => Ok(KeysCommand::BatchExtend {
            hours: parse_num(parts.get(1).copied(), "hours")?,
            keys: parts.get(2..).unwrap_or_default().iter().map(|s| s.to_string()).collect(),
        }),
        other => Err(format!("unknown keys subcommand '{}'", other)),
    }
}

/// Parse one input line. Empty lines are an error the REPL simply skips.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Err("empty input".to_string());
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((h, r)) => (h, r.trim()),
        None => (line, ""),
    };
    match head.to_ascii_lowercase().as_str() {
        "exit" | "quit" => Ok(Command::Exit),
        "help" | "?" => Ok(Command::Help),
        "search" | "s" => {
            if rest.is_empty() { Err(usage("search <keyword>")) } else { Ok(Command::Search(rest.to_string())) }
        }
        "more" => Ok(Command::More),
        "history" => {
            let mut it = rest.splitn(2, char::is_whitespace);
            match it.next().map(str::to_ascii_lowercase).as_deref() {
                None | Some("") => Ok(Command::History),
                Some("clear") => Ok(Command::HistoryClear),
                Some("rm") => match it.next().map(str::trim).filter(|k| !k.is_empty()) {
                    Some(k) => Ok(Command::HistoryRemove(k.to_string())),
                    None => Err(usage("history rm <keyword>")),
                },
                Some(other) => Err(format!("unknown history subcommand '{}'", other)),
            }
        }
        "set" => parse_set(rest).map(Command::Set),
        "params" => Ok(Command::Params),
        "options" => Ok(Command::Options),
        "login" => {
            if rest.is_empty() { Err(usage("login <api-key>")) } else { Ok(Command::Login(rest.to_string())) }
        }
        "admin-login" => {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            match parts.as_slice() {
                [password] => Ok(Command::AdminLogin { username: None, password: password.to_string() }),
                [user, password] => Ok(Command::AdminLogin { username: Some(user.to_string()), password: password.to_string() }),
                _ => Err(usage("admin-login [username] <password>")),
            }
        }
        "logout" => Ok(Command::Logout),
        "status" => Ok(Command::Status),
        "keys" => parse_keys(rest).map(Command::Keys),
        "theme" => match rest.to_ascii_lowercase().as_str() {
            "" => Ok(Command::Theme(ThemeCommand::Show)),
            "toggle" => Ok(Command::Theme(ThemeCommand::Toggle)),
            other => other.parse::<Theme>().map(|t| Command::Theme(ThemeCommand::Set(t))),
        },
        "share" => Ok(Command::Share),
        "open" => {
            if rest.is_empty() { Err(usage("open <share-url>")) } else { Ok(Command::Open(rest.to_string())) }
        }
        "clear" => Ok(Command::Clear),
        "reset" => Ok(Command::Reset),
        _ => Ok(Command::Search(line.to_string())),
    }
}
