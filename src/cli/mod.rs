//! Interactive front end: command grammar, session wiring, table rendering and
//! the line-editor loop.

pub mod commands;
pub mod outputformatter;
pub mod session;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

pub use commands::{parse_command, Command, KeysCommand, ThemeCommand};
pub use session::Session;

const REPL_HISTORY_FILE: &str = "repl_history.txt";

pub fn print_usage_lines(program: &str) -> Vec<String> {
    let text = format!(
        "Usage:\n  {program} [--api <url>] [--api-key <key>] [--data-dir <dir>] [--json] [-q <keyword>]\n\nFlags:\n  --api <url>          API base (env UNISEARCH_API_BASE, default http://localhost:8888/api)\n  --api-key <key>      log in with an API key before starting\n  --data-dir <dir>     durable client state (env UNISEARCH_DATA_DIR, default .unisearch)\n  --timeout-ms <ms>    request timeout (env UNISEARCH_TIMEOUT_MS, default 30000)\n  --json               print results as JSON\n  -q, --query <kw>     run one search, print the first page and exit\n  -h, --help           show this help\n\nInteractive commands:\n  <keyword> | search <keyword>      search all configured drives\n  more                              show the next page of results\n  history [rm <kw> | clear]         recent keywords\n  set <field> <value>               source|result|conc|types|channels|plugins|refresh\n  params                            show current search parameters\n  options                           load channels/plugins from /health\n  share | open <url>                build or apply a shareable search link\n  clear | reset                     clear results / restore default parameters\n  login <api-key>                   user login\n  admin-login [user] <password>     administrator login\n  logout | status\n  keys [list|create <ttl> [desc]|rm <key>|extend <key> <h>|expire <key> <time>]\n  keys batch-create <n> <ttl> [prefix] | batch-rm <keys..> | batch-extend <h> <keys..>\n  theme [dark|light|toggle]\n  help | exit"
    );
    text.lines().map(str::to_string).collect()
}

fn print_lines(lines: &[String]) {
    for l in lines {
        println!("{}", l);
    }
}

/// Line-editor loop until `exit` or end of input.
pub fn run_repl(rt: &tokio::runtime::Runtime, session: &Session, data_dir: &std::path::Path) -> Result<()> {
    let mut rl = DefaultEditor::new().context("failed to initialise line editor")?;
    let history_path = data_dir.join(REPL_HISTORY_FILE);
    let _ = rl.load_history(&history_path);
    println!("unisearch interactive client. Type 'help' for commands.");
    loop {
        let line = match rl.readline(&session.prompt()) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                warn!(target: "unisearch::cli", "readline failed: {}", e);
                break;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() { continue; }
        let _ = rl.add_history_entry(trimmed);
        let cmd = match parse_command(trimmed) {
            Ok(c) => c,
            Err(msg) => {
                eprintln!("{}", msg);
                continue;
            }
        };
        if cmd == Command::Exit { break; }
        match rt.block_on(session.execute(cmd)) {
            Ok(lines) => print_lines(&lines),
            Err(e) => {
                eprintln!("error: {}", e.message());
                if e.is_unauthorized() && !session.auth_store().is_authenticated() {
                    eprintln!("session cleared; log in again");
                }
            }
        }
    }
    if let Err(e) = rl.save_history(&history_path) {
        warn!(target: "unisearch::cli", "could not save REPL history: {}", e);
    }
    Ok(())
}

/// One search, first page printed, then return.
pub fn run_once(rt: &tokio::runtime::Runtime, session: &Session, keyword: &str) -> Result<bool> {
    match rt.block_on(session.execute(Command::Search(keyword.to_string()))) {
        Ok(lines) => {
            print_lines(&lines);
            Ok(session.search_store().snapshot().error.is_none())
        }
        Err(e) => {
            eprintln!("error: {}", e.message());
            Ok(false)
        }
    }
}
