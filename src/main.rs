//!
//! unisearch CLI binary
//! --------------------
//! Interactive client for a UniSearch server: keyword search across cloud
//! drives, paged result tables, local history, and API-key / admin sessions.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use unisearch::cli::{print_usage_lines, run_once, run_repl, Command, Session};
use unisearch::config::{ClientConfig, OutputMode};
use unisearch::storage::FileStorage;

fn print_usage(program: &str) {
    for l in print_usage_lines(program) {
        eprintln!("{}", l);
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow!("invalid log filter: {}", e))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut cfg = ClientConfig::from_env();
    let mut api_key: Option<String> = None;
    let mut query: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--api" => {
                if i + 1 >= args.len() { eprintln!("--api requires a value"); print_usage(&program); std::process::exit(2); }
                cfg.api_base = args[i + 1].clone();
                i += 2; continue;
            }
            "--api-key" => {
                if i + 1 >= args.len() { eprintln!("--api-key requires a value"); print_usage(&program); std::process::exit(2); }
                api_key = Some(args[i + 1].clone());
                i += 2; continue;
            }
            "--data-dir" => {
                if i + 1 >= args.len() { eprintln!("--data-dir requires a value"); print_usage(&program); std::process::exit(2); }
                cfg.data_dir = args[i + 1].clone().into();
                i += 2; continue;
            }
            "--timeout-ms" => {
                let ms = args.get(i + 1).and_then(|v| v.parse::<u64>().ok()).filter(|ms| *ms > 0);
                match ms {
                    Some(ms) => cfg.timeout = Duration::from_millis(ms),
                    None => { eprintln!("--timeout-ms requires a positive number"); std::process::exit(2); }
                }
                i += 2; continue;
            }
            "--query" | "-q" => {
                if i + 1 >= args.len() { eprintln!("--query requires a value"); print_usage(&program); std::process::exit(2); }
                query = Some(args[i + 1].clone());
                i += 2; continue;
            }
            "--json" => { cfg.output = OutputMode::Json; i += 1; continue; }
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            unk => {
                eprintln!("Unrecognized argument: {}", unk);
                print_usage(&program);
                std::process::exit(2);
            }
        }
    }

    info!(target: "unisearch", "api={} data_dir='{}' timeout_ms={}", cfg.api_base, cfg.data_dir.display(), cfg.timeout.as_millis());

    let storage = FileStorage::open(&cfg.data_dir).with_context(|| format!("failed to open data dir {}", cfg.data_dir.display()))?;
    let data_dir = cfg.data_dir.clone();
    let session = Session::new(cfg, Arc::new(storage)).map_err(|e| anyhow!("{}", e))?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    if let Some(key) = api_key {
        match rt.block_on(session.execute(Command::Login(key))) {
            Ok(lines) => lines.iter().for_each(|l| println!("{}", l)),
            Err(e) => { eprintln!("login failed: {}", e.message()); std::process::exit(1); }
        }
    }

    if let Some(kw) = query {
        let ok = run_once(&rt, &session, &kw)?;
        if !ok { std::process::exit(1); }
        return Ok(());
    }

    run_repl(&rt, &session, &data_dir)
}
