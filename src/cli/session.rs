//! Wiring of stores and services behind the interactive commands.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use super::commands::{Command, KeysCommand, ThemeCommand};
use super::outputformatter::{get_terminal_width, render_history, render_keys, render_results};
use super::print_usage_lines;
use crate::admin::{batch_summary, AdminService};
use crate::api::{ApiClient, Navigator, ADMIN_LOGIN_ROUTE, ADMIN_ROUTE, HOME_ROUTE, LOGIN_ROUTE};
use crate::auth::{AuthCredential, AuthService, AuthStore};
use crate::config::{ClientConfig, OutputMode};
use crate::error::AppResult;
use crate::preferences::Theme;
use crate::search::{build_search_url, group_counts, parse_search_url, ParamsPatch, SearchOutcome, SearchParameters, SearchStore};
use crate::storage::SharedStorage;

pub struct Session {
    config: ClientConfig,
    storage: SharedStorage,
    api: ApiClient,
    search: SearchStore<ApiClient>,
    auth: AuthService,
    admin: AdminService,
}

fn join_or(items: &[String], empty: &str) -> String { if items.is_empty() { empty.to_string() } else { items.join(", ") } }

pub fn describe_params(p: &SearchParameters) -> Vec<String> {
    let types: Vec<String> = p.cloud_types.iter().map(|t| t.as_str().to_string()).collect();
    let channels: Vec<String> = p.channels.iter().cloned().collect();
    let plugins: Vec<String> = p.plugins.iter().cloned().collect();
    vec![
        format!("keyword:  {}", if p.keyword.is_empty() { "-" } else { p.keyword.as_str() }),
        format!("source:   {}", p.source.as_str()),
        format!("result:   {}", p.result_type.as_str()),
        format!("conc:     {}", p.concurrency.map(|c| c.to_string()).unwrap_or_else(|| "server default".to_string())),
        format!("refresh:  {}", if p.refresh { "on" } else { "off" }),
        format!("types:    {}", join_or(&types, "none")),
        format!("channels: {}", join_or(&channels, "server default")),
        format!("plugins:  {}", join_or(&plugins, "server default")),
    ]
}

impl Session {
    pub fn new(config: ClientConfig, storage: SharedStorage) -> AppResult<Self> {
        let auth_store = Arc::new(AuthStore::load(storage.clone()));
        let api = ApiClient::new(&config, auth_store, Arc::new(Navigator::default()))?;
        let search = SearchStore::new(api.clone(), storage.clone());
        Ok(Self { auth: AuthService::new(api.clone()), admin: AdminService::new(api.clone()), config, storage, api, search })
    }

    pub fn search_store(&self) -> &SearchStore<ApiClient> { &self.search }

    pub fn auth_store(&self) -> &Arc<AuthStore> { self.api.auth() }

    pub fn navigator(&self) -> &Arc<Navigator> { self.api.navigator() }

    pub fn prompt(&self) -> String {
        match self.auth_store().credential() {
            AuthCredential::Anonymous => "unisearch> ".to_string(),
            AuthCredential::UserSession { .. } => "unisearch[user]> ".to_string(),
            AuthCredential::AdminSession { username, .. } => format!("unisearch[{}]> ", username),
        }
    }

    fn result_lines(&self) -> Vec<String> {
        let state = self.search.snapshot();
        let items = self.search.displayed_results();
        if self.config.output == OutputMode::Json {
            return vec![serde_json::to_string_pretty(&items).unwrap_or_else(|e| format!("error: {}", e))];
        }
        let groups = state.results.as_deref().map(group_counts).unwrap_or_default();
        render_results(&items, state.total_count(), state.pagination.has_more, &groups, get_terminal_width())
    }

    fn error_lines(&self) -> Vec<String> {
        let mut out = vec![format!("error: {}", self.search.snapshot().error.unwrap_or_else(|| "unknown error".to_string()))];
        if self.navigator().on_login_route() && !self.auth_store().is_authenticated() {
            out.push("session cleared; log in again with 'login <api-key>' or 'admin-login'".to_string());
        }
        out
    }

    async fn run_search(&self, patch: Option<ParamsPatch>) -> Vec<String> {
        self.navigator().navigate(HOME_ROUTE);
        match self.search.search(patch).await {
            SearchOutcome::Completed { .. } => self.result_lines(),
            SearchOutcome::Rejected | SearchOutcome::Failed => self.error_lines(),
            SearchOutcome::Superseded => Vec::new(),
        }
    }

    pub async fn execute(&self, cmd: Command) -> AppResult<Vec<String>> {
        debug!(target: "unisearch::cli", "execute {:?}", cmd);
        Ok(match cmd {
            Command::Search(kw) => self.run_search(Some(ParamsPatch::keyword(kw))).await,
            Command::More => {
                if self.search.load_more() { self.result_lines() } else { vec!["no more results".to_string()] }
            }
            Command::History => render_history(&self.search.history()),
            Command::HistoryRemove(kw) => {
                if self.search.remove_from_history(&kw) { vec![format!("removed '{}'", kw)] } else { vec![format!("'{}' is not in history", kw)] }
            }
            Command::HistoryClear => {
                self.search.clear_history();
                vec!["history cleared".to_string()]
            }
            Command::Set(patch) => {
                self.search.set_parameters(&patch);
                describe_params(&self.search.snapshot().params)
            }
            Command::Params => describe_params(&self.search.snapshot().params),
            Command::Options => {
                if self.search.load_available_options().await {
                    let st = self.search.snapshot();
                    vec![format!("channels: {}", join_or(&st.available_channels, "none")), format!("plugins: {}", join_or(&st.available_plugins, "none"))]
                } else {
                    vec!["could not load search options; keeping previous lists".to_string()]
                }
            }
            Command::Login(key) => {
                self.navigator().navigate(LOGIN_ROUTE);
                self.auth.login_with_api_key(&key).await?;
                self.navigator().navigate(HOME_ROUTE);
                vec!["logged in with API key".to_string()]
            }
            Command::AdminLogin { username, password } => {
                self.navigator().navigate(ADMIN_LOGIN_ROUTE);
                self.auth.admin_login(username.as_deref(), &password).await?;
                self.navigator().navigate(ADMIN_ROUTE);
                vec![format!("admin session started for {}", self.auth_store().username().unwrap_or_default())]
            }
            Command::Logout => {
                self.auth.logout();
                self.navigator().navigate(LOGIN_ROUTE);
                vec!["logged out".to_string()]
            }
            Command::Status => self.status_lines(),
            Command::Keys(k) => self.keys(k).await?,
            Command::Theme(t) => {
                let current = Theme::load(self.storage.as_ref());
                let next = match t {
                    ThemeCommand::Show => return Ok(vec![format!("theme: {}", current)]),
                    ThemeCommand::Toggle => current.toggled(),
                    ThemeCommand::Set(t) => t,
                };
                next.persist(self.storage.as_ref());
                vec![format!("theme: {}", next)]
            }
            Command::Share => vec![build_search_url(&self.search.snapshot().params)],
            Command::Open(url) => {
                let patch = parse_search_url(&url);
                if patch.keyword.is_some() {
                    self.run_search(Some(patch)).await
                } else {
                    self.search.set_parameters(&patch);
                    describe_params(&self.search.snapshot().params)
                }
            }
            Command::Clear => {
                self.search.clear_results();
                vec!["results cleared".to_string()]
            }
            Command::Reset => {
                self.search.reset();
                vec!["search state reset".to_string()]
            }
            Command::Help => print_usage_lines("unisearch"),
            Command::Exit => Vec::new(),
        })
    }

    fn status_lines(&self) -> Vec<String> {
        let cred = self.auth_store().credential();
        let st = self.search.snapshot();
        vec![
            format!("api:      {}", self.api.base()),
            format!("session:  {}{}", cred.label(), cred.username().map(|u| format!(" ({})", u)).unwrap_or_default()),
            format!("route:    {}", self.navigator().current()),
            format!("results:  {}", st.total_count()),
            format!("history:  {} entries", st.history.len()),
            format!("theme:    {}", Theme::load(self.storage.as_ref())),
        ]
    }

    async fn keys(&self, cmd: KeysCommand) -> AppResult<Vec<String>> {
        self.navigator().navigate(ADMIN_ROUTE);
        let width = get_terminal_width();
        Ok(match cmd {
            KeysCommand::List => render_keys(&self.admin.list_keys().await?, Utc::now(), width),
            KeysCommand::Create { ttl_hours, description } => {
                let k = self.admin.create_key(ttl_hours, &description).await?;
                vec![format!("created {}", k.key)]
            }
            KeysCommand::Delete { key } => {
                self.admin.delete_key(&key).await?;
                vec![format!("deleted {}", key)]
            }
            KeysCommand::Extend { key, hours } => {
                let k = self.admin.update_key(&key, None, Some(hours)).await?;
                vec![format!("{} now expires {}", k.display_key(), k.expires_at.to_rfc3339())]
            }
            KeysCommand::Expire { key, at } => {
                let k = self.admin.update_key(&key, Some(at), None).await?;
                vec![format!("{} now expires {}", k.display_key(), k.expires_at.to_rfc3339())]
            }
            KeysCommand::BatchCreate { count, ttl_hours, prefix } => {
                let res = self.admin.batch_create(count, ttl_hours, prefix.as_deref()).await?;
                let mut out = vec![batch_summary("created", res.success_count, res.failed_count)];
                out.extend(res.keys.iter().map(|k| k.key.clone()));
                out
            }
            KeysCommand::BatchDelete { keys } => {
                let res = self.admin.batch_delete(&keys).await?;
                vec![batch_summary("deleted", res.success_count, res.failed_count)]
            }
            KeysCommand::BatchExtend { hours, keys } => {
                let res = self.admin.batch_extend(&keys, hours).await?;
                vec![batch_summary("extended", res.success_count, res.failed_count)]
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn session() -> Session {
        let cfg = ClientConfig { api_base: "http://127.0.0.1:9/api".into(), ..Default::default() };
        Session::new(cfg, Arc::new(MemoryStorage::new())).unwrap()
    }

    #[tokio::test]
    async fn local_commands_need_no_server() {
        let s = session();
        assert_eq!(s.prompt(), "unisearch> ");
        let out = s.execute(Command::Search("x".into())).await.unwrap();
        assert_eq!(out, vec!["error: search keyword needs at least 2 characters"]);

        s.execute(Command::Set(ParamsPatch { refresh: Some(true), ..Default::default() })).await.unwrap();
        assert!(s.search_store().snapshot().params.refresh);
        assert_eq!(s.execute(Command::Theme(ThemeCommand::Toggle)).await.unwrap(), vec!["theme: light"]);
        assert_eq!(s.execute(Command::More).await.unwrap(), vec!["no more results"]);
        assert_eq!(s.execute(Command::Share).await.unwrap(), vec!["/"]);
    }

    #[tokio::test]
    async fn open_without_keyword_only_sets_parameters() {
        let s = session();
        let out = s.execute(Command::Open("/?src=tg&res=all".into())).await.unwrap();
        assert!(out.contains(&"source:   tg".to_string()));
        assert_eq!(s.search_store().snapshot().params.result_type, crate::search::ResultKind::All);
    }
}
