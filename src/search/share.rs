//! Shareable search links: `/?q=..&src=..&res=..&types=..&channels=..&plugins=..`.

use std::collections::BTreeSet;

use super::types::{CloudType, ParamsPatch, ResultKind, SearchParameters, SourceKind};

/// Relative link reproducing `params`. Default source, result type and the
/// full cloud type set are left out; no parameters at all gives `/`.
pub fn build_search_url(params: &SearchParameters) -> String {
    let mut pairs: Vec<(&str, String)> = Vec::new();
    let kw = params.keyword.trim();
    if !kw.is_empty() { pairs.push(("q", kw.to_string())); }
    if params.source != SourceKind::All { pairs.push(("src", params.source.as_str().to_string())); }
    if params.result_type != ResultKind::Merge { pairs.push(("res", params.result_type.as_str().to_string())); }
    if !params.cloud_types.is_empty() && params.cloud_types != CloudType::all() {
        pairs.push(("types", join(params.cloud_types.iter().map(|t| t.as_str()))));
    }
    if !params.channels.is_empty() { pairs.push(("channels", join(params.channels.iter().map(String::as_str)))); }
    if !params.plugins.is_empty() { pairs.push(("plugins", join(params.plugins.iter().map(String::as_str)))); }

    if pairs.is_empty() {
        return "/".to_string();
    }
    let query: Vec<String> = pairs.into_iter().map(|(k, v)| format!("{}={}", k, urlencoding::encode(&v))).collect();
    format!("/?{}", query.join("&"))
}

fn join<'a, I: Iterator<Item = &'a str>>(items: I) -> String { items.collect::<Vec<_>>().join(",") }

/// Parameters carried by a share link. Unknown enum values and cloud types are
/// dropped; a link with nothing recognizable yields an empty patch.
pub fn parse_search_url(url: &str) -> ParamsPatch {
    let mut patch = ParamsPatch::default();
    let Some((_, query)) = url.split_once('?') else { return patch };
    let query = query.split('#').next().unwrap_or("");
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (k, raw) = pair.split_once('=').unwrap_or((pair, ""));
        let Some(value) = decode_component(raw) else { continue };
        if value.is_empty() { continue; }
        match k {
            "q" => patch.keyword = Some(value),
            "src" => patch.source = value.parse::<SourceKind>().ok().or(patch.source),
            "res" => patch.result_type = value.parse::<ResultKind>().ok().or(patch.result_type),
            "types" => {
                let types: BTreeSet<CloudType> = split_list(&value).filter_map(|t| t.parse().ok()).collect();
                if !types.is_empty() { patch.cloud_types = Some(types); }
            }
            "channels" => patch.channels = Some(split_list(&value).map(str::to_string).collect()),
            "plugins" => patch.plugins = Some(split_list(&value).map(str::to_string).collect()),
            _ => {}
        }
    }
    patch
}

fn split_list(v: &str) -> impl Iterator<Item = &str> { v.split(',').map(str::trim).filter(|s| !s.is_empty()) }

// form encoding: '+' is a space
fn decode_component(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " ")).ok().map(|c| c.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_give_root() {
        assert_eq!(build_search_url(&SearchParameters::default()), "/");
    }

    #[test]
    fn builds_only_non_default_fields() {
        let p = SearchParameters {
            keyword: " rust book ".into(),
            source: SourceKind::Tg,
            cloud_types: [CloudType::Quark, CloudType::Baidu].into_iter().collect(),
            channels: ["tgsearchers3".to_string(), "ali".to_string()].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(build_search_url(&p), "/?q=rust%20book&src=tg&types=baidu%2Cquark&channels=ali%2Ctgsearchers3");
    }

    #[test]
    fn parse_recovers_what_build_wrote() {
        let p = SearchParameters {
            keyword: "movie 2024".into(),
            result_type: ResultKind::All,
            plugins: ["pansearch".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let patch = parse_search_url(&build_search_url(&p));
        assert_eq!(SearchParameters::default().merged(&patch), p);
    }

    #[test]
    fn parse_accepts_form_encoding_and_ignores_junk() {
        let patch = parse_search_url("https://host/?q=a+b&src=nope&res=results&types=quark,dropbox,115&channels=&x=1");
        assert_eq!(patch.keyword.as_deref(), Some("a b"));
        assert_eq!(patch.source, None);
        assert_eq!(patch.result_type, Some(ResultKind::Results));
        assert_eq!(patch.cloud_types, Some([CloudType::Quark, CloudType::Pan115].into_iter().collect()));
        assert_eq!(patch.channels, None);
        assert!(parse_search_url("/").is_empty());
    }
}
