//! Mapping of `SearchParameters` onto the `POST /search` request body.
//! Empty collections, an empty `ext`, an absent `conc` and `refresh: false`
//! are left out of the body entirely.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::{CloudType, ResultKind, SearchParameters, SourceKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub kw: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cloud_types: Vec<CloudType>,
    pub src: SourceKind,
    pub res: ResultKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conc: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub refresh: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub ext: Map<String, Value>,
}

fn is_false(b: &bool) -> bool { !*b }

impl From<&SearchParameters> for SearchRequest {
    fn from(p: &SearchParameters) -> Self {
        SearchRequest {
            kw: p.keyword.trim().to_string(),
            channels: p.channels.iter().filter(|c| !c.trim().is_empty()).cloned().collect(),
            plugins: p.plugins.iter().filter(|c| !c.trim().is_empty()).cloned().collect(),
            cloud_types: p.cloud_types.iter().copied().collect(),
            src: p.source,
            res: p.result_type,
            conc: p.concurrency,
            refresh: p.refresh,
            ext: p.extension.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    #[test]
    fn empty_fields_are_omitted() {
        let p = SearchParameters {
            keyword: "  avatar ".into(),
            cloud_types: BTreeSet::new(),
            concurrency: None,
            ..Default::default()
        };
        let body = serde_json::to_value(SearchRequest::from(&p)).unwrap();
        assert_eq!(body, json!({"kw": "avatar", "src": "all", "res": "merge"}));
    }

    #[test]
    fn populated_fields_are_sent() {
        let mut ext = Map::new();
        ext.insert("title_en".into(), json!("Avatar"));
        let p = SearchParameters {
            keyword: "avatar".into(),
            channels: ["tgsearchers".to_string()].into_iter().collect(),
            plugins: ["", "pansearch"].iter().map(|s| s.to_string()).collect(),
            cloud_types: [CloudType::Quark, CloudType::Pan115].into_iter().collect(),
            source: SourceKind::Plugin,
            result_type: ResultKind::All,
            concurrency: Some(8),
            refresh: true,
            extension: ext,
        };
        let body = serde_json::to_value(SearchRequest::from(&p)).unwrap();
        assert_eq!(body["channels"], json!(["tgsearchers"]));
        assert_eq!(body["plugins"], json!(["pansearch"]));
        // BTreeSet order follows the enum declaration order
        assert_eq!(body["cloud_types"], json!(["quark", "115"]));
        assert_eq!(body["src"], json!("plugin"));
        assert_eq!(body["res"], json!("all"));
        assert_eq!(body["conc"], json!(8));
        assert_eq!(body["refresh"], json!(true));
        assert_eq!(body["ext"], json!({"title_en": "Avatar"}));
    }
}
