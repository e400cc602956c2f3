//! Search data model: parameters, cloud drive kinds and the server response shapes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Closed set of drive/link backends the service aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CloudType {
    #[serde(rename = "baidu")]
    Baidu,
    #[serde(rename = "aliyun")]
    Aliyun,
    #[serde(rename = "quark")]
    Quark,
    #[serde(rename = "tianyi")]
    Tianyi,
    #[serde(rename = "uc")]
    Uc,
    #[serde(rename = "mobile")]
    Mobile,
    #[serde(rename = "115")]
    Pan115,
    #[serde(rename = "pikpak")]
    Pikpak,
    #[serde(rename = "xunlei")]
    Xunlei,
    #[serde(rename = "123")]
    Pan123,
    #[serde(rename = "magnet")]
    Magnet,
    #[serde(rename = "ed2k")]
    Ed2k,
    #[serde(rename = "lanzou")]
    Lanzou,
    #[serde(rename = "onedrive")]
    Onedrive,
    #[serde(rename = "googledrive")]
    Googledrive,
}

impl CloudType {
    pub const ALL: [CloudType; 15] = [
        CloudType::Baidu,
        CloudType::Aliyun,
        CloudType::Quark,
        CloudType::Tianyi,
        CloudType::Uc,
        CloudType::Mobile,
        CloudType::Pan115,
        CloudType::Pikpak,
        CloudType::Xunlei,
        CloudType::Pan123,
        CloudType::Magnet,
        CloudType::Ed2k,
        CloudType::Lanzou,
        CloudType::Onedrive,
        CloudType::Googledrive,
    ];

    /// Wire name used in request bodies and response group keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudType::Baidu => "baidu",
            CloudType::Aliyun => "aliyun",
            CloudType::Quark => "quark",
            CloudType::Tianyi => "tianyi",
            CloudType::Uc => "uc",
            CloudType::Mobile => "mobile",
            CloudType::Pan115 => "115",
            CloudType::Pikpak => "pikpak",
            CloudType::Xunlei => "xunlei",
            CloudType::Pan123 => "123",
            CloudType::Magnet => "magnet",
            CloudType::Ed2k => "ed2k",
            CloudType::Lanzou => "lanzou",
            CloudType::Onedrive => "onedrive",
            CloudType::Googledrive => "googledrive",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CloudType::Baidu => "Baidu Netdisk",
            CloudType::Aliyun => "Aliyun Drive",
            CloudType::Quark => "Quark Drive",
            CloudType::Tianyi => "Tianyi Cloud",
            CloudType::Uc => "UC Drive",
            CloudType::Mobile => "China Mobile Cloud",
            CloudType::Pan115 => "115 Drive",
            CloudType::Pikpak => "PikPak",
            CloudType::Xunlei => "Xunlei Drive",
            CloudType::Pan123 => "123 Drive",
            CloudType::Magnet => "Magnet",
            CloudType::Ed2k => "ED2K",
            CloudType::Lanzou => "Lanzou Cloud",
            CloudType::Onedrive => "OneDrive",
            CloudType::Googledrive => "Google Drive",
        }
    }

    pub fn all() -> BTreeSet<CloudType> { Self::ALL.iter().copied().collect() }
}

impl fmt::Display for CloudType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for CloudType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim().to_ascii_lowercase();
        CloudType::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == t)
            .ok_or_else(|| format!("unknown cloud type '{}'", s.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    All,
    Tg,
    Plugin,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self { SourceKind::All => "all", SourceKind::Tg => "tg", SourceKind::Plugin => "plugin" }
    }
}

impl FromStr for SourceKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SourceKind::All),
            "tg" => Ok(SourceKind::Tg),
            "plugin" => Ok(SourceKind::Plugin),
            other => Err(format!("unknown source '{}', expected all|tg|plugin", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    All,
    Results,
    #[default]
    Merge,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self { ResultKind::All => "all", ResultKind::Results => "results", ResultKind::Merge => "merge" }
    }
}

impl FromStr for ResultKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ResultKind::All),
            "results" => Ok(ResultKind::Results),
            "merge" => Ok(ResultKind::Merge),
            other => Err(format!("unknown result type '{}', expected all|results|merge", other)),
        }
    }
}

pub const DEFAULT_CONCURRENCY: u32 = 5;

/// User-facing search parameters; mapped onto the wire body by `search::wire`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParameters {
    pub keyword: String,
    pub channels: BTreeSet<String>,
    pub plugins: BTreeSet<String>,
    pub cloud_types: BTreeSet<CloudType>,
    pub source: SourceKind,
    pub result_type: ResultKind,
    pub concurrency: Option<u32>,
    pub refresh: bool,
    pub extension: Map<String, Value>,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            channels: BTreeSet::new(),
            plugins: BTreeSet::new(),
            cloud_types: CloudType::all(),
            source: SourceKind::All,
            result_type: ResultKind::Merge,
            concurrency: Some(DEFAULT_CONCURRENCY),
            refresh: false,
            extension: Map::new(),
        }
    }
}

/// Partial update for `SearchParameters`; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamsPatch {
    pub keyword: Option<String>,
    pub channels: Option<BTreeSet<String>>,
    pub plugins: Option<BTreeSet<String>>,
    pub cloud_types: Option<BTreeSet<CloudType>>,
    pub source: Option<SourceKind>,
    pub result_type: Option<ResultKind>,
    pub concurrency: Option<Option<u32>>,
    pub refresh: Option<bool>,
    pub extension: Option<Map<String, Value>>,
}

impl ParamsPatch {
    pub fn keyword<S: Into<String>>(kw: S) -> Self { Self { keyword: Some(kw.into()), ..Default::default() } }

    pub fn is_empty(&self) -> bool { *self == ParamsPatch::default() }
}

impl SearchParameters {
    /// Shallow merge: each field present in the patch replaces the current one.
    pub fn merged(&self, patch: &ParamsPatch) -> SearchParameters {
        let mut out = self.clone();
        if let Some(v) = &patch.keyword { out.keyword = v.clone(); }
        if let Some(v) = &patch.channels { out.channels = v.clone(); }
        if let Some(v) = &patch.plugins { out.plugins = v.clone(); }
        if let Some(v) = &patch.cloud_types { out.cloud_types = v.clone(); }
        if let Some(v) = patch.source { out.source = v; }
        if let Some(v) = patch.result_type { out.result_type = v; }
        if let Some(v) = patch.concurrency { out.concurrency = v; }
        if let Some(v) = patch.refresh { out.refresh = v; }
        if let Some(v) = &patch.extension { out.extension = v.clone(); }
        out
    }
}

/// A share link merged under one cloud type by the server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawLink {
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub password: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub note: String,
    /// Non-string values (numeric epochs, objects) are dropped and sort as oldest.
    #[serde(default, deserialize_with = "string_or_none", skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// Link entry inside a raw message result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageLink {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, alias = "updateTime", skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Raw channel/plugin message as returned when `res` includes results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    pub message_id: String,
    pub unique_id: String,
    pub channel: String,
    pub datetime: String,
    pub title: String,
    pub content: String,
    #[serde(deserialize_with = "null_as_default")]
    pub links: Vec<MessageLink>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub images: Vec<String>,
}

/// Links grouped by cloud type, in the order the server emitted the groups.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergedByType(Vec<(CloudType, Vec<RawLink>)>);

impl MergedByType {
    pub fn new() -> Self { Self::default() }

    /// Appends to an existing group of the same type, otherwise opens a new group.
    pub fn push_group(&mut self, cloud_type: CloudType, links: Vec<RawLink>) {
        if let Some((_, existing)) = self.0.iter_mut().find(|(t, _)| *t == cloud_type) {
            existing.extend(links);
        } else {
            self.0.push((cloud_type, links));
        }
    }

    pub fn groups(&self) -> &[(CloudType, Vec<RawLink>)] { &self.0 }

    pub fn get(&self, cloud_type: CloudType) -> Option<&[RawLink]> {
        self.0.iter().find(|(t, _)| *t == cloud_type).map(|(_, l)| l.as_slice())
    }

    pub fn is_empty(&self) -> bool { self.0.iter().all(|(_, l)| l.is_empty()) }

    /// Total number of links across every group.
    pub fn link_count(&self) -> usize { self.0.iter().map(|(_, l)| l.len()).sum() }
}

impl FromIterator<(CloudType, Vec<RawLink>)> for MergedByType {
    fn from_iter<I: IntoIterator<Item = (CloudType, Vec<RawLink>)>>(iter: I) -> Self {
        let mut m = MergedByType::new();
        for (t, links) in iter { m.push_group(t, links); }
        m
    }
}

impl Serialize for MergedByType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (t, links) in &self.0 {
            map.serialize_entry(t.as_str(), links)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MergedByType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = MergedByType;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of cloud type to link arrays")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = MergedByType::new();
                while let Some(key) = access.next_key::<String>()? {
                    match key.parse::<CloudType>() {
                        Ok(t) => {
                            let raw: Option<Vec<Value>> = access.next_value()?;
                            out.push_group(t, decode_links(t, raw.unwrap_or_default()));
                        }
                        Err(_) => {
                            warn!(target: "unisearch::search", "skipping links under unknown cloud type '{}'", key);
                            access.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}

/// Response payload of `POST /search`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total: u64,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<SearchResult>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub merged_by_type: MergedByType,
}

impl SearchResponse {
    /// Number of items the flattened view will hold.
    pub fn flattened_count(&self) -> usize { self.merged_by_type.link_count() }
}

/// Plugin list in either `["a","b"]` or `{"count":2,"names":["a","b"]}` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginList {
    Names(Vec<String>),
    Detailed {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        names: Vec<String>,
        #[serde(default)]
        info: Option<BTreeMap<String, Value>>,
    },
}

impl Default for PluginList {
    fn default() -> Self { PluginList::Names(Vec::new()) }
}

impl PluginList {
    pub fn names(&self) -> &[String] {
        match self {
            PluginList::Names(n) => n,
            PluginList::Detailed { names, .. } => names,
        }
    }
}

/// Response payload of `GET /health`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub auth_enabled: Option<bool>,
    #[serde(default)]
    pub plugins_enabled: Option<bool>,
    #[serde(default)]
    pub plugin_count: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub plugins: PluginList,
    #[serde(default)]
    pub channels_count: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub channels: Vec<String>,
}

/// Decodes each link on its own so one malformed entry does not sink the group.
fn decode_links(cloud_type: CloudType, raw: Vec<Value>) -> Vec<RawLink> {
    raw.into_iter()
        .filter_map(|v| match serde_json::from_value::<RawLink>(v) {
            Ok(link) => Some(link),
            Err(e) => {
                warn!(target: "unisearch::search", "skipping malformed {} link: {}", cloud_type.as_str(), e);
                None
            }
        })
        .collect()
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
