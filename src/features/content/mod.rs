//! 内容库：按类别组织的名言与笑话，供占位图随机取用。

pub mod handler;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use axum::{Router, routing::get};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::AppState;

/// 内置内容（可被配置中的外部文件覆盖）
const BUILTIN_QUOTES: &str = include_str!("../../../resources/content/quotes.yaml");
const BUILTIN_JOKES: &str = include_str!("../../../resources/content/jokes.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Quote,
    Joke,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Joke => "joke",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = ();

    /// 接受单复数与大小写变体：`quote` / `quotes` / `Joke` ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quote" | "quotes" => Ok(Self::Quote),
            "joke" | "jokes" => Ok(Self::Joke),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{kind} 没有类别 `{category}`")]
    UnknownCategory { kind: ContentKind, category: String },

    #[error("{0} 内容为空")]
    Empty(ContentKind),

    #[error("解析 {source_name} 失败: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("读取 {path} 失败: {message}")]
    Io { path: String, message: String },
}

/// 类别 → 条目列表
pub type Catalog = BTreeMap<String, Vec<String>>;

/// 只读内容库；加载完成后在请求间共享
#[derive(Debug, Clone, Default)]
pub struct ContentRepository {
    quotes: Catalog,
    jokes: Catalog,
}

impl ContentRepository {
    pub fn new(quotes: Catalog, jokes: Catalog) -> Self {
        Self {
            quotes: prune(quotes),
            jokes: prune(jokes),
        }
    }

    /// 从 YAML 文本加载（顶层为 `类别: [条目...]` 的映射）
    pub fn from_yaml(quotes_yaml: &str, jokes_yaml: &str) -> Result<Self, ContentError> {
        Ok(Self::new(
            parse_catalog("quotes", quotes_yaml)?,
            parse_catalog("jokes", jokes_yaml)?,
        ))
    }

    pub fn builtin() -> Result<Self, ContentError> {
        Self::from_yaml(BUILTIN_QUOTES, BUILTIN_JOKES)
    }

    pub fn catalog(&self, kind: ContentKind) -> &Catalog {
        match kind {
            ContentKind::Quote => &self.quotes,
            ContentKind::Joke => &self.jokes,
        }
    }

    /// 随机取一条。`category` 为空时从所有类别的并集中取。
    pub fn get_random(&self, kind: ContentKind, category: &str) -> Result<String, ContentError> {
        self.get_random_with(kind, category, &mut rand::thread_rng())
    }

    pub fn get_random_with<R: Rng + ?Sized>(
        &self,
        kind: ContentKind,
        category: &str,
        rng: &mut R,
    ) -> Result<String, ContentError> {
        let catalog = self.catalog(kind);
        let category = category.trim();

        if category.is_empty() {
            let pool: Vec<&String> = catalog.values().flatten().collect();
            return pool
                .choose(rng)
                .map(|s| (*s).clone())
                .ok_or(ContentError::Empty(kind));
        }

        let entries = catalog
            .get(category)
            .ok_or_else(|| ContentError::UnknownCategory {
                kind,
                category: category.to_string(),
            })?;
        entries.choose(rng).cloned().ok_or(ContentError::Empty(kind))
    }

    /// 该类内容的全部类别名（已排序）
    pub fn get_categories(&self, kind: ContentKind) -> Vec<String> {
        self.catalog(kind).keys().cloned().collect()
    }

    pub fn count(&self, kind: ContentKind) -> usize {
        self.catalog(kind).values().map(Vec::len).sum()
    }
}

/// 解析单个 YAML 内容文件；空文档视为空目录
pub fn parse_catalog(source_name: &str, yaml: &str) -> Result<Catalog, ContentError> {
    let blank = yaml
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'));
    if blank {
        return Ok(Catalog::new());
    }
    serde_yaml::from_str::<Option<Catalog>>(yaml)
        .map(Option::unwrap_or_default)
        .map_err(|e| ContentError::Parse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })
}

/// 去掉空白条目与空类别
fn prune(catalog: Catalog) -> Catalog {
    catalog
        .into_iter()
        .filter_map(|(category, entries)| {
            let entries: Vec<String> = entries
                .into_iter()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect();
            (!entries.is_empty()).then(|| (category.trim().to_string(), entries))
        })
        .collect()
}

pub fn create_content_router() -> Router<AppState> {
    Router::new().route("/categories/:kind", get(handler::list_categories))
}
