use std::fs;

use crate::config::ContentConfig;
use crate::features::content::{
    Catalog, ContentError, ContentKind, ContentRepository, parse_catalog,
};

/// 加载名言与笑话；未配置路径的一类使用内置数据
pub fn load_content(cfg: &ContentConfig) -> Result<ContentRepository, ContentError> {
    let builtin = ContentRepository::builtin()?;
    if cfg.quotes_path.is_none() && cfg.jokes_path.is_none() {
        log_summary(&builtin, "内置");
        return Ok(builtin);
    }

    let quotes = read_or_builtin(cfg.quotes_path.as_deref(), ContentKind::Quote, &builtin)?;
    let jokes = read_or_builtin(cfg.jokes_path.as_deref(), ContentKind::Joke, &builtin)?;
    let repo = ContentRepository::new(quotes, jokes);
    log_summary(&repo, "外部");
    Ok(repo)
}

fn read_or_builtin(
    path: Option<&str>,
    kind: ContentKind,
    builtin: &ContentRepository,
) -> Result<Catalog, ContentError> {
    let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(builtin.catalog(kind).clone());
    };
    let yaml = fs::read_to_string(path).map_err(|e| ContentError::Io {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    parse_catalog(path, &yaml)
}

fn log_summary(repo: &ContentRepository, origin: &str) {
    tracing::info!(
        quotes = repo.count(ContentKind::Quote),
        quote_categories = repo.get_categories(ContentKind::Quote).len(),
        jokes = repo.count(ContentKind::Joke),
        joke_categories = repo.get_categories(ContentKind::Joke).len(),
        "{origin}内容库加载完成"
    );
}
