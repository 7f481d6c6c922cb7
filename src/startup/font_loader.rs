use std::fs;
use std::path::Path;

use resvg::usvg::fontdb;

use crate::config::FontsConfig;
use crate::features::render::FontBook;

/// 构建字体库：系统字体（可关闭）+ 字体目录下的全部 .ttf/.otf
pub fn load_font_book(cfg: &FontsConfig) -> FontBook {
    let mut font_db = fontdb::Database::new();
    if cfg.load_system_fonts {
        font_db.load_system_fonts();
    }

    let loaded = load_font_dir(&mut font_db, Path::new(&cfg.dir));
    let book = FontBook::new(font_db, cfg.family.as_deref());

    if book.has_faces() {
        tracing::info!(
            faces = book.face_count(),
            custom = loaded,
            family = book.family(),
            "字体库加载完成"
        );
    } else {
        tracing::warn!("未找到可用字体，栅格图片将不包含文字");
    }
    book
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
}

/// 加载目录中的字体文件，返回成功加载的文件数
fn load_font_dir(font_db: &mut fontdb::Database, dir: &Path) -> usize {
    if !dir.exists() {
        tracing::debug!("字体目录不存在，跳过: {}", dir.display());
        return 0;
    }
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("读取字体目录失败 '{}': {}", dir.display(), e);
            return 0;
        }
    };

    let mut loaded = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || !is_font_file(&path) {
            continue;
        }
        match font_db.load_font_file(&path) {
            Ok(()) => loaded += 1,
            Err(e) => tracing::error!("加载字体文件失败 '{}': {}", path.display(), e),
        }
    }
    loaded
}
