/// 名言/笑话内容库加载器（YAML）
pub mod content_loader;
/// 字体库加载器（系统字体 + 字体目录）
pub mod font_loader;

pub use content_loader::load_content;
pub use font_loader::load_font_book;
