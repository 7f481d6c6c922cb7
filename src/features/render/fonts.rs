//! 字体库：包装 fontdb 数据库，解析常规/粗体字体并提供精确的文本宽度测量。

use std::sync::Arc;

use resvg::usvg::fontdb;

use super::text::AVG_CHAR_WIDTH_RATIO;
use super::types::FontWeight;

/// 矢量输出与无可用字体时使用的通用字体族
pub const GENERIC_FAMILY: &str = "sans-serif";

/// 系统未配置无衬线映射时依次尝试的字体族
const SANS_CANDIDATES: [&str; 5] = [
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Helvetica",
    "Arial",
];

/// 字体文件的原始数据（常驻内存）
struct FaceData {
    data: Vec<u8>,
    index: u32,
}

impl FaceData {
    fn load(db: &fontdb::Database, id: fontdb::ID) -> Option<Self> {
        db.with_face_data(id, |data, index| Self {
            data: data.to_vec(),
            index,
        })
    }

    fn parse(&self) -> Option<ParsedFace<'_>> {
        let face = ttf_parser::Face::parse(&self.data, self.index).ok()?;
        let units_per_em = f64::from(face.units_per_em());
        if units_per_em <= 0.0 {
            return None;
        }
        let notdef = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .unwrap_or_default();
        Some(ParsedFace {
            face,
            units_per_em,
            notdef,
        })
    }
}

/// 解析好的字形表，借用 [`FontBook`] 中的字体数据；一次解析可多次测量
pub struct ParsedFace<'a> {
    face: ttf_parser::Face<'a>,
    units_per_em: f64,
    notdef: u16,
}

impl ParsedFace<'_> {
    /// 以 `font_size` 排版 `text` 的前进宽度之和
    pub fn advance(&self, text: &str, font_size: f64) -> f64 {
        let units: f64 = text
            .chars()
            .map(|ch| {
                self.face
                    .glyph_index(ch)
                    .and_then(|glyph| self.face.glyph_hor_advance(glyph))
                    .unwrap_or(self.notdef)
            })
            .map(f64::from)
            .sum();
        units * font_size / self.units_per_em
    }
}

/// 无字体时的宽度估算：每字符 0.6 倍字号
pub fn estimate_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * AVG_CHAR_WIDTH_RATIO
}

pub struct FontBook {
    db: Arc<fontdb::Database>,
    family: String,
    regular: Option<FaceData>,
    bold: Option<FaceData>,
}

impl FontBook {
    /// 从已填充的字体数据库构建；优先使用 `preferred_family`，否则回落到无衬线字体。
    pub fn new(mut db: fontdb::Database, preferred_family: Option<&str>) -> Self {
        resolve_sans_serif(&mut db);
        let regular_id = query(&db, preferred_family, fontdb::Weight::NORMAL);
        let bold_id = query(&db, preferred_family, fontdb::Weight::BOLD).or(regular_id);

        let family = regular_id
            .and_then(|id| db.face(id))
            .and_then(|face| face.families.first().map(|(name, _)| name.clone()))
            .unwrap_or_else(|| GENERIC_FAMILY.to_string());

        let regular = regular_id.and_then(|id| FaceData::load(&db, id));
        let bold = bold_id.and_then(|id| FaceData::load(&db, id));

        Self {
            db: Arc::new(db),
            family,
            regular,
            bold,
        }
    }

    /// 不含任何字体的空字体库（测量退化为估算）
    pub fn empty() -> Self {
        Self::new(fontdb::Database::new(), None)
    }

    pub fn database(&self) -> Arc<fontdb::Database> {
        Arc::clone(&self.db)
    }

    /// 栅格输出使用的字体族名
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    pub fn has_faces(&self) -> bool {
        self.regular.is_some()
    }

    /// 解析指定字重的字形表；无可用字体时返回 None
    pub fn parsed_face(&self, weight: FontWeight) -> Option<ParsedFace<'_>> {
        let face = match weight {
            FontWeight::Bold => self.bold.as_ref(),
            FontWeight::Normal => self.regular.as_ref(),
        };
        face.and_then(FaceData::parse)
    }

    /// 文本在给定字号与字重下的宽度。无可用字体时按每字符 0.6 倍字号估算。
    pub fn text_width(&self, text: &str, font_size: f64, weight: FontWeight) -> f64 {
        self.parsed_face(weight)
            .map(|face| face.advance(text, font_size))
            .unwrap_or_else(|| estimate_width(text, font_size))
    }
}

/// 把通用 sans-serif 指向一个实际安装的无衬线字体（fontdb 默认指向 Arial）
fn resolve_sans_serif(db: &mut fontdb::Database) {
    let installed = SANS_CANDIDATES.into_iter().find(|candidate| {
        db.faces()
            .any(|face| face.families.iter().any(|(name, _)| name == candidate))
    });
    if let Some(name) = installed {
        db.set_sans_serif_family(name);
    }
}

fn query(
    db: &fontdb::Database,
    preferred_family: Option<&str>,
    weight: fontdb::Weight,
) -> Option<fontdb::ID> {
    let mut families = Vec::with_capacity(2);
    if let Some(name) = preferred_family.filter(|s| !s.trim().is_empty()) {
        families.push(fontdb::Family::Name(name));
    }
    families.push(fontdb::Family::SansSerif);

    db.query(&fontdb::Query {
        families: &families,
        weight,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    })
    // 没有任何候选无衬线字体时退回已加载字体，字重一致者优先
    .or_else(|| {
        db.faces()
            .find(|face| face.weight == weight && face.style == fontdb::Style::Normal)
            .or_else(|| db.faces().next())
            .map(|face| face.id)
    })
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("family", &self.family)
            .field("faces", &self.db.len())
            .field("regular", &self.regular.is_some())
            .field("bold", &self.bold.is_some())
            .finish()
    }
}
