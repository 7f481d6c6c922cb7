//! 渲染结果缓存：请求指纹 → 图片字节的有界 LRU。

use std::num::NonZeroUsize;
use std::sync::Mutex;

use axum::body::Bytes;
use lru::LruCache;
use md5::{Digest, Md5};

use crate::features::render::RenderSpec;

/// 规范化的请求指纹。
///
/// 由所有影响输出字节的字段拼接而成；颜色已规范化为六位小写十六进制，
/// 文本放在最后，因此任意文本内容都不会与其它字段产生歧义。
pub fn fingerprint(spec: &RenderSpec) -> String {
    format!(
        "{}:{}:{}:{}:{}:{}:{}:{}:{}",
        spec.width,
        spec.height,
        spec.shape.code(),
        spec.weight.code(),
        spec.layout.code(),
        spec.format.code(),
        spec.background.code(),
        spec.foreground.to_hex(),
        spec.text
    )
}

/// 指纹的内容摘要，带引号，直接用作 ETag
pub fn digest(fingerprint: &str) -> String {
    let hash = Md5::digest(fingerprint.as_bytes());
    format!("\"{}\"", hex::encode(hash))
}

pub struct ImageCache {
    entries: Mutex<LruCache<String, Bytes>>,
    capacity: NonZeroUsize,
}

impl ImageCache {
    /// 容量为 0 时按 1 处理
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            capacity,
        }
    }

    /// 命中时刷新该条目的最近使用时间
    pub fn get(&self, fingerprint: &str) -> Option<Bytes> {
        let mut entries = self.entries.lock().ok()?;
        entries.get(fingerprint).cloned()
    }

    /// 写入或覆盖；超出容量时淘汰最久未使用的条目
    pub fn put(&self, fingerprint: String, bytes: Bytes) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(fingerprint, bytes);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::render::{
        ColorSpec, FontWeight, ImageFormat, Rgb, Shape, TextLayout,
    };

    fn spec() -> RenderSpec {
        RenderSpec {
            width: 128,
            height: 128,
            background: ColorSpec::Solid(Rgb::new(0xf0, 0xe9, 0xe9)),
            foreground: Rgb::BLACK,
            text: "JD".into(),
            shape: Shape::Rect,
            weight: FontWeight::Normal,
            layout: TextLayout::Single,
            format: ImageFormat::Svg,
        }
    }

    #[test]
    fn fingerprint_changes_with_every_output_field() {
        let base = fingerprint(&spec());
        let variants: Vec<Box<dyn Fn(&mut RenderSpec)>> = vec![
            Box::new(|s| s.width = 129),
            Box::new(|s| s.height = 127),
            Box::new(|s| s.background = ColorSpec::Solid(Rgb::WHITE)),
            Box::new(|s| s.background = ColorSpec::Gradient(Rgb::new(0xf0, 0xe9, 0xe9), Rgb::WHITE)),
            Box::new(|s| s.foreground = Rgb::WHITE),
            Box::new(|s| s.text = "JE".into()),
            Box::new(|s| s.shape = Shape::Circle),
            Box::new(|s| s.weight = FontWeight::Bold),
            Box::new(|s| s.layout = TextLayout::Wrapped),
            Box::new(|s| s.format = ImageFormat::Png),
        ];
        for mutate in variants {
            let mut s = spec();
            mutate(&mut s);
            assert_ne!(fingerprint(&s), base, "{s:?}");
        }
    }

    #[test]
    fn fingerprint_is_stable_for_equal_specs() {
        assert_eq!(fingerprint(&spec()), fingerprint(&spec()));
        assert_eq!(
            fingerprint(&spec()),
            "128:128:rect:normal:single:svg:f0e9e9:000000:JD"
        );
    }

    #[test]
    fn text_with_separators_does_not_collide() {
        let mut a = spec();
        a.text = "a:b".into();
        let mut b = spec();
        b.text = "a".into();
        b.foreground = Rgb::WHITE;
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn digest_is_quoted_md5_hex() {
        let d = digest("hello");
        assert_eq!(d, "\"5d41402abc4b2a76b9719d911017c592\"");
        assert_eq!(d, digest("hello"));
        assert_ne!(d, digest("hello!"));
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = ImageCache::new(2);
        cache.put("a".into(), Bytes::from_static(b"1"));
        cache.put("b".into(), Bytes::from_static(b"2"));
        // 访问 a 使 b 成为最久未使用
        assert_eq!(cache.get("a"), Some(Bytes::from_static(b"1")));
        cache.put("c".into(), Bytes::from_static(b"3"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let cache = ImageCache::new(4);
        cache.put("k".into(), Bytes::from_static(b"old"));
        cache.put("k".into(), Bytes::from_static(b"new"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k"), Some(Bytes::from_static(b"new")));
    }

    #[test]
    fn zero_capacity_is_treated_as_one() {
        let cache = ImageCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.put("a".into(), Bytes::new());
        cache.put("b".into(), Bytes::new());
        assert_eq!(cache.len(), 1);
        assert!(cache.get("b").is_some());
    }
}
