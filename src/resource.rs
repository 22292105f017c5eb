use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use image::ImageFormat;
use uuid::Uuid;

pub const OBJECT_URL_PREFIX: &str = "blob:profile/";

/// Declared media type of a response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    Image(String),
    Text(String),
    Unrecognized(String),
    Missing,
}

impl ContentKind {
    /// Parse a `Content-Type` header value. Parameters such as the charset
    /// are ignored and the comparison is case-insensitive.
    pub fn parse(header: Option<&str>) -> Self {
        let raw = match header {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return ContentKind::Missing,
        };
        let essence = raw
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.split_once('/') {
            Some(("image", sub)) if !sub.is_empty() => {
                ContentKind::Image(essence)
            }
            Some(("text", sub)) if !sub.is_empty() => ContentKind::Text(essence),
            _ => ContentKind::Unrecognized(raw.to_string()),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Image(mime)
            | ContentKind::Text(mime)
            | ContentKind::Unrecognized(mime) => f.write_str(mime),
            ContentKind::Missing => f.write_str("<missing>"),
        }
    }
}

/// Bytes kept alive behind an object URL
#[derive(Debug)]
pub struct Blob {
    pub media_type: String,
    pub data: Vec<u8>,
}

/// Process-local table of object URLs.
///
/// Every entry is owned by exactly one [ImageHandle] and removed when that
/// handle is dropped.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    blobs: Mutex<HashMap<Uuid, Arc<Blob>>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `data` and hand out the owning handle
    pub fn create(
        self: &Arc<Self>,
        media_type: impl Into<String>,
        data: Vec<u8>,
    ) -> ImageHandle {
        let id = Uuid::new_v4();
        let format = image::guess_format(&data).ok();
        let blob = Arc::new(Blob {
            media_type: media_type.into(),
            data,
        });
        let handle = ImageHandle {
            id,
            url: format!("{}{}", OBJECT_URL_PREFIX, id),
            media_type: blob.media_type.clone(),
            len: blob.data.len(),
            format,
            registry: Arc::clone(self),
        };
        self.lock().insert(id, blob);
        log::debug!("created {} ({} bytes)", handle.url, handle.len);
        handle
    }

    /// Look up the bytes behind an object URL
    pub fn resolve(&self, url: &str) -> Option<Arc<Blob>> {
        let id = url
            .strip_prefix(OBJECT_URL_PREFIX)
            .and_then(|id| Uuid::parse_str(id).ok())?;
        self.lock().get(&id).cloned()
    }

    /// Number of live object URLs
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn revoke(&self, id: &Uuid) {
        if self.lock().remove(id).is_some() {
            log::debug!("revoked {}{}", OBJECT_URL_PREFIX, id);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<Blob>>> {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Owning reference to a registered image. Dropping it revokes the URL.
pub struct ImageHandle {
    id: Uuid,
    url: String,
    media_type: String,
    len: usize,
    format: Option<ImageFormat>,
    registry: Arc<ObjectUrlRegistry>,
}

impl ImageHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Format sniffed from the bytes, which may disagree with the
    /// declared media type
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub fn release(self) {}
}

impl Drop for ImageHandle {
    fn drop(&mut self) {
        self.registry.revoke(&self.id);
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("url", &self.url)
            .field("media_type", &self.media_type)
            .field("len", &self.len)
            .field("format", &self.format)
            .finish()
    }
}

/// Outcome of a profile load
#[derive(Debug, Default)]
pub enum ProfileResource {
    Image(ImageHandle),
    TextUrl(String),
    #[default]
    Absent,
}

impl ProfileResource {
    /// What an `img` element would use as its source
    pub fn source(&self) -> Option<&str> {
        match self {
            ProfileResource::Image(handle) => Some(handle.url()),
            ProfileResource::TextUrl(url) => Some(url),
            ProfileResource::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ProfileResource::Absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[rstest]
    #[case(Some("image/png"), ContentKind::Image("image/png".into()))]
    #[case(Some("Image/JPEG"), ContentKind::Image("image/jpeg".into()))]
    #[case(
        Some("text/plain;charset=UTF-8"),
        ContentKind::Text("text/plain".into())
    )]
    #[case(
        Some("application/json"),
        ContentKind::Unrecognized("application/json".into())
    )]
    #[case(Some("image"), ContentKind::Unrecognized("image".into()))]
    #[case(Some("  "), ContentKind::Missing)]
    #[case(None, ContentKind::Missing)]
    fn parse_content_kind(
        #[case] header: Option<&str>,
        #[case] expected: ContentKind,
    ) {
        assert_eq!(ContentKind::parse(header), expected);
    }

    #[test]
    fn handle_resolves_until_dropped() {
        let registry = ObjectUrlRegistry::new();
        let handle = registry.create("image/png", PNG_MAGIC.to_vec());

        assert!(handle.url().starts_with(OBJECT_URL_PREFIX));
        assert_eq!(handle.len(), PNG_MAGIC.len());
        assert_eq!(handle.format(), Some(ImageFormat::Png));

        let url = handle.url().to_string();
        let blob = registry.resolve(&url).unwrap();
        assert_eq!(blob.data, PNG_MAGIC);
        assert_eq!(blob.media_type, "image/png");

        handle.release();
        assert!(registry.resolve(&url).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn releasing_one_handle_keeps_the_other() {
        let registry = ObjectUrlRegistry::new();
        let old = registry.create("image/png", vec![1, 2, 3]);
        let current = registry.create("image/png", vec![4, 5, 6]);
        assert_ne!(old.url(), current.url());
        assert_eq!(old.format(), None);

        drop(old);
        assert_eq!(registry.len(), 1);
        let blob = registry.resolve(current.url()).unwrap();
        assert_eq!(blob.data, vec![4, 5, 6]);
    }

    #[test]
    fn resolve_ignores_foreign_urls() {
        let registry = ObjectUrlRegistry::new();
        let _handle = registry.create("image/gif", vec![0]);
        assert!(registry.resolve("http://example.com/p.jpg").is_none());
        assert!(registry.resolve("blob:profile/not-a-uuid").is_none());
    }

    #[test]
    fn resource_source() {
        let registry = ObjectUrlRegistry::new();
        let handle = registry.create("image/png", vec![7]);
        let url = handle.url().to_string();

        assert_eq!(ProfileResource::Image(handle).source(), Some(url.as_str()));
        assert_eq!(
            ProfileResource::TextUrl("http://example.com/p.jpg".into())
                .source(),
            Some("http://example.com/p.jpg")
        );
        assert!(ProfileResource::default().is_absent());
    }
}
