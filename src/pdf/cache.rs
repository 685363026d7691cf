//! LRU cache of rendered pages

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::renderer::RenderedPage;
use super::request::RenderTarget;

/// Cache key for rendered pages
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Page number (1-based)
    pub page: usize,
    /// Scale factor (stored as millionths for stable hashing)
    pub scale_millionths: u32,
}

impl CacheKey {
    #[must_use]
    pub fn from_target(target: &RenderTarget) -> Self {
        Self {
            page: target.page,
            scale_millionths: (target.scale * 1_000_000.0) as u32,
        }
    }
}

/// LRU cache for rendered page data
pub struct PageCache {
    cache: LruCache<CacheKey, Arc<RenderedPage>>,
}

impl PageCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Get a cached page, promoting it in the LRU order
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<RenderedPage>> {
        self.cache.get(key).cloned()
    }

    /// Insert a page, returning the shared handle
    pub fn insert(&mut self, key: CacheKey, page: RenderedPage) -> Arc<RenderedPage> {
        let arc = Arc::new(page);
        self.cache.put(key, arc.clone());
        arc
    }

    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{Bitmap, PageSize, TextLayer, Viewport};

    fn rendered(page: usize) -> RenderedPage {
        let viewport = Viewport::for_page(PageSize::new(100.0, 100.0), 1.0);
        RenderedPage {
            page,
            viewport,
            bitmap: Bitmap::blank(viewport.width_px, viewport.height_px),
            text_layer: TextLayer::build(page, &[], &viewport),
        }
    }

    fn key(page: usize, scale: f32) -> CacheKey {
        CacheKey::from_target(&RenderTarget { page, scale })
    }

    #[test]
    fn cache_lru_eviction() {
        let mut cache = PageCache::new(2);
        for i in 1..=3 {
            cache.insert(key(i, 1.0), rendered(i));
        }

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key(1, 1.0)).is_none());
        assert!(cache.get(&key(3, 1.0)).is_some());
    }

    #[test]
    fn scale_is_part_of_the_key() {
        let mut cache = PageCache::new(4);
        cache.insert(key(1, 1.0), rendered(1));
        assert!(cache.get(&key(1, 1.5)).is_none());
        assert!(cache.get(&key(1, 1.0)).is_some());

        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
