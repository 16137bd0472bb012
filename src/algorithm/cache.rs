use crate::analysis::extraction::TileId;
use crate::io::configuration::{DEFAULT_CACHE_MAX_BYTES, DEFAULT_CACHE_MAX_ENTRIES, Quality};
use image::RgbaImage;
use lru::LruCache;
use std::sync::Arc;

/// Pixel buffer a surface was rendered from
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SurfaceSource {
    /// The uncompressed square thumbnail
    Thumbnail,
    /// The RGB565 payload, decoded
    Compressed,
}

impl SurfaceSource {
    /// Buffer that `quality` draws tiles from
    pub const fn for_quality(quality: Quality) -> Self {
        if quality.uses_compressed_tiles() {
            Self::Compressed
        } else {
            Self::Thumbnail
        }
    }
}

/// Key for a rendered tile surface
///
/// The same tile is cached independently for every size and source buffer it
/// is drawn from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct CacheKey {
    /// Tile the surface was rendered from
    pub tile_id: TileId,
    /// Side length of the square surface in pixels
    pub render_size: u32,
    /// Buffer the surface was rendered from
    pub source: SurfaceSource,
}

impl CacheKey {
    /// Create a key for `tile_id` rendered at `render_size` from `source`
    pub const fn new(tile_id: TileId, render_size: u32, source: SurfaceSource) -> Self {
        Self {
            tile_id,
            render_size,
            source,
        }
    }
}

/// A cached surface with its estimated footprint
#[derive(Clone, Debug)]
pub struct CacheEntry {
    /// Rendered RGBA pixels
    pub surface: Arc<RgbaImage>,
    /// Estimated bytes held by `surface`
    pub estimated_bytes: usize,
}

/// Performance metrics for cache effectiveness
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: usize,
    /// Number of cache misses
    pub misses: usize,
    /// Number of entries evicted to stay within budget
    pub evictions: usize,
}

/// Bounded LRU store of rendered tile surfaces
///
/// Both the entry count and the estimated byte total are capped; inserting
/// evicts least-recently-used entries until the newcomer fits.
#[derive(Debug)]
pub struct TileCache {
    entries: LruCache<CacheKey, CacheEntry>,
    max_entries: usize,
    max_bytes: usize,
    total_bytes: usize,

    /// Cache performance statistics
    pub stats: CacheStats,
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_MAX_BYTES)
    }
}

/// Estimated bytes of an RGBA surface
pub fn estimate_bytes(surface: &RgbaImage) -> usize {
    surface.width() as usize * surface.height() as usize * 4
}

impl TileCache {
    /// Create an empty cache with the given budget
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            max_entries,
            max_bytes,
            total_bytes: 0,
            stats: CacheStats::default(),
        }
    }

    /// Look up a surface, marking it most recently used
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<RgbaImage>> {
        if let Some(entry) = self.entries.get(key) {
            self.stats.hits += 1;
            Some(Arc::clone(&entry.surface))
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Test for presence without touching recency
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    /// Store a surface, evicting old entries to make room
    ///
    /// Returns `false` when the surface alone exceeds the byte budget or the
    /// cache holds no entries at all; nothing is stored in that case.
    pub fn insert(&mut self, key: CacheKey, surface: Arc<RgbaImage>) -> bool {
        let incoming = estimate_bytes(&surface);
        if incoming > self.max_bytes || self.max_entries == 0 {
            return false;
        }

        self.remove(&key);
        while self.total_bytes + incoming > self.max_bytes
            || self.entries.len() >= self.max_entries
        {
            let Some((evicted, entry)) = self.entries.pop_lru() else {
                break;
            };
            self.total_bytes = self.total_bytes.saturating_sub(entry.estimated_bytes);
            self.stats.evictions += 1;
            tracing::trace!(
                tile_id = %evicted.tile_id,
                size = evicted.render_size,
                "Evicted cached surface"
            );
        }

        self.total_bytes += incoming;
        self.entries.put(
            key,
            CacheEntry {
                surface,
                estimated_bytes: incoming,
            },
        );
        true
    }

    /// Drop one entry, returning its surface
    pub fn remove(&mut self, key: &CacheKey) -> Option<Arc<RgbaImage>> {
        let entry = self.entries.pop(key)?;
        self.total_bytes = self.total_bytes.saturating_sub(entry.estimated_bytes);
        Some(entry.surface)
    }

    /// Drop every entry, keeping statistics
    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_bytes = 0;
    }

    /// Number of cached surfaces
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no surfaces
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Estimated bytes currently held
    pub const fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Configured entry budget
    pub const fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Configured byte budget
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}
