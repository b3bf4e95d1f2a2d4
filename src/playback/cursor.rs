//! Ordered "current advertisement -> current asset" cursor.

use crate::manifest::{AdKind, AdvertisementItem, Asset, FlatEntry, Manifest};

/// Assets sorted by `orderIndex` ascending with missing indices last.
///
/// The sort is stable, so equal indices keep their manifest order.
pub fn ordered_assets(item: &AdvertisementItem) -> Vec<&Asset> {
    let mut assets: Vec<&Asset> = item.assets.iter().collect();
    assets.sort_by_key(|a| (a.order_index.is_none(), a.order_index));
    assets
}

/// Sum of declared durations for one advertisement, each clamped at zero.
pub fn cycle_seconds(item: &AdvertisementItem) -> f64 {
    item.assets
        .iter()
        .map(|a| a.duration_seconds.filter(|d| d.is_finite()).unwrap_or(0.0).max(0.0))
        .sum()
}

/// One advertisement with its assets already ordered and flattened
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistAd {
    pub advertisement_id: i64,
    pub kind: AdKind,
    pub entries: Vec<FlatEntry>,
    pub cycle_seconds: f64,
}

impl PlaylistAd {
    pub fn from_item(item: &AdvertisementItem) -> Self {
        Self {
            advertisement_id: item.advertisement_id,
            kind: item.kind,
            entries: ordered_assets(item)
                .into_iter()
                .map(|asset| FlatEntry::new(item, asset))
                .collect(),
            cycle_seconds: cycle_seconds(item),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlaybackCursor {
    ads: Vec<PlaylistAd>,
    ad_index: usize,
    asset_index: usize,
}

impl PlaybackCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the playlist from a new manifest. The selected advertisement
    /// index is kept (it wraps on access); the asset position restarts.
    pub fn set_manifest(&mut self, manifest: &Manifest) {
        self.ads = manifest.items.iter().map(PlaylistAd::from_item).collect();
        self.asset_index = 0;
    }

    pub fn clear(&mut self) {
        self.ads.clear();
        self.asset_index = 0;
    }

    pub fn ad_count(&self) -> usize {
        self.ads.len()
    }

    pub fn asset_index(&self) -> usize {
        self.asset_index
    }

    pub fn current_advertisement(&self) -> Option<&PlaylistAd> {
        if self.ads.is_empty() {
            return None;
        }
        self.ads.get(self.ad_index % self.ads.len())
    }

    pub fn current_asset(&self) -> Option<&FlatEntry> {
        self.current_advertisement()?.entries.get(self.asset_index)
    }

    /// Move to the next asset. Returns `false` when already at the last one.
    pub fn advance_asset(&mut self) -> bool {
        let len = self
            .current_advertisement()
            .map(|ad| ad.entries.len())
            .unwrap_or(0);
        if self.asset_index + 1 < len {
            self.asset_index += 1;
            true
        } else {
            false
        }
    }

    pub fn reset_to_start(&mut self) {
        self.asset_index = 0;
    }

    /// Select an advertisement by (unwrapped) index and restart its assets.
    pub fn select_advertisement(&mut self, index: usize) {
        self.ad_index = index;
        self.asset_index = 0;
    }
}
