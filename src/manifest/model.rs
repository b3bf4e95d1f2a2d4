//! Manifest data model as delivered in `manifest.json`.

use serde::{Deserialize, Serialize};

use crate::config::FALLBACK_ASSET_SECONDS;

/// Root object of `manifest.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub items: Vec<AdvertisementItem>,
}

/// How an advertisement's assets are rendered and timed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdKind {
    #[serde(rename = "IMAGE")]
    Image,
    #[serde(rename = "VIDEO")]
    Video,
}

/// One advertisement; all of its assets share `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertisementItem {
    pub advertisement_id: i64,
    #[serde(rename = "type")]
    pub kind: AdKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_display_count: Option<u32>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// One playable file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub path: String,
    #[serde(default)]
    pub order_index: Option<i64>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

impl Asset {
    /// Duration used for playback: the declared value when usable, else the fallback.
    pub fn effective_duration(&self) -> f64 {
        match self.duration_seconds {
            Some(d) if d.is_finite() && d > 0.0 => d,
            _ => FALLBACK_ASSET_SECONDS,
        }
    }
}

/// Per-asset projection consumed by the playback cursor
#[derive(Debug, Clone, PartialEq)]
pub struct FlatEntry {
    pub advertisement_id: i64,
    pub kind: AdKind,
    pub asset_path: String,
    pub duration_seconds: f64,
}

impl FlatEntry {
    pub fn new(item: &AdvertisementItem, asset: &Asset) -> Self {
        Self {
            advertisement_id: item.advertisement_id,
            kind: item.kind,
            asset_path: asset.path.clone(),
            duration_seconds: asset.effective_duration(),
        }
    }
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::from_json(
            r#"{
                "date": "2026-02-22",
                "items": [
                    {
                        "advertisementId": 7,
                        "type": "VIDEO",
                        "dailyDisplayCount": 4,
                        "assets": [{ "path": "videos/a.mp4", "orderIndex": null, "durationSeconds": 31.5 }]
                    },
                    {
                        "advertisementId": 8,
                        "type": "IMAGE",
                        "assets": [{ "path": "img/b.jpg" }]
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.date, "2026-02-22");
        assert_eq!(manifest.items.len(), 2);
        assert_eq!(manifest.items[0].kind, AdKind::Video);
        assert_eq!(manifest.items[0].daily_display_count, Some(4));
        assert_eq!(manifest.items[0].assets[0].order_index, None);
        assert_eq!(manifest.items[1].assets[0].duration_seconds, None);
    }

    #[test]
    fn test_missing_items_is_empty() {
        let manifest = Manifest::from_json(r#"{ "date": "x" }"#).unwrap();
        assert!(manifest.items.is_empty());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = Manifest::from_json(
            r#"{ "date": "x", "items": [{ "advertisementId": 1, "type": "AUDIO", "assets": [] }] }"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_effective_duration_fallback() {
        let asset = |d: Option<f64>| Asset {
            path: "a.jpg".into(),
            order_index: None,
            duration_seconds: d,
        };
        assert_eq!(asset(Some(5.0)).effective_duration(), 5.0);
        assert_eq!(asset(None).effective_duration(), FALLBACK_ASSET_SECONDS);
        assert_eq!(asset(Some(0.0)).effective_duration(), FALLBACK_ASSET_SECONDS);
        assert_eq!(asset(Some(-3.0)).effective_duration(), FALLBACK_ASSET_SECONDS);
        assert_eq!(asset(Some(f64::NAN)).effective_duration(), FALLBACK_ASSET_SECONDS);
    }
}
