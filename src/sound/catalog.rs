//! Fixed catalog of ambient tracks and the alarm sound.
//!
//! Track sources are file names resolved against the sounds directory
//! (`~/.lifeos/sounds` by default).

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::types::TrackInfo;

/// Alarm file looked up in the sounds directory.
pub const ALARM_FILE: &str = "alarm.wav";

/// Fixed volume of the completion alarm.
pub const ALARM_VOLUME: f32 = 0.5;

/// Broad grouping of ambient tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackCategory {
    Nature,
    Ambience,
    Noise,
    Music,
}

impl TrackCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackCategory::Nature => "nature",
            TrackCategory::Ambience => "ambience",
            TrackCategory::Noise => "noise",
            TrackCategory::Music => "music",
        }
    }
}

/// A looping background track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmbientTrack {
    pub name: &'static str,
    pub source: &'static str,
    pub category: TrackCategory,
}

impl AmbientTrack {
    /// Resolves the track source inside `sounds_dir`.
    #[must_use]
    pub fn path_in(&self, sounds_dir: &Path) -> PathBuf {
        sounds_dir.join(self.source)
    }
}

/// All selectable ambient tracks, in display order.
pub const TRACK_CATALOG: &[AmbientTrack] = &[
    AmbientTrack {
        name: "Rain",
        source: "rain.mp3",
        category: TrackCategory::Nature,
    },
    AmbientTrack {
        name: "Forest",
        source: "forest.mp3",
        category: TrackCategory::Nature,
    },
    AmbientTrack {
        name: "Ocean Waves",
        source: "ocean.mp3",
        category: TrackCategory::Nature,
    },
    AmbientTrack {
        name: "Coffee Shop",
        source: "cafe.mp3",
        category: TrackCategory::Ambience,
    },
    AmbientTrack {
        name: "Fireplace",
        source: "fireplace.mp3",
        category: TrackCategory::Ambience,
    },
    AmbientTrack {
        name: "Brown Noise",
        source: "brown-noise.mp3",
        category: TrackCategory::Noise,
    },
    AmbientTrack {
        name: "White Noise",
        source: "white-noise.mp3",
        category: TrackCategory::Noise,
    },
    AmbientTrack {
        name: "Lo-fi Beats",
        source: "lofi.mp3",
        category: TrackCategory::Music,
    },
];

/// Returns the track at `index`, if any.
#[must_use]
pub fn track(index: usize) -> Option<&'static AmbientTrack> {
    TRACK_CATALOG.get(index)
}

/// Returns the catalog in wire form.
#[must_use]
pub fn track_infos() -> Vec<TrackInfo> {
    TRACK_CATALOG
        .iter()
        .enumerate()
        .map(|(index, track)| TrackInfo {
            index,
            name: track.name.to_string(),
            category: track.category.as_str().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_not_empty() {
        assert!(!TRACK_CATALOG.is_empty());
    }

    #[test]
    fn test_sources_are_unique() {
        let mut sources: Vec<&str> = TRACK_CATALOG.iter().map(|t| t.source).collect();
        sources.sort_unstable();
        sources.dedup();
        assert_eq!(sources.len(), TRACK_CATALOG.len());
    }

    #[test]
    fn test_track_lookup() {
        assert_eq!(track(0).map(|t| t.name), Some("Rain"));
        assert!(track(TRACK_CATALOG.len()).is_none());
    }

    #[test]
    fn test_path_in() {
        let path = TRACK_CATALOG[0].path_in(Path::new("/sounds"));
        assert_eq!(path, PathBuf::from("/sounds/rain.mp3"));
    }

    #[test]
    fn test_track_infos() {
        let infos = track_infos();
        assert_eq!(infos.len(), TRACK_CATALOG.len());
        assert_eq!(infos[5].index, 5);
        assert_eq!(infos[5].category, "noise");
    }
}
