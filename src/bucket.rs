//! Completion percentage to color bucket, and the note border rule.
//!
//! Both the batch side (one location group) and the viewer side (a cluster of
//! markers) go through [`ColorBucket::from_percentage`]. A cluster's color is
//! the bucket of its summed counts, never a blend of its children's colors.

use crate::config::{NoteStyleConfig, PaletteConfig, ThresholdConfig};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorBucket {
    Complete,
    High,
    Mid,
    Low,
    Critical,
}

impl ColorBucket {
    /// Evaluation order, highest threshold first.
    pub const ALL: [ColorBucket; 5] = [
        ColorBucket::Complete,
        ColorBucket::High,
        ColorBucket::Mid,
        ColorBucket::Low,
        ColorBucket::Critical,
    ];

    /// `==100 -> Complete`, `>=high -> High`, `>=mid -> Mid`, `>=low -> Low`,
    /// anything else (including NaN) `Critical`.
    pub fn from_percentage(percentage: f64, thresholds: &ThresholdConfig) -> Self {
        for bucket in Self::ALL {
            if bucket.admits(percentage, thresholds) {
                return bucket;
            }
        }
        ColorBucket::Critical
    }

    fn admits(self, percentage: f64, thresholds: &ThresholdConfig) -> bool {
        match self.lower_bound(thresholds) {
            Bound::Exactly(v) => percentage == v,
            Bound::AtLeast(v) => percentage >= v,
            Bound::Any => true,
        }
    }

    pub(crate) fn lower_bound(self, thresholds: &ThresholdConfig) -> Bound {
        match self {
            ColorBucket::Complete => Bound::Exactly(100.0),
            ColorBucket::High => Bound::AtLeast(thresholds.high),
            ColorBucket::Mid => Bound::AtLeast(thresholds.mid),
            ColorBucket::Low => Bound::AtLeast(thresholds.low),
            ColorBucket::Critical => Bound::Any,
        }
    }

    pub fn color(self, palette: &PaletteConfig) -> &str {
        match self {
            ColorBucket::Complete => &palette.complete,
            ColorBucket::High => &palette.high,
            ColorBucket::Mid => &palette.mid,
            ColorBucket::Low => &palette.low,
            ColorBucket::Critical => &palette.critical,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorBucket::Complete => "complete",
            ColorBucket::High => "high",
            ColorBucket::Mid => "mid",
            ColorBucket::Low => "low",
            ColorBucket::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Bound {
    Exactly(f64),
    AtLeast(f64),
    Any,
}

/// `(done / total) * 100`, in that order so every runtime computing it gets
/// the same double.
pub fn completion_percentage(done: usize, total: usize) -> f64 {
    debug_assert!(total > 0, "percentage of an empty set");
    debug_assert!(done <= total, "done {done} exceeds total {total}");
    if total == 0 {
        return 0.0;
    }
    (done as f64 / total as f64) * 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDecoration {
    pub border_color: String,
    pub border_weight: f64,
}

impl NoteDecoration {
    /// Border for a single location marker.
    pub fn marker(has_note: bool, style: &NoteStyleConfig) -> Self {
        Self {
            border_color: border_color(has_note, style).to_string(),
            border_weight: if has_note {
                style.marker_note_weight
            } else {
                style.marker_weight
            },
        }
    }

    /// Border for a cluster badge, in pixels.
    pub fn cluster(has_note: bool, style: &NoteStyleConfig) -> Self {
        Self {
            border_color: border_color(has_note, style).to_string(),
            border_weight: f64::from(if has_note {
                style.cluster_note_border_px
            } else {
                style.cluster_border_px
            }),
        }
    }
}

fn border_color(has_note: bool, style: &NoteStyleConfig) -> &str {
    if has_note {
        &style.color
    } else {
        &style.plain_color
    }
}
