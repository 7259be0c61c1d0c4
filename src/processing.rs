use crate::aggregate::GroupStats;
use crate::config::AppConfig;
use crate::data::{validate_rows, SkippedRow};
use crate::grouping::group_by_location;
use crate::marker::{build_marker, Marker};
use crate::types::RawRow;
use geo::{Centroid, MultiPoint, Point};
use serde::Serialize;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub addresses: usize,
    pub markers: usize,
    pub groups: usize,
    pub shared_locations: usize,
    pub notes: usize,
    pub skipped: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} markers, {} location groups, {} addresses, {} notes",
            self.markers, self.groups, self.addresses, self.notes
        )?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        Ok(())
    }
}

/// Everything the renderer and the publisher need from one run.
#[derive(Debug, Clone)]
pub struct MapBuild {
    pub markers: Vec<Marker>,
    pub skipped: Vec<SkippedRow>,
    pub summary: RunSummary,
    /// x = longitude, y = latitude.
    pub center: Point<f64>,
}

/// Ingestion, grouping, aggregation and marker construction for one batch.
/// Bad rows only shrink the marker set; they never stop the run.
pub fn process_rows(config: &AppConfig, rows: &[RawRow]) -> MapBuild {
    info!("Processing {} rows...", rows.len());

    let ingested = validate_rows(rows, &config.validation);
    let addresses = ingested.records.len();
    let notes = ingested.records.iter().filter(|r| r.note.is_some()).count();

    let center = MultiPoint::new(ingested.records.iter().map(|r| r.location).collect())
        .centroid()
        .unwrap_or_else(|| {
            let (lat, lon) = config.validation.bounds.center();
            Point::new(lon, lat)
        });

    let groups = group_by_location(ingested.records);
    let shared_locations = groups.iter().filter(|g| g.len() > 1).count();
    if shared_locations > 0 {
        info!("{} locations with multiple addresses", shared_locations);
    }

    let markers: Vec<Marker> = groups
        .iter()
        .map(|group| {
            let stats = GroupStats::from_group(group);
            build_marker(group, &stats, &config.style, &config.labels)
        })
        .collect();

    let summary = RunSummary {
        addresses,
        markers: markers.len(),
        groups: groups.len(),
        shared_locations,
        notes,
        skipped: ingested.skipped.len(),
    };
    info!("Built {}", summary);

    MapBuild {
        markers,
        skipped: ingested.skipped,
        summary,
        center,
    }
}
