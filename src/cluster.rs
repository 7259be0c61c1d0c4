//! Cluster re-aggregation as the viewer performs it.
//!
//! The viewer regroups markers on every zoom and pan. Whatever children a
//! cluster ends up with, its icon is computed from their exported metadata
//! only: summed address counts, the union of note flags, and the number of
//! children as the badge. [`ClusterAggregate`] is the reference version of that
//! rule and [`icon_create_function`] emits the script the viewer runs, with its
//! bucket branches generated from [`ColorBucket::ALL`].

use crate::bucket::{completion_percentage, Bound, ColorBucket, NoteDecoration};
use crate::config::{ClusterConfig, StyleConfig};
use crate::html::script_safe_json;
use crate::marker::Marker;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAggregate {
    pub child_count: usize,
    pub total_addresses: usize,
    pub done_addresses: usize,
    pub has_note: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterIcon {
    pub badge: usize,
    pub bucket: ColorBucket,
    pub fill_color: String,
    #[serde(flatten)]
    pub decoration: NoteDecoration,
}

impl ClusterAggregate {
    pub fn from_markers<'a>(children: impl IntoIterator<Item = &'a Marker>) -> Self {
        children.into_iter().fold(Self::default(), |acc, m| Self {
            child_count: acc.child_count + 1,
            total_addresses: acc.total_addresses + m.total_addresses,
            done_addresses: acc.done_addresses + m.done_addresses,
            has_note: acc.has_note || m.has_note,
        })
    }

    pub fn percentage(&self) -> f64 {
        if self.total_addresses == 0 {
            return 0.0;
        }
        completion_percentage(self.done_addresses, self.total_addresses)
    }

    pub fn icon(&self, style: &StyleConfig) -> ClusterIcon {
        let bucket = ColorBucket::from_percentage(self.percentage(), &style.thresholds);
        ClusterIcon {
            badge: self.child_count,
            bucket,
            fill_color: bucket.color(&style.palette).to_string(),
            decoration: NoteDecoration::cluster(self.has_note, &style.note),
        }
    }
}

/// Options object handed to `L.markerClusterGroup`, minus the icon function.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOptions {
    pub max_cluster_radius: u32,
    pub disable_clustering_at_zoom: u8,
    pub spiderfy_on_max_zoom: bool,
    pub show_coverage_on_hover: bool,
}

impl From<&ClusterConfig> for ClusterOptions {
    fn from(config: &ClusterConfig) -> Self {
        Self {
            max_cluster_radius: config.max_cluster_radius,
            disable_clustering_at_zoom: config.disable_clustering_at_zoom,
            spiderfy_on_max_zoom: config.spiderfy_on_max_zoom,
            show_coverage_on_hover: config.show_coverage_on_hover,
        }
    }
}

/// `marker.options` keys the viewer reads back when it builds a cluster. The
/// marker layer writes exactly these from the marker properties.
pub const TOTAL_KEY: &str = "totalAddresses";
pub const DONE_KEY: &str = "doneAddresses";
pub const NOTE_KEY: &str = "hasNote";
pub const CLUSTER_INPUT_KEYS: [&str; 3] = [TOTAL_KEY, DONE_KEY, NOTE_KEY];

fn js_string(value: &str) -> String {
    script_safe_json(&serde_json::Value::String(value.to_string()).to_string())
}

/// Viewer-side `iconCreateFunction` implementing the same rule as
/// [`ClusterAggregate::icon`].
pub fn icon_create_function(style: &StyleConfig, cluster: &ClusterConfig) -> String {
    let mut js = String::new();
    js.push_str("function (cluster) {\n");
    js.push_str("  var markers = cluster.getAllChildMarkers();\n");
    js.push_str("  var total = 0;\n  var done = 0;\n  var hasNote = false;\n");
    js.push_str("  markers.forEach(function (marker) {\n");
    let _ = writeln!(js, "    total += marker.options.{} || 0;", TOTAL_KEY);
    let _ = writeln!(js, "    done += marker.options.{} || 0;", DONE_KEY);
    let _ = writeln!(js, "    if (marker.options.{}) {{ hasNote = true; }}", NOTE_KEY);
    js.push_str("  });\n");
    js.push_str("  var percentage = total > 0 ? (done / total) * 100 : 0;\n");
    js.push_str("  var color;\n");

    for (i, bucket) in ColorBucket::ALL.iter().enumerate() {
        let color = js_string(bucket.color(&style.palette));
        let keyword = if i == 0 { "if" } else { "else if" };
        let _ = match bucket.lower_bound(&style.thresholds) {
            Bound::Exactly(v) => {
                writeln!(js, "  {keyword} (percentage === {v}) {{ color = {color}; }}")
            }
            Bound::AtLeast(v) => {
                writeln!(js, "  {keyword} (percentage >= {v}) {{ color = {color}; }}")
            }
            Bound::Any => writeln!(js, "  else {{ color = {color}; }}"),
        };
    }

    let note = &style.note;
    let _ = writeln!(
        js,
        "  var borderColor = hasNote ? {} : {};",
        js_string(&note.color),
        js_string(&note.plain_color)
    );
    let _ = writeln!(
        js,
        "  var borderWidth = hasNote ? '{}px' : '{}px';",
        note.cluster_note_border_px, note.cluster_border_px
    );

    let size = cluster.icon_size;
    let _ = writeln!(
        js,
        concat!(
            "  return L.divIcon({{\n",
            "    html: '<div style=\"background-color:' + color + '; ",
            "width: {size}px; height: {size}px; border-radius: 50%; display: flex; ",
            "align-items: center; justify-content: center; ",
            "border: ' + borderWidth + ' solid ' + borderColor + '; ",
            "box-shadow: 0 2px 5px rgba(0,0,0,0.3);\">",
            "<span style=\"color: white; font-weight: bold; font-size: 14px;\">' ",
            "+ markers.length + '<\\/span><\\/div>',\n",
            "    className: 'marker-cluster-custom',\n",
            "    iconSize: L.point({size}, {size})\n",
            "  }});"
        ),
        size = size
    );
    js.push('}');
    js
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThresholdConfig;

    fn child(total: usize, done: usize, has_note: bool) -> Marker {
        Marker {
            lat: 52.0,
            lon: 5.0,
            radius: 7.0,
            bucket: ColorBucket::Critical,
            fill_color: String::new(),
            decoration: NoteDecoration::marker(has_note, &Default::default()),
            popup: String::new(),
            tooltip: String::new(),
            all_done: total == done,
            has_note,
            total_addresses: total,
            done_addresses: done,
        }
    }

    #[test]
    fn sums_counts_and_badges_children() {
        let a = child(3, 3, false);
        let b = child(2, 0, true);
        let agg = ClusterAggregate::from_markers([&a, &b]);
        assert_eq!(agg.total_addresses, 5);
        assert_eq!(agg.done_addresses, 3);
        assert!(agg.has_note);
        assert_eq!(agg.percentage(), 60.0);

        let icon = agg.icon(&StyleConfig::default());
        assert_eq!(icon.bucket, ColorBucket::Mid);
        assert_eq!(icon.badge, 2);
        assert_eq!(icon.decoration.border_color, "#9b59b6");
        assert_eq!(icon.decoration.border_weight, 4.0);
    }

    #[test]
    fn cluster_color_is_not_an_average_of_child_colors() {
        // complete (1/1) + critical (0/9): by counts 10 percent, critical.
        let a = child(1, 1, false);
        let b = child(9, 0, false);
        let icon = ClusterAggregate::from_markers([&a, &b]).icon(&StyleConfig::default());
        assert_eq!(icon.bucket, ColorBucket::Critical);
        assert_eq!(icon.decoration.border_color, "white");
    }

    #[test]
    fn aggregation_ignores_child_order() {
        let children = [child(4, 1, false), child(2, 2, true), child(7, 5, false)];
        let forward = ClusterAggregate::from_markers(children.iter());
        let backward = ClusterAggregate::from_markers(children.iter().rev());
        assert_eq!(forward, backward);
    }

    #[test]
    fn single_child_cluster_matches_its_marker() {
        let style = StyleConfig::default();
        for total in 1..=8 {
            for done in 0..=total {
                let m = child(total, done, false);
                let p = completion_percentage(done, total);
                let own = ColorBucket::from_percentage(p, &style.thresholds);
                let icon = ClusterAggregate::from_markers([&m]).icon(&style);
                assert_eq!(icon.bucket, own);
            }
        }
    }

    #[test]
    fn options_serialize_for_markercluster() {
        let json = serde_json::to_value(ClusterOptions::from(&ClusterConfig::default())).unwrap();
        assert_eq!(json["maxClusterRadius"], 30);
        assert_eq!(json["disableClusteringAtZoom"], 18);
        assert_eq!(json["spiderfyOnMaxZoom"], true);
        assert_eq!(json["showCoverageOnHover"], false);
    }

    /// Reads the generated `if (percentage ...) { color = ...; }` chain back.
    fn parse_branches(js: &str) -> Vec<(String, Option<f64>, String)> {
        js.lines()
            .map(str::trim)
            .filter(|l| l.contains("color = ") && (l.starts_with("if") || l.starts_with("else")))
            .map(|line| {
                let color = line
                    .split("color = ")
                    .nth(1)
                    .and_then(|rest| rest.split(';').next())
                    .map(|c| c.trim_matches('"').to_string())
                    .unwrap();
                match line.split("(percentage ").nth(1) {
                    Some(cond) => {
                        let cond = cond.split(')').next().unwrap();
                        let (op, value) = cond.split_once(' ').unwrap();
                        (op.to_string(), Some(value.parse().unwrap()), color)
                    }
                    None => ("else".to_string(), None, color),
                }
            })
            .collect()
    }

    fn eval_branches(branches: &[(String, Option<f64>, String)], percentage: f64) -> String {
        for (op, value, color) in branches {
            let hit = match (op.as_str(), value) {
                ("===", Some(v)) => percentage == *v,
                (">=", Some(v)) => percentage >= *v,
                ("else", None) => true,
                _ => panic!("unexpected branch {op}"),
            };
            if hit {
                return color.clone();
            }
        }
        panic!("no branch matched {percentage}");
    }

    #[test]
    fn generated_script_agrees_with_rust_buckets() {
        let mut style = StyleConfig::default();
        style.thresholds = ThresholdConfig {
            high: 80.0,
            mid: 55.5,
            low: 20.0,
        };
        let js = icon_create_function(&style, &ClusterConfig::default());
        let branches = parse_branches(&js);
        assert_eq!(branches.len(), 5);
        assert_eq!(branches[0].0, "===");
        assert_eq!(branches[4].0, "else");

        for total in 1..=30usize {
            for done in 0..=total {
                let p = completion_percentage(done, total);
                let expected =
                    ColorBucket::from_percentage(p, &style.thresholds).color(&style.palette);
                assert_eq!(eval_branches(&branches, p), expected, "{done}/{total}");
            }
        }
    }

    #[test]
    fn generated_script_badges_child_count() {
        let js = icon_create_function(&StyleConfig::default(), &ClusterConfig::default());
        assert!(js.contains("' + markers.length + '"));
        assert!(!js.contains("' + total + '"));
        assert!(js.contains("(done / total) * 100"));
        assert!(js.contains("\"#9b59b6\""));
        assert!(js.contains("'4px' : '3px'"));
        assert!(js.contains("L.point(40, 40)"));
    }

    #[test]
    fn script_reads_exactly_the_exported_marker_keys() {
        let js = icon_create_function(&StyleConfig::default(), &ClusterConfig::default());
        let read: Vec<&str> = js
            .split("marker.options.")
            .skip(1)
            .map(|rest| rest.split(|c: char| !c.is_ascii_alphanumeric()).next().unwrap())
            .collect();
        assert_eq!(read, CLUSTER_INPUT_KEYS);

        let exported = serde_json::to_value(child(2, 1, true)).unwrap();
        for key in CLUSTER_INPUT_KEYS {
            assert!(exported.get(key).is_some(), "marker does not export {key}");
        }
    }

    #[test]
    fn configured_colors_cannot_close_the_script() {
        let mut style = StyleConfig::default();
        style.palette.critical = "red</script><script>alert(1)".to_string();
        style.note.color = "</SCRIPT>".to_string();
        let js = icon_create_function(&style, &ClusterConfig::default());
        assert!(!js.to_ascii_lowercase().contains("</script"));
        assert!(js.contains("red<\\/script>"));
    }
}
