use crate::aggregate::GroupStats;
use crate::bucket::{ColorBucket, NoteDecoration};
use crate::config::{LabelConfig, RadiusConfig, StyleConfig};
use crate::html::escape_html;
use crate::types::LocationGroup;
use serde::Serialize;
use std::fmt::Write;

/// Render-ready description of one location group.
///
/// `all_done`, `has_note`, `total_addresses` and `done_addresses` are what the
/// viewer reads back when it aggregates markers into clusters; they must be
/// enough on their own to reproduce the cluster color and badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub radius: f64,
    pub bucket: ColorBucket,
    pub fill_color: String,
    #[serde(flatten)]
    pub decoration: NoteDecoration,
    pub popup: String,
    pub tooltip: String,
    pub all_done: bool,
    pub has_note: bool,
    pub total_addresses: usize,
    pub done_addresses: usize,
}

pub fn build_marker(
    group: &LocationGroup,
    stats: &GroupStats,
    style: &StyleConfig,
    labels: &LabelConfig,
) -> Marker {
    let bucket = stats.bucket(&style.thresholds);
    let key = group.key();

    Marker {
        lat: key.lat(),
        lon: key.lon(),
        radius: marker_radius(stats.count, &style.radius),
        bucket,
        fill_color: bucket.color(&style.palette).to_string(),
        decoration: NoteDecoration::marker(stats.has_note, &style.note),
        popup: popup_html(group, stats, labels),
        tooltip: format!("{} {}", stats.count, labels.addresses(stats.count)),
        all_done: stats.all_done,
        has_note: stats.has_note,
        total_addresses: stats.count,
        done_addresses: stats.done_count,
    }
}

/// Grows with group size but stops after `max_growth_members` extra members.
pub fn marker_radius(count: usize, radius: &RadiusConfig) -> f64 {
    let extra = count.saturating_sub(1).min(radius.max_growth_members as usize);
    radius.base + radius.step * extra as f64
}

fn popup_html(group: &LocationGroup, stats: &GroupStats, labels: &LabelConfig) -> String {
    let mut html = String::from("<div class='popup-body'>");

    let _ = write!(
        html,
        "<b>{} {}</b> &middot; {}/{} {}<hr>",
        stats.count,
        escape_html(labels.addresses(stats.count)),
        stats.done_count,
        stats.count,
        escape_html(&labels.done).to_lowercase(),
    );

    for member in group.members() {
        let status = if member.done {
            format!("&#9989; {}", escape_html(&labels.done))
        } else {
            format!("&#10060; {}", escape_html(&labels.not_done))
        };
        let _ = write!(
            html,
            "<div class='member'><b>{}</b><br><span style='font-size: 12px;'>{}: {}</span>",
            escape_html(&member.address),
            escape_html(&labels.status),
            status,
        );
        if let Some(note) = &member.note {
            let _ = write!(html, "<br><i>&#128172; {}</i>", note);
        }
        html.push_str("</div>");
    }

    if !stats.notes.is_empty() {
        let _ = write!(
            html,
            "<hr><b>&#128172; {} ({}):</b><ul>",
            escape_html(&labels.notes),
            stats.notes.len()
        );
        for entry in &stats.notes {
            let _ = write!(
                html,
                "<li><b>{}</b>: <i>{}</i></li>",
                escape_html(&entry.address),
                entry.note
            );
        }
        html.push_str("</ul>");
    }

    html.push_str("</div>");
    html
}
