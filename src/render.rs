use crate::cluster::{icon_create_function, ClusterOptions, CLUSTER_INPUT_KEYS};
use crate::config::AppConfig;
use crate::html::{
    escape_html, script_safe_json, LEAFLET_CSS, LEAFLET_JS, LOCATE_CSS, LOCATE_JS,
    MARKERCLUSTER_CSS, MARKERCLUSTER_JS, PAGE_CSS,
};
use crate::marker::Marker;
use crate::processing::{MapBuild, RunSummary};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoValue};
use std::fmt::Write;
use tracing::info;

/// The finished, self-contained map page.
#[derive(Debug, Clone)]
pub struct MapDocument {
    pub html: String,
    pub summary: RunSummary,
}

impl MapDocument {
    pub fn as_bytes(&self) -> &[u8] {
        self.html.as_bytes()
    }
}

/// One point feature per marker; the marker descriptor becomes the properties.
pub fn markers_geojson(markers: &[Marker]) -> Result<FeatureCollection, serde_json::Error> {
    let features = markers
        .iter()
        .map(|marker| {
            let properties = match serde_json::to_value(marker)? {
                serde_json::Value::Object(map) => Some(map),
                _ => Some(JsonObject::new()),
            };
            Ok(Feature {
                bbox: None,
                geometry: Some(Geometry::new(GeoValue::Point(vec![marker.lon, marker.lat]))),
                id: None,
                properties,
                foreign_members: None,
            })
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

pub fn render_document(
    config: &AppConfig,
    build: &MapBuild,
) -> Result<MapDocument, serde_json::Error> {
    info!("Rendering document with {} markers...", build.markers.len());

    let collection = markers_geojson(&build.markers)?;
    let marker_data = script_safe_json(&serde_json::to_string(&collection)?);
    let cluster_options = serde_json::to_string(&ClusterOptions::from(&config.cluster))?;
    let icon_fn = script_safe_json(&icon_create_function(&config.style, &config.cluster));
    let map = &config.map;

    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n\
         <title>{}</title>\n",
        escape_html(&map.title)
    );
    for css in [LEAFLET_CSS, MARKERCLUSTER_CSS] {
        let _ = writeln!(html, "<link rel=\"stylesheet\" href=\"{css}\" />");
    }
    if map.locate_control {
        let _ = writeln!(html, "<link rel=\"stylesheet\" href=\"{LOCATE_CSS}\" />");
    }
    for js in [LEAFLET_JS, MARKERCLUSTER_JS] {
        let _ = writeln!(html, "<script src=\"{js}\"></script>");
    }
    if map.locate_control {
        let _ = writeln!(html, "<script src=\"{LOCATE_JS}\"></script>");
    }
    let _ = write!(
        html,
        "<style>{PAGE_CSS}</style>\n</head>\n<body>\n<div id=\"map\"></div>\n<script>\n"
    );

    let _ = writeln!(
        html,
        "var map = L.map('map').setView([{}, {}], {});",
        build.center.y(),
        build.center.x(),
        map.zoom_start
    );
    let _ = writeln!(
        html,
        "L.tileLayer({}, {{ attribution: {}, maxZoom: 20 }}).addTo(map);",
        json_string(&map.tile_url),
        json_string(&map.tile_attribution)
    );
    if map.locate_control {
        html.push_str("L.control.locate({ flyTo: true }).addTo(map);\n");
    }
    let _ = writeln!(html, "var clusterOptions = {cluster_options};");
    let _ = writeln!(html, "clusterOptions.iconCreateFunction = {icon_fn};");
    html.push_str("var clusters = L.markerClusterGroup(clusterOptions);\n");
    let _ = writeln!(html, "var markerData = {marker_data};");
    html.push_str(&marker_loop_js());
    html.push_str("clusters.addTo(map);\n</script>\n</body>\n</html>\n");

    Ok(MapDocument {
        html,
        summary: build.summary,
    })
}

fn json_string(value: &str) -> String {
    script_safe_json(&serde_json::Value::String(value.to_string()).to_string())
}

const MARKER_LOOP_HEAD: &str = r#"markerData.features.forEach(function (feature) {
  var p = feature.properties;
  var c = feature.geometry.coordinates;
  var marker = L.circleMarker([c[1], c[0]], {
    radius: p.radius,
    color: p.borderColor,
    weight: p.borderWeight,
    fill: true,
    fillColor: p.fillColor,
    fillOpacity: 0.85,
    allDone: p.allDone,
"#;

const MARKER_LOOP_TAIL: &str = r#"  });
  marker.bindPopup(p.popup, { maxWidth: 300 });
  marker.bindTooltip(p.tooltip);
  clusters.addLayer(marker);
});
"#;

/// Copies the cluster inputs from each feature onto `marker.options`, where
/// the generated `iconCreateFunction` reads them.
fn marker_loop_js() -> String {
    let mut js = String::from(MARKER_LOOP_HEAD);
    for key in CLUSTER_INPUT_KEYS {
        let _ = writeln!(js, "    {key}: p.{key},");
    }
    js.push_str(MARKER_LOOP_TAIL);
    js
}
