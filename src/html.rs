//! HTML helpers and the static assets the map document links to.

pub const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
pub const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
pub const MARKERCLUSTER_CSS: &str =
    "https://unpkg.com/leaflet.markercluster@1.4.1/dist/MarkerCluster.css";
pub const MARKERCLUSTER_JS: &str =
    "https://unpkg.com/leaflet.markercluster@1.4.1/dist/leaflet.markercluster.js";
pub const LOCATE_CSS: &str =
    "https://cdn.jsdelivr.net/npm/leaflet.locatecontrol@0.79.0/dist/L.Control.Locate.min.css";
pub const LOCATE_JS: &str =
    "https://cdn.jsdelivr.net/npm/leaflet.locatecontrol@0.79.0/dist/L.Control.Locate.min.js";

pub const PAGE_CSS: &str = r#"
    html, body { height: 100%; margin: 0; padding: 0; }
    #map { position: absolute; top: 0; bottom: 0; left: 0; right: 0; }
    .marker-cluster-custom { background: transparent; border: none; }
    .popup-body {
        min-width: 150px; max-width: 300px; font-family: Arial, sans-serif;
        word-wrap: break-word; overflow-wrap: break-word;
    }
    .popup-body .member { margin: 4px 0; }
    .popup-body hr { margin: 8px 0; }
"#;

/// Escapes `&`, `<` and `>`. Quotes are left alone; the output is only used
/// as element text.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Makes serialized JSON safe to inline inside a `<script>` element.
pub fn script_safe_json(json: &str) -> String {
    json.replace("</", "<\\/")
}
