use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub validation: ValidationConfig,
    pub style: StyleConfig,
    pub cluster: ClusterConfig,
    pub map: MapConfig,
    pub labels: LabelConfig,
    pub output: OutputConfig,
    pub publish: Option<PublishConfig>,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub rows_csv: PathBuf,
    pub columns: ColumnConfig,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            rows_csv: PathBuf::from("addresses.csv"),
            columns: ColumnConfig::default(),
        }
    }
}

/// Header names of the exported address sheet.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ColumnConfig {
    pub address: String,
    pub lat: String,
    pub lon: String,
    pub done: String,
    pub note: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            address: "Adres".to_string(),
            lat: "lat".to_string(),
            lon: "lon".to_string(),
            done: "Afgevinkt".to_string(),
            note: "Opmerkingen".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ValidationConfig {
    pub bounds: BoundsConfig,
    /// Completion flag value (compared trimmed and lowercased) meaning "done".
    pub affirmative: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            bounds: BoundsConfig::default(),
            affirmative: "ja".to_string(),
        }
    }
}

/// Inclusive latitude/longitude box a record must fall in.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct BoundsConfig {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            min_lat: 50.5,
            max_lat: 53.7,
            min_lon: 3.0,
            max_lon: 7.5,
        }
    }
}

impl BoundsConfig {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StyleConfig {
    pub thresholds: ThresholdConfig,
    pub palette: PaletteConfig,
    pub note: NoteStyleConfig,
    pub radius: RadiusConfig,
}

/// Lower bounds (inclusive) of the `high`, `mid` and `low` buckets.
/// `complete` is always exactly 100 percent.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ThresholdConfig {
    pub high: f64,
    pub mid: f64,
    pub low: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            high: 75.0,
            mid: 50.0,
            low: 25.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PaletteConfig {
    pub complete: String,
    pub high: String,
    pub mid: String,
    pub low: String,
    pub critical: String,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            complete: "#28a745".to_string(),
            high: "#7cb342".to_string(),
            mid: "#ffc107".to_string(),
            low: "#fd7e14".to_string(),
            critical: "#dc3545".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct NoteStyleConfig {
    /// Border color when at least one underlying record has a note.
    pub color: String,
    /// Border color otherwise.
    pub plain_color: String,
    pub marker_weight: f64,
    pub marker_note_weight: f64,
    pub cluster_border_px: u32,
    pub cluster_note_border_px: u32,
}

impl Default for NoteStyleConfig {
    fn default() -> Self {
        Self {
            color: "#9b59b6".to_string(),
            plain_color: "white".to_string(),
            marker_weight: 1.5,
            marker_note_weight: 3.0,
            cluster_border_px: 3,
            cluster_note_border_px: 4,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RadiusConfig {
    pub base: f64,
    /// Added per member beyond the first.
    pub step: f64,
    /// Maximum number of extra members that still grow the radius.
    pub max_growth_members: u32,
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            base: 7.0,
            step: 1.5,
            max_growth_members: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ClusterConfig {
    pub max_cluster_radius: u32,
    pub disable_clustering_at_zoom: u8,
    pub spiderfy_on_max_zoom: bool,
    pub show_coverage_on_hover: bool,
    /// Pixel size of the cluster badge.
    pub icon_size: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_cluster_radius: 30,
            disable_clustering_at_zoom: 18,
            spiderfy_on_max_zoom: true,
            show_coverage_on_hover: false,
            icon_size: 40,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub title: String,
    pub zoom_start: u8,
    pub tile_url: String,
    pub tile_attribution: String,
    pub locate_control: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            title: "Wijkkaart".to_string(),
            zoom_start: 16,
            tile_url: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png".to_string(),
            tile_attribution: "&copy; OpenStreetMap contributors &copy; CARTO".to_string(),
            locate_control: true,
        }
    }
}

/// Wording used in popups and tooltips.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LabelConfig {
    pub done: String,
    pub not_done: String,
    pub status: String,
    pub notes: String,
    pub address_singular: String,
    pub address_plural: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            done: "Done".to_string(),
            not_done: "Not done".to_string(),
            status: "Status".to_string(),
            notes: "Notes".to_string(),
            address_singular: "address".to_string(),
            address_plural: "addresses".to_string(),
        }
    }
}

impl LabelConfig {
    pub fn addresses(&self, count: usize) -> &str {
        if count == 1 {
            &self.address_singular
        } else {
            &self.address_plural
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub html_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            html_path: PathBuf::from("site/index.html"),
        }
    }
}

impl OutputConfig {
    pub fn site_dir(&self) -> PathBuf {
        match self.html_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PublishConfig {
    /// `owner/name` of the target repository.
    pub repo: String,
    #[serde(default = "default_path_in_repo")]
    pub path_in_repo: String,
    pub branch: Option<String>,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_path_in_repo() -> String {
    "index.html".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let b = &self.validation.bounds;
        if !(b.min_lat < b.max_lat && b.min_lon < b.max_lon) {
            bail!("Bounding box is empty: {:?}", b);
        }

        let t = &self.style.thresholds;
        if !(0.0 < t.low && t.low < t.mid && t.mid < t.high && t.high < 100.0) {
            bail!(
                "Thresholds must satisfy 0 < low < mid < high < 100, got low={} mid={} high={}",
                t.low,
                t.mid,
                t.high
            );
        }

        let p = &self.style.palette;
        for (name, color) in [
            ("complete", &p.complete),
            ("high", &p.high),
            ("mid", &p.mid),
            ("low", &p.low),
            ("critical", &p.critical),
        ] {
            if color.trim().is_empty() {
                bail!("Palette color for '{}' is empty", name);
            }
        }

        if self.style.note.color.trim().is_empty() {
            bail!("Note decoration color is empty");
        }

        let r = &self.style.radius;
        if r.base <= 0.0 || r.step < 0.0 {
            bail!("Marker radius base must be positive and step non-negative");
        }

        if self.validation.affirmative.trim().is_empty() {
            bail!("Affirmative completion literal is empty");
        }

        if let Some(publish) = &self.publish {
            if publish.repo.split('/').filter(|s| !s.is_empty()).count() != 2 {
                bail!("Publish repo must look like 'owner/name', got '{}'", publish.repo);
            }
        }

        Ok(())
    }
}
