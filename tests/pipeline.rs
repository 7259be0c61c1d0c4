use std::fs;
use std::path::PathBuf;

use wijkkaart::bucket::ColorBucket;
use wijkkaart::cluster::ClusterAggregate;
use wijkkaart::config::AppConfig;
use wijkkaart::data::load_rows;
use wijkkaart::error::{CollaboratorError, SkipReason};
use wijkkaart::processing::process_rows;
use wijkkaart::publish::{write_document, PublishOutcome, Publisher};
use wijkkaart::render::{render_document, MapDocument};
use tempfile::tempdir;

const SHEET: &str = "\
Adres,lat,lon,Afgevinkt,Opmerkingen
Dorpsstraat 1,52.1234567,5.1000000,ja,
Dorpsstraat 1a,52.12345670001,5.1000000,Ja,nan
Dorpsstraat 1b,52.1234567,5.1,JA ,
Kerkpad 2,52.1235,5.2,nee,A & B <script>
Kerkpad 4,52.1236,5.2,,
Onbekend,0,5.2,ja,
Buitenland,60,5.2,ja,
Komma,\"52,1\",5.2,ja,
";

fn sheet_path(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("addresses.csv");
    fs::write(&path, SHEET).expect("write sheet");
    path
}

#[test]
fn csv_sheet_to_markers() {
    let dir = tempdir().expect("tmp");
    let config = AppConfig::default();
    let rows = load_rows(&sheet_path(dir.path()), &config.input.columns).expect("rows");
    assert_eq!(rows.len(), 8);

    let build = process_rows(&config, &rows);
    assert_eq!(build.summary.addresses, 5);
    assert_eq!(build.summary.markers, 3);
    assert_eq!(build.summary.groups, 3);
    assert_eq!(build.summary.notes, 1);
    assert_eq!(build.summary.skipped, 3);

    let shared = &build.markers[0];
    assert_eq!(shared.total_addresses, 3);
    assert_eq!(shared.done_addresses, 3);
    assert!(shared.all_done);
    assert!(!shared.has_note, "'nan' is not a note");
    assert_eq!(shared.bucket, ColorBucket::Complete);

    let noted = &build.markers[1];
    assert_eq!(noted.total_addresses, 1);
    assert!(noted.has_note);
    assert!(noted.popup.contains("A &amp; B &lt;script&gt;"));
    assert_eq!(noted.bucket, ColorBucket::Critical);

    let labels: Vec<&str> = build.skipped.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Onbekend", "Buitenland", "Komma"]);
    assert!(matches!(build.skipped[0].reason, SkipReason::UnsetCoordinate { .. }));
    assert!(matches!(build.skipped[1].reason, SkipReason::OutOfBounds { .. }));
    assert!(matches!(build.skipped[2].reason, SkipReason::InvalidCoordinate { .. }));
}

#[test]
fn skipped_rows_contribute_to_no_marker() {
    let dir = tempdir().expect("tmp");
    let config = AppConfig::default();
    let rows = load_rows(&sheet_path(dir.path()), &config.input.columns).expect("rows");
    let build = process_rows(&config, &rows);
    let total: usize = build.markers.iter().map(|m| m.total_addresses).sum();
    assert_eq!(total, build.summary.addresses);
    assert!(build.markers.iter().all(|m| m.lat < 53.7 && m.lat > 50.5));
}

#[test]
fn rerun_is_identical() {
    let dir = tempdir().expect("tmp");
    let config = AppConfig::default();
    let rows = load_rows(&sheet_path(dir.path()), &config.input.columns).expect("rows");
    let first = render_document(&config, &process_rows(&config, &rows)).expect("render");
    let second = render_document(&config, &process_rows(&config, &rows)).expect("render");
    assert_eq!(first.html, second.html);
}

#[test]
fn whole_map_cluster_matches_summed_counts() {
    let dir = tempdir().expect("tmp");
    let config = AppConfig::default();
    let rows = load_rows(&sheet_path(dir.path()), &config.input.columns).expect("rows");
    let build = process_rows(&config, &rows);

    let agg = ClusterAggregate::from_markers(&build.markers);
    assert_eq!(agg.child_count, 3);
    assert_eq!(agg.total_addresses, 5);
    assert_eq!(agg.done_addresses, 3);
    assert!(agg.has_note);
    let icon = agg.icon(&config.style);
    assert_eq!(icon.badge, 3);
    assert_eq!(icon.bucket, ColorBucket::Mid);
}

#[test]
fn missing_source_is_a_collaborator_error() {
    let dir = tempdir().expect("tmp");
    let err = load_rows(&dir.path().join("nope.csv"), &AppConfig::default().input.columns)
        .expect_err("missing file must fail");
    assert!(matches!(err, CollaboratorError::OpenSource { .. }));
}

#[test]
fn config_file_drives_the_run() {
    let dir = tempdir().expect("tmp");
    let sheet = sheet_path(dir.path());
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            r##"
            [input]
            rows_csv = {:?}

            [validation]
            affirmative = "nee"

            [style.palette]
            complete = "#000001"

            [output]
            html_path = {:?}
            "##,
            sheet,
            dir.path().join("out").join("index.html")
        ),
    )
    .expect("write config");

    let config = AppConfig::load_from_file(&config_path).expect("config");
    let rows = load_rows(&config.input.rows_csv, &config.input.columns).expect("rows");
    let build = process_rows(&config, &rows);
    // Only "nee" counts as done now.
    assert_eq!(build.markers[1].done_addresses, 1);
    assert_eq!(build.markers[1].fill_color, "#000001");

    let doc = render_document(&config, &build).expect("render");
    write_document(&config.output.html_path, &doc).expect("write");
    let written = fs::read_to_string(&config.output.html_path).expect("read back");
    assert!(written.contains("\"#000001\""));
}

struct RecordingPublisher {
    seen: std::cell::RefCell<Vec<String>>,
}

impl Publisher for RecordingPublisher {
    fn publish(&self, document: &MapDocument) -> Result<PublishOutcome, CollaboratorError> {
        self.seen.borrow_mut().push(document.summary.to_string());
        Ok(PublishOutcome::Created)
    }
}

#[test]
fn publisher_receives_summary() {
    let config = AppConfig::default();
    let build = process_rows(&config, &[]);
    let doc = render_document(&config, &build).expect("render");
    let publisher = RecordingPublisher {
        seen: Default::default(),
    };
    let outcome = publisher.publish(&doc).expect("publish");
    assert_eq!(outcome, PublishOutcome::Created);
    let seen = publisher.seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], "0 markers, 0 location groups, 0 addresses, 0 notes");
}
