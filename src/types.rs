use geo::Point;
use serde::Serialize;

/// One untyped row as it came out of the source sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    /// 1-based data row number in the source, for diagnostics.
    pub row: usize,
    pub address: String,
    pub lat: String,
    pub lon: String,
    pub done: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddressRecord {
    pub address: String,
    /// x = longitude, y = latitude.
    pub location: Point<f64>,
    pub done: bool,
    /// Trimmed and HTML-escaped.
    pub note: Option<String>,
}

impl AddressRecord {
    pub fn lat(&self) -> f64 {
        self.location.y()
    }

    pub fn lon(&self) -> f64 {
        self.location.x()
    }
}

/// Coordinate rounded to 6 decimal places, held as integer micro-degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordKey {
    pub lat_micro: i64,
    pub lon_micro: i64,
}

const MICRO: f64 = 1_000_000.0;

impl CoordKey {
    pub fn from_point(point: Point<f64>) -> Self {
        Self {
            lat_micro: (point.y() * MICRO).round() as i64,
            lon_micro: (point.x() * MICRO).round() as i64,
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat_micro as f64 / MICRO
    }

    pub fn lon(&self) -> f64 {
        self.lon_micro as f64 / MICRO
    }
}

/// Records sharing one rounded coordinate, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationGroup {
    key: CoordKey,
    members: Vec<AddressRecord>,
}

impl LocationGroup {
    /// A group only ever exists because a record created it.
    pub fn new(first: AddressRecord) -> Self {
        Self {
            key: CoordKey::from_point(first.location),
            members: vec![first],
        }
    }

    pub(crate) fn push(&mut self, record: AddressRecord) {
        debug_assert_eq!(CoordKey::from_point(record.location), self.key);
        self.members.push(record);
    }

    pub fn key(&self) -> CoordKey {
        self.key
    }

    pub fn members(&self) -> &[AddressRecord] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteEntry {
    /// As read from the sheet; escape when rendering.
    pub address: String,
    /// Already trimmed and HTML-escaped, like [`AddressRecord::note`].
    pub note: String,
}
