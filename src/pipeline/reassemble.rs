//! Fold physical table rows back into logical registry records.
//!
//! A toponym with a long name or a multi-part location spills over several
//! printed rows. Only the first row carries the reference code and the
//! coordinates; the rows after it leave the reference cell blank and hold
//! overflow text for the administrative and geographic location columns.
//!
//! ```text
//! ref      name     type   administrative     geo / coordinates
//! ──────── ──────── ────── ────────────────── ─────────────────
//! 0012345  Mount X  peak   RegionA            45°30.0
//!                                             60°15.0
//!                          Sub-district       on the left bank
//! ```
//!
//! [`Reassembler`] walks the rows once, keeping at most one record in
//! progress, and yields each record as soon as the next reference code (or
//! the end of input) shows it is complete.

use crate::error::ReassembleError;
use crate::pipeline::coordinate::to_decimal_degrees;
use crate::pipeline::extract::RawRow;
use tracing::debug;

/// Column holding the reference code; non-empty only on a record's first row.
pub const REFERENCE: usize = 0;
/// Column holding the toponym name.
pub const NAME: usize = 1;
/// Column holding the object type (river, settlement, peak, ...).
pub const OBJECT_TYPE: usize = 2;
/// Column holding the administrative location fragment.
pub const ADMINISTRATIVE: usize = 3;
/// Column holding `<lat>\n<lon>` on a first row and geo-location overflow
/// text on continuation rows.
pub const GEO: usize = 4;

/// A complete registry entry assembled from one or more table rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Registry reference code. Never empty.
    pub reference: String,
    pub name: String,
    pub object_type: String,
    /// Administrative location; each continuation fragment is appended
    /// after one space, even when the first row's cell was empty.
    pub administrative_location: String,
    /// Geographic location text; continuation fragments joined with no
    /// separator. `None` when no continuation row contributed any text.
    pub geo_location: Option<String>,
    /// Decimal degrees.
    pub latitude: f64,
    /// Decimal degrees.
    pub longitude: f64,
    /// 1-indexed page the record starts on.
    pub page: usize,
}

impl Record {
    /// Start a record from a row whose reference cell is non-empty.
    fn start(row: &RawRow) -> Result<Self, ReassembleError> {
        let reference = row.cell(REFERENCE).to_string();
        let cell = row.cell(GEO);

        let (lat, lon) = cell
            .split_once('\n')
            .ok_or_else(|| ReassembleError::MissingCoordinates {
                page: row.page,
                reference: reference.clone(),
                cell: cell.to_string(),
            })?;

        let parse = |s: &str| {
            to_decimal_degrees(s).map_err(|source| ReassembleError::Coordinate {
                page: row.page,
                reference: reference.clone(),
                source,
            })
        };
        let latitude = parse(lat)?;
        let longitude = parse(lon)?;

        Ok(Self {
            name: row.cell(NAME).to_string(),
            object_type: row.cell(OBJECT_TYPE).to_string(),
            administrative_location: row.cell(ADMINISTRATIVE).to_string(),
            geo_location: None,
            latitude,
            longitude,
            page: row.page,
            reference,
        })
    }

    /// Merge a continuation row's overflow text. Empty fragments are no-ops.
    fn absorb(&mut self, row: &RawRow) {
        let administrative = row.cell(ADMINISTRATIVE);
        if !administrative.is_empty() {
            self.administrative_location.push(' ');
            self.administrative_location.push_str(administrative);
        }

        let geo = row.cell(GEO);
        if !geo.is_empty() {
            self.geo_location
                .get_or_insert_with(String::new)
                .push_str(geo);
        }
    }
}

/// Lazy left fold of [`RawRow`]s into [`Record`]s.
///
/// Yields `Err` at most once; the iterator is exhausted afterwards. A record
/// that was already complete when the failing row arrived is still yielded
/// before the error. Cloning a `Reassembler` over a cloneable row iterator
/// gives an independent restart point.
#[derive(Debug, Clone)]
pub struct Reassembler<I> {
    rows: I,
    pending: Option<Record>,
    deferred: Option<ReassembleError>,
    done: bool,
}

impl<I> Reassembler<I>
where
    I: Iterator<Item = RawRow>,
{
    pub fn new(rows: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            rows: rows.into_iter(),
            pending: None,
            deferred: None,
            done: false,
        }
    }
}

impl<I> Iterator for Reassembler<I>
where
    I: Iterator<Item = RawRow>,
{
    type Item = Result<Record, ReassembleError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.deferred.take() {
            return Some(Err(err));
        }
        if self.done {
            return None;
        }

        for row in self.rows.by_ref() {
            if row.is_continuation() {
                match self.pending.as_mut() {
                    Some(record) => record.absorb(&row),
                    None => debug!("Skipping continuation row before first record on page {}", row.page),
                }
                continue;
            }

            match Record::start(&row) {
                Ok(started) => {
                    if let Some(finished) = self.pending.replace(started) {
                        return Some(Ok(finished));
                    }
                }
                Err(err) => {
                    self.done = true;
                    return match self.pending.take() {
                        Some(finished) => {
                            self.deferred = Some(err);
                            Some(Ok(finished))
                        }
                        None => Some(Err(err)),
                    };
                }
            }
        }

        self.done = true;
        self.pending.take().map(Ok)
    }
}

/// Reassemble every row, stopping at the first bad one.
pub fn reassemble(rows: impl IntoIterator<Item = RawRow>) -> Result<Vec<Record>, ReassembleError> {
    Reassembler::new(rows).collect()
}
