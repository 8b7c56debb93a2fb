//! Pure parsers for the catalog tool's textual listings.
//!
//! Backup listing lines are whitespace-delimited with the creation
//! timestamp in field\[2\]; WAL listing lines carry the timestamp in
//! field\[0\] and the segment identifier in field\[1\]. Both timestamps are
//! ISO-8601 UTC instants (`YYYY-MM-DDTHH:MM:SSZ`).

use chrono::{DateTime, NaiveDateTime, Utc};
use walcatch_error::{Result, WalcatchError};
use walcatch_types::WalSegment;

const CATALOG_INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const BACKUP_TIMESTAMP_FIELD: usize = 2;

/// Parse one catalog timestamp field.
pub fn parse_instant(text: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, CATALOG_INSTANT_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| WalcatchError::parse(format!("bad catalog timestamp `{text}`")))
}

/// Resolve a backup's creation instant from the backup listing.
///
/// A line belongs to the backup iff one of its whitespace-delimited fields
/// equals `name` exactly. Substring matching would select the wrong record
/// whenever one backup name prefixes another, so it is deliberately not
/// used here. First matching line wins; the listing is assumed to hold one
/// line per backup name.
pub fn locate_backup<'a, I>(name: &str, lines: I) -> Result<DateTime<Utc>>
where
    I: IntoIterator<Item = &'a str>,
{
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if !fields.iter().any(|field| *field == name) {
            continue;
        }
        // A matching line without a usable timestamp means the catalog has
        // no record we can anchor on, which is indistinguishable from the
        // backup being absent.
        return fields
            .get(BACKUP_TIMESTAMP_FIELD)
            .and_then(|field| parse_instant(field).ok())
            .ok_or_else(|| WalcatchError::BackupNotFound { name: name.to_owned() });
    }
    Err(WalcatchError::BackupNotFound { name: name.to_owned() })
}

/// Collect the WAL segments produced strictly after `cutoff`.
///
/// Lines whose first field does not parse as a timestamp are skipped
/// without error; the catalog tool interleaves headers and summaries with
/// segment rows. Output order follows input order, so "since" semantics
/// rely on the tool emitting segments in time order.
pub fn segments_after<'a, I>(cutoff: DateTime<Utc>, lines: I) -> Vec<WalSegment>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut segments = Vec::new();
    for line in lines {
        let mut fields = line.split_whitespace();
        let (Some(timestamp), Some(id)) = (fields.next(), fields.next()) else {
            continue;
        };
        let Ok(produced_at) = parse_instant(timestamp) else {
            continue;
        };
        if produced_at > cutoff {
            segments.push(WalSegment { id: id.to_owned(), produced_at });
        }
    }
    segments
}
