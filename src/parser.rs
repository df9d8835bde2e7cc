//! Parser for VE7CC-format DX cluster spot lines.
//!
//! The cluster emits structured spots as caret-delimited records once
//! `set/ve7cc 1` has been sent. The parser splits the record with `nom` and
//! maps the fixed field positions onto a [`Spot`]; anything that does not
//! look like a record is diagnostic text, not an error.
//!
//! # Spot Format
//!
//! ```text
//! CC11^14074.0^VK3ABC^2024-01-01^10:00^FT8 CQ^W1AW
//! ```
//!
//! Fields by position: marker, frequency in kHz, spotted call, date, time
//! (UTC), free-text comment, spotter call. Records may carry trailing fields
//! beyond the seventh; they are ignored.

use nom::{
    IResult, Parser,
    bytes::complete::take_till,
    character::complete::char,
    multi::many0,
    sequence::preceded,
};

use crate::classify;
use crate::spot::Spot;

/// Prefix marking a structured spot record.
pub const SPOT_PREFIX: &str = "CC";

/// Field separator of the VE7CC record format.
const FIELD_SEPARATOR: char = '^';

/// Minimum field count for a line to qualify as a spot record.
const MIN_FIELDS: usize = 7;

/// Split a record into its caret-delimited fields.
fn record_fields(input: &str) -> IResult<&str, Vec<&str>> {
    let (input, first) = take_till(|c: char| c == FIELD_SEPARATOR).parse(input)?;
    let (input, rest) = many0(preceded(
        char(FIELD_SEPARATOR),
        take_till(|c: char| c == FIELD_SEPARATOR),
    ))
    .parse(input)?;

    let mut fields = Vec::with_capacity(rest.len() + 1);
    fields.push(first);
    fields.extend(rest);
    Ok((input, fields))
}

/// An empty field falls back to the given default.
fn field_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

/// Check if a line is a structured spot record (quick pre-filter).
///
/// Everything else on the wire is welcome text, announcements, or command
/// echo and is handled as raw diagnostic output.
#[inline]
pub fn is_structured_line(line: &str) -> bool {
    line.trim_start().starts_with(SPOT_PREFIX)
}

/// Parse a VE7CC spot record into a [`Spot`].
///
/// Returns `None` when the line has fewer than seven fields. Empty
/// frequency, call, and spotter fields default to `"?"`; empty date, time,
/// and comment fields stay empty.
///
/// # Example
///
/// ```
/// use dx_watch::parser::parse_spot;
///
/// let line = "CC^14074.0^VK3ABC^2024-01-01^10:00^FT8 CQ^W1AW";
/// let spot = parse_spot(line).unwrap();
/// assert_eq!(spot.call, "VK3ABC");
/// assert_eq!(spot.band, "20m");
/// ```
pub fn parse_spot(line: &str) -> Option<Spot> {
    let line = line.trim();

    let fields = match record_fields(line) {
        Ok((_, fields)) => fields,
        Err(_) => return None,
    };
    if fields.len() < MIN_FIELDS {
        return None;
    }

    let freq = field_or(fields[1], "?");
    let comment = fields[5];

    Some(Spot {
        freq: freq.to_string(),
        call: field_or(fields[2], "?").to_string(),
        date: fields[3].to_string(),
        time: fields[4].to_string(),
        comment: comment.to_string(),
        spotter: field_or(fields[6], "?").to_string(),
        band: classify::band_for(freq),
        mode: classify::mode_for(comment),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let line = "CC^14074.0^VK3ABC^2024-01-01^10:00^FT8 CQ^W1AW";
        let spot = parse_spot(line).expect("should parse");

        assert_eq!(spot.freq, "14074.0");
        assert_eq!(spot.call, "VK3ABC");
        assert_eq!(spot.datetime(), "2024-01-01 10:00");
        assert_eq!(spot.comment, "FT8 CQ");
        assert_eq!(spot.spotter, "W1AW");
        assert_eq!(spot.band, "20m");
        assert_eq!(spot.mode, "FT8");
    }

    #[test]
    fn test_parse_record_with_trailing_fields() {
        let line = "CC11^7018.3^RW1M^2024-02-02^22:59^CW 19 dB^EA5WU-#^extra^more";
        let spot = parse_spot(line).expect("should parse");

        assert_eq!(spot.call, "RW1M");
        assert_eq!(spot.band, "40m");
        assert_eq!(spot.mode, "CW");
        assert_eq!(spot.spotter, "EA5WU-#");
    }

    #[test]
    fn test_parse_short_record_is_none() {
        assert!(parse_spot("CC^14074.0^VK3ABC").is_none());
        assert!(parse_spot("CC^1^2^3^4^5").is_none());
        assert!(parse_spot("Welcome to the cluster").is_none());
        assert!(parse_spot("").is_none());
    }

    #[test]
    fn test_parse_empty_fields_default() {
        let line = "CC^^^2024-01-01^10:00^^";
        let spot = parse_spot(line).expect("should parse");

        assert_eq!(spot.freq, "?");
        assert_eq!(spot.call, "?");
        assert_eq!(spot.spotter, "?");
        assert_eq!(spot.comment, "");
        assert_eq!(spot.band, "?");
        assert_eq!(spot.mode, "?");
    }

    #[test]
    fn test_parse_unparseable_frequency_keeps_text() {
        let line = "CC^garbage^VK3ABC^2024-01-01^10:00^FT8^W1AW";
        let spot = parse_spot(line).expect("should parse");

        assert_eq!(spot.freq, "garbage");
        assert_eq!(spot.band, "?");
    }

    #[test]
    fn test_is_structured_line() {
        assert!(is_structured_line("CC^14074.0^VK3ABC^d^t^c^s"));
        assert!(is_structured_line("  CC11^7018.3^RW1M^d^t^c^s"));
        assert!(!is_structured_line("DX de W1AW: hello"));
        assert!(!is_structured_line("Welcome to the cluster"));
        assert!(!is_structured_line(""));
    }

    #[test]
    fn test_record_fields_preserves_empties() {
        let (_, fields) = record_fields("a^^b^").expect("should split");
        assert_eq!(fields, vec!["a", "", "b", ""]);
    }
}
