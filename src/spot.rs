//! Data structures representing DX cluster spots.
//!
//! A [`Spot`] is the parsed form of one VE7CC-format line from the cluster.
//! Fields are kept as received; the band and mode labels are derived at parse
//! time by the classifier.

use std::fmt;

/// A parsed spot announcement from the DX cluster feed.
///
/// A raw line like:
/// ```text
/// CC11^14074.0^VK3ABC^2024-01-01^10:00^FT8 CQ^W1AW
/// ```
///
/// Would be parsed into a `Spot` with:
/// - `freq`: "14074.0"
/// - `call`: "VK3ABC"
/// - `date`: "2024-01-01", `time`: "10:00"
/// - `comment`: "FT8 CQ"
/// - `spotter`: "W1AW"
/// - `band`: "20m", `mode`: "FT8"
#[derive(Debug, Clone, PartialEq)]
pub struct Spot {
    /// Frequency in kHz as received (decimal text), `"?"` if absent.
    pub freq: String,

    /// The spotted call sign, as received and unnormalized.
    pub call: String,

    /// The date field of the spot, verbatim.
    pub date: String,

    /// The UTC time field of the spot, verbatim.
    pub time: String,

    /// Free-text comment attached by the spotter.
    pub comment: String,

    /// The call sign of the reporting station, `"?"` if absent.
    pub spotter: String,

    /// Band label derived from the frequency field, `"?"` if unknown.
    pub band: &'static str,

    /// Mode label derived from the comment, `"?"` if unknown.
    pub mode: &'static str,
}

impl Spot {
    /// The space-joined `date time` string, exactly as the fields arrived.
    pub fn datetime(&self) -> String {
        format!("{} {}", self.date, self.time)
    }

    /// Render the HTML notification text delivered to recipients.
    pub fn notification_text(&self) -> String {
        format!(
            "🛰️ <b>Spot DXCluster</b>\n\
             Station: <b>{}</b>\n\
             Freq: {} kHz ({})\n\
             Mode: {}\n\
             Date/Time: {}\n\
             Comment: {}\n\
             Spotter: {}",
            self.call,
            self.freq,
            self.band,
            self.mode,
            self.datetime(),
            self.comment,
            self.spotter
        )
    }
}

impl fmt::Display for Spot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} kHz ({}) {} de {}",
            self.call, self.freq, self.band, self.mode, self.spotter
        )
    }
}
