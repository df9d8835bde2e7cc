//! Band and mode classification for DX cluster spots.
//!
//! These are total functions: anything that cannot be classified comes back
//! as the `"?"` sentinel rather than an error.

/// Sentinel label for an unknown band or mode.
pub const UNKNOWN: &str = "?";

/// Amateur band edges in kHz, inclusive on both ends.
const BAND_TABLE: &[(f64, f64, &str)] = &[
    (1800.0, 2000.0, "160m"),
    (3500.0, 3800.0, "80m"),
    (5300.0, 5400.0, "60m"),
    (7000.0, 7200.0, "40m"),
    (10100.0, 10150.0, "30m"),
    (14000.0, 14350.0, "20m"),
    (18068.0, 18168.0, "17m"),
    (21000.0, 21450.0, "15m"),
    (24890.0, 24990.0, "12m"),
    (28000.0, 29700.0, "10m"),
    (50000.0, 54000.0, "6m"),
];

/// Modes recognized in comment text, scanned in priority order.
const MODE_PRIORITY: &[&str] = &["CW", "FT8", "RTTY"];

/// Any of these collapse to a single SSB label.
const SSB_HINTS: &[&str] = &["SSB", "USB", "LSB"];

/// Map a raw frequency field (kHz as decimal text) to a band label.
///
/// Unparseable text and frequencies outside every band yield [`UNKNOWN`].
pub fn band_for(freq_text: &str) -> &'static str {
    let Ok(freq) = freq_text.trim().parse::<f64>() else {
        return UNKNOWN;
    };
    BAND_TABLE
        .iter()
        .find(|(low, high, _)| *low <= freq && freq <= *high)
        .map(|(_, _, band)| *band)
        .unwrap_or(UNKNOWN)
}

/// Derive a mode label from the free-text comment of a spot.
///
/// The comment is scanned case-insensitively for `CW`, `FT8`, `RTTY` in that
/// order; failing that, any SSB/USB/LSB hint yields `SSB`.
pub fn mode_for(comment: &str) -> &'static str {
    let upper = comment.to_ascii_uppercase();
    for mode in MODE_PRIORITY {
        if upper.contains(mode) {
            return mode;
        }
    }
    if SSB_HINTS.iter().any(|hint| upper.contains(hint)) {
        return "SSB";
    }
    UNKNOWN
}

/// Normalize a call sign for comparison and dedup keying.
///
/// Upper-cases the input and strips every character outside `[A-Z0-9/]`.
/// Idempotent: normalizing an already-normalized call is a no-op.
pub fn normalize_call(call: &str) -> String {
    call.chars()
        .filter_map(|c| {
            let c = c.to_ascii_uppercase();
            (c.is_ascii_uppercase() || c.is_ascii_digit() || c == '/').then_some(c)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_band_for_known_frequencies() {
        assert_eq!(band_for("1820.0"), "160m");
        assert_eq!(band_for("3573"), "80m");
        assert_eq!(band_for("7074.0"), "40m");
        assert_eq!(band_for("10136"), "30m");
        assert_eq!(band_for("14074"), "20m");
        assert_eq!(band_for("18100.0"), "17m");
        assert_eq!(band_for("21074.0"), "15m");
        assert_eq!(band_for("24915"), "12m");
        assert_eq!(band_for("28074.0"), "10m");
        assert_eq!(band_for("50313.0"), "6m");
    }

    #[test]
    fn test_band_for_boundaries_inclusive() {
        assert_eq!(band_for("14000"), "20m");
        assert_eq!(band_for("14350"), "20m");
        assert_eq!(band_for("14350.0"), "20m");
        assert_eq!(band_for("13999.9"), UNKNOWN);
        assert_eq!(band_for("14351"), UNKNOWN);
    }

    #[test]
    fn test_band_for_unparseable() {
        assert_eq!(band_for("notanumber"), UNKNOWN);
        assert_eq!(band_for(""), UNKNOWN);
        assert_eq!(band_for("?"), UNKNOWN);
    }

    #[test]
    fn test_mode_for_priority_order() {
        assert_eq!(mode_for("CW FT8"), "CW");
        assert_eq!(mode_for("FT8 RTTY"), "FT8");
        assert_eq!(mode_for("rtty contest"), "RTTY");
    }

    #[test]
    fn test_mode_for_ssb_hints() {
        assert_eq!(mode_for("USB QSO"), "SSB");
        assert_eq!(mode_for("lsb 5/9"), "SSB");
        assert_eq!(mode_for("strong SSB signal"), "SSB");
    }

    #[test]
    fn test_mode_for_unknown() {
        assert_eq!(mode_for("hello"), UNKNOWN);
        assert_eq!(mode_for(""), UNKNOWN);
    }

    #[test]
    fn test_normalize_call_strips_and_uppercases() {
        assert_eq!(normalize_call("vk3-abc "), "VK3ABC");
        assert_eq!(normalize_call("ea8/ok1abc"), "EA8/OK1ABC");
        assert_eq!(normalize_call("W1AW"), "W1AW");
        assert_eq!(normalize_call("  "), "");
    }

    proptest! {
        #[test]
        fn normalize_call_is_idempotent(s in "\\PC*") {
            let once = normalize_call(&s);
            prop_assert_eq!(normalize_call(&once), once);
        }

        #[test]
        fn band_for_never_panics(s in "\\PC*") {
            let _ = band_for(&s);
        }
    }
}
