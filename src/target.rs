//! Watch rules for selecting which spots trigger a notification.
//!
//! A [`Target`] names one watched station plus optional band and mode
//! restrictions. Rules combine with OR logic across the configured list.

use serde::Deserialize;

use crate::classify::normalize_call;
use crate::spot::Spot;

/// A watched station rule.
///
/// Empty `bands`/`modes` lists match any band or mode.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Target {
    /// The watched call sign. Compared after normalization.
    pub call: String,

    /// Acceptable band labels (e.g., "20m", "40m").
    pub bands: Vec<String>,

    /// Acceptable mode labels (e.g., "FT8", "CW", "SSB").
    pub modes: Vec<String>,
}

impl Target {
    /// Check if a spot satisfies this rule.
    ///
    /// Call equality is checked first (cheap rejection), then band
    /// membership, then mode membership, all case-insensitively.
    pub fn matches(&self, spot: &Spot) -> bool {
        if normalize_call(&spot.call) != normalize_call(&self.call) {
            return false;
        }
        if !self.bands.is_empty() && !self.bands.iter().any(|b| b.eq_ignore_ascii_case(spot.band))
        {
            return false;
        }
        if !self.modes.is_empty() && !self.modes.iter().any(|m| m.eq_ignore_ascii_case(spot.mode))
        {
            return false;
        }
        true
    }

    /// Validate the rule.
    ///
    /// A call that normalizes to the empty string can never match anything.
    pub fn validate(&self) -> Result<(), String> {
        if normalize_call(&self.call).is_empty() {
            return Err(format!("target call '{}' is empty after normalization", self.call));
        }
        Ok(())
    }
}

/// Check if any rule in the list matches the spot.
///
/// Returns `false` for an empty list.
pub fn any_target_matches(targets: &[Target], spot: &Spot) -> bool {
    targets.iter().any(|t| t.matches(spot))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_spot(call: &str, band: &'static str, mode: &'static str) -> Spot {
        Spot {
            freq: "14074.0".to_string(),
            call: call.to_string(),
            date: "2024-01-01".to_string(),
            time: "10:00".to_string(),
            comment: "CQ".to_string(),
            spotter: "W1AW".to_string(),
            band,
            mode,
        }
    }

    #[test]
    fn test_call_mismatch_always_rejects() {
        let target = Target {
            call: "VK3ABC".to_string(),
            bands: vec![],
            modes: vec![],
        };
        assert!(!target.matches(&make_spot("K1ABC", "20m", "FT8")));
    }

    #[test]
    fn test_call_only_target_matches_any_band_and_mode() {
        let target = Target {
            call: "VK3ABC".to_string(),
            ..Default::default()
        };
        assert!(target.matches(&make_spot("VK3ABC", "20m", "FT8")));
        assert!(target.matches(&make_spot("VK3ABC", "?", "?")));
    }

    #[test]
    fn test_call_comparison_is_normalized() {
        let target = Target {
            call: "vk3-abc".to_string(),
            ..Default::default()
        };
        assert!(target.matches(&make_spot("VK3ABC", "20m", "FT8")));
    }

    #[test]
    fn test_band_restriction() {
        let target = Target {
            call: "VK3ABC".to_string(),
            bands: vec!["20m".to_string(), "40m".to_string()],
            modes: vec![],
        };
        assert!(target.matches(&make_spot("VK3ABC", "20m", "FT8")));
        assert!(target.matches(&make_spot("VK3ABC", "40m", "CW")));
        assert!(!target.matches(&make_spot("VK3ABC", "15m", "FT8")));
        assert!(!target.matches(&make_spot("VK3ABC", "?", "FT8")));
    }

    #[test]
    fn test_mode_restriction_case_insensitive() {
        let target = Target {
            call: "VK3ABC".to_string(),
            bands: vec![],
            modes: vec!["ft8".to_string()],
        };
        assert!(target.matches(&make_spot("VK3ABC", "20m", "FT8")));
        assert!(!target.matches(&make_spot("VK3ABC", "20m", "CW")));
    }

    #[test]
    fn test_any_target_matches_or_logic() {
        let targets = vec![
            Target {
                call: "VK3ABC".to_string(),
                ..Default::default()
            },
            Target {
                call: "K1ABC".to_string(),
                bands: vec!["40m".to_string()],
                ..Default::default()
            },
        ];

        assert!(any_target_matches(&targets, &make_spot("VK3ABC", "20m", "FT8")));
        assert!(any_target_matches(&targets, &make_spot("K1ABC", "40m", "CW")));
        assert!(!any_target_matches(&targets, &make_spot("K1ABC", "20m", "CW")));
        assert!(!any_target_matches(&[], &make_spot("VK3ABC", "20m", "FT8")));
    }

    #[test]
    fn test_parse_target_from_toml() {
        let toml = r#"
            call = "VK3ABC"
            bands = ["20m"]
            modes = ["FT8"]
        "#;
        let target: Target = toml::from_str(toml).unwrap();
        assert_eq!(target.call, "VK3ABC");
        assert_eq!(target.bands, vec!["20m".to_string()]);
        assert_eq!(target.modes, vec!["FT8".to_string()]);

        let bare: Target = toml::from_str(r#"call = "K1ABC""#).unwrap();
        assert!(bare.bands.is_empty());
        assert!(bare.modes.is_empty());
    }

    #[test]
    fn test_validate_rejects_empty_call() {
        assert!(Target::default().validate().is_err());
        let target = Target {
            call: "--".to_string(),
            ..Default::default()
        };
        assert!(target.validate().is_err());
        let ok = Target {
            call: "W1AW".to_string(),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }
}
