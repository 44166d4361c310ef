use core::fmt;

use serde::{Deserialize, Serialize};

/// Academic risk category produced by the classifier.
///
/// The classifier emits integer class codes; `Unknown` covers any code
/// outside the trained set so a model/label mismatch degrades instead
/// of failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    Low,
    High,
    Unknown,
}

impl RiskLabel {
    /// Maps a raw classifier output code to its label.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Low,
            1 => Self::High,
            _ => Self::Unknown,
        }
    }

    /// Returns the label as it appears on the wire and in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::High => "High",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(RiskLabel::from_code(0), RiskLabel::Low);
        assert_eq!(RiskLabel::from_code(1), RiskLabel::High);
    }

    #[test]
    fn test_out_of_set_codes_are_unknown() {
        assert_eq!(RiskLabel::from_code(2), RiskLabel::Unknown);
        assert_eq!(RiskLabel::from_code(-1), RiskLabel::Unknown);
        assert_eq!(RiskLabel::from_code(i64::MAX), RiskLabel::Unknown);
    }

    #[test]
    fn test_display_matches_wire_form() {
        assert_eq!(RiskLabel::Low.to_string(), "Low");
        assert_eq!(RiskLabel::High.as_str(), "High");
    }
}
