use serde::{Deserialize, Serialize};
use std::fmt;

/// Cosmetic rank derived from a player's ELO.
///
/// Variants are ordered from the lowest band to the highest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TierLabel {
    Lt5,
    Ht5,
    Lt4,
    Ht4,
    Lt3,
    Ht3,
    Lt2,
    Ht2,
    Lt1,
    Ht1,
}

impl TierLabel {
    /// Every tier in band order.
    pub const ALL: [TierLabel; 10] = [
        TierLabel::Lt5,
        TierLabel::Ht5,
        TierLabel::Lt4,
        TierLabel::Ht4,
        TierLabel::Lt3,
        TierLabel::Ht3,
        TierLabel::Lt2,
        TierLabel::Ht2,
        TierLabel::Lt1,
        TierLabel::Ht1,
    ];
    
    /// Hex color-coded label as rendered by the chat formatter.
    pub fn as_str(&self) -> &'static str {
        match self {
            TierLabel::Lt5 => "&x&A&3&4&7&0&2LT5",
            TierLabel::Ht5 => "&x&D&2&5&D&0&4HT5",
            TierLabel::Lt4 => "&x&C&0&B&D&A&2LT4",
            TierLabel::Ht4 => "&x&E&B&E&A&C&8HT4",
            TierLabel::Lt3 => "&x&1&2&C&6&5&DLT3",
            TierLabel::Ht3 => "&x&0&4&F&9&6&AHT3",
            TierLabel::Lt2 => "&x&0&2&7&7&D&0LT2",
            TierLabel::Ht2 => "&x&2&1&C&9&F&BHT2",
            TierLabel::Lt1 => "&x&B&0&0&4&C&ELT1",
            TierLabel::Ht1 => "&x&F&9&0&6&E&CHT1",
        }
    }
    
    /// Bare tag without color codes, e.g. `"LT5"`.
    pub fn tag(&self) -> &'static str {
        match self {
            TierLabel::Lt5 => "LT5",
            TierLabel::Ht5 => "HT5",
            TierLabel::Lt4 => "LT4",
            TierLabel::Ht4 => "HT4",
            TierLabel::Lt3 => "LT3",
            TierLabel::Ht3 => "HT3",
            TierLabel::Lt2 => "LT2",
            TierLabel::Ht2 => "HT2",
            TierLabel::Lt1 => "LT1",
            TierLabel::Ht1 => "HT1",
        }
    }
    
    /// Inclusive upper bound of the band. The top band is open-ended.
    pub fn upper_bound(&self) -> Option<f64> {
        match self {
            TierLabel::Lt5 => Some(500.0),
            TierLabel::Ht5 => Some(6_000.0),
            TierLabel::Lt4 => Some(8_000.0),
            TierLabel::Ht4 => Some(10_000.0),
            TierLabel::Lt3 => Some(15_000.0),
            TierLabel::Ht3 => Some(20_000.0),
            TierLabel::Lt2 => Some(25_000.0),
            TierLabel::Ht2 => Some(30_000.0),
            TierLabel::Lt1 => Some(40_000.0),
            TierLabel::Ht1 => None,
        }
    }
    
    pub fn from_tag(s: &str) -> Option<Self> {
        let wanted = s.trim();
        TierLabel::ALL
            .into_iter()
            .find(|tier| tier.tag().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for TierLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an ELO score onto its tier. Bounds are inclusive, so a score sitting
/// exactly on a boundary lands in the lower band.
pub fn compute_tier(score: f64) -> TierLabel {
    match score {
        s if s <= 500.0 => TierLabel::Lt5,
        s if s <= 6_000.0 => TierLabel::Ht5,
        s if s <= 8_000.0 => TierLabel::Lt4,
        s if s <= 10_000.0 => TierLabel::Ht4,
        s if s <= 15_000.0 => TierLabel::Lt3,
        s if s <= 20_000.0 => TierLabel::Ht3,
        s if s <= 25_000.0 => TierLabel::Lt2,
        s if s <= 30_000.0 => TierLabel::Ht2,
        s if s <= 40_000.0 => TierLabel::Lt1,
        _ => TierLabel::Ht1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_lowest_band_is_inclusive() {
        assert_eq!(compute_tier(0.0), TierLabel::Lt5);
        assert_eq!(compute_tier(250.0), TierLabel::Lt5);
        assert_eq!(compute_tier(500.0), TierLabel::Lt5);
        assert_eq!(compute_tier(500.0001), TierLabel::Ht5);
    }
    
    #[test]
    fn test_every_boundary_lands_in_lower_band() {
        for tier in TierLabel::ALL {
            if let Some(bound) = tier.upper_bound() {
                assert_eq!(compute_tier(bound), tier, "bound {}", bound);
                assert_ne!(compute_tier(bound + 0.001), tier, "just above {}", bound);
            }
        }
    }
    
    #[test]
    fn test_top_band_is_open() {
        assert_eq!(compute_tier(40_000.0001), TierLabel::Ht1);
        assert_eq!(compute_tier(1_000_000.0), TierLabel::Ht1);
        assert_eq!(compute_tier(f64::MAX), TierLabel::Ht1);
    }
    
    #[test]
    fn test_band_midpoints() {
        assert_eq!(compute_tier(3_000.0), TierLabel::Ht5);
        assert_eq!(compute_tier(7_000.0), TierLabel::Lt4);
        assert_eq!(compute_tier(9_000.0), TierLabel::Ht4);
        assert_eq!(compute_tier(12_000.0), TierLabel::Lt3);
        assert_eq!(compute_tier(17_500.0), TierLabel::Ht3);
        assert_eq!(compute_tier(22_000.0), TierLabel::Lt2);
        assert_eq!(compute_tier(27_000.0), TierLabel::Ht2);
        assert_eq!(compute_tier(35_000.0), TierLabel::Lt1);
    }
    
    #[test]
    fn test_bands_are_ordered_and_distinct() {
        let bounds: Vec<f64> = TierLabel::ALL.iter().filter_map(|t| t.upper_bound()).collect();
        assert_eq!(bounds.len(), 9);
        assert!(bounds.windows(2).all(|w| w[0] < w[1]));
        
        let mut labels: Vec<&str> = TierLabel::ALL.iter().map(|t| t.as_str()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), 10);
    }
    
    #[test]
    fn test_labels_end_with_tag() {
        for tier in TierLabel::ALL {
            assert!(tier.as_str().starts_with("&x"));
            assert!(tier.as_str().ends_with(tier.tag()));
            assert_eq!(tier.to_string(), tier.as_str());
        }
    }
    
    #[test]
    fn test_tag_parsing() {
        assert_eq!(TierLabel::from_tag("lt5"), Some(TierLabel::Lt5));
        assert_eq!(TierLabel::from_tag(" HT1 "), Some(TierLabel::Ht1));
        assert_eq!(TierLabel::from_tag("HT6"), None);
    }
}
