//! Direction resolution from aggregated signed evidence.

use confluence_core::Direction;

/// Classifies bullish (`positive`) and bearish (`negative`) weighted sums.
///
/// Evidence is mixed when the weaker side exceeds `mixed_threshold` of the
/// stronger one, or on an exact nonzero tie.
#[must_use]
pub fn resolve_direction(positive: f64, negative: f64, mixed_threshold: f64) -> Direction {
    let positive = positive.max(0.0);
    let negative = negative.max(0.0);

    if positive == 0.0 && negative == 0.0 {
        return Direction::Neutral;
    }
    if positive == negative {
        return Direction::Mixed;
    }

    let (weaker, stronger) = if positive > negative {
        (negative, positive)
    } else {
        (positive, negative)
    };
    if weaker / stronger > mixed_threshold {
        return Direction::Mixed;
    }

    if positive > negative {
        Direction::Bullish
    } else {
        Direction::Bearish
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_is_neutral() {
        assert_eq!(resolve_direction(0.0, 0.0, 0.6), Direction::Neutral);
    }

    #[test]
    fn one_sided_evidence_is_directional() {
        assert_eq!(resolve_direction(42.0, 0.0, 0.6), Direction::Bullish);
        assert_eq!(resolve_direction(0.0, 5.0, 0.6), Direction::Bearish);
    }

    #[test]
    fn exact_tie_is_mixed() {
        assert_eq!(resolve_direction(30.0, 30.0, 0.99), Direction::Mixed);
    }

    #[test]
    fn comparable_sides_are_mixed() {
        assert_eq!(resolve_direction(70.0, 45.5, 0.6), Direction::Mixed);
        assert_eq!(resolve_direction(45.5, 70.0, 0.6), Direction::Mixed);
    }

    #[test]
    fn threshold_boundary_is_not_mixed() {
        assert_eq!(resolve_direction(100.0, 60.0, 0.6), Direction::Bullish);
        assert_eq!(resolve_direction(100.0, 61.0, 0.6), Direction::Mixed);
    }
}
