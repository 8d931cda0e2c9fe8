//! # Page Break Decisions
//!
//! Rows and cards are never split across pages. Before drawing one, the
//! renderer asks whether it fits in what is left of the page; if not, it
//! moves to a fresh page, and if it would not even fit there the render
//! fails instead of producing a clipped document.

/// Decide what to do with an unbreakable block of a given height.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Place the block on the current page (it fits).
    Place,
    /// Start a new page and place the block there.
    MoveToNextPage,
    /// The block is taller than an empty page; it can never be placed.
    Oversized,
}

/// Given the remaining space on the current page and on a fresh page,
/// decide where a block of `block_height` goes.
pub fn decide_break(
    remaining_height: f64,
    block_height: f64,
    fresh_page_height: f64,
) -> BreakDecision {
    if block_height <= remaining_height {
        return BreakDecision::Place;
    }

    if block_height > fresh_page_height {
        return BreakDecision::Oversized;
    }

    BreakDecision::MoveToNextPage
}

/// Height of a group of blocks that must start on the same page,
/// e.g. a section heading and the first row under it.
pub fn keep_together(block_heights: &[f64]) -> f64 {
    block_heights.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_everything_fits() {
        let decision = decide_break(100.0, 60.0, 250.0);
        assert_eq!(decision, BreakDecision::Place);
    }

    #[test]
    fn test_exact_fit_is_placed() {
        let decision = decide_break(60.0, 60.0, 250.0);
        assert_eq!(decision, BreakDecision::Place);
    }

    #[test]
    fn test_overflow_moves() {
        let decision = decide_break(50.0, 60.0, 250.0);
        assert_eq!(decision, BreakDecision::MoveToNextPage);
    }

    #[test]
    fn test_taller_than_a_page_is_oversized() {
        let decision = decide_break(50.0, 260.0, 250.0);
        assert_eq!(decision, BreakDecision::Oversized);
    }

    #[test]
    fn test_oversized_even_when_page_is_empty() {
        let decision = decide_break(250.0, 260.0, 250.0);
        assert_eq!(decision, BreakDecision::Oversized);
    }

    #[test]
    fn test_keep_together_sums_heights() {
        assert_eq!(keep_together(&[10.0, 27.0]), 37.0);
        assert_eq!(keep_together(&[]), 0.0);
    }
}
