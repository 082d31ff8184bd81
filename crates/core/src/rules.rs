//! Deck-building rules.
//!
//! Both limits are re-validated inside the deck service's DB transaction; the
//! distributed lock around deck mutations only reduces wasted work, it is not
//! the safety boundary.

/// Maximum number of cards a deck may hold.
pub const MAX_DECK_SIZE: i64 = 60;

/// Maximum copies of any single card within one deck.
pub const MAX_COPIES_PER_CARD: i64 = 3;

/// Outcome of checking whether one more copy of a card fits in a deck.
#[derive(Debug, PartialEq, Eq)]
pub enum DeckRuleCheck {
    Ok,
    DeckFull,
    TooManyCopies,
}

/// Check the deck invariants for an add-card operation.
///
/// `deck_size` is the current total card count, `copies` the current number
/// of copies of the card being added.
pub fn check_add_card(deck_size: i64, copies: i64) -> DeckRuleCheck {
    if deck_size >= MAX_DECK_SIZE {
        DeckRuleCheck::DeckFull
    } else if copies >= MAX_COPIES_PER_CARD {
        DeckRuleCheck::TooManyCopies
    } else {
        DeckRuleCheck::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_allowed_below_limits() {
        assert_eq!(check_add_card(0, 0), DeckRuleCheck::Ok);
        assert_eq!(check_add_card(59, 2), DeckRuleCheck::Ok);
    }

    #[test]
    fn test_full_deck_rejected() {
        assert_eq!(check_add_card(60, 0), DeckRuleCheck::DeckFull);
        assert_eq!(check_add_card(61, 0), DeckRuleCheck::DeckFull);
    }

    #[test]
    fn test_fourth_copy_rejected() {
        assert_eq!(check_add_card(10, 3), DeckRuleCheck::TooManyCopies);
    }

    #[test]
    fn test_size_limit_checked_before_copies() {
        // A full deck wins over the copy limit when both apply.
        assert_eq!(check_add_card(60, 3), DeckRuleCheck::DeckFull);
    }
}
