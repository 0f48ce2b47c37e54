use crate::error::SolverError;

/// A type representing a card, defined as an alias of `u8`.
///
/// The correspondence between the card and its ID is defined as follows:
/// - `card_id = 4 * rank + suit` (where `0 <= card_id < 52`)
///   - `rank`: 2 => `0`, 3 => `1`, 4 => `2`, ..., A => `12`
///   - `suit`: club => `0`, diamond => `1`, heart => `2`, spade => `3`
pub type Card = u8;

/// Number of distinct cards in the deck.
pub const NUM_CARDS: usize = 52;

#[inline]
pub(crate) fn card_rank(card: Card) -> u8 {
    card >> 2
}

#[inline]
pub(crate) fn card_suit(card: Card) -> u8 {
    card & 3
}

#[inline]
pub(crate) fn card_mask(card: Card) -> u64 {
    1 << card
}

/// Attempts to convert a rank character to a rank index.
///
/// `'A'` => `12`, `'K'` => `11`, ..., `'2'` => `0`. Case-insensitive.
#[inline]
pub(crate) fn char_to_rank(c: char) -> Result<u8, SolverError> {
    match c.to_ascii_uppercase() {
        'A' => Ok(12),
        'K' => Ok(11),
        'Q' => Ok(10),
        'J' => Ok(9),
        'T' => Ok(8),
        '2'..='9' => Ok(c as u8 - b'2'),
        _ => Err(SolverError::InvalidRange(format!("unknown rank: {c}"))),
    }
}

/// Attempts to convert a suit character to a suit index.
///
/// `'c'` => `0`, `'d'` => `1`, `'h'` => `2`, `'s'` => `3`. Case-insensitive.
#[inline]
pub(crate) fn char_to_suit(c: char) -> Result<u8, SolverError> {
    match c.to_ascii_lowercase() {
        'c' => Ok(0),
        'd' => Ok(1),
        'h' => Ok(2),
        's' => Ok(3),
        _ => Err(SolverError::InvalidRange(format!("unknown suit: {c}"))),
    }
}

#[inline]
fn rank_to_char(rank: u8) -> char {
    b"23456789TJQKA"[rank as usize] as char
}

#[inline]
fn suit_to_char(suit: u8) -> char {
    b"cdhs"[suit as usize] as char
}

/// Converts a card into a string such as `"As"` or `"2c"`.
///
/// # Examples
/// ```
/// use postflop_dcfr::card_to_string;
///
/// assert_eq!(card_to_string(0), "2c");
/// assert_eq!(card_to_string(5), "3d");
/// assert_eq!(card_to_string(51), "As");
/// ```
#[inline]
pub fn card_to_string(card: Card) -> String {
    debug_assert!(card < 52);
    format!("{}{}", rank_to_char(card_rank(card)), suit_to_char(card_suit(card)))
}

/// Attempts to parse a two-character card string such as `"As"` or `"2c"`.
///
/// # Examples
/// ```
/// use postflop_dcfr::card_from_str;
///
/// assert_eq!(card_from_str("2c"), Ok(0));
/// assert_eq!(card_from_str("As"), Ok(51));
/// assert!(card_from_str("Ax").is_err());
/// ```
#[inline]
pub fn card_from_str(s: &str) -> Result<Card, SolverError> {
    let mut chars = s.trim().chars();
    let rank_char = chars
        .next()
        .ok_or_else(|| SolverError::InvalidBoard(format!("empty card string: '{s}'")))?;
    let suit_char = chars
        .next()
        .ok_or_else(|| SolverError::InvalidBoard(format!("incomplete card string: '{s}'")))?;
    if chars.next().is_some() {
        return Err(SolverError::InvalidBoard(format!("card string too long: '{s}'")));
    }

    let rank = char_to_rank(rank_char)
        .map_err(|_| SolverError::InvalidBoard(format!("unknown rank in card: '{s}'")))?;
    let suit = char_to_suit(suit_char)
        .map_err(|_| SolverError::InvalidBoard(format!("unknown suit in card: '{s}'")))?;
    Ok((rank << 2) | suit)
}

/// Parses a whitespace- or comma-separated board string into cards.
///
/// The result is validated: 3 to 5 cards, all distinct.
///
/// # Examples
/// ```
/// use postflop_dcfr::board_from_str;
///
/// assert_eq!(board_from_str("2c 7d Kh").unwrap().len(), 3);
/// assert!(board_from_str("2c 2c Kh").is_err());
/// ```
pub fn board_from_str(s: &str) -> Result<Vec<Card>, SolverError> {
    let cards = s
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(card_from_str)
        .collect::<Result<Vec<_>, _>>()?;
    validate_board(&cards)?;
    Ok(cards)
}

/// Checks that a board holds 3 to 5 distinct valid cards.
pub fn validate_board(board: &[Card]) -> Result<(), SolverError> {
    if board.len() < 3 || board.len() > 5 {
        return Err(SolverError::InvalidBoard(format!(
            "expected 3 to 5 board cards, got {}",
            board.len()
        )));
    }
    let mut mask: u64 = 0;
    for &card in board {
        if card >= 52 {
            return Err(SolverError::InvalidBoard(format!("card out of range: {card}")));
        }
        if mask & card_mask(card) != 0 {
            return Err(SolverError::InvalidBoard(format!(
                "duplicate card: {}",
                card_to_string(card)
            )));
        }
        mask |= card_mask(card);
    }
    Ok(())
}

/// Returns the bitmask of a board, the canonical integer encoding used as a
/// cache key.
#[inline]
pub fn board_mask(board: &[Card]) -> u64 {
    board.iter().fold(0, |mask, &card| mask | card_mask(card))
}

/// Formats a board as a compact string such as `"2c7dKh"`.
pub fn board_to_string(board: &[Card]) -> String {
    board.iter().map(|&c| card_to_string(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_round_trip() {
        for card in 0..52 {
            let s = card_to_string(card);
            assert_eq!(card_from_str(&s), Ok(card));
        }
    }

    #[test]
    fn test_card_from_str_case_insensitive() {
        assert_eq!(card_from_str("as"), card_from_str("AS"));
        assert_eq!(card_from_str("tC"), Ok(8 << 2));
    }

    #[test]
    fn test_card_from_str_errors() {
        assert!(card_from_str("").is_err());
        assert!(card_from_str("A").is_err());
        assert!(card_from_str("Axs").is_err());
        assert!(card_from_str("1s").is_err());
        assert!(card_from_str("Az").is_err());
    }

    #[test]
    fn test_board_validation() {
        assert!(board_from_str("2c 7d Kh").is_ok());
        assert!(board_from_str("2c 7d Kh 3s 9h").is_ok());
        assert!(board_from_str("2c 7d").is_err());
        assert!(board_from_str("2c 7d Kh 3s 9h As").is_err());
        assert!(board_from_str("2c 2c Kh").is_err());
    }

    #[test]
    fn test_board_mask() {
        let board = board_from_str("2c 7d Kh").unwrap();
        assert_eq!(board_mask(&board), (1 << 0) | (1 << 21) | (1 << 46));
    }
}
