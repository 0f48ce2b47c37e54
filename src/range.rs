use crate::card::*;
use crate::error::SolverError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// A specific two-card holding with its weight in a range.
///
/// `card1 < card2` always holds; hand identity ignores card order.
/// `probability` is the absolute weight from the range text and
/// `rel_probability` the board-conditioned normalised weight computed by
/// [`RangeManager::set_rel_probabilities`](crate::RangeManager).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreflopCombo {
    pub card1: Card,
    pub card2: Card,
    pub probability: f32,
    pub rel_probability: f32,
}

impl PreflopCombo {
    pub(crate) fn new(card1: Card, card2: Card, probability: f32) -> Self {
        debug_assert!(card1 != card2);
        let (card1, card2) = if card1 < card2 { (card1, card2) } else { (card2, card1) };
        Self {
            card1,
            card2,
            probability,
            rel_probability: 0.0,
        }
    }

    /// Bitmask of the two hole cards.
    #[inline]
    pub fn mask(&self) -> u64 {
        card_mask(self.card1) | card_mask(self.card2)
    }

    /// Whether either hole card appears in `mask`.
    #[inline]
    pub fn overlaps_mask(&self, mask: u64) -> bool {
        self.mask() & mask != 0
    }

    /// Whether the two combos share a card.
    #[inline]
    pub fn overlaps(&self, other: &PreflopCombo) -> bool {
        self.mask() & other.mask() != 0
    }

    /// Whether the two combos are the same holding, ignoring weights.
    #[inline]
    pub fn same_hand(&self, other: &PreflopCombo) -> bool {
        self.card1 == other.card1 && self.card2 == other.card2
    }
}

impl fmt::Display for PreflopCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", card_to_string(self.card2), card_to_string(self.card1))
    }
}

/// A weighted distribution over starting hands, expanded into explicit
/// combos. Combo order is the deterministic expansion order of the range
/// text, which fixes the indexing of every reach-probability vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Range {
    combos: Vec<PreflopCombo>,
}

static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([2-9TJQKA])([2-9TJQKA])([so])?(\+)?$").unwrap()
});

static DASH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([2-9TJQKA])([2-9TJQKA])([so])?-([2-9TJQKA])([2-9TJQKA])([so])?$").unwrap()
});

impl Range {
    /// Expands a comma-delimited range string such as
    /// `"22+,A5s-A2s,KQo,JTs:0.5"` into explicit weighted combos.
    ///
    /// Supported tokens: pairs (`QQ`), suited/offsuit hands (`AKs`, `T9o`),
    /// both-suit hands (`KQ`), plus-operators (`22+`, `A2s+`), dash ranges
    /// (`A5s-A2s`, `76s-54s`, `QQ-99`), and an optional `:weight` suffix in
    /// (0, 1].
    ///
    /// # Examples
    /// ```
    /// use postflop_dcfr::Range;
    ///
    /// let range: Range = "22+,A2s+,KQo".parse().unwrap();
    /// assert_eq!(range.num_combos(), 13 * 6 + 12 * 4 + 12);
    /// ```
    pub fn expand(text: &str) -> Result<Self, SolverError> {
        let mut range = Range::default();

        for token in text.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            range.parse_token(token)?;
        }

        if range.combos.is_empty() {
            return Err(SolverError::InvalidRange(format!(
                "range expands to zero combos: '{text}'"
            )));
        }
        Ok(range)
    }

    /// The expanded combos, in deterministic expansion order.
    #[inline]
    pub fn combos(&self) -> &[PreflopCombo] {
        &self.combos
    }

    #[inline]
    pub fn num_combos(&self) -> usize {
        self.combos.len()
    }

    /// Whether swapping `suit1` and `suit2` leaves the weighted combo
    /// multiset unchanged.
    pub fn is_suit_isomorphic(&self, suit1: u8, suit2: u8) -> bool {
        suit_isomorphic(&self.combos, suit1, suit2)
    }

    fn parse_token(&mut self, token: &str) -> Result<(), SolverError> {
        let (body, weight) = match token.split_once(':') {
            Some((body, weight_str)) => {
                let weight: f32 = weight_str.parse().map_err(|_| {
                    SolverError::InvalidRange(format!("malformed weight: '{token}'"))
                })?;
                if !(weight > 0.0 && weight <= 1.0) {
                    return Err(SolverError::InvalidRange(format!(
                        "weight must be in (0, 1]: '{token}'"
                    )));
                }
                (body, weight)
            }
            None => (token, 1.0),
        };

        if let Some(caps) = DASH_REGEX.captures(body) {
            let r1 = char_to_rank(caps[1].chars().next().unwrap())?;
            let r2 = char_to_rank(caps[2].chars().next().unwrap())?;
            let r3 = char_to_rank(caps[4].chars().next().unwrap())?;
            let r4 = char_to_rank(caps[5].chars().next().unwrap())?;
            let suit1 = caps.get(3).map(|m| m.as_str().to_ascii_lowercase());
            let suit2 = caps.get(6).map(|m| m.as_str().to_ascii_lowercase());
            if suit1 != suit2 {
                return Err(SolverError::InvalidRange(format!(
                    "dash range endpoints disagree on suitedness: '{token}'"
                )));
            }
            return self.add_dash_range(token, r1, r2, r3, r4, suit1.as_deref(), weight);
        }

        let caps = TOKEN_REGEX
            .captures(body)
            .ok_or_else(|| SolverError::InvalidRange(format!("malformed token: '{token}'")))?;
        let high = char_to_rank(caps[1].chars().next().unwrap())?;
        let low = char_to_rank(caps[2].chars().next().unwrap())?;
        let suitedness = caps.get(3).map(|m| m.as_str().to_ascii_lowercase());
        let plus = caps.get(4).is_some();

        if high == low && suitedness.as_deref() == Some("s") {
            return Err(SolverError::InvalidRange(format!(
                "suited pairs do not exist: '{token}'"
            )));
        }
        let (high, low) = (high.max(low), high.min(low));

        match (high == low, plus) {
            // single pair, or "AAo" which is just the pair
            (true, false) => self.add_pair(high, weight),
            // pairs from `low` up to aces
            (true, true) => {
                for rank in (low..13).rev() {
                    self.add_pair(rank, weight);
                }
            }
            (false, false) => self.add_unpaired(high, low, suitedness.as_deref(), weight),
            // fixed high card, low card up to just below the high card
            (false, true) => {
                for rank in (low..high).rev() {
                    self.add_unpaired(high, rank, suitedness.as_deref(), weight);
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn add_dash_range(
        &mut self,
        token: &str,
        r1: u8,
        r2: u8,
        r3: u8,
        r4: u8,
        suitedness: Option<&str>,
        weight: f32,
    ) -> Result<(), SolverError> {
        if (r1 == r2) != (r3 == r4) {
            return Err(SolverError::InvalidRange(format!(
                "dash range mixes pairs and non-pairs: '{token}'"
            )));
        }

        if r1 == r2 {
            // pair range such as "QQ-99"
            let (hi, lo) = (r1.max(r3), r1.min(r3));
            for rank in (lo..=hi).rev() {
                self.add_pair(rank, weight);
            }
        } else if r1 == r3 {
            // same high card, e.g. "A5s-A2s"
            let (hi, lo) = (r2.max(r4), r2.min(r4));
            for rank in (lo..=hi).rev() {
                self.add_unpaired(r1, rank, suitedness, weight);
            }
        } else {
            // rank-gap preserving, e.g. "76s-54s"
            if r1 < r2 || r3 < r4 || r1.wrapping_sub(r2) != r3.wrapping_sub(r4) {
                return Err(SolverError::InvalidRange(format!(
                    "dash range endpoints have different rank gaps: '{token}'"
                )));
            }
            let gap = r1 - r2;
            let (hi, lo) = (r1.max(r3), r1.min(r3));
            for high in (lo..=hi).rev() {
                self.add_unpaired(high, high - gap, suitedness, weight);
            }
        }
        Ok(())
    }

    fn add_pair(&mut self, rank: u8, weight: f32) {
        for suit1 in 0..4u8 {
            for suit2 in (suit1 + 1)..4 {
                self.push(PreflopCombo::new((rank << 2) | suit1, (rank << 2) | suit2, weight));
            }
        }
    }

    fn add_unpaired(&mut self, high: u8, low: u8, suitedness: Option<&str>, weight: f32) {
        match suitedness {
            Some("s") => self.add_suited(high, low, weight),
            Some("o") => self.add_offsuit(high, low, weight),
            _ => {
                self.add_suited(high, low, weight);
                self.add_offsuit(high, low, weight);
            }
        }
    }

    fn add_suited(&mut self, high: u8, low: u8, weight: f32) {
        for suit in 0..4u8 {
            self.push(PreflopCombo::new((high << 2) | suit, (low << 2) | suit, weight));
        }
    }

    fn add_offsuit(&mut self, high: u8, low: u8, weight: f32) {
        for suit1 in 0..4u8 {
            for suit2 in 0..4u8 {
                if suit1 != suit2 {
                    self.push(PreflopCombo::new((high << 2) | suit1, (low << 2) | suit2, weight));
                }
            }
        }
    }

    fn push(&mut self, combo: PreflopCombo) {
        self.combos.push(combo);
    }
}

impl FromStr for Range {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Range::expand(s)
    }
}

/// Whether swapping `suit1` and `suit2` leaves a weighted combo multiset
/// unchanged.
pub(crate) fn suit_isomorphic(combos: &[PreflopCombo], suit1: u8, suit2: u8) -> bool {
    let swap = |card: Card| -> Card {
        let suit = card_suit(card);
        if suit == suit1 {
            card - suit1 + suit2
        } else if suit == suit2 {
            card + suit1 - suit2
        } else {
            card
        }
    };

    let mut weights = vec![0.0f32; 52 * 52];
    let mut swapped = vec![0.0f32; 52 * 52];

    for combo in combos {
        weights[combo.card1 as usize * 52 + combo.card2 as usize] += combo.probability;

        let (mut c1, mut c2) = (swap(combo.card1), swap(combo.card2));
        if c1 > c2 {
            std::mem::swap(&mut c1, &mut c2);
        }
        swapped[c1 as usize * 52 + c2 as usize] += combo.probability;
    }

    weights
        .iter()
        .zip(&swapped)
        .all(|(w, s)| (w - s).abs() <= 1e-6)
}
