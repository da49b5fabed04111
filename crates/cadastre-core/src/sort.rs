//! Multi-key view sorting
//!
//! A [`SortKey`] is an ordered list of rules applied left to right, stopping
//! at the first rule that tells two records apart. Sorting is always stable,
//! so records that compare equal under every rule keep their load order.

use crate::record::UnitRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Rank of the ground floor in numeric floor comparisons.
pub const GROUND_FLOOR_RANK: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "direction", rename_all = "snake_case")]
pub enum SortRule {
    /// Street number, numeric.
    StreetNumber(Direction),
    /// Floor, numeric, with the ground floor ranked just below floor 0.
    Floor(Direction),
    /// Door label, lexicographic.
    Door(Direction),
    /// Stair key, numeric.
    Stair(Direction),
    /// Block key, numeric.
    Block(Direction),
    Kind(Direction),
    Area(Direction),
}

impl SortRule {
    pub fn compare(&self, a: &UnitRecord, b: &UnitRecord) -> Ordering {
        match *self {
            SortRule::StreetNumber(dir) => dir.apply(
                parse_leading_int(&a.street_number).cmp(&parse_leading_int(&b.street_number)),
            ),
            SortRule::Floor(dir) => dir.apply(floor_rank(&a.floor).cmp(&floor_rank(&b.floor))),
            SortRule::Door(dir) => dir.apply(a.door.cmp(&b.door)),
            SortRule::Stair(dir) => {
                dir.apply(parse_leading_int(&a.stair).cmp(&parse_leading_int(&b.stair)))
            }
            SortRule::Block(dir) => {
                dir.apply(parse_leading_int(&a.block).cmp(&parse_leading_int(&b.block)))
            }
            SortRule::Kind(dir) => dir.apply(a.kind.cmp(&b.kind)),
            SortRule::Area(dir) => dir.apply(a.built_area.total_cmp(&b.built_area)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortKey {
    rules: Vec<SortRule>,
}

impl SortKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule that only applies when all earlier rules tie.
    pub fn then(mut self, rule: SortRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// The order used by the unit list, shift-click ranges and the printed
    /// table: street number, floor (ground first), door, stair, block.
    pub fn canonical() -> Self {
        Self::new()
            .then(SortRule::StreetNumber(Direction::Ascending))
            .then(SortRule::Floor(Direction::Ascending))
            .then(SortRule::Door(Direction::Ascending))
            .then(SortRule::Stair(Direction::Ascending))
            .then(SortRule::Block(Direction::Ascending))
    }

    pub fn rules(&self) -> &[SortRule] {
        &self.rules
    }

    pub fn compare(&self, a: &UnitRecord, b: &UnitRecord) -> Ordering {
        self.rules
            .iter()
            .map(|rule| rule.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Sort records into a new sequence. The input is left untouched.
pub fn sort<'a>(records: &'a [UnitRecord], key: &SortKey) -> Vec<&'a UnitRecord> {
    let mut sorted: Vec<&UnitRecord> = records.iter().collect();
    sorted.sort_by(|a, b| key.compare(a, b));
    sorted
}

/// Integer prefix of a string, `parseInt` style: "2A" is 2, "" and "x" are 0.
pub fn parse_leading_int(value: &str) -> i64 {
    let value = value.trim_start();
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };

    let mut result: i64 = 0;
    for byte in digits.bytes().take_while(u8::is_ascii_digit) {
        result = result
            .saturating_mul(10)
            .saturating_add(i64::from(byte - b'0'));
    }

    if negative {
        -result
    } else {
        result
    }
}

/// Numeric floor rank; the ground-floor token ranks as [`GROUND_FLOOR_RANK`].
pub fn floor_rank(floor: &str) -> i64 {
    if floor
        .trim()
        .eq_ignore_ascii_case(crate::record::GROUND_FLOOR_TOKEN)
    {
        GROUND_FLOOR_RANK
    } else {
        parse_leading_int(floor)
    }
}
