//! Year values and navigation direction

use crate::{Error, Result};
use std::fmt;

/// A displayable portfolio year
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Year(pub u16);

impl Year {
    /// Returns the numeric value
    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for Year {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

/// Direction of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Towards a greater year
    Forward,
    /// Towards a lesser year
    Back,
}

impl Direction {
    /// Both directions, forward first
    pub const ALL: [Direction; 2] = [Direction::Forward, Direction::Back];

    /// Name used in asset file names
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Back => "back",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed range of navigable years; `min <= max` always holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RangeBounds", into = "RangeBounds"))]
pub struct YearRange {
    min: Year,
    max: Year,
}

/// Wire form of a range, validated on the way in
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RangeBounds {
    min: u16,
    max: u16,
}

#[cfg(feature = "serde")]
impl TryFrom<RangeBounds> for YearRange {
    type Error = Error;

    fn try_from(bounds: RangeBounds) -> Result<Self> {
        YearRange::new(bounds.min, bounds.max)
    }
}

#[cfg(feature = "serde")]
impl From<YearRange> for RangeBounds {
    fn from(range: YearRange) -> Self {
        Self {
            min: range.min.0,
            max: range.max.0,
        }
    }
}

impl YearRange {
    /// Creates a new range, rejecting `min > max`
    pub fn new(min: u16, max: u16) -> Result<Self> {
        if min > max {
            return Err(Error::InvalidRange { min, max });
        }
        Ok(Self {
            min: Year(min),
            max: Year(max),
        })
    }

    pub fn min(&self) -> Year {
        self.min
    }

    pub fn max(&self) -> Year {
        self.max
    }

    /// Checks if the year lies inside the range
    pub fn contains(&self, year: Year) -> bool {
        year >= self.min && year <= self.max
    }

    /// Validates a year against the range
    pub fn check(&self, year: Year) -> Result<Year> {
        if self.contains(year) {
            Ok(year)
        } else {
            Err(Error::YearOutOfRange {
                year: year.0,
                min: self.min.0,
                max: self.max.0,
            })
        }
    }

    /// Returns the adjacent year in the given direction, if it is in range
    pub fn step(&self, year: Year, direction: Direction) -> Option<Year> {
        let next = match direction {
            Direction::Forward => year.0.checked_add(1)?,
            Direction::Back => year.0.checked_sub(1)?,
        };
        let next = Year(next);
        self.contains(next).then_some(next)
    }

    /// Direction needed to move from `from` towards `to`, `None` when equal
    pub fn direction_between(from: Year, to: Year) -> Option<Direction> {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Some(Direction::Forward),
            std::cmp::Ordering::Less => Some(Direction::Back),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Iterates all years in ascending order
    pub fn years(&self) -> impl Iterator<Item = Year> {
        (self.min.0..=self.max.0).map(Year)
    }

    /// Number of years in the range
    pub fn len(&self) -> usize {
        usize::from(self.max.0.saturating_sub(self.min.0)) + usize::from(!self.is_empty())
    }

    /// Never true for a range built through `new`
    pub fn is_empty(&self) -> bool {
        self.max < self.min
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            min: Year(2023),
            max: Year(2026),
        }
    }
}
