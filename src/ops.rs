use std::{
    fmt::{Debug, Formatter},
    ops::Sub,
};

use chrono::{DateTime, Utc};
use serde::Serialize;

pub type Interval<Tz = Utc> = RangeExclusive<DateTime<Tz>>;

#[must_use]
#[derive(Copy, Clone, Eq, PartialEq, Serialize)]
pub struct RangeExclusive<T: Copy> {
    pub start: T,
    pub end: T,
}

impl<T: Copy + Debug> Debug for RangeExclusive<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl<T: Copy + Sub> RangeExclusive<T> {
    #[must_use]
    pub fn len(self) -> <T as Sub>::Output {
        self.end - self.start
    }
}

impl<T: Copy + PartialOrd> RangeExclusive<T> {
    #[must_use]
    pub fn contains(self, other: T) -> bool {
        (self.start <= other) && (other < self.end)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[test]
    fn test_contains_excludes_end() {
        let interval = RangeExclusive { start: 1, end: 3 };
        assert!(interval.contains(1));
        assert!(interval.contains(2));
        assert!(!interval.contains(3));
    }

    #[test]
    fn test_len_ok() {
        let start = DateTime::<Utc>::UNIX_EPOCH;
        let interval = Interval { start, end: start + TimeDelta::hours(24) };
        assert_eq!(interval.len(), TimeDelta::hours(24));
    }
}
