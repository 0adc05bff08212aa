//! 68-point facial landmarks (iBUG 300-W layout).
//!
//! Index groups:
//! - 0-16 jaw
//! - 17-21 right eyebrow, 22-26 left eyebrow
//! - 27-30 nose bridge, 31-35 nose base
//! - 36-41 right eye, 42-47 left eye
//! - 48-59 outer lip, 60-67 inner lip

use std::ops::Range;

use thiserror::Error;

pub const LANDMARK_COUNT: usize = 68;

pub const JAW: Range<usize> = 0..17;
pub const RIGHT_EYEBROW: Range<usize> = 17..22;
pub const LEFT_EYEBROW: Range<usize> = 22..27;
pub const NOSE_BRIDGE: Range<usize> = 27..31;
pub const NOSE_BASE: Range<usize> = 31..36;
pub const RIGHT_EYE: Range<usize> = 36..42;
pub const LEFT_EYE: Range<usize> = 42..48;
pub const OUTER_LIP: Range<usize> = 48..60;
pub const INNER_LIP: Range<usize> = 60..68;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("expected {LANDMARK_COUNT} landmarks, got {0}")]
    Count(usize),
}

/// Exactly 68 integer `(x, y)` pixel coordinates.
///
/// Values are immutable; transforms return a new set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LandmarkSet {
    points: [(i32, i32); LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [(i32, i32); LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(i32, i32); LANDMARK_COUNT] {
        &self.points
    }

    pub fn point(&self, index: usize) -> (i32, i32) {
        self.points[index]
    }

    pub fn group(&self, range: Range<usize>) -> &[(i32, i32)] {
        &self.points[range]
    }

    /// Applies `f` to every point, producing a new set.
    pub fn map_points(&self, mut f: impl FnMut((i32, i32)) -> (i32, i32)) -> LandmarkSet {
        let mut points = self.points;
        for p in points.iter_mut() {
            *p = f(*p);
        }
        LandmarkSet { points }
    }

    /// Smallest x over `range`.
    pub fn min_x(&self, range: Range<usize>) -> i32 {
        self.points[range].iter().map(|p| p.0).min().unwrap_or(0)
    }

    /// Largest x over `range`.
    pub fn max_x(&self, range: Range<usize>) -> i32 {
        self.points[range].iter().map(|p| p.0).max().unwrap_or(0)
    }

    /// Largest y over `range`.
    pub fn max_y(&self, range: Range<usize>) -> i32 {
        self.points[range].iter().map(|p| p.1).max().unwrap_or(0)
    }
}

impl TryFrom<Vec<(i32, i32)>> for LandmarkSet {
    type Error = LandmarkError;

    fn try_from(points: Vec<(i32, i32)>) -> Result<Self, Self::Error> {
        let count = points.len();
        let points: [(i32, i32); LANDMARK_COUNT] =
            points.try_into().map_err(|_| LandmarkError::Count(count))?;
        Ok(Self { points })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn indexed_landmarks() -> LandmarkSet {
        let mut pts = [(0, 0); LANDMARK_COUNT];
        for (i, p) in pts.iter_mut().enumerate() {
            *p = (i as i32, 100 + i as i32);
        }
        LandmarkSet::new(pts)
    }

    #[test]
    fn test_groups_cover_all_points_once() {
        let groups = [
            JAW,
            RIGHT_EYEBROW,
            LEFT_EYEBROW,
            NOSE_BRIDGE,
            NOSE_BASE,
            RIGHT_EYE,
            LEFT_EYE,
            OUTER_LIP,
            INNER_LIP,
        ];
        let total: usize = groups.iter().map(|g| g.len()).sum();
        assert_eq!(total, LANDMARK_COUNT);
        for pair in groups.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_try_from_exact_count() {
        let pts: Vec<(i32, i32)> = (0..68).map(|i| (i, i)).collect();
        let set = LandmarkSet::try_from(pts).unwrap();
        assert_eq!(set.point(67), (67, 67));
    }

    #[rstest]
    #[case::empty(0)]
    #[case::five_point(5)]
    #[case::too_many(69)]
    fn test_try_from_wrong_count(#[case] n: usize) {
        let pts = vec![(1, 1); n];
        assert_eq!(LandmarkSet::try_from(pts), Err(LandmarkError::Count(n)));
    }

    #[test]
    fn test_extent_helpers() {
        let set = indexed_landmarks();
        assert_eq!(set.min_x(0..4), 0);
        assert_eq!(set.max_x(12..16), 15);
        assert_eq!(set.max_y(6..10), 109);
    }

    #[test]
    fn test_map_points_returns_new_set() {
        let set = indexed_landmarks();
        let shifted = set.map_points(|(x, y)| (x + 1, y - 1));
        assert_eq!(shifted.point(0), (1, 99));
        assert_eq!(set.point(0), (0, 100));
    }

    #[test]
    fn test_group_slices() {
        let set = indexed_landmarks();
        assert_eq!(set.group(RIGHT_EYE).len(), 6);
        assert_eq!(set.group(INNER_LIP)[0], (60, 160));
    }
}
