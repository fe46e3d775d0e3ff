/// A Dataset is a set of named {x,y} series that are meant to be drawn together.  The series may
/// have been sampled at different x values; after construction every series has exactly one point
/// for every x value that occurs in any series, so that they can be stacked.
///
/// Gaps are filled forward: the value at x is the value of the latest real point at or before x.
/// Before its first real point a series has the value 0.
///
/// Optionally the series can first be "minimized", see `Dataset::minimized`.
use itertools::Itertools;
use std::collections::BTreeMap;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<K: Ord> {
    series: BTreeMap<K, Vec<Point>>,
    xs: Vec<f64>,
}

impl<K: Ord> Dataset<K> {
    /// Align the series on the union of their x values.

    pub fn new(series: BTreeMap<K, Vec<Point>>) -> Dataset<K> {
        let mut ds = Dataset { series, xs: vec![] };
        ds.fill();
        ds
    }

    /// Minimize every series, then align them.  With `discretize`, x values are rounded to the
    /// nearest integer first.

    pub fn minimized(mut series: BTreeMap<K, Vec<Point>>, discretize: bool) -> Dataset<K> {
        for points in series.values_mut() {
            *points = minimize_series(std::mem::take(points), discretize);
        }
        Dataset::new(series)
    }

    pub fn get(&self) -> &BTreeMap<K, Vec<Point>> {
        &self.series
    }

    pub fn series(&self, key: &K) -> Option<&[Point]> {
        self.series.get(key).map(|v| v.as_slice())
    }

    /// The shared x values, ascending.

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    fn fill(&mut self) {
        self.xs = self
            .series
            .values()
            .flat_map(|points| points.iter().map(|p| p.x))
            .sorted_by(f64::total_cmp)
            .dedup()
            .collect::<Vec<f64>>();

        for points in self.series.values_mut() {
            points.sort_by(|a, b| a.x.total_cmp(&b.x));
            *points = forward_fill(points, &self.xs, Point::new(0.0, 0.0), |p| p.x, |p, x| {
                Point::new(x, p.y)
            });
        }
    }
}

/// Resample a time-ordered sequence onto `grid`.
///
/// The grid and the items are walked in lockstep.  At every grid point, all items at or before the
/// point are consumed and the last of them becomes the current value; the current value, moved to
/// the grid point, is emitted.  Before the first item the current value is `initial`.
///
/// The output has exactly one element per grid point, with the grid point's position.

pub fn forward_fill<T, X, M>(items: &[T], grid: &[f64], initial: T, pos: X, move_to: M) -> Vec<T>
where
    T: Copy,
    X: Fn(&T) -> f64,
    M: Fn(&T, f64) -> T,
{
    let mut filled = Vec::with_capacity(grid.len());
    let mut current = initial;
    let mut next = items.iter().peekable();
    for &x in grid {
        while let Some(item) = next.next_if(|item| pos(*item) <= x) {
            current = *item;
        }
        filled.push(move_to(&current, x));
    }
    filled
}

// Retain a point only if *both* its x and its y differ from the previously retained point.  This
// keeps every point whose value is unchanged but which has a new x, and every point with a repeated
// x but a new value, so in practice it removes little.  It is the historical behavior of the charts
// and is kept as-is.

fn minimize_series(mut points: Vec<Point>, discretize: bool) -> Vec<Point> {
    points.sort_by(|a, b| a.x.total_cmp(&b.x));
    let mut prev: Option<Point> = None;
    let mut retained = vec![];
    for p in points {
        let x = if discretize { p.x.round() } else { p.x };
        let keep = match prev {
            None => true,
            Some(q) => q.x != x && q.y != p.y,
        };
        if keep {
            let p = Point::new(x, p.y);
            prev = Some(p);
            retained.push(p);
        }
    }
    retained
}

#[cfg(test)]
fn pts(v: &[(f64, f64)]) -> Vec<Point> {
    v.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

#[test]
fn test_fill_aligns_series() {
    let mut m = BTreeMap::new();
    m.insert("a", pts(&[(1.0, 10.0), (3.0, 30.0)]));
    m.insert("b", pts(&[(2.0, 5.0)]));
    m.insert("c", vec![]);
    let ds = Dataset::new(m);
    assert_eq!(ds.xs(), &[1.0, 2.0, 3.0]);
    assert_eq!(ds.series(&"a").unwrap(), pts(&[(1.0, 10.0), (2.0, 10.0), (3.0, 30.0)]));
    assert_eq!(ds.series(&"b").unwrap(), pts(&[(1.0, 0.0), (2.0, 5.0), (3.0, 5.0)]));
    assert_eq!(ds.series(&"c").unwrap(), pts(&[(1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]));
}

#[test]
fn test_fill_takes_latest_point() {
    let mut m = BTreeMap::new();
    m.insert(0, pts(&[(1.0, 1.0), (1.5, 2.0), (1.7, 3.0), (4.0, 4.0)]));
    m.insert(1, pts(&[(2.0, 0.0), (4.0, 1.0)]));
    let ds = Dataset::new(m);
    assert_eq!(ds.xs(), &[1.0, 1.5, 1.7, 2.0, 4.0]);
    assert_eq!(
        ds.series(&1).unwrap(),
        pts(&[(1.0, 0.0), (1.5, 0.0), (1.7, 0.0), (2.0, 0.0), (4.0, 1.0)])
    );
}

#[test]
fn test_minimize_is_conjunctive() {
    let v = pts(&[(0.0, 1.0), (1.0, 1.0), (1.0, 2.0), (2.0, 3.0), (2.4, 4.0)]);
    // (1,1): same y, dropped.  (1,2): new y but x=1 != 0, kept.  (2,3) kept.  (2.4,4) kept.
    assert_eq!(
        minimize_series(v.clone(), false),
        pts(&[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0), (2.4, 4.0)])
    );
    // Rounded, 2.4 collides with 2 and is dropped.
    assert_eq!(
        minimize_series(v, true),
        pts(&[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)])
    );
}

#[test]
fn test_minimized_dataset() {
    let mut m = BTreeMap::new();
    m.insert("a", pts(&[(0.0, 1.0), (1.0, 1.0), (2.0, 2.0)]));
    let ds = Dataset::minimized(m, false);
    assert_eq!(ds.xs(), &[0.0, 2.0]);
    assert_eq!(ds.series(&"a").unwrap(), pts(&[(0.0, 1.0), (2.0, 2.0)]));
}
