//! Human-like cursor paths

use crate::driver::Point;
use rand::Rng;

/// Number of points sampled along a path.
pub const PATH_POINTS: usize = 10;

/// Quadratic Bézier from `from` to `to`, sampled at t = 0.1, 0.2 … 1.0.
///
/// The control point is the midpoint shifted by a uniform offset within
/// ±distance/3 on each axis. The last point is always exactly `to`.
pub fn bezier_path<R: Rng + ?Sized>(from: Point, to: Point, rng: &mut R) -> Vec<Point> {
    let spread = from.distance(to) / 3.0;
    let (ox, oy) = if spread > 0.0 {
        (rng.gen_range(-spread..=spread), rng.gen_range(-spread..=spread))
    } else {
        (0.0, 0.0)
    };

    let (x0, y0) = (from.x as f64, from.y as f64);
    let (x2, y2) = (to.x as f64, to.y as f64);
    let cx = (x0 + x2) / 2.0 + ox;
    let cy = (y0 + y2) / 2.0 + oy;

    let mut points: Vec<Point> = (1..=PATH_POINTS)
        .map(|i| {
            let t = i as f64 / PATH_POINTS as f64;
            let u = 1.0 - t;
            let x = u * u * x0 + 2.0 * u * t * cx + t * t * x2;
            let y = u * u * y0 + 2.0 * u * t * cy + t * t * y2;
            Point::new(x.round() as i32, y.round() as i32)
        })
        .collect();

    if let Some(last) = points.last_mut() {
        *last = to;
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn path_ends_on_target() {
        let mut rng = StdRng::seed_from_u64(7);
        let path = bezier_path(Point::new(0, 0), Point::new(300, 200), &mut rng);
        assert_eq!(path.len(), PATH_POINTS);
        assert_eq!(*path.last().unwrap(), Point::new(300, 200));
    }

    #[test]
    fn control_offset_stays_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        let from = Point::new(0, 0);
        let to = Point::new(90, 0);
        for _ in 0..50 {
            let path = bezier_path(from, to, &mut rng);
            // Midpoint of a quadratic curve sits halfway to the control point
            let mid = path[4];
            assert!(mid.y.abs() <= 15 + 1, "{:?}", mid);
        }
    }

    #[test]
    fn zero_distance_path_is_stationary() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = Point::new(40, 40);
        assert!(bezier_path(p, p, &mut rng).iter().all(|q| *q == p));
    }
}
