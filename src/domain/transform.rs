//! View transform and the pure coordinate mappings built on it
//!
//! Screen coordinates are pixels on the display surface. Document coordinates
//! are the background's own pixels at zoom 1 and no pan. Overlay positions are
//! always stored in document coordinates.

use super::geometry::{Point, ScaleRange};

/// Pan/zoom applied uniformly to the whole stage
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub zoom: f32,
    pub pan: Point,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        zoom: 1.0,
        pan: Point::ORIGIN,
    };

    pub fn new(zoom: f32, pan: Point) -> Self {
        Self { zoom, pan }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Zoom as a rounded percentage, e.g. `105` for 1.05
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round().max(0.0) as u32
    }
}

/// Map a screen point into document space: `(p - pan) / zoom`
pub fn screen_to_document(screen: Point, view: &ViewTransform) -> Point {
    (screen - view.pan) / view.zoom
}

/// Map a document point onto the screen: `p * zoom + pan`
pub fn document_to_screen(document: Point, view: &ViewTransform) -> Point {
    document * view.zoom + view.pan
}

/// Zoom by `factor` while keeping the document point under `pivot` fixed on screen.
///
/// The resulting zoom is clamped to `bounds`; the pan is then solved from the
/// clamped zoom so the anchor holds even when clamping kicks in.
pub fn zoom_around(
    pivot: Point,
    view: &ViewTransform,
    factor: f32,
    bounds: ScaleRange,
) -> ViewTransform {
    let anchor = screen_to_document(pivot, view);
    let zoom = bounds.clamp(view.zoom * factor);
    ViewTransform {
        zoom,
        pan: pivot - anchor * zoom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: ScaleRange = ScaleRange::new(0.3, 4.0);

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn test_round_trip_over_many_views() {
        let views = [
            ViewTransform::IDENTITY,
            ViewTransform::new(0.3, Point::new(-120.0, 45.5)),
            ViewTransform::new(2.75, Point::new(500.0, 500.0)),
            ViewTransform::new(4.0, Point::new(-3000.0, 12.25)),
        ];
        let points = [
            Point::ORIGIN,
            Point::new(100.0, 100.0),
            Point::new(-42.5, 799.0),
            Point::new(1234.0, -0.5),
        ];
        for view in &views {
            for &p in &points {
                let back = screen_to_document(document_to_screen(p, view), view);
                assert_close(back, p);
            }
        }
    }

    #[test]
    fn test_identity_is_noop() {
        let p = Point::new(17.0, 33.0);
        assert_eq!(screen_to_document(p, &ViewTransform::IDENTITY), p);
        assert_eq!(document_to_screen(p, &ViewTransform::IDENTITY), p);
    }

    #[test]
    fn test_zoom_around_keeps_pivot_anchored() {
        let view = ViewTransform::new(1.3, Point::new(40.0, -12.0));
        let pivot = Point::new(450.0, 320.0);
        let before = screen_to_document(pivot, &view);

        let zoomed = zoom_around(pivot, &view, 1.05, BOUNDS);
        assert!((zoomed.zoom - 1.365).abs() < 1e-4);
        assert_close(screen_to_document(pivot, &zoomed), before);

        let unzoomed = zoom_around(pivot, &zoomed, 1.0 / 1.05, BOUNDS);
        assert_close(screen_to_document(pivot, &unzoomed), before);
    }

    #[test]
    fn test_zoom_around_clamps_and_stays_anchored() {
        let pivot = Point::new(100.0, 100.0);
        let mut view = ViewTransform::IDENTITY;
        let before = screen_to_document(pivot, &view);
        for _ in 0..200 {
            view = zoom_around(pivot, &view, 1.05, BOUNDS);
            assert!(BOUNDS.contains(view.zoom));
        }
        assert_eq!(view.zoom, 4.0);
        assert_close(screen_to_document(pivot, &view), before);

        for _ in 0..400 {
            view = zoom_around(pivot, &view, 1.0 / 1.05, BOUNDS);
            assert!(BOUNDS.contains(view.zoom));
        }
        assert_eq!(view.zoom, 0.3);
        assert_close(screen_to_document(pivot, &view), before);
    }

    #[test]
    fn test_zoom_percent() {
        assert_eq!(ViewTransform::IDENTITY.zoom_percent(), 100);
        assert_eq!(ViewTransform::new(1.05, Point::ORIGIN).zoom_percent(), 105);
        assert_eq!(ViewTransform::new(0.3, Point::ORIGIN).zoom_percent(), 30);
    }
}
