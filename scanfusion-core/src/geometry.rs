//! Rectangles in named coordinate spaces and the sensor/view transform
//!
//! Camera sensors report landscape-native dimensions while the preview is
//! laid out in portrait, so the transform pairs the view's width with the
//! frame's height and the view's height with the frame's width.

use crate::constants::{DEGENERATE_SCALE, MAX_PIXEL_EDGE};
use core::fmt;
use core::marker::PhantomData;
use serde::{Deserialize, Serialize};

/// Frame (sensor) pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sensor;

/// Coordinates local to a decode crop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decode;

/// On-screen preview coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct View;

/// Axis-aligned rectangle in coordinate space `S`
///
/// Edges are normalized on construction so `left <= right` and
/// `top <= bottom` always hold.
#[derive(Serialize, Deserialize)]
#[serde(bound = "", from = "RectEdges", into = "RectEdges")]
pub struct Rect<S> {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    space: PhantomData<S>,
}

/// Serialized form of a [`Rect`]; the space is carried by the type only
#[derive(Serialize, Deserialize)]
struct RectEdges {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl<S> From<RectEdges> for Rect<S> {
    fn from(e: RectEdges) -> Self {
        Rect::new(e.left, e.top, e.right, e.bottom)
    }
}

impl<S> From<Rect<S>> for RectEdges {
    fn from(r: Rect<S>) -> Self {
        RectEdges {
            left: r.left,
            top: r.top,
            right: r.right,
            bottom: r.bottom,
        }
    }
}

// Manual impls so the marker type needs no bounds.
impl<S> Clone for Rect<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Rect<S> {}

impl<S> PartialEq for Rect<S> {
    fn eq(&self, other: &Self) -> bool {
        self.left == other.left
            && self.top == other.top
            && self.right == other.right
            && self.bottom == other.bottom
    }
}

impl<S> fmt::Debug for Rect<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect<{}>({}, {}, {}, {})",
            core::any::type_name::<S>().rsplit("::").next().unwrap_or("?"),
            self.left,
            self.top,
            self.right,
            self.bottom
        )
    }
}

impl<S> Rect<S> {
    /// Build a rectangle from its edges, swapping inverted pairs
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
            space: PhantomData,
        }
    }

    /// Build a rectangle from an origin and a size
    pub fn from_origin(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    /// Left edge
    pub fn left(&self) -> f32 {
        self.left
    }

    /// Top edge
    pub fn top(&self) -> f32 {
        self.top
    }

    /// Right edge
    pub fn right(&self) -> f32 {
        self.right
    }

    /// Bottom edge
    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    /// Horizontal extent
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Vertical extent
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Whether the rectangle has zero area
    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Whether `other` lies entirely inside `self` (edges inclusive)
    ///
    /// Empty rectangles neither contain nor are contained.
    pub fn contains(&self, other: &Rect<S>) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    /// Whether the two rectangles share any area
    pub fn intersects(&self, other: &Rect<S>) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Integer pixel window `(left, top, width, height)`, edges rounded
    ///
    /// Edges are clamped to `±MAX_PIXEL_EDGE` and NaN becomes 0, so the
    /// result is always representable; a window that cannot fit any image is
    /// then rejected when the crop is taken.
    pub fn to_pixel_window(&self) -> PixelWindow {
        let left = pixel_edge(self.left);
        let top = pixel_edge(self.top);
        PixelWindow {
            left,
            top,
            width: pixel_edge(self.right) - left,
            height: pixel_edge(self.bottom) - top,
        }
    }

    fn scaled<T>(&self, sx: f32, sy: f32) -> Rect<T> {
        Rect::new(
            self.left * sx,
            self.top * sy,
            self.right * sx,
            self.bottom * sy,
        )
    }
}

fn pixel_edge(edge: f32) -> i64 {
    if edge.is_nan() {
        return 0;
    }
    edge.round().clamp(-MAX_PIXEL_EDGE, MAX_PIXEL_EDGE) as i64
}

/// Integer crop window in pixel units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelWindow {
    /// Left column
    pub left: i64,
    /// Top row
    pub top: i64,
    /// Width in pixels
    pub width: i64,
    /// Height in pixels
    pub height: i64,
}

/// Size of the preview view in display units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewSize {
    /// Display width
    pub width: f32,
    /// Display height
    pub height: f32,
}

impl ViewSize {
    /// Create a view size
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Scale factors between a frame and the view it is previewed in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    scale_x: f32,
    scale_y: f32,
    inv_scale_x: f32,
    inv_scale_y: f32,
}

impl ViewTransform {
    /// Compute the transform for a `frame_width x frame_height` frame shown in `view`
    ///
    /// `scale_x = view.width / frame_height`, `scale_y = view.height / frame_width`.
    /// Any axis with a zero (not yet laid out) or non-finite side falls back
    /// to a scale of 1.0 in both directions.
    pub fn new(frame_width: usize, frame_height: usize, view: ViewSize) -> Self {
        let (scale_x, inv_scale_x) = ratio_pair(view.width, frame_height as f32);
        let (scale_y, inv_scale_y) = ratio_pair(view.height, frame_width as f32);
        Self {
            scale_x,
            scale_y,
            inv_scale_x,
            inv_scale_y,
        }
    }

    /// Identity transform
    pub fn identity() -> Self {
        Self {
            scale_x: DEGENERATE_SCALE,
            scale_y: DEGENERATE_SCALE,
            inv_scale_x: DEGENERATE_SCALE,
            inv_scale_y: DEGENERATE_SCALE,
        }
    }

    /// Horizontal sensor-to-view factor
    pub fn scale_x(&self) -> f32 {
        self.scale_x
    }

    /// Vertical sensor-to-view factor
    pub fn scale_y(&self) -> f32 {
        self.scale_y
    }

    /// Map a sensor-space rectangle into view space
    pub fn sensor_to_view(&self, rect: &Rect<Sensor>) -> Rect<View> {
        rect.scaled(self.scale_x, self.scale_y)
    }

    /// Map a view-space rectangle into sensor space
    pub fn view_to_sensor(&self, rect: &Rect<View>) -> Rect<Sensor> {
        rect.scaled(self.inv_scale_x, self.inv_scale_y)
    }
}

/// `(num / den, den / num)`, or `(1, 1)` when either side is degenerate
fn ratio_pair(num: f32, den: f32) -> (f32, f32) {
    if num > 0.0 && den > 0.0 && num.is_finite() && den.is_finite() {
        (num / den, den / num)
    } else {
        (DEGENERATE_SCALE, DEGENERATE_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-3 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_new_normalizes_edges() {
        let r: Rect<View> = Rect::new(10.0, 40.0, 0.0, 20.0);
        assert_eq!(r.left(), 0.0);
        assert_eq!(r.top(), 20.0);
        assert_eq!(r.right(), 10.0);
        assert_eq!(r.bottom(), 40.0);
    }

    #[test]
    fn test_contains_is_strict_containment() {
        let window: Rect<View> = Rect::new(100.0, 100.0, 300.0, 300.0);
        assert!(window.contains(&Rect::new(150.0, 150.0, 250.0, 250.0)));
        assert!(window.contains(&window));
        // Straddles the right edge: intersects but is not contained.
        let straddling = Rect::new(250.0, 150.0, 350.0, 250.0);
        assert!(window.intersects(&straddling));
        assert!(!window.contains(&straddling));
        assert!(!window.contains(&Rect::new(400.0, 400.0, 500.0, 500.0)));
    }

    #[test]
    fn test_scales_swap_axes() {
        // 640x480 landscape sensor shown in a 960x1280 portrait view.
        let t = ViewTransform::new(640, 480, ViewSize::new(960.0, 1280.0));
        assert!(approx(t.scale_x(), 2.0));
        assert!(approx(t.scale_y(), 2.0));

        let t = ViewTransform::new(1280, 720, ViewSize::new(1080.0, 1920.0));
        assert!(approx(t.scale_x(), 1.5));
        assert!(approx(t.scale_y(), 1.5));

        let boxed: Rect<Sensor> = Rect::new(10.0, 20.0, 30.0, 40.0);
        let view = t.sensor_to_view(&boxed);
        assert!(approx(view.left(), 15.0));
        assert!(approx(view.bottom(), 60.0));
    }

    #[test]
    fn test_round_trip_through_sensor() {
        let t = ViewTransform::new(1920, 1080, ViewSize::new(1080.0, 2340.0));
        let window: Rect<View> = Rect::new(140.0, 770.0, 940.0, 1570.0);
        let back = t.sensor_to_view(&t.view_to_sensor(&window));
        assert!(approx(back.left(), window.left()));
        assert!(approx(back.top(), window.top()));
        assert!(approx(back.right(), window.right()));
        assert!(approx(back.bottom(), window.bottom()));
    }

    #[test]
    fn test_unlaid_view_is_degenerate_identity() {
        let t = ViewTransform::new(640, 480, ViewSize::new(0.0, 0.0));
        assert_eq!(t, ViewTransform::identity());
        let r: Rect<View> = Rect::new(1.0, 2.0, 3.0, 4.0);
        let s = t.view_to_sensor(&r);
        assert_eq!((s.left(), s.top(), s.right(), s.bottom()), (1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn test_pixel_window_rounds_edges() {
        let r: Rect<Sensor> = Rect::new(10.4, 20.6, 110.5, 70.2);
        assert_eq!(
            r.to_pixel_window(),
            PixelWindow {
                left: 10,
                top: 21,
                width: 101,
                height: 49
            }
        );
    }

    #[test]
    fn test_pixel_window_saturates_extreme_edges() {
        let r: Rect<Sensor> = Rect::new(-1e19, 0.0, 100.0, 100.0);
        let w = r.to_pixel_window();
        assert_eq!(w.left, -(MAX_PIXEL_EDGE as i64));
        assert_eq!(w.width, 100 + MAX_PIXEL_EDGE as i64);

        let r: Rect<Sensor> = Rect::new(0.0, 0.0, f32::INFINITY, f32::MAX);
        let w = r.to_pixel_window();
        assert_eq!((w.width, w.height), (MAX_PIXEL_EDGE as i64, MAX_PIXEL_EDGE as i64));
    }

    #[test]
    fn test_rect_deserialize_normalizes() {
        let r: Rect<Sensor> =
            serde_json::from_str(r#"{"left":5.0,"top":9.0,"right":1.0,"bottom":2.0}"#).unwrap();
        assert_eq!((r.left(), r.top(), r.right(), r.bottom()), (1.0, 2.0, 5.0, 9.0));
    }

    #[test]
    fn test_rect_serde_has_no_space_field() {
        let r: Rect<View> = Rect::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"left":1.0,"top":2.0,"right":3.0,"bottom":4.0}"#);
        let back: Rect<View> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
