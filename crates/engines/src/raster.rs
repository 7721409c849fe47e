//! CPU rasterizer that turns a [`Scene`] into an RGBA8 pixel buffer.
//!
//! Always available (no feature gate) so the `png` snapshot path and any
//! other backend that wants raw pixels share the same drawing code. Shapes
//! are drawn in scene order without anti-aliasing; anything outside the
//! frame is clipped.

use physlets_core::{DVec2, EngineError, Renderer, Scene, Shape, Tone};

/// RGBA colour for each semantic tone.
pub fn tone_rgba(tone: Tone) -> [u8; 4] {
    match tone {
        Tone::Background => [17, 17, 17, 255],
        Tone::Body => [255, 99, 71, 255],
        Tone::Secondary => [70, 130, 180, 255],
        Tone::Pivot => [220, 220, 220, 255],
        Tone::Attract => [0, 200, 0, 255],
        Tone::Repel => [220, 0, 0, 255],
        Tone::Trail => [120, 120, 200, 255],
        Tone::Force => [255, 215, 0, 255],
        Tone::Velocity => [0, 255, 255, 255],
        Tone::Fluid => [40, 80, 140, 255],
    }
}

/// An RGBA8 image, row-major, four bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Frame {
    /// A frame filled with the background tone.
    ///
    /// Returns `EngineError::InvalidDimensions` if either side is zero or the
    /// byte count overflows.
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or(EngineError::InvalidDimensions)?;
        let pixels = tone_rgba(Tone::Background)
            .into_iter()
            .cycle()
            .take(len)
            .collect();
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw RGBA bytes, `width * height * 4` long.
    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_data(self) -> Vec<u8> {
        self.pixels
    }

    /// Colour at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.pixels[i..i + 4]);
        Some(out)
    }

    fn plot(&mut self, x: i64, y: i64, rgba: [u8; 4]) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y * self.width + x) * 4;
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }

    /// Pixel index range covering `[lo, hi]` clipped to `0..limit`.
    fn span(lo: f64, hi: f64, limit: usize) -> std::ops::Range<i64> {
        let start = lo.floor().max(0.0) as i64;
        let end = (hi.ceil() + 1.0).min(limit as f64) as i64;
        start..end.max(start)
    }

    fn fill_disc(&mut self, center: DVec2, radius: f64, rgba: [u8; 4]) {
        let r2 = radius * radius;
        for y in Self::span(center.y - radius, center.y + radius, self.height) {
            for x in Self::span(center.x - radius, center.x + radius, self.width) {
                let d = DVec2::new(x as f64 + 0.5, y as f64 + 0.5) - center;
                if d.length_squared() <= r2 {
                    self.plot(x, y, rgba);
                }
            }
        }
    }

    fn stroke_ring(&mut self, center: DVec2, radius: f64, rgba: [u8; 4]) {
        let outer = radius + 1.0;
        for y in Self::span(center.y - outer, center.y + outer, self.height) {
            for x in Self::span(center.x - outer, center.x + outer, self.width) {
                let d = DVec2::new(x as f64 + 0.5, y as f64 + 0.5) - center;
                if (d.length() - radius).abs() <= 0.75 {
                    self.plot(x, y, rgba);
                }
            }
        }
    }

    fn fill_rect(&mut self, min: DVec2, size: DVec2, rgba: [u8; 4]) {
        let max = min + size;
        for y in Self::span(min.y, max.y - 1.0, self.height) {
            for x in Self::span(min.x, max.x - 1.0, self.width) {
                self.plot(x, y, rgba);
            }
        }
    }

    /// One-pixel line by uniform stepping along the longer axis.
    fn stroke_segment(&mut self, from: DVec2, to: DVec2, rgba: [u8; 4]) {
        let delta = to - from;
        // Clipping keeps a runaway coordinate from turning into billions of steps.
        let limit = (self.width + self.height) as f64 * 4.0;
        let steps = delta.x.abs().max(delta.y.abs()).ceil().min(limit) as usize;
        if steps == 0 {
            self.plot(from.x.floor() as i64, from.y.floor() as i64, rgba);
            return;
        }
        for i in 0..=steps {
            let p = from + delta * (i as f64 / steps as f64);
            self.plot(p.x.floor() as i64, p.y.floor() as i64, rgba);
        }
    }

    /// Draws one shape on top of what is already there.
    pub fn draw(&mut self, shape: &Shape) {
        if !shape_is_finite(shape) {
            return;
        }
        let rgba = tone_rgba(shape.tone());
        match shape {
            Shape::Disc { center, radius, .. } => self.fill_disc(*center, *radius, rgba),
            Shape::Ring { center, radius, .. } => self.stroke_ring(*center, *radius, rgba),
            Shape::Rect { min, size, .. } => self.fill_rect(*min, *size, rgba),
            Shape::Segment { from, to, .. } => self.stroke_segment(*from, *to, rgba),
            Shape::Polyline { points, .. } => {
                for pair in points.windows(2) {
                    self.stroke_segment(pair[0], pair[1], rgba);
                }
            }
        }
    }
}

fn shape_is_finite(shape: &Shape) -> bool {
    match shape {
        Shape::Disc { center, radius, .. } | Shape::Ring { center, radius, .. } => {
            center.is_finite() && radius.is_finite()
        }
        Shape::Rect { min, size, .. } => min.is_finite() && size.is_finite(),
        Shape::Segment { from, to, .. } => from.is_finite() && to.is_finite(),
        Shape::Polyline { points, .. } => points.iter().all(|p| p.is_finite()),
    }
}

/// Rasterizes every shape of `scene` over a background-filled frame.
pub fn rasterize(scene: &Scene) -> Result<Frame, EngineError> {
    let mut frame = Frame::new(scene.width, scene.height)?;
    for shape in &scene.shapes {
        frame.draw(shape);
    }
    Ok(frame)
}

/// [`Renderer`] that rasterizes each frame and keeps the most recent one.
#[derive(Debug, Default)]
pub struct RasterRenderer {
    last: Option<Frame>,
    frames: u64,
}

impl RasterRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last frame rendered, if any.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    pub fn into_last_frame(self) -> Option<Frame> {
        self.last
    }

    /// Number of frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for RasterRenderer {
    fn render(&mut self, scene: &Scene) -> Result<(), EngineError> {
        self.last = Some(rasterize(scene)?);
        self.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physlets_core::Driver;

    const BG: [u8; 4] = [17, 17, 17, 255];

    #[test]
    fn frame_new_rejects_zero_dimensions() {
        assert!(matches!(Frame::new(0, 4), Err(EngineError::InvalidDimensions)));
        assert!(matches!(Frame::new(4, 0), Err(EngineError::InvalidDimensions)));
    }

    #[test]
    fn frame_starts_as_background() {
        let frame = Frame::new(8, 4).unwrap();
        assert_eq!(frame.data().len(), 8 * 4 * 4);
        assert!(frame.data().chunks(4).all(|px| px == BG));
    }

    #[test]
    fn pixel_outside_frame_is_none() {
        let frame = Frame::new(2, 2).unwrap();
        assert!(frame.pixel(2, 0).is_none());
        assert!(frame.pixel(0, 2).is_none());
        assert_eq!(frame.pixel(1, 1), Some(BG));
    }

    #[test]
    fn every_tone_is_opaque_and_distinct() {
        let tones = [
            Tone::Background,
            Tone::Body,
            Tone::Secondary,
            Tone::Pivot,
            Tone::Attract,
            Tone::Repel,
            Tone::Trail,
            Tone::Force,
            Tone::Velocity,
            Tone::Fluid,
        ];
        for (i, a) in tones.iter().enumerate() {
            assert_eq!(tone_rgba(*a)[3], 255);
            for b in &tones[i + 1..] {
                assert_ne!(tone_rgba(*a), tone_rgba(*b), "{a:?} vs {b:?}");
            }
        }
    }

    // ---- Shapes ----

    #[test]
    fn disc_fills_center_not_corners() {
        let mut scene = Scene::new(21, 21);
        scene.disc(DVec2::new(10.5, 10.5), 5.0, Tone::Body);
        let frame = rasterize(&scene).unwrap();
        assert_eq!(frame.pixel(10, 10), Some(tone_rgba(Tone::Body)));
        assert_eq!(frame.pixel(14, 10), Some(tone_rgba(Tone::Body)));
        assert_eq!(frame.pixel(0, 0), Some(BG));
        assert_eq!(frame.pixel(15, 15), Some(BG));
    }

    #[test]
    fn ring_leaves_its_middle_empty() {
        let mut scene = Scene::new(41, 41);
        scene.push(Shape::Ring {
            center: DVec2::new(20.5, 20.5),
            radius: 10.0,
            tone: Tone::Attract,
        });
        let frame = rasterize(&scene).unwrap();
        assert_eq!(frame.pixel(20, 20), Some(BG));
        assert_eq!(frame.pixel(30, 20), Some(tone_rgba(Tone::Attract)));
    }

    #[test]
    fn rect_covers_exactly_its_size() {
        let mut scene = Scene::new(10, 10);
        scene.push(Shape::Rect {
            min: DVec2::new(2.0, 3.0),
            size: DVec2::new(4.0, 2.0),
            tone: Tone::Secondary,
        });
        let frame = rasterize(&scene).unwrap();
        let painted = frame
            .data()
            .chunks(4)
            .filter(|px| *px == tone_rgba(Tone::Secondary))
            .count();
        assert_eq!(painted, 8);
        assert_eq!(frame.pixel(2, 3), Some(tone_rgba(Tone::Secondary)));
        assert_eq!(frame.pixel(5, 4), Some(tone_rgba(Tone::Secondary)));
        assert_eq!(frame.pixel(6, 4), Some(BG));
    }

    #[test]
    fn segment_touches_both_endpoints() {
        let mut scene = Scene::new(16, 16);
        scene.segment(DVec2::new(1.0, 1.0), DVec2::new(12.0, 7.0), Tone::Pivot);
        let frame = rasterize(&scene).unwrap();
        assert_eq!(frame.pixel(1, 1), Some(tone_rgba(Tone::Pivot)));
        assert_eq!(frame.pixel(12, 7), Some(tone_rgba(Tone::Pivot)));
    }

    #[test]
    fn polyline_draws_each_leg() {
        let mut scene = Scene::new(16, 16);
        scene.polyline(
            [DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0), DVec2::new(10.0, 10.0)],
            Tone::Trail,
        );
        let frame = rasterize(&scene).unwrap();
        assert_eq!(frame.pixel(5, 0), Some(tone_rgba(Tone::Trail)));
        assert_eq!(frame.pixel(10, 5), Some(tone_rgba(Tone::Trail)));
    }

    #[test]
    fn later_shapes_paint_over_earlier_ones() {
        let mut scene = Scene::new(10, 10);
        scene.disc(DVec2::new(5.0, 5.0), 3.0, Tone::Body);
        scene.disc(DVec2::new(5.0, 5.0), 1.5, Tone::Pivot);
        let frame = rasterize(&scene).unwrap();
        assert_eq!(frame.pixel(4, 4), Some(tone_rgba(Tone::Pivot)));
    }

    #[test]
    fn off_frame_and_non_finite_shapes_are_clipped() {
        let mut scene = Scene::new(8, 8);
        scene.disc(DVec2::new(-100.0, -100.0), 5.0, Tone::Body);
        scene.disc(DVec2::new(f64::NAN, 2.0), 5.0, Tone::Body);
        scene.segment(DVec2::new(-1e12, 0.0), DVec2::new(1e12, 0.0), Tone::Force);
        let frame = rasterize(&scene).unwrap();
        assert_eq!(frame.data().len(), 8 * 8 * 4);
        assert!(frame.data().chunks(4).all(|px| px != tone_rgba(Tone::Body)));
    }

    // ---- Renderer ----

    #[test]
    fn raster_renderer_keeps_last_frame() {
        let mut engine = crate::EngineKind::from_name("pendulum", 64, 48, 1, &serde_json::json!({})).unwrap();
        let mut renderer = RasterRenderer::new();
        assert!(renderer.last_frame().is_none());
        let mut driver = Driver::default();
        driver.run(&mut engine, &mut renderer, 3).unwrap();
        assert_eq!(renderer.frames(), 3);
        let frame = renderer.last_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (64, 48));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_disc_keeps_buffer_size(
                x in -1e4_f64..1e4,
                y in -1e4_f64..1e4,
                r in 0.0_f64..200.0,
            ) {
                let mut scene = Scene::new(32, 24);
                scene.disc(DVec2::new(x, y), r, Tone::Body);
                let frame = rasterize(&scene).unwrap();
                prop_assert_eq!(frame.data().len(), 32 * 24 * 4);
            }
        }
    }
}
