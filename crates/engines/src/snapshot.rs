//! PNG output of rendered scenes.
//!
//! This module is feature-gated behind `png` (default on) so that builds
//! which only need raw pixels do not pull in the `image` crate. Drawing
//! itself lives in [`crate::raster`] (always available).

use physlets_core::{EngineError, Scene};
use std::path::Path;

use crate::raster::{rasterize, Frame};

/// Writes a rasterized frame as a PNG image.
///
/// Returns `EngineError::InvalidDimensions` if the frame dimensions overflow
/// `u32`, or `EngineError::Io` on write failure.
pub fn write_frame_png(frame: &Frame, path: &Path) -> Result<(), EngineError> {
    let w = u32::try_from(frame.width()).map_err(|_| EngineError::InvalidDimensions)?;
    let h = u32::try_from(frame.height()).map_err(|_| EngineError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, frame.data().to_vec())
        .ok_or_else(|| EngineError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path)
        .map_err(|e| EngineError::Io(format!("{}: {e}", path.display())))
}

/// Rasterizes `scene` and writes it as a PNG image.
pub fn write_png(scene: &Scene, path: &Path) -> Result<(), EngineError> {
    write_frame_png(&rasterize(scene)?, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::tone_rgba;
    use physlets_core::{DVec2, Tone};

    #[test]
    fn write_png_round_trip() {
        let mut scene = Scene::new(16, 12);
        scene.disc(DVec2::new(8.0, 6.0), 3.0, Tone::Body);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.png");

        write_png(&scene, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.width(), 16);
        assert_eq!(img.height(), 12);
        assert_eq!(img.get_pixel(8, 6).0, tone_rgba(Tone::Body));
        assert_eq!(img.get_pixel(0, 0).0, tone_rgba(Tone::Background));
    }

    #[test]
    fn write_png_reports_unwritable_path() {
        let scene = Scene::new(4, 4);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.png");
        let err = write_png(&scene, &path).unwrap_err();
        assert!(matches!(err, EngineError::Io(ref m) if m.contains("out.png")));
    }

    #[test]
    fn write_png_rejects_empty_scene_size() {
        let scene = Scene::new(0, 4);
        let dir = tempfile::tempdir().unwrap();
        let err = write_png(&scene, &dir.path().join("x.png")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDimensions));
    }
}
