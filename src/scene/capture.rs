use std::fs;
use std::path::Path;

use glam::Vec2;
use log::{info, warn};

use super::Scene;
use crate::color::Color;
use crate::error::SceneError;
use crate::gfx::{BlendFactor, BlendMode, GraphicsBackend};

impl Scene {
    /// Renders `[start, end)` at `fps` frames per second and writes every
    /// frame to `out_dir` as `frameNNNN.png`, creating the directory when
    /// needed. A progress bar is drawn over each frame after it is captured.
    /// Returns the number of frames written.
    pub fn render_sequence(
        &mut self,
        gfx: &mut dyn GraphicsBackend,
        start: u64,
        end: u64,
        fps: u32,
        out_dir: &Path,
    ) -> Result<usize, SceneError> {
        if fps == 0 {
            return Err(SceneError::InvalidFrameRate(fps));
        }
        if end < start {
            return Err(SceneError::InvalidTimeRange { start, end });
        }
        fs::create_dir_all(out_dir).map_err(|source| SceneError::OutputDir {
            path: out_dir.to_path_buf(),
            source,
        })?;

        warn!("sequence rendering is experimental and may keep the program busy for a while");

        let dt = u64::from((1000 / fps).max(1));
        let span = (end - start).max(1) as f32;
        let mut time = start;
        let mut frames = 0;

        while time < end {
            self.render(gfx, time);

            let path = out_dir.join(format!("frame{frames:04}.png"));
            gfx.screen_capture()
                .save(&path)
                .map_err(|source| SceneError::Capture {
                    path: path.clone(),
                    source,
                })?;

            draw_progress_bar(gfx, (time - start) as f32 / span);
            gfx.flip();

            time += dt;
            frames += 1;
        }

        info!("rendered {frames} frames into {}", out_dir.display());
        Ok(frames)
    }
}

fn draw_progress_bar(gfx: &mut dyn GraphicsBackend, progress: f32) {
    gfx.set_depth_test(false);
    gfx.set_lighting(false);
    gfx.set_blending(Some(BlendMode::new(
        BlendFactor::OneMinusDstColor,
        BlendFactor::Zero,
    )));
    gfx.draw_screen_quad(Vec2::new(0.0, 0.49), Vec2::new(progress, 0.51), Color::WHITE);
    gfx.set_blending(None);
    gfx.set_lighting(true);
    gfx.set_depth_test(true);
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use tempfile::tempdir;

    use super::*;
    use crate::gfx::SoftwareBackend;
    use crate::scene::Camera;

    #[test]
    fn writes_one_png_per_frame() {
        let dir = tempdir().expect("temp dir");
        let out = dir.path().join("frames");
        let mut scene = Scene::new();
        scene.add_camera(Camera::new("cam", Vec3::Z, Vec3::ZERO));
        let mut gfx = SoftwareBackend::new(16, 16);

        let frames = scene
            .render_sequence(&mut gfx, 0, 1000, 4, &out)
            .expect("sequence");
        assert_eq!(frames, 4);
        assert_eq!(gfx.frames_presented(), 4);
        for i in 0..4 {
            assert!(out.join(format!("frame{i:04}.png")).is_file());
        }
        assert!(!out.join("frame0004.png").exists());
    }

    #[test]
    fn rejects_bad_arguments() {
        let dir = tempdir().expect("temp dir");
        let mut scene = Scene::new();
        let mut gfx = SoftwareBackend::new(4, 4);
        assert!(matches!(
            scene.render_sequence(&mut gfx, 0, 100, 0, dir.path()),
            Err(SceneError::InvalidFrameRate(0))
        ));
        assert!(matches!(
            scene.render_sequence(&mut gfx, 100, 0, 25, dir.path()),
            Err(SceneError::InvalidTimeRange { .. })
        ));
    }

    #[test]
    fn progress_bar_inverts_the_middle_band() {
        let mut gfx = SoftwareBackend::new(100, 100);
        gfx.clear(Color::BLACK);
        draw_progress_bar(&mut gfx, 0.5);
        assert_eq!(gfx.color_at(10, 50).rgb_vec(), Vec3::ONE);
        assert_eq!(gfx.color_at(90, 50).rgb_vec(), Vec3::ZERO);
        assert_eq!(gfx.color_at(10, 10).rgb_vec(), Vec3::ZERO);
    }
}
