//! Renderer

use photon_core::camera::*;
use photon_core::film::*;
use photon_core::geometry::*;
use photon_core::pbrt::*;
use photon_core::render_state::*;
use photon_core::rng::*;
use photon_core::scene::*;
use photon_core::shader::*;
use photon_core::spectrum::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::thread;

/// Settings of the tile renderer.
#[derive(Copy, Clone, Debug)]
pub struct RenderSettings {
    /// Number of worker threads.
    pub threads: usize,

    /// Tile edge length in pixels.
    pub tile_size: usize,

    /// Hide progress bars.
    pub quiet: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            threads: 1,
            tile_size: 16,
            quiet: true,
        }
    }
}

/// Render the scene. Lights are initialized first; as long as a light
/// requests it, full preparatory passes are rendered and discarded, each
/// followed by `post_init` on all lights. The final pass is returned.
///
/// * `scene`    - The scene.
/// * `camera`   - The camera.
/// * `settings` - Render settings.
pub fn render(scene: &dyn Scene, camera: &PinholeCamera, settings: &RenderSettings) -> Film {
    for light in scene.lights() {
        light.init(scene);
    }

    let mut pass = 0;
    while scene.take_repeat_first() {
        pass += 1;
        info!("Preparatory pass {}", pass);
        render_pass(scene, camera, settings, format!("Preparatory pass {pass}"));

        let mut again = false;
        for light in scene.lights() {
            again |= light.post_init(scene);
        }
        if again {
            scene.set_repeat_first();
        }
    }

    render_pass(scene, camera, settings, String::from("Rendering"))
}

/// Render one full pass over all tiles.
///
/// * `scene`    - The scene.
/// * `camera`   - The camera.
/// * `settings` - Render settings.
/// * `message`  - Progress message.
fn render_pass(scene: &dyn Scene, camera: &PinholeCamera, settings: &RenderSettings, message: String) -> Film {
    let (width, height) = camera.resolution();
    let film = Film::new(width, height);
    let tiles = film.tiles(settings.tile_size);
    let n_threads = settings.threads.max(1);

    let progress = create_progress_bar(tiles.len() as u64, settings.quiet);
    progress.set_message(message);

    thread::scope(|scope| {
        let (tx_worker, rx_worker) = crossbeam_channel::bounded::<FilmTile>(n_threads);

        for worker in 0..n_threads {
            let rx_worker = rx_worker.clone();
            let film = &film;
            let progress = &progress;
            scope.spawn(move || {
                let mut state = RenderState::new(RNG::new(worker as u64));
                for mut tile in rx_worker.iter() {
                    render_tile(scene, camera, &mut state, &mut tile, width);
                    film.merge_tile(&tile);
                    progress.inc(1);
                }
            });
        }
        drop(rx_worker);

        for tile in tiles {
            if tx_worker.send(tile).is_err() {
                warn!("Render workers stopped early");
                break;
            }
        }
    });

    progress.finish_and_clear();
    film
}

/// Shade every pixel of a tile.
///
/// * `scene`  - The scene.
/// * `camera` - The camera.
/// * `state`  - Worker render state.
/// * `tile`   - The tile.
/// * `width`  - Image width.
fn render_tile(scene: &dyn Scene, camera: &PinholeCamera, state: &mut RenderState, tile: &mut FilmTile, width: usize) {
    for ty in 0..tile.height {
        for tx in 0..tile.width {
            let (x, y) = (tile.x0 + tx, tile.y0 + ty);
            let ray = camera.generate_ray(x as Float + 0.5, y as Float + 0.5);
            state.start_pixel((y * width + x) as i64, ray.screen_pos);
            tile.pixels[ty * tile.width + tx] = shade(scene, state, &ray);
        }
    }
}

/// Returns the color seen along a camera ray.
///
/// * `scene` - The scene.
/// * `state` - Render state.
/// * `ray`   - Camera ray.
pub fn shade(scene: &dyn Scene, state: &mut RenderState, ray: &CameraRay) -> Spectrum {
    match scene.first_hit(state, &ray.origin, &ray.dir, false) {
        Some(sp) => {
            state.traveled = sp.z;
            let eye = -ray.dir;
            let n = face_forward(&sp.ng, &sp.n, &eye);
            scene.light(state, &sp, &ray.origin, false)
                + sp.shader.from_radiosity(state, &sp, &Energy::new(n, Spectrum::ZERO), &eye)
        }
        None => scene.background(&ray.dir, state, false),
    }
}

/// Returns a progress bar, hidden when `quiet`.
///
/// * `len`   - Number of steps.
/// * `quiet` - Hide the bar.
fn create_progress_bar(len: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {percent}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    progress.set_style(style);
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;
    use photon_core::light::*;
    use lights::*;
    use std::sync::Arc;

    /// Floor and ceiling facing each other with a point light in between,
    /// seen from below the ceiling.
    fn room(path: PathLight) -> (SimpleScene, PinholeCamera, Arc<PathLight>) {
        let mut scene = SimpleScene::new(Spectrum::ZERO);
        let shader: ArcShader = Arc::new(DiffuseShader::new(Spectrum::new(0.7), Spectrum::ZERO));
        scene.add(
            Shape::Quad {
                corner: Point3f::new(-10.0, -10.0, 0.0),
                edge_u: Vector3f::new(20.0, 0.0, 0.0),
                edge_v: Vector3f::new(0.0, 20.0, 0.0),
            },
            ObjectProperties::default(),
            Arc::clone(&shader),
        );
        scene.add(
            Shape::Quad {
                corner: Point3f::new(-10.0, -10.0, 2.0),
                edge_u: Vector3f::new(0.0, 20.0, 0.0),
                edge_v: Vector3f::new(20.0, 0.0, 0.0),
            },
            ObjectProperties::default(),
            shader,
        );
        scene.add_light(Arc::new(PointLight::new(Point3f::new(0.0, 0.0, 1.0), Spectrum::ONE, 4.0, true)));

        let camera = PinholeCamera::new(
            Point3f::new(0.0, 0.0, 1.9),
            Point3f::ORIGIN,
            Vector3f::new(0.0, 1.0, 0.0),
            60.0,
            8,
            8,
        );
        scene.set_camera(camera.world_resolution(), camera.aspect_ratio());

        let path = Arc::new(path);
        scene.add_light(Arc::clone(&path) as ArcLight);
        (scene, camera, path)
    }

    #[test]
    fn misses_show_background() {
        let scene = SimpleScene::new(Spectrum::new(0.25));
        let mut state = RenderState::new(RNG::new(0));
        let ray = CameraRay {
            origin: Point3f::ORIGIN,
            dir: Vector3f::Z_AXIS,
            screen_pos: Point2f::new(0.0, 0.0),
        };
        assert_eq!(shade(&scene, &mut state, &ray), Spectrum::new(0.25));
    }

    #[test]
    fn uncached_render_is_lit() {
        let options = PathLightOptions {
            samples: 4,
            depth: 1,
            ..PathLightOptions::default()
        };
        let path = PathLight::new(options, &CacheRegistry::default()).unwrap();
        let (scene, camera, _) = room(path);
        let settings = RenderSettings {
            threads: 2,
            tile_size: 4,
            quiet: true,
        };

        let film = render(&scene, &camera, &settings);
        let pixels = film.pixels();
        assert_eq!(pixels.len(), 64);
        assert!(pixels.iter().all(|p| !p.has_nans() && !p.is_black()));
    }

    #[test]
    fn cached_render_fills_then_interpolates() {
        let options = PathLightOptions {
            samples: 4,
            depth: 1,
            cache: true,
            cache_size: 0.05,
            shadow_threshold: 0.3,
            search: 9,
            max_refinement: 1,
            ..PathLightOptions::default()
        };
        let path = PathLight::new(options, &CacheRegistry::default()).unwrap();
        let (scene, camera, path) = room(path);
        let settings = RenderSettings {
            threads: 2,
            tile_size: 4,
            quiet: true,
        };

        let film = render(&scene, &camera, &settings);
        let cache = path.light_cache().unwrap();
        assert!(cache.ready());
        assert!(cache.size() > 0);
        assert!(!scene.take_repeat_first());
        assert!(film.pixels().iter().all(|p| !p.has_nans() && !p.is_black()));
    }
}
