#[macro_use]
extern crate log;

use clap::Parser;
use photon_core::app::*;
use photon_core::error::*;
use integrators::*;

mod demo;

fn main() {
    // Initialize `env_logger`.
    env_logger::init();

    let options = match Options::parse().validate() {
        Ok(options) => options,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&options) {
        error!("{e}");
        std::process::exit(1);
    }
}

/// Render the demo scene and write the image.
///
/// * `options` - Command line options.
fn run(options: &Options) -> Result<()> {
    let (scene, camera) = demo::cornell_box(options)?;
    let settings = RenderSettings {
        threads: options.threads(),
        tile_size: options.tile_size,
        quiet: options.quiet,
    };
    info!(
        "Rendering {}x{} with {} threads",
        options.width, options.height, settings.threads
    );

    let film = render(&scene, &camera, &settings);
    film.write_image(&options.image_file)
}
