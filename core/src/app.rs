//! Application related stuff

use crate::error::{Error, Result};
use crate::pbrt::*;
use clap::Parser;

/// Command line options of the renderer.
#[derive(Parser, Clone, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Options {
    /// Number of threads to use for rendering.
    #[clap(
        long = "nthreads",
        short = 't',
        value_name = "NUM",
        default_value_t = 0,
        help = "Use specified number of threads for rendering (0 = all logical CPUs)."
    )]
    n_threads: usize,

    /// Automatically reduce a number of quality settings to render more quickly.
    #[clap(
        long = "quick",
        help = "Automatically reduce a number of quality settings to render more quickly."
    )]
    pub quick_render: bool,

    /// Suppress all text output other than error messages.
    #[clap(long, help = "Suppress all text output other than error messages.")]
    pub quiet: bool,

    /// Path to the image file.
    #[clap(
        long = "outfile",
        short = 'o',
        value_name = "FILE",
        default_value = "render.png",
        help = "Write the final image to the given filename."
    )]
    pub image_file: String,

    /// Tile size.
    #[clap(
        long = "tilesize",
        short = 'p',
        value_name = "NUM",
        default_value_t = 16,
        help = "Size in pixels of square tiles rendered per thread."
    )]
    pub tile_size: usize,

    /// Image width.
    #[clap(long, value_name = "PIXELS", default_value_t = 256, help = "Image width in pixels.")]
    pub width: usize,

    /// Image height.
    #[clap(long, value_name = "PIXELS", default_value_t = 256, help = "Image height in pixels.")]
    pub height: usize,

    /// Hemisphere samples per shading point.
    #[clap(long, value_name = "NUM", default_value_t = 16, help = "Path light hemisphere samples.")]
    pub samples: Int,

    /// Photons shot by the global photon light; 0 disables photon mapping.
    #[clap(long, value_name = "NUM", default_value_t = 50000, help = "Global photons to shoot (0 disables).")]
    pub photons: Int,

    /// Use the irradiance cache.
    #[clap(long, help = "Cache irradiance and interpolate between cached samples.")]
    pub cache: bool,

    /// Use quasi-Monte Carlo sampling.
    #[clap(long = "qmc", help = "Use Halton sequences instead of jittered sampling.")]
    pub use_qmc: bool,

    /// Render ambient occlusion instead of full global illumination.
    #[clap(long, help = "Render ambient occlusion instead of full global illumination.")]
    pub occlusion: bool,
}

impl Options {
    /// Returns the number of threads to use.
    pub fn threads(&self) -> usize {
        let max_threads = num_cpus::get();
        match self.n_threads {
            0 => max_threads,
            n if n > max_threads => {
                warn!("Num threads > max logical CPUs {}", max_threads);
                max_threads
            }
            n => n,
        }
    }

    /// Validates the options, applying `--quick` reductions.
    pub fn validate(mut self) -> Result<Self> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidParameter {
                name: String::from("resolution"),
                reason: format!("{}x{} has no pixels", self.width, self.height),
            });
        }
        if self.tile_size == 0 {
            return Err(Error::InvalidParameter {
                name: String::from("tilesize"),
                reason: String::from("must be at least 1"),
            });
        }
        if self.quick_render {
            self.width = max(1, self.width / 4);
            self.height = max(1, self.height / 4);
            self.samples = max(1, self.samples / 4);
            self.photons /= 4;
        }
        Ok(self)
    }
}
