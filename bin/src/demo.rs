//! Demo Scene

use photon_core::app::*;
use photon_core::camera::*;
use photon_core::error::*;
use photon_core::geometry::*;
use photon_core::light::*;
use photon_core::paramset::*;
use photon_core::scene::*;
use photon_core::shader::*;
use photon_core::spectrum::*;
use integrators::*;
use lights::*;
use std::sync::Arc;

/// Returns a Cornell style box with a diffuse and a glass sphere, lit by a
/// point light below the ceiling, and a camera looking into it.
///
/// * `options` - Command line options.
pub fn cornell_box(options: &Options) -> Result<(SimpleScene, PinholeCamera)> {
    let mut scene = SimpleScene::new(Spectrum::ZERO);

    let white: ArcShader = Arc::new(DiffuseShader::new(Spectrum::new(0.75), Spectrum::ZERO));
    let red: ArcShader = Arc::new(DiffuseShader::new(Spectrum::from_rgb(0.75, 0.15, 0.15), Spectrum::ZERO));
    let green: ArcShader = Arc::new(DiffuseShader::new(Spectrum::from_rgb(0.15, 0.75, 0.15), Spectrum::ZERO));
    let glass: ArcShader = Arc::new(DiffuseShader::new(Spectrum::new(0.02), Spectrum::ZERO));

    let walls = [
        // Floor.
        (Point3f::new(-1.0, 0.0, -1.0), Vector3f::new(0.0, 0.0, 2.0), Vector3f::new(2.0, 0.0, 0.0), &white),
        // Ceiling.
        (Point3f::new(-1.0, 2.0, -1.0), Vector3f::new(2.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, 2.0), &white),
        // Back.
        (Point3f::new(-1.0, 0.0, -1.0), Vector3f::new(2.0, 0.0, 0.0), Vector3f::new(0.0, 2.0, 0.0), &white),
        // Left.
        (Point3f::new(-1.0, 0.0, -1.0), Vector3f::new(0.0, 2.0, 0.0), Vector3f::new(0.0, 0.0, 2.0), &red),
        // Right.
        (Point3f::new(1.0, 0.0, -1.0), Vector3f::new(0.0, 0.0, 2.0), Vector3f::new(0.0, 2.0, 0.0), &green),
    ];
    for (corner, edge_u, edge_v, shader) in walls {
        scene.add(
            Shape::Quad { corner, edge_u, edge_v },
            ObjectProperties::default(),
            Arc::clone(shader),
        );
    }

    scene.add(
        Shape::Sphere {
            center: Point3f::new(-0.4, 0.4, -0.3),
            radius: 0.4,
        },
        ObjectProperties::default(),
        white,
    );
    scene.add(
        Shape::Sphere {
            center: Point3f::new(0.45, 0.35, 0.3),
            radius: 0.35,
        },
        ObjectProperties {
            receive_radiosity: false,
            caustic: Some(Caustic {
                reflect: Spectrum::ONE,
                transmit: Spectrum::new(0.95),
                ior: 1.5,
            }),
            ..ObjectProperties::default()
        },
        glass,
    );

    scene.add_light(Arc::new(PointLight::new(
        Point3f::new(0.0, 1.9, 0.0),
        Spectrum::ONE,
        3.0,
        true,
    )));

    // The photon pre-pass must be initialized before the path light reads
    // its maps.
    if options.photons > 0 {
        let mut params = ParamSet::new();
        params.add_int("photons", &[options.photons]);
        params.add_float("radius", &[0.2]);
        scene.add_light(Arc::new(GlobalPhotonLight::from(&params)));
    }

    let mut params = ParamSet::new();
    params.add_int("samples", &[options.samples]);
    params.add_int("depth", &[if options.photons > 0 { 1 } else { 3 }]);
    params.add_bool("use_QMC", &[options.use_qmc]);
    params.add_bool("cache", &[options.cache]);
    if options.occlusion {
        params.add_str("mode", "occlusion");
    }
    let path = PathLight::try_from((&params, CacheRegistry::global()))?;
    scene.add_light(Arc::new(path) as ArcLight);

    let camera = PinholeCamera::new(
        Point3f::new(0.0, 1.0, 3.5),
        Point3f::new(0.0, 1.0, 0.0),
        Vector3f::new(0.0, 1.0, 0.0),
        45.0,
        options.width,
        options.height,
    );
    scene.set_camera(camera.world_resolution(), camera.aspect_ratio());

    Ok((scene, camera))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn photon_light_precedes_path_light() {
        let options = Options::parse_from(["photon-gi", "--width", "32", "--height", "24", "--photons", "100"]);
        let (scene, camera) = cornell_box(&options).unwrap();
        assert_eq!(scene.lights().len(), 3);
        assert!(scene.lights()[2].use_in_render() && !scene.lights()[2].use_in_indirect());
        assert_eq!(camera.resolution(), (32, 24));
        assert_eq!(scene.aspect_ratio(), camera.aspect_ratio());
    }

    #[test]
    fn photons_can_be_disabled() {
        let options = Options::parse_from(["photon-gi", "--photons", "0"]);
        let (scene, _) = cornell_box(&options).unwrap();
        assert_eq!(scene.lights().len(), 2);
    }
}
