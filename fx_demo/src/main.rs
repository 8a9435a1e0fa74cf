//! Headless scene effects demo
//!
//! Computes one frame of cascaded shadow projections for a scattered scene,
//! then simulates a few seconds of explosions and logs what happens.
//!
//! Usage: `fx_demo [explosion.toml|explosion.ron]`
//! Run with `RUST_LOG=debug` to see the per-split and per-explosion output.

use rand::Rng;
use scene_fx::config::Config;
use scene_fx::foundation::logging;
use scene_fx::foundation::math::{Mat4, Mat4Ext, Vec3};
use scene_fx::particles::{ExplosionConfig, ExplosionSystem};
use scene_fx::render::shadow::{parallel_split_projections, ShadowConfig, SplitCamera};
use scene_fx::render::Light;
use scene_fx::scene::SceneObject;

const SCENE_OBJECTS: usize = 64;
const SCENE_SPREAD: f32 = 40.0;
const FRAME_TIME: f32 = 1.0 / 60.0;
const SIMULATED_SECONDS: f32 = 6.0;
const EXPLOSION_PERIOD: f32 = 1.5;

fn build_scene() -> Vec<SceneObject> {
    let mut rng = rand::thread_rng();
    (0..SCENE_OBJECTS)
        .map(|i| {
            let position = Vec3::new(
                rng.gen_range(-SCENE_SPREAD..SCENE_SPREAD),
                rng.gen_range(0.0..4.0),
                rng.gen_range(-SCENE_SPREAD..SCENE_SPREAD),
            );
            let object = SceneObject::new(position, rng.gen_range(0.5..2.0));
            // every eighth object is hidden and must not affect the shadow boxes
            if i % 8 == 0 {
                object.with_visible(false)
            } else {
                object
            }
        })
        .collect()
}

fn run_shadows() -> Result<(), Box<dyn std::error::Error>> {
    let objects = build_scene();
    let light = Light::directional(Vec3::new(-0.4, -1.0, -0.3), Vec3::new(1.0, 0.95, 0.9), 1.0);
    let camera = SplitCamera {
        view: Mat4::look_at(Vec3::new(0.0, 12.0, 30.0), Vec3::zeros(), Vec3::y()),
        fov_y: 60.0_f32.to_radians(),
        aspect: 16.0 / 9.0,
        near: 0.5,
        far: 120.0,
    };

    let cascades = parallel_split_projections(&objects, &light, &camera, &ShadowConfig::default())?;
    for (index, split) in cascades.splits.iter().enumerate() {
        let size = split.bounds.size();
        log::info!(
            "Cascade {}: depth [{:.2}, {:.2}), light box {:.1} x {:.1} x {:.1}, {} casters",
            index,
            split.near,
            split.far,
            size.x,
            size.y,
            size.z,
            split.caster_count
        );
    }

    let uniforms = cascades.to_uniforms();
    log::info!(
        "Cascade uniforms: {} splits, {} bytes",
        uniforms.split_count,
        std::mem::size_of_val(&uniforms)
    );
    Ok(())
}

fn load_explosion_config() -> Result<ExplosionConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading explosion settings from {}", path);
            Ok(ExplosionConfig::load_from_file(&path)?)
        }
        None => Ok(ExplosionConfig::default()),
    }
}

fn run_explosions() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_explosion_config()?;
    let mut explosions = ExplosionSystem::new(2000, config)?;

    let mut rng = rand::thread_rng();
    let mut elapsed = 0.0;
    let mut next_explosion = 0.0;
    let mut next_report = 0.0;

    while elapsed < SIMULATED_SECONDS {
        if elapsed >= next_explosion {
            let position = Vec3::new(rng.gen_range(-10.0..10.0), rng.gen_range(-5.0..5.0), 0.0);
            explosions.show_explosion(position, rng.gen_range(0.5..2.0));
            next_explosion += EXPLOSION_PERIOD;
        }

        explosions.update(FRAME_TIME);
        elapsed += FRAME_TIME;

        if elapsed >= next_report {
            log::info!(
                "t = {:.1}s: {} live particles, {} dropped",
                elapsed,
                explosions.particles().active_count(),
                explosions.particles().dropped_spawns()
            );
            next_report += 1.0;
        }
    }

    let instances = explosions.instances();
    log::info!("Final frame uploads {} particle instances", instances.len());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_default_filter("info");

    log::info!("Computing shadow cascades...");
    run_shadows()?;

    log::info!("Simulating explosions...");
    run_explosions()?;

    log::info!("Demo complete");
    Ok(())
}
