//! Renders a small test scene and saves it in PPM format.
//!
//! Run with: cargo run --release --example render_scene -- [config.json] [out.ppm]

use anyhow::{Context, Result};
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use umbra_renderer::{
    render, Camera, Color, EnvironmentMap, Film, Material, Primitive, RenderConfig, Scene,
    Triangle, Vec3,
};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

fn load_config(path: Option<&String>) -> Result<RenderConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", path))
        }
        None => Ok(RenderConfig::default()),
    }
}

/// Sky gradient: bright towards +z, dim below the horizon.
fn sky(width: usize, height: usize) -> Result<EnvironmentMap> {
    let mut texels = Vec::with_capacity(width * height * 3);
    for row in 0..height {
        let v = (row as f32 + 0.5) / height as f32;
        let up = (1.0 - 2.0 * v).max(0.0);
        for _ in 0..width {
            texels.extend_from_slice(&[0.3 + 0.4 * up, 0.4 + 0.5 * up, 0.6 + 0.8 * up]);
        }
    }
    Ok(EnvironmentMap::new(width, height, texels)?)
}

fn build_scene() -> Result<Scene> {
    let floor = Arc::new(Material::diffuse(Color::new(0.6, 0.6, 0.55)));
    let red = Arc::new(Material::new(Color::new(0.6, 0.1, 0.1), Color::splat(0.2), 80.0));
    let glass = Arc::new(
        Material::new(Color::ZERO, Color::splat(0.05), 2000.0)
            .with_transmission(Color::new(0.9, 0.95, 0.9), 1.5),
    );
    let metal = Arc::new(Material::new(Color::splat(0.05), Color::new(0.9, 0.7, 0.4), 300.0));
    let lamp = Arc::new(Material::light(Color::splat(12.0)));

    let quad = |a: Vec3, b: Vec3, c: Vec3, d: Vec3, material: &Arc<Material>| {
        [
            Primitive::triangle(Triangle::new(a, b, c), material.clone()),
            Primitive::triangle(Triangle::new(a, c, d), material.clone()),
        ]
    };

    let mut primitives = Vec::new();
    primitives.extend(quad(
        Vec3::new(-6.0, -6.0, 0.0),
        Vec3::new(6.0, -6.0, 0.0),
        Vec3::new(6.0, 6.0, 0.0),
        Vec3::new(-6.0, 6.0, 0.0),
        &floor,
    ));
    primitives.push(Primitive::sphere(Vec3::new(-1.2, 0.0, 1.0), 1.0, glass));
    primitives.push(
        Primitive::sphere(Vec3::new(1.3, 0.5, 0.7), 0.7, red)
            .with_motion(Vec3::new(1.45, 0.5, 0.7), Vec3::new(1.6, 0.5, 0.7)),
    );
    primitives.push(Primitive::cuboid(Vec3::new(-0.4, 1.8, 0.0), Vec3::new(0.8, 0.8, 1.6), metal.clone()));
    primitives.push(Primitive::cylinder(Vec3::new(2.5, 2.5, 0.0), Vec3::new(0.0, 0.0, 2.0), 0.35, metal));
    primitives.extend(quad(
        Vec3::new(-0.5, -0.5, 4.0),
        Vec3::new(-0.5, 0.5, 4.0),
        Vec3::new(0.5, 0.5, 4.0),
        Vec3::new(0.5, -0.5, 4.0),
        &lamp,
    ));
    primitives.push(Primitive::environment(Vec3::ZERO, 100.0, Arc::new(sky(64, 32)?)));

    Ok(Scene::new(primitives)?)
}

fn write_ppm(film: &Film, path: &str) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path))?;
    let mut out = BufWriter::new(file);
    write!(out, "P6\n{} {}\n255\n", film.width(), film.height())?;
    for rgba in film.to_rgba().chunks_exact(4) {
        out.write_all(&rgba[..3])?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let config = load_config(args.get(1))?;
    let output = args.get(2).map(String::as_str).unwrap_or("umbra.ppm");

    let scene = build_scene()?;
    log::info!("Scene bounds: {:?}", scene.bounding_box());

    let camera = Camera::look_at(
        Vec3::new(0.0, -7.0, 2.5),
        Vec3::new(0.0, 0.0, 0.8),
        Vec3::Z,
        0.45,
        WIDTH,
        HEIGHT,
    );
    let film = render(&scene, &camera, &config)?;
    write_ppm(&film, output)?;

    log::info!("Wrote {}", output);
    Ok(())
}
