// Copyright 2020 TwoCookingMice

use genoise::core::scene_loader::{LoadOverrides, load_scene_from_file_with};
use genoise::io::exr_utils;
use genoise::renderers::simple::{Renderer, SimpleRenderer};

use std::env;

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <scene.xml> <output.exr> [--spp N] [--max-depth N] [--seed N] [--camera N]", args[0]);
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let mut overrides = LoadOverrides::default();
    let mut seed: u64 = 0;
    let mut camera_id: usize = 0;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--spp" => {
                i += 1;
                overrides.samples_per_pixel = args.get(i).and_then(|v| v.parse().ok());
            }
            "--max-depth" => {
                i += 1;
                overrides.max_depth = args.get(i).and_then(|v| v.parse().ok());
            }
            "--seed" => {
                i += 1;
                seed = args.get(i).and_then(|v| v.parse().ok()).unwrap_or(0);
            }
            "--camera" => {
                i += 1;
                camera_id = args.get(i).and_then(|v| v.parse().ok()).unwrap_or(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let load_result = match load_scene_from_file_with(input_path, overrides) {
        Ok(result) => result,
        Err(e) => {
            log::error!("Failed to load {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    let mut scene = load_result.scene;
    let renderer = SimpleRenderer::new(load_result.integrator, camera_id, seed);
    let image = renderer.render(&mut scene);

    if let Err(e) = exr_utils::write_exr_to_file(&image, output_path) {
        log::error!("Failed to write {}: {}", output_path, e);
        std::process::exit(1);
    }
}
