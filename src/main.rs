use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use log::info;

use scenefx::{load_scene, Scene, SoftwareBackend, TextureManager};

const USAGE: &str = "Usage: scenefx <scene.xml> [--out DIR] [--start MS] [--end MS] [--fps N] \
                     [--size WxH] [--summary-only]";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let mut textures = TextureManager::new();
    let mut scene = load_scene(&options.path, &mut textures)?;

    print_summary(&scene);
    if options.summary_only {
        return Ok(());
    }

    let (width, height) = options.size;
    let mut gfx = SoftwareBackend::new(width, height);

    match &options.out_dir {
        Some(out_dir) => {
            let end = options.end.unwrap_or(options.start + 1000);
            let frames = scene
                .render_sequence(&mut gfx, options.start, end, options.fps, out_dir)
                .with_context(|| format!("failed to render sequence into {}", out_dir.display()))?;
            println!("Wrote {frames} frame(s) to {}", out_dir.display());
        }
        None => {
            scene.render(&mut gfx, options.start);
            info!("rendered a {width}x{height} frame at {} ms", options.start);
            println!(
                "Rendered frame at {} ms: {} triangles, {} shadowed pixels",
                options.start,
                scene.frame_poly_count(),
                gfx.stencil_coverage()
            );
        }
    }
    Ok(())
}

fn print_summary(scene: &Scene) {
    println!(
        "Loaded scene with {} objects ({} lights)",
        scene.object_count(),
        scene.light_count()
    );
    for name in scene.object_names() {
        let triangles = scene
            .object(&name)
            .map_or(0, |object| object.mesh().triangle_count());
        println!(" - {name} ({triangles} triangles)");
    }
    println!(
        "{} camera(s), {} particle system(s), {} curve(s), shadows {}",
        scene.camera_count(),
        scene.particle_system_count(),
        scene.curve_count(),
        if scene.shadows_enabled() { "on" } else { "off" }
    );
}

#[derive(Debug, PartialEq)]
struct CliOptions {
    path: PathBuf,
    out_dir: Option<PathBuf>,
    start: u64,
    end: Option<u64>,
    fps: u32,
    size: (u32, u32),
    summary_only: bool,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let Some(path) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        let mut options = Self {
            path: PathBuf::from(path),
            out_dir: None,
            start: 0,
            end: None,
            fps: 25,
            size: (320, 240),
            summary_only: false,
        };

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} expects a value. {USAGE}"))
            };
            match arg.as_str() {
                "--out" => options.out_dir = Some(PathBuf::from(value("--out")?)),
                "--start" => options.start = parse_number(&value("--start")?, "--start")?,
                "--end" => options.end = Some(parse_number(&value("--end")?, "--end")?),
                "--fps" => options.fps = parse_number(&value("--fps")?, "--fps")?,
                "--size" => options.size = parse_size(&value("--size")?)?,
                "--summary-only" => options.summary_only = true,
                other => return Err(anyhow!("Unknown argument: {other}. {USAGE}")),
            }
        }
        Ok(options)
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, flag: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|err| anyhow!("invalid value `{value}` for {flag}: {err}"))
}

fn parse_size(value: &str) -> Result<(u32, u32)> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| anyhow!("--size expects WIDTHxHEIGHT, got `{value}`"))?;
    Ok((
        parse_number(width, "--size")?,
        parse_number(height, "--size")?,
    ))
}
