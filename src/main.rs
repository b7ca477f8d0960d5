//! assetcore - font atlas and audio asset tool
//!
//! ```text
//! assetcore atlas <font-base> [--png | --png-out <out>]
//! assetcore play <file.wav> [--loop-ticks N]
//! ```

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use assetcore::audio::{Listener, PlayType, Sound, SoundHandler, SoundId, SoundPack};
use assetcore::config::Config;
use assetcore::constants::TICK_INTERVAL_MS;
use assetcore::font::Font;
use assetcore::fs::{DiskFileSystem, FileMode, FileSystem};
use assetcore::gpu::{CpuTexture, CpuTextureSink};

/// Extra time a Once sound gets past its length before the CLI gives up
const PLAYBACK_GRACE: Duration = Duration::from_secs(2);

fn print_help() {
    println!(
        r#"assetcore {} - bitmap font atlas and audio emitter tool

USAGE:
    assetcore [OPTIONS] <COMMAND>

COMMANDS:
    atlas [FONT]            Build the atlas for FONT (.met/.fnt base name,
                            relative to font.data_dir; default font.default_font)
    play <FILE.wav>         Play a WAV file through the configured backend

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    --config <PATH>         Use this config file instead of the default lookup
    --png                   (atlas) Write the atlas as a greyscale PNG into
                            atlas.dump_dir with a timestamped name
    --png-out <OUT>         (atlas) Write the atlas PNG to OUT
    --loop-ticks <N>        (play) Loop for N ticks, then stop

EXAMPLES:
    assetcore atlas Neo_Std --png
    assetcore atlas fonts/Neo_Std --png-out atlas.png
    assetcore play click.wav
    RUST_LOG=debug assetcore play ambience.wav --loop-ticks 300

CONFIG FILE:
    ~/.config/assetcore/config.toml (or $ASSETCORE_CONFIG)
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Value following `flag`, if the flag is present and a value follows
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1)
        .map(String::as_str)
        .filter(|v| !v.starts_with("--"))
}

/// Positional arguments (everything that is neither a flag nor a flag value)
fn positionals(args: &[String]) -> Vec<&str> {
    const VALUE_FLAGS: [&str; 3] = ["--config", "--png-out", "--loop-ticks"];

    let mut out = Vec::new();
    let mut skip_value = false;
    for arg in args.iter().skip(1) {
        if skip_value {
            skip_value = false;
            if !arg.starts_with("--") {
                continue;
            }
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_value = true;
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

/// Atlas PNG destination
///
/// `None` = no dump, `Some(None)` = timestamped file in atlas.dump_dir
fn png_target(args: &[String]) -> Option<Option<PathBuf>> {
    if let Some(out) = flag_value(args, "--png-out") {
        return Some(Some(PathBuf::from(out)));
    }
    args.iter().any(|a| a == "--png").then_some(None)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("assetcore {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let cfg = match flag_value(&args, "--config") {
        Some(path) => Config::load_from_file(Path::new(path))?,
        None => Config::load(),
    };
    debug!("Config: {:?}", cfg);

    let positional = positionals(&args);
    match positional.first().copied() {
        Some("atlas") => {
            let base = positional
                .get(1)
                .copied()
                .filter(|b| !b.is_empty())
                .unwrap_or(cfg.font.default_font.as_str());
            if base.is_empty() {
                bail!("No font given and font.default_font is not set");
            }
            atlas_command(&cfg, base, png_target(&args))
        }
        Some("play") => {
            let file = positional
                .get(1)
                .ok_or_else(|| anyhow!("play: missing <FILE.wav>"))?;
            let loop_ticks = flag_value(&args, "--loop-ticks")
                .map(|n| n.parse::<u64>())
                .transpose()
                .context("--loop-ticks expects a number")?;
            play_command(&cfg, Path::new(file), loop_ticks)
        }
        Some(other) => {
            print_help();
            bail!("Unknown command: {}", other)
        }
        None => {
            print_help();
            Ok(())
        }
    }
}

/// Build a font atlas on the CPU and report it
fn atlas_command(cfg: &Config, base: &str, png: Option<Option<PathBuf>>) -> Result<()> {
    let fs = DiskFileSystem::new(cfg.font.data_dir());
    let mut sink = CpuTextureSink::new();

    let font = Font::load_from_file(&fs, &mut sink, base)
        .with_context(|| format!("Failed to load font {} from {}", base, fs.root().display()))?;
    let atlas = font
        .atlas()
        .ok_or_else(|| anyhow!("Font {} has no atlas", base))?;

    println!("Font:   {} ({}px)", font.name(), font.size());
    println!("Glyphs: {}", font.glyphs().len());
    println!("Atlas:  {}x{}", atlas.width, atlas.height);

    let skipped: Vec<String> = font
        .skipped_glyphs()
        .map(|g| format!("U+{:04X}", g.codepoint))
        .collect();
    if !skipped.is_empty() {
        println!("Unpacked glyphs ({}): {}", skipped.len(), skipped.join(" "));
    }

    if let Some(out) = png {
        let texture = sink
            .get(atlas.id)
            .ok_or_else(|| anyhow!("Atlas texture {:?} missing", atlas.id))?;
        let path = match out {
            Some(path) => path,
            None => {
                let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
                let stem = Path::new(base)
                    .file_name()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| "font".to_string());
                cfg.atlas
                    .dump_dir()
                    .join(format!("{}_atlas_{}.png", stem, timestamp))
            }
        };
        save_atlas_png(texture, &path)?;
        println!("PNG:    {}", path.display());
    }

    Ok(())
}

/// Save an R8 atlas as an 8-bit greyscale PNG
fn save_atlas_png(texture: &CpuTexture, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut encoder = png::Encoder::new(
        std::io::BufWriter::new(file),
        texture.desc.width,
        texture.desc.height,
    );
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&texture.pixels)?;

    info!("Atlas saved: {}", path.display());
    Ok(())
}

/// Play one WAV file and tick until its emitter is culled
fn play_command(cfg: &Config, file: &Path, loop_ticks: Option<u64>) -> Result<()> {
    let bytes = {
        let fs = DiskFileSystem::new(".");
        let mut stream = fs
            .open(file, FileMode::Read)
            .with_context(|| format!("Failed to open {}", file.display()))?;
        stream
            .read_all()
            .with_context(|| format!("Failed to read {}", file.display()))?
    };

    let name = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "sound".to_string());
    let id = SoundId(1);

    let mut handler = SoundHandler::from_config(&cfg.audio);
    handler.register_sound_pack(SoundPack::new(name.clone()).with_sound(Sound::new(id, name, bytes)))?;

    let (duration, sample_rate, channels) = {
        let sound = handler.get_sound(id)?;
        if !sound.loaded {
            bail!("Failed to decode {}", file.display());
        }
        (
            Duration::from_secs_f64(sound.duration_secs()),
            sound.sample_rate,
            sound.channels,
        )
    };
    println!(
        "Playing {} ({:.2}s, {}Hz, {}ch) on {}",
        file.display(),
        duration.as_secs_f64(),
        sample_rate,
        channels,
        handler.player().name()
    );

    let play_type = if loop_ticks.is_some() {
        PlayType::Loop
    } else {
        PlayType::Once
    };
    let emitter = handler.play_sound(id, play_type)?;

    let listener = Listener::default();
    let deadline = Instant::now() + duration + PLAYBACK_GRACE;
    let mut ticks = 0u64;

    while handler.emitter_exists(emitter) {
        std::thread::sleep(Duration::from_millis(TICK_INTERVAL_MS));
        handler.tick(&listener);
        ticks += 1;

        match loop_ticks {
            Some(limit) if ticks >= limit => {
                handler.stop_emitter(emitter);
                handler.destroy_emitter(emitter);
            }
            None if Instant::now() > deadline => {
                warn!("Backend did not finish playback in time, stopping");
                handler.destroy_emitter(emitter);
            }
            _ => {}
        }
    }

    handler.destroy_emitters();
    info!("Playback finished after {} ticks", ticks);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_png_switch_keeps_font_positional() {
        let args = args("assetcore atlas --png Neo_Std");
        assert_eq!(positionals(&args), vec!["atlas", "Neo_Std"]);
        assert_eq!(png_target(&args), Some(None));
    }

    #[test]
    fn test_png_out_takes_path() {
        let args = args("assetcore atlas --png-out out.png Neo_Std");
        assert_eq!(positionals(&args), vec!["atlas", "Neo_Std"]);
        assert_eq!(png_target(&args), Some(Some(PathBuf::from("out.png"))));
    }

    #[test]
    fn test_no_png() {
        let args = args("assetcore --config cfg.toml atlas Neo_Std");
        assert_eq!(positionals(&args), vec!["atlas", "Neo_Std"]);
        assert_eq!(png_target(&args), None);
    }

    #[test]
    fn test_loop_ticks_value() {
        let args = args("assetcore play hum.wav --loop-ticks 30");
        assert_eq!(positionals(&args), vec!["play", "hum.wav"]);
        assert_eq!(flag_value(&args, "--loop-ticks"), Some("30"));
    }
}
