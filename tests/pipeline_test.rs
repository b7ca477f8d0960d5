//! End-to-end checks through the public API: fonts from disk into a CPU
//! texture sink, and WAV sounds through the silent backend.

use std::time::Duration;

use assetcore::audio::{
    encode_wav, AudioError, EmitterDesc, Listener, NullPlayer, PlayType, Sound, SoundHandler,
    SoundId, SoundPack, WavDecoder,
};
use assetcore::font::metadata::write_metadata;
use assetcore::font::{Font, Glyph};
use assetcore::fs::DiskFileSystem;
use assetcore::gpu::{CpuTextureSink, PixelFormat};

/// 'A' (2 wide) and 'B' (3 wide), both fully inked, 2px tall
fn write_font(dir: &std::path::Path, base: &str) {
    let glyphs = [
        Glyph {
            codepoint: b'A' as u16,
            width: 2,
            data_offset: 2,
            data_size: 2,
            ..Glyph::default()
        },
        Glyph {
            codepoint: b'B' as u16,
            width: 3,
            data_offset: 0,
            data_size: 2,
            ..Glyph::default()
        },
    ];
    std::fs::write(dir.join(format!("{}.met", base)), write_metadata(2, "Tiny", &glyphs)).unwrap();
    std::fs::write(dir.join(format!("{}.fnt", base)), [0u8, 6, 0, 4]).unwrap();
}

#[test]
fn test_font_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    write_font(dir.path(), "tiny");

    let fs = DiskFileSystem::new(dir.path());
    let mut sink = CpuTextureSink::new();
    let font = Font::load_from_file(&fs, &mut sink, "tiny").unwrap();

    assert_eq!(font.name(), "Tiny");
    assert_eq!(font.size(), 2);

    let atlas = font.atlas().unwrap();
    assert_eq!((atlas.width, atlas.height), (512, 4));

    // Wider 'B' is packed first, 'A' sits right of its padded cell
    let b = font.find_glyph_no_fallback('B' as u32).unwrap();
    assert_eq!(b.u0, 0.0);
    assert_eq!(b.u1, 5.0 / 512.0);
    assert_eq!((b.v0, b.v1), (0.0, 1.0));
    let a = font.find_glyph_no_fallback('A' as u32).unwrap();
    assert_eq!(a.u0, 5.0 / 512.0);
    assert_eq!(a.u1, 9.0 / 512.0);

    let texture = sink.get(atlas.id).unwrap();
    assert_eq!(texture.desc.format, PixelFormat::R8);
    let row0 = &texture.pixels[..8];
    assert_eq!(row0, &[255, 255, 255, 0, 0, 255, 255, 0]);
    let row2 = &texture.pixels[2 * 512..2 * 512 + 8];
    assert!(row2.iter().all(|&p| p == 0));
}

#[test]
fn test_font_reload_releases_old_atlas() {
    let dir = tempfile::tempdir().unwrap();
    write_font(dir.path(), "tiny");

    let fs = DiskFileSystem::new(dir.path());
    let mut sink = CpuTextureSink::new();
    let mut font = Font::load_from_file(&fs, &mut sink, "tiny").unwrap();
    let old = font.atlas().unwrap().id;

    font.reload(&fs, &mut sink).unwrap();
    let new = font.atlas().unwrap().id;

    assert_ne!(old, new);
    assert_eq!(sink.destroyed(), &[old]);
    assert_eq!(sink.len(), 1);

    font.destroy(&mut sink);
    assert!(sink.is_empty());
    assert!(font.atlas().is_none());
}

#[test]
fn test_font_missing_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let fs = DiskFileSystem::new(dir.path());
    let mut sink = CpuTextureSink::new();
    assert!(Font::load_from_file(&fs, &mut sink, "nothing").is_err());
    assert!(sink.is_empty());
}

fn handler_with_click() -> SoundHandler {
    // 100 samples at 8kHz: 12.5ms
    let wav = encode_wav(&[1000; 100], 8_000).unwrap();
    let mut handler = SoundHandler::new(Box::new(WavDecoder), Box::new(NullPlayer::new()));
    handler
        .register_sound_pack(
            SoundPack::new("ui")
                .with_sound(Sound::new(SoundId(10), "click", wav.clone()))
                .with_sound(Sound::new(SoundId(11), "hum", wav)),
        )
        .unwrap();
    handler
}

#[test]
fn test_once_emitter_culled_after_playback() {
    let mut handler = handler_with_click();
    let once = handler.play_sound(SoundId(10), PlayType::Once).unwrap();
    let looping = handler.play_sound(SoundId(11), PlayType::Loop).unwrap();

    let listener = Listener::default();
    for _ in 0..200 {
        if !handler.emitter_exists(once) {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
        handler.tick(&listener);
    }

    assert!(!handler.emitter_exists(once));
    assert!(handler.emitter_exists(looping));
    assert_eq!(handler.emitters().len(), 1);

    handler.destroy_emitters();
    assert!(handler.emitters().is_empty());
}

#[test]
fn test_decoded_sound_metadata() {
    let mut handler = handler_with_click();
    let sound = handler.get_sound(SoundId(10)).unwrap();
    assert!(sound.loaded);
    assert_eq!(sound.sample_rate, 8_000);
    assert_eq!(sound.frames(), 100);
}

#[test]
fn test_registry_errors() {
    let mut handler = handler_with_click();
    assert_eq!(
        handler.register_sound_pack(SoundPack::new("ui")).unwrap_err(),
        AudioError::DuplicateSoundPack("ui".to_string())
    );
    assert_eq!(
        handler
            .create_emitter(SoundId(99), &EmitterDesc::default())
            .unwrap_err(),
        AudioError::SoundNotFound(SoundId(99))
    );
    assert_eq!(
        handler
            .create_emitters(&[], &EmitterDesc::default())
            .unwrap_err(),
        AudioError::NoCandidates
    );
}
