//! Integration tests for OmniHide
//!
//! Every test goes through the public encode/decode API and the real
//! container formats (PNG, WAV, AVI).

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use tempfile::TempDir;

use omnihide::crypto::token_len;
use omnihide::stego::avi::{write_avi, FrameRate};
use omnihide::stego::frame::framed_bit_len;
use omnihide::stego::{AudioStego, ImageStego, VideoStego};
use omnihide::{
    capacity, decode, decode_audio, decode_image, decode_video, encode, encode_audio,
    encode_audio_frames, encode_image, encode_image_pixels, encode_video, encode_video_frames,
    CarrierError, CarrierKind, DecodeOutcome, DecoderError, EncoderError, StegoConfig,
};

fn white_image() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([255, 255, 255])))
}

fn png_bytes(image: DynamicImage) -> Vec<u8> {
    ImageStego::from_image(image).to_png_bytes().unwrap()
}

/// 16-bit mono sine WAV with `samples` samples.
fn wav_bytes(samples: usize) -> Vec<u8> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..samples {
            let t = i as f32 / 44100.0;
            let sample = ((t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 12000.0) as i16;
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Frames with distinct colours so a mixed-up frame order is noticed.
fn video_frames(count: u8, width: u32, height: u32) -> Vec<RgbImage> {
    (0..count)
        .map(|n| RgbImage::from_fn(width, height, |x, y| Rgb([n * 40, x as u8, y as u8])))
        .collect()
}

/// Test the documented image example: white 100x100, "pw123", "hello"
#[test]
fn test_image_roundtrip() {
    let encoded = encode_image_pixels(white_image(), "pw123", "hello").unwrap();

    assert_eq!(encoded.kind, CarrierKind::Image);
    assert_eq!(encoded.capacity_bits, 30_000);
    assert_eq!(encoded.bits_used, 424);
    assert_eq!(decode_image(&encoded.data, "pw123").unwrap(), "hello");
}

/// Test that a wrong password fails closed instead of returning garbage
#[test]
fn test_wrong_password_fails() {
    let encoded = encode_image_pixels(white_image(), "pw123", "hello").unwrap();

    let err = decode_image(&encoded.data, "wrong").unwrap_err();
    assert!(matches!(err, DecoderError::WrongPassword));
    assert_eq!(err.to_string(), "Incorrect password or corrupt data");
}

/// Test that only the LSBs of the prefix change
#[test]
fn test_image_changes_only_lsbs() {
    let original = white_image();
    let encoded = encode_image_pixels(original.clone(), "pw", "a longer secret message").unwrap();

    let stego = ImageStego::from_bytes(&encoded.data).unwrap();
    let before = original.as_bytes();
    let after = stego.image().as_bytes();
    assert_eq!(before.len(), after.len());

    for (i, (a, b)) in before.iter().zip(after).enumerate() {
        if i < encoded.bits_used {
            assert_eq!(a & 0xFE, b & 0xFE, "high bits changed at byte {}", i);
        } else {
            assert_eq!(a, b, "byte {} past the payload changed", i);
        }
    }
}

/// Test encoding from a file in another format (BMP in, PNG out)
#[test]
fn test_image_from_encoded_file() {
    let bmp = {
        let mut cursor = Cursor::new(Vec::new());
        white_image()
            .write_to(&mut cursor, image::ImageFormat::Bmp)
            .unwrap();
        cursor.into_inner()
    };

    let encoded = encode_image(&bmp, "pw", "from bmp").unwrap();
    assert!(encoded.data.starts_with(b"\x89PNG"));
    assert_eq!(decode_image(&encoded.data, "pw").unwrap(), "from bmp");
}

/// Test unicode and empty messages
#[test]
fn test_unicode_and_empty_messages() {
    let png = png_bytes(white_image());

    let unicode = encode_image(&png, "clé", "héllo wörld ✓").unwrap();
    assert_eq!(decode_image(&unicode.data, "clé").unwrap(), "héllo wörld ✓");

    let empty = encode_image(&png, "pw", "").unwrap();
    assert_eq!(decode_image(&empty.data, "pw").unwrap(), "");
}

/// Test that a message containing the marker text survives
#[test]
fn test_message_containing_marker() {
    let secret = "before ##### after #####";
    let encoded = encode_image_pixels(white_image(), "pw", secret).unwrap();
    assert_eq!(decode_image(&encoded.data, "pw").unwrap(), secret);
}

/// Test the exact capacity boundary on both sides
#[test]
fn test_capacity_boundary() {
    let needed = framed_bit_len(token_len("boundary".len()));
    let fits = DynamicImage::ImageLuma8(GrayImage::from_pixel(needed as u32, 1, Luma([7])));
    let short = DynamicImage::ImageLuma8(GrayImage::from_pixel(needed as u32 - 1, 1, Luma([7])));

    let encoded = encode_image_pixels(fits, "pw", "boundary").unwrap();
    assert_eq!(decode_image(&encoded.data, "pw").unwrap(), "boundary");

    let err = encode_image_pixels(short, "pw", "boundary").unwrap_err();
    assert!(err.is_capacity_exceeded());
    assert_eq!(
        err.to_string(),
        format!(
            "Carrier too small to hide data: need {} bits, have {}",
            needed,
            needed - 1
        )
    );
}

/// Test that an untouched carrier reports no hidden data
#[test]
fn test_no_hidden_data() {
    let png = png_bytes(white_image());
    assert!(matches!(
        decode_image(&png, "pw"),
        Err(DecoderError::NoHiddenData)
    ));

    let wav = wav_bytes(2000);
    assert!(matches!(
        decode_audio(&wav, "pw"),
        Err(DecoderError::NoHiddenData)
    ));

    let avi = write_avi(&video_frames(3, 24, 16), FrameRate::from_fps(25.0).unwrap()).unwrap();
    assert!(matches!(
        decode_video(&avi, "pw"),
        Err(DecoderError::NoHiddenData)
    ));
}

/// Test that every carrier kind rejects a wrong password
#[test]
fn test_wrong_password_all_kinds() {
    let audio = encode_audio(&wav_bytes(10_000), "right", "tone").unwrap();
    assert!(matches!(
        decode_audio(&audio.data, "wrong"),
        Err(DecoderError::WrongPassword)
    ));

    let video = encode_video_frames(video_frames(2, 33, 21), 25.0, "right", "clip").unwrap();
    assert!(matches!(
        decode_video(&video.data, "wrong"),
        Err(DecoderError::WrongPassword)
    ));
}

/// Test that decoding does not change anything and can be repeated
#[test]
fn test_extraction_is_idempotent() {
    let encoded = encode_image_pixels(white_image(), "pw", "again").unwrap();
    let copy = encoded.data.clone();

    assert_eq!(decode_image(&encoded.data, "pw").unwrap(), "again");
    assert_eq!(decode_image(&encoded.data, "pw").unwrap(), "again");
    assert_eq!(encoded.data, copy);
}

/// Test that encoding twice gives different carriers (random nonce)
#[test]
fn test_encoding_uses_random_nonces() {
    let first = encode_image_pixels(white_image(), "pw", "same").unwrap();
    let second = encode_image_pixels(white_image(), "pw", "same").unwrap();

    assert_ne!(first.data, second.data);
    assert_eq!(decode_image(&first.data, "pw").unwrap(), "same");
    assert_eq!(decode_image(&second.data, "pw").unwrap(), "same");
}

/// Test audio roundtrip and that the WAV format is preserved
#[test]
fn test_audio_roundtrip() {
    let wav = wav_bytes(10_000);
    let encoded = encode_audio(&wav, "pw123", "hello").unwrap();

    assert_eq!(encoded.kind, CarrierKind::Audio);
    assert_eq!(encoded.capacity_bits, 20_000);
    assert_eq!(decode_audio(&encoded.data, "pw123").unwrap(), "hello");

    let original = AudioStego::from_bytes(&wav).unwrap();
    let stego = AudioStego::from_bytes(&encoded.data).unwrap();
    assert_eq!(original.spec(), stego.spec());
    assert_eq!(original.frame_bytes().len(), stego.frame_bytes().len());
    for (a, b) in original.frame_bytes().iter().zip(stego.frame_bytes()) {
        assert_eq!(a & 0xFE, b & 0xFE);
    }
}

/// Test audio with too few frame bytes for the payload
#[test]
fn test_audio_too_short() {
    let secret = "a secret";
    let needed = (token_len(secret.len()) + 5) * 8;
    // 2 bytes per sample, one short of the needed bytes
    let wav = wav_bytes((needed - 1) / 2);

    let err = encode_audio(&wav, "pw", secret).unwrap_err();
    assert!(matches!(
        err,
        EncoderError::Carrier(CarrierError::CapacityExceeded { needed: n, .. }) if n == needed
    ));
}

/// Test 8-bit stereo audio from raw frames
#[test]
fn test_audio_frames_8bit_stereo() {
    let spec = WavSpec {
        channels: 2,
        sample_rate: 8000,
        bits_per_sample: 8,
        sample_format: SampleFormat::Int,
    };
    let frames: Vec<u8> = (0..4000u32).map(|i| (i % 251) as u8).collect();

    let encoded = encode_audio_frames(spec, frames.clone(), "pw", "stereo").unwrap();
    assert_eq!(decode_audio(&encoded.data, "pw").unwrap(), "stereo");

    let stego = AudioStego::from_bytes(&encoded.data).unwrap();
    assert_eq!(*stego.spec(), spec);
    assert_eq!(stego.frame_bytes()[encoded.bits_used..], frames[encoded.bits_used..]);
}

/// Test video roundtrip: payload in the first frame only
#[test]
fn test_video_roundtrip() {
    let frames = video_frames(4, 33, 21);
    let encoded = encode_video_frames(frames.clone(), 25.0, "pw123", "hello").unwrap();

    assert_eq!(encoded.kind, CarrierKind::Video);
    assert_eq!(encoded.capacity_bits, 33 * 21 * 3);
    assert_eq!(decode_video(&encoded.data, "pw123").unwrap(), "hello");

    let stego = VideoStego::from_bytes(&encoded.data).unwrap();
    assert_eq!(stego.frames().len(), 4);
    assert_eq!(stego.fps(), 25.0);
    assert_eq!(stego.frames()[1..], frames[1..]);
}

/// Test re-encoding an AVI that was itself produced by the writer
#[test]
fn test_video_reencode_from_file_bytes() {
    let first = encode_video_frames(video_frames(2, 40, 30), 30.0, "one", "first").unwrap();
    let second = encode_video(&first.data, "two", "second").unwrap();

    assert_eq!(decode_video(&second.data, "two").unwrap(), "second");
    assert!(matches!(
        decode_video(&second.data, "one"),
        Err(DecoderError::WrongPassword)
    ));
}

/// Test video whose first frame is too small
#[test]
fn test_video_too_small() {
    let err = encode_video_frames(video_frames(3, 4, 4), 24.0, "pw", "hello").unwrap_err();
    assert!(err.is_capacity_exceeded());
}

/// Test the kind-dispatching API and capacity report
#[test]
fn test_dispatch_and_capacity() {
    let png = png_bytes(white_image());
    let report = capacity(CarrierKind::Image, &png).unwrap();
    assert_eq!(report.capacity_bits, 30_000);
    let max = report.max_secret_len.unwrap();

    let longest = "x".repeat(max);
    let encoded = encode(CarrierKind::Image, &png, "pw", &longest).unwrap();
    assert_eq!(decode(CarrierKind::Image, &encoded.data, "pw").unwrap(), longest);

    let too_long = "x".repeat(max + 3);
    assert!(encode(CarrierKind::Image, &png, "pw", &too_long)
        .unwrap_err()
        .is_capacity_exceeded());
}

/// Test that the wrong carrier kind is a read error, not a crash
#[test]
fn test_wrong_kind_is_carrier_error() {
    let png = png_bytes(white_image());
    assert!(matches!(
        decode(CarrierKind::Audio, &png, "pw"),
        Err(DecoderError::Carrier(_))
    ));
    assert!(matches!(
        decode(CarrierKind::Video, &png, "pw"),
        Err(DecoderError::Carrier(_))
    ));
}

/// Test the caller-facing JSON outcome
#[test]
fn test_decode_outcome_json() {
    let encoded = encode_image_pixels(white_image(), "pw123", "hello").unwrap();

    let ok = DecodeOutcome::from(decode_image(&encoded.data, "pw123"));
    let json: serde_json::Value = serde_json::to_value(&ok).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["secret_message"], "hello");

    let bad = DecodeOutcome::from(decode_image(&encoded.data, "nope"));
    let json: serde_json::Value = serde_json::to_value(&bad).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], "Incorrect password or corrupt data");

    let none = DecodeOutcome::from(decode_image(&png_bytes(white_image()), "pw123"));
    assert_eq!(
        none,
        DecodeOutcome::Error {
            message: "No hidden data found".to_string()
        }
    );
}

/// Test no-password mode with a master secret from a config file
#[test]
fn test_master_secret_mode() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "master_secret = \"house-secret\"\n").unwrap();

    let config = StegoConfig::load_from(&config_path).unwrap();
    let password = config.resolve_password(None).unwrap();

    let encoded = encode_image_pixels(white_image(), password, "no password given").unwrap();
    assert_eq!(
        decode_image(&encoded.data, "house-secret").unwrap(),
        "no password given"
    );
}

/// Test saving and loading carriers through the filesystem
#[test]
fn test_file_roundtrip_all_kinds() {
    let dir = TempDir::new().unwrap();

    let png_path = dir.path().join("stego_white.png");
    let encoded = encode_image_pixels(white_image(), "pw", "on disk").unwrap();
    ImageStego::from_bytes(&encoded.data)
        .unwrap()
        .save(&png_path)
        .unwrap();
    let saved = std::fs::read(&png_path).unwrap();
    assert!(saved.starts_with(b"\x89PNG"));
    let token = ImageStego::from_file(&png_path).unwrap().extract().unwrap();
    assert!(!token.is_empty());
    assert_eq!(decode_image(&saved, "pw").unwrap(), "on disk");

    let wav_path = dir.path().join("stego_tone.wav");
    let audio = AudioStego::from_bytes(&wav_bytes(5000)).unwrap();
    audio.save(&wav_path).unwrap();
    let reloaded = AudioStego::from_file(&wav_path).unwrap();
    assert_eq!(reloaded.frame_bytes(), audio.frame_bytes());

    let avi_path = dir.path().join("stego_clip.avi");
    let video = VideoStego::from_frames(video_frames(2, 16, 16), 10.0).unwrap();
    video.save(&avi_path).unwrap();
    let reloaded = VideoStego::from_file(&avi_path).unwrap();
    assert_eq!(reloaded.frames(), video.frames());
}
