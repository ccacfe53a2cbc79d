//! LSB steganography for audio files.
//!
//! Works on the raw PCM frame bytes exactly as they sit in the WAV `data`
//! chunk: little-endian samples, channels interleaved, 8-bit samples as
//! unsigned offset binary. Every frame byte carries one bit, so a 16-bit
//! sample holds two bits (one in its low byte, one in its high byte).
//!
//! Only integer PCM (8, 16, 24 or 32 bits per sample) is supported. The output
//! WAV reuses the source `WavSpec` unchanged.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tracing::{debug, warn};

use super::error::CarrierError;
use super::frame::{self, FrameError};
use super::lsb;

/// Audio steganography handler.
pub struct AudioStego {
    /// Audio specification (sample rate, channels, bit depth).
    spec: WavSpec,
    /// PCM frame bytes in on-disk order.
    frames: Vec<u8>,
}

impl AudioStego {
    /// Creates a new AudioStego from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CarrierError> {
        let reader = WavReader::open(path).map_err(|e| CarrierError::Read(e.to_string()))?;
        Self::from_reader(reader)
    }

    /// Creates a new AudioStego from WAV bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CarrierError> {
        let reader =
            WavReader::new(Cursor::new(bytes)).map_err(|e| CarrierError::Read(e.to_string()))?;
        Self::from_reader(reader)
    }

    /// Creates an AudioStego from a parameter block and raw PCM frame bytes.
    ///
    /// `frames` must hold whole frames (a multiple of the block align).
    pub fn from_pcm(spec: WavSpec, frames: Vec<u8>) -> Result<Self, CarrierError> {
        let width = sample_width(&spec)?;
        let block_align = width * spec.channels as usize;
        if block_align == 0 || frames.len() % block_align != 0 {
            return Err(CarrierError::InvalidFrames(format!(
                "{} bytes is not a whole number of {}-byte frames",
                frames.len(),
                block_align
            )));
        }
        Ok(Self { spec, frames })
    }

    /// Creates AudioStego from a WavReader.
    fn from_reader<R: Read>(reader: WavReader<R>) -> Result<Self, CarrierError> {
        let spec = reader.spec();
        let width = sample_width(&spec)?;

        let samples: Vec<i32> = reader
            .into_samples::<i32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CarrierError::Read(e.to_string()))?;

        let mut frames = Vec::with_capacity(samples.len() * width);
        for sample in samples {
            push_sample_bytes(&mut frames, sample, width);
        }

        Ok(Self { spec, frames })
    }

    /// Returns the number of bits this audio can carry (one per frame byte).
    pub fn capacity_bits(&self) -> usize {
        self.frames.len()
    }

    /// Writes a framed bitstream into the frame-byte LSBs.
    ///
    /// # Returns
    /// A new AudioStego with the bits embedded.
    pub fn embed(&self, bits: &[u8]) -> Result<Self, CarrierError> {
        let mut frames = self.frames.clone();
        lsb::embed_bits(&mut frames, bits)?;

        debug!(
            bits = bits.len(),
            capacity = self.frames.len(),
            sample_rate = self.spec.sample_rate,
            channels = self.spec.channels,
            "embedded bits in audio"
        );

        Ok(Self {
            spec: self.spec,
            frames,
        })
    }

    /// Frames `token` and hides it in the audio.
    pub fn hide(&self, token: &[u8]) -> Result<Self, CarrierError> {
        self.embed(&frame::serialize(token))
    }

    /// Extracts the framed token from the audio.
    pub fn extract(&self) -> Result<Vec<u8>, FrameError> {
        let (token, consumed) = frame::parse(lsb::lsb_bits(&self.frames), self.frames.len())?;
        debug!(consumed, token_len = token.len(), "found end marker in audio");
        Ok(token)
    }

    /// Saves the audio to a WAV file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CarrierError> {
        let writer =
            WavWriter::create(path, self.spec).map_err(|e| CarrierError::Write(e.to_string()))?;
        self.write_samples(writer)
    }

    /// Returns the audio as WAV bytes.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, CarrierError> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let writer = WavWriter::new(&mut cursor, self.spec)
                .map_err(|e| CarrierError::Write(e.to_string()))?;
            self.write_samples(writer)?;
        }
        Ok(cursor.into_inner())
    }

    fn write_samples<W: Write + Seek>(&self, mut writer: WavWriter<W>) -> Result<(), CarrierError> {
        let width = sample_width(&self.spec)?;

        for chunk in self.frames.chunks_exact(width) {
            let sample = sample_from_bytes(chunk);
            let written = if width == 1 {
                writer.write_sample(sample as i8)
            } else if width == 2 {
                writer.write_sample(sample as i16)
            } else {
                writer.write_sample(sample)
            };
            written.map_err(|e| CarrierError::Write(e.to_string()))?;
        }

        writer
            .finalize()
            .map_err(|e| CarrierError::Write(e.to_string()))
    }

    /// Returns the audio specification.
    pub fn spec(&self) -> &WavSpec {
        &self.spec
    }

    /// Returns the raw PCM frame bytes.
    pub fn frame_bytes(&self) -> &[u8] {
        &self.frames
    }
}

/// Bytes per sample for a supported spec.
fn sample_width(spec: &WavSpec) -> Result<usize, CarrierError> {
    if spec.sample_format != SampleFormat::Int {
        warn!(format = ?spec.sample_format, "rejecting non-integer PCM");
        return Err(CarrierError::Unsupported(format!(
            "only integer PCM WAV is supported, got {:?}",
            spec.sample_format
        )));
    }
    match spec.bits_per_sample {
        8 => Ok(1),
        16 => Ok(2),
        24 => Ok(3),
        32 => Ok(4),
        bits => Err(CarrierError::Unsupported(format!(
            "{} bits per sample",
            bits
        ))),
    }
}

/// Appends the on-disk bytes of one sample.
fn push_sample_bytes(out: &mut Vec<u8>, sample: i32, width: usize) {
    if width == 1 {
        // 8-bit WAV is unsigned; hound hands it out shifted to signed
        out.push((sample + 128) as u8);
    } else {
        out.extend_from_slice(&sample.to_le_bytes()[..width]);
    }
}

/// Rebuilds a sample from its on-disk bytes (sign-extending 24-bit values).
fn sample_from_bytes(bytes: &[u8]) -> i32 {
    match bytes.len() {
        1 => bytes[0] as i32 - 128,
        2 => i16::from_le_bytes([bytes[0], bytes[1]]) as i32,
        3 => {
            let fill = if bytes[2] & 0x80 != 0 { 0xFF } else { 0x00 };
            i32::from_le_bytes([bytes[0], bytes[1], bytes[2], fill])
        }
        _ => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

/// Creates a simple 16-bit mono test WAV audio.
#[cfg(test)]
pub(crate) fn create_test_audio(sample_count: usize) -> AudioStego {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut frames = Vec::with_capacity(sample_count * 2);
    for i in 0..sample_count {
        let t = i as f64 / 44100.0;
        let sample = (f64::sin(2.0 * std::f64::consts::PI * 440.0 * t) * 16000.0) as i16;
        frames.extend_from_slice(&sample.to_le_bytes());
    }

    AudioStego { spec, frames }
}
