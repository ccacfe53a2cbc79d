//! Minimal uncompressed AVI container.
//!
//! Reads and writes RIFF AVI files holding a single video stream of
//! uncompressed 24-bit DIB frames (`BI_RGB`). No codec ever touches the pixel
//! data, so LSBs written into a frame come back out bit-exact.
//!
//! Written layout:
//!
//! ```text
//! RIFF 'AVI '
//!   LIST 'hdrl'
//!     'avih'  main header
//!     LIST 'strl'
//!       'strh'  stream header ('vids', 'DIB ')
//!       'strf'  BITMAPINFOHEADER (24 bpp, BI_RGB, bottom-up)
//!   LIST 'movi'
//!     '00db' frame 0 (BGR rows, bottom row first, rows padded to 4 bytes)
//!     '00db' frame 1 ...
//!   'idx1'  keyframe index
//! ```
//!
//! The reader also accepts top-down DIBs (negative height), `00dc` chunk
//! ids, `LIST 'rec '` groups and a missing index.

use image::RgbImage;
use tracing::warn;

use super::error::CarrierError;

const AVIF_HASINDEX: u32 = 0x10;
const AVIIF_KEYFRAME: u32 = 0x10;
const BI_RGB: u32 = 0;
const BITMAPINFOHEADER_SIZE: u32 = 40;

/// Frame rate as the `rate / scale` fraction AVI stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate {
    pub rate: u32,
    pub scale: u32,
}

impl FrameRate {
    /// Builds a frame rate from frames per second, with millisecond precision.
    pub fn from_fps(fps: f64) -> Result<Self, CarrierError> {
        if !fps.is_finite() || fps <= 0.0 || fps > 10_000.0 {
            return Err(CarrierError::InvalidFrames(format!("invalid frame rate {}", fps)));
        }
        Ok(Self {
            rate: (fps * 1000.0).round() as u32,
            scale: 1000,
        })
    }

    /// Frames per second.
    pub fn fps(&self) -> f64 {
        if self.scale == 0 {
            return 0.0;
        }
        self.rate as f64 / self.scale as f64
    }

    fn micros_per_frame(&self) -> u32 {
        if self.rate == 0 {
            return 0;
        }
        ((1_000_000u64 * self.scale as u64) / self.rate as u64) as u32
    }
}

/// Video stream parameters from the AVI headers.
#[derive(Debug, Clone, Copy)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    top_down: bool,
    stream: u16,
}

/// Parsed AVI file borrowing the input bytes.
pub struct AviReader<'a> {
    info: VideoInfo,
    movi: &'a [u8],
}

impl<'a> AviReader<'a> {
    /// Parses the headers and locates the `movi` list. Frame data is not
    /// decoded until iterated.
    pub fn new(bytes: &'a [u8]) -> Result<Self, CarrierError> {
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"AVI " {
            return Err(CarrierError::Read("not a RIFF AVI file".to_string()));
        }
        let riff_len = (read_u32(bytes, 4)? as usize).saturating_add(8).min(bytes.len());
        let body = bytes
            .get(12..riff_len)
            .ok_or_else(|| CarrierError::Read(format!("RIFF size {} too small", riff_len)))?;

        let mut info = None;
        let mut movi = None;

        for chunk in Chunks::new(body) {
            let chunk = chunk?;
            match (&chunk.id, chunk.list_type()) {
                (b"LIST", Some(b"hdrl")) => info = Some(parse_hdrl(&chunk.data[4..])?),
                (b"LIST", Some(b"movi")) => movi = Some(&chunk.data[4..]),
                _ => {}
            }
        }

        let info = info.ok_or_else(|| CarrierError::Read("missing AVI header list".to_string()))?;
        let movi = movi.ok_or_else(|| CarrierError::Read("missing movi list".to_string()))?;

        Ok(Self { info, movi })
    }

    /// Stream parameters.
    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    /// Lazily decodes frames in stream order.
    pub fn frames(&self) -> impl Iterator<Item = Result<RgbImage, CarrierError>> + '_ {
        let info = self.info;
        FrameChunks::new(self.movi, info.stream).map(move |data| decode_dib(data?, &info))
    }
}

/// Reads every frame and the frame rate.
pub fn read_avi(bytes: &[u8]) -> Result<(FrameRate, Vec<RgbImage>), CarrierError> {
    let reader = AviReader::new(bytes)?;
    let frames = reader.frames().collect::<Result<Vec<_>, _>>()?;
    if frames.is_empty() {
        return Err(CarrierError::Read("AVI has no video frames".to_string()));
    }
    Ok((reader.info().frame_rate, frames))
}

/// Reads only the first frame.
pub fn read_first_frame(bytes: &[u8]) -> Result<RgbImage, CarrierError> {
    let reader = AviReader::new(bytes)?;
    let first = reader.frames().next();
    first.unwrap_or_else(|| Err(CarrierError::Read("AVI has no video frames".to_string())))
}

/// Writes frames to an uncompressed AVI.
///
/// All frames must share the first frame's dimensions.
pub fn write_avi(frames: &[RgbImage], frame_rate: FrameRate) -> Result<Vec<u8>, CarrierError> {
    let first = frames
        .first()
        .ok_or_else(|| CarrierError::InvalidFrames("no frames".to_string()))?;
    let (width, height) = first.dimensions();
    if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
        return Err(CarrierError::InvalidFrames(format!(
            "invalid frame size {}x{}",
            width, height
        )));
    }
    if let Some(bad) = frames.iter().position(|f| f.dimensions() != (width, height)) {
        return Err(CarrierError::InvalidFrames(format!(
            "frame {} is {}x{}, expected {}x{}",
            bad,
            frames[bad].width(),
            frames[bad].height(),
            width,
            height
        )));
    }

    let frame_size = dib_stride(width) * height as usize;
    let frame_size_u32 = u32::try_from(frame_size)
        .map_err(|_| CarrierError::Write("frame too large for AVI".to_string()))?;
    let frame_count = u32::try_from(frames.len())
        .map_err(|_| CarrierError::Write("too many frames for AVI".to_string()))?;

    let mut avih = Vec::with_capacity(56);
    put_u32(&mut avih, frame_rate.micros_per_frame());
    put_u32(
        &mut avih,
        (frame_size as u64 * frame_rate.rate as u64 / frame_rate.scale.max(1) as u64) as u32,
    );
    put_u32(&mut avih, 0); // padding granularity
    put_u32(&mut avih, AVIF_HASINDEX);
    put_u32(&mut avih, frame_count);
    put_u32(&mut avih, 0); // initial frames
    put_u32(&mut avih, 1); // streams
    put_u32(&mut avih, frame_size_u32);
    put_u32(&mut avih, width);
    put_u32(&mut avih, height);
    avih.extend_from_slice(&[0u8; 16]);

    let mut strh = Vec::with_capacity(56);
    strh.extend_from_slice(b"vids");
    strh.extend_from_slice(b"DIB ");
    put_u32(&mut strh, 0); // flags
    put_u16(&mut strh, 0); // priority
    put_u16(&mut strh, 0); // language
    put_u32(&mut strh, 0); // initial frames
    put_u32(&mut strh, frame_rate.scale);
    put_u32(&mut strh, frame_rate.rate);
    put_u32(&mut strh, 0); // start
    put_u32(&mut strh, frame_count);
    put_u32(&mut strh, frame_size_u32);
    put_u32(&mut strh, u32::MAX); // quality: default
    put_u32(&mut strh, 0); // sample size: varies
    put_u16(&mut strh, 0);
    put_u16(&mut strh, 0);
    put_u16(&mut strh, width.min(u16::MAX as u32) as u16);
    put_u16(&mut strh, height.min(u16::MAX as u32) as u16);

    let mut strf = Vec::with_capacity(BITMAPINFOHEADER_SIZE as usize);
    put_u32(&mut strf, BITMAPINFOHEADER_SIZE);
    put_u32(&mut strf, width);
    put_u32(&mut strf, height); // positive: bottom-up
    put_u16(&mut strf, 1); // planes
    put_u16(&mut strf, 24); // bits per pixel
    put_u32(&mut strf, BI_RGB);
    put_u32(&mut strf, frame_size_u32);
    put_u32(&mut strf, 0);
    put_u32(&mut strf, 0);
    put_u32(&mut strf, 0);
    put_u32(&mut strf, 0);

    let mut strl = Vec::new();
    strl.extend(chunk(b"strh", &strh));
    strl.extend(chunk(b"strf", &strf));

    let mut hdrl = Vec::new();
    hdrl.extend(chunk(b"avih", &avih));
    hdrl.extend(list(b"strl", &strl));

    let mut movi = Vec::with_capacity(frames.len() * (frame_size + 8));
    let mut idx1 = Vec::with_capacity(frames.len() * 16);
    for frame in frames {
        // offsets are relative to the 'movi' fourcc
        let offset = 4 + movi.len() as u64;
        let offset = u32::try_from(offset)
            .map_err(|_| CarrierError::Write("video too large for AVI".to_string()))?;
        idx1.extend_from_slice(b"00db");
        put_u32(&mut idx1, AVIIF_KEYFRAME);
        put_u32(&mut idx1, offset);
        put_u32(&mut idx1, frame_size_u32);
        movi.extend(chunk(b"00db", &encode_dib(frame)));
    }

    let mut body = Vec::new();
    body.extend_from_slice(b"AVI ");
    body.extend(list(b"hdrl", &hdrl));
    body.extend(list(b"movi", &movi));
    body.extend(chunk(b"idx1", &idx1));

    let riff_size = u32::try_from(body.len())
        .map_err(|_| CarrierError::Write("video too large for AVI".to_string()))?;
    let mut out = Vec::with_capacity(body.len() + 8);
    out.extend_from_slice(b"RIFF");
    put_u32(&mut out, riff_size);
    out.extend(body);
    Ok(out)
}

/// A RIFF chunk borrowed from the input.
struct Chunk<'a> {
    id: [u8; 4],
    data: &'a [u8],
}

impl Chunk<'_> {
    fn list_type(&self) -> Option<&[u8]> {
        if &self.id == b"LIST" && self.data.len() >= 4 {
            Some(&self.data[..4])
        } else {
            None
        }
    }
}

/// Iterates sibling chunks. Trailing bytes too short for a chunk header are
/// ignored; a chunk running past the end of its parent is an error.
struct Chunks<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Chunks<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<Chunk<'a>, CarrierError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos + 8 > self.data.len() {
            return None;
        }
        let start = self.pos;
        let mut id = [0u8; 4];
        id.copy_from_slice(&self.data[start..start + 4]);
        let size = u32::from_le_bytes([
            self.data[start + 4],
            self.data[start + 5],
            self.data[start + 6],
            self.data[start + 7],
        ]) as usize;

        let body = start + 8;
        let Some(end) = body.checked_add(size).filter(|&end| end <= self.data.len()) else {
            self.pos = self.data.len();
            return Some(Err(CarrierError::Read(format!(
                "truncated '{}' chunk",
                String::from_utf8_lossy(&id)
            ))));
        };

        self.pos = end + (size & 1);
        Some(Ok(Chunk {
            id,
            data: &self.data[body..end],
        }))
    }
}

/// Yields the frame chunks of one stream from a `movi` list, descending into
/// `rec ` groups.
struct FrameChunks<'a> {
    stack: Vec<Chunks<'a>>,
    prefix: String,
}

impl<'a> FrameChunks<'a> {
    fn new(movi: &'a [u8], stream: u16) -> Self {
        Self {
            stack: vec![Chunks::new(movi)],
            prefix: format!("{:02}", stream),
        }
    }

    fn is_frame(&self, id: &[u8; 4]) -> bool {
        &id[..2] == self.prefix.as_bytes() && (&id[2..] == b"db" || &id[2..] == b"dc")
    }
}

impl<'a> Iterator for FrameChunks<'a> {
    type Item = Result<&'a [u8], CarrierError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let chunks = self.stack.last_mut()?;
            match chunks.next() {
                None => {
                    self.stack.pop();
                }
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok(chunk)) => {
                    if matches!(chunk.list_type(), Some(b"rec ")) {
                        self.stack.push(Chunks::new(&chunk.data[4..]));
                    } else if self.is_frame(&chunk.id) {
                        return Some(Ok(chunk.data));
                    }
                }
            }
        }
    }
}

/// Parses `LIST 'hdrl'` and returns the first video stream's parameters.
fn parse_hdrl(hdrl: &[u8]) -> Result<VideoInfo, CarrierError> {
    let mut stream_index = 0u16;

    for chunk in Chunks::new(hdrl) {
        let chunk = chunk?;
        if !matches!(chunk.list_type(), Some(b"strl")) {
            continue;
        }

        let mut strh = None;
        let mut strf = None;
        for sub in Chunks::new(&chunk.data[4..]) {
            let sub = sub?;
            match &sub.id {
                b"strh" => strh = Some(sub.data),
                b"strf" => strf = Some(sub.data),
                _ => {}
            }
        }

        let strh = strh.ok_or_else(|| CarrierError::Read("stream without strh".to_string()))?;
        if strh.len() < 36 {
            return Err(CarrierError::Read("short stream header".to_string()));
        }
        if &strh[0..4] != b"vids" {
            stream_index += 1;
            continue;
        }

        let scale = read_u32(strh, 20)?;
        let rate = read_u32(strh, 24)?;
        let strf = strf.ok_or_else(|| CarrierError::Read("video stream without strf".to_string()))?;
        if strf.len() < BITMAPINFOHEADER_SIZE as usize {
            return Err(CarrierError::Read("short bitmap header".to_string()));
        }

        let width = read_u32(strf, 4)? as i32;
        let height = read_u32(strf, 8)? as i32;
        let bit_count = read_u16(strf, 14)?;
        let compression = read_u32(strf, 16)?;

        if compression != BI_RGB || bit_count != 24 {
            warn!(codec = %fourcc_name(compression), bit_count, "rejecting compressed video stream");
            return Err(CarrierError::Unsupported(format!(
                "video codec '{}' at {} bpp; only uncompressed 24-bit AVI is supported",
                fourcc_name(compression),
                bit_count
            )));
        }
        if width <= 0 || height == 0 {
            return Err(CarrierError::Read(format!("invalid frame size {}x{}", width, height)));
        }

        return Ok(VideoInfo {
            width: width as u32,
            height: height.unsigned_abs(),
            frame_rate: FrameRate { rate, scale },
            top_down: height < 0,
            stream: stream_index,
        });
    }

    Err(CarrierError::Read("no video stream in AVI".to_string()))
}

/// Row stride of a 24-bit DIB.
fn dib_stride(width: u32) -> usize {
    (width as usize * 3 + 3) & !3
}

fn encode_dib(frame: &RgbImage) -> Vec<u8> {
    let (width, height) = frame.dimensions();
    let stride = dib_stride(width);
    let mut out = vec![0u8; stride * height as usize];

    for (row_index, row) in out.chunks_exact_mut(stride).enumerate() {
        let y = height - 1 - row_index as u32;
        for x in 0..width {
            let [r, g, b] = frame.get_pixel(x, y).0;
            let at = x as usize * 3;
            row[at] = b;
            row[at + 1] = g;
            row[at + 2] = r;
        }
    }
    out
}

fn decode_dib(data: &[u8], info: &VideoInfo) -> Result<RgbImage, CarrierError> {
    let stride = dib_stride(info.width);
    let needed = stride * info.height as usize;
    if data.len() < needed {
        return Err(CarrierError::Read(format!(
            "frame chunk has {} bytes, expected {}",
            data.len(),
            needed
        )));
    }

    let mut frame = RgbImage::new(info.width, info.height);
    for (row_index, row) in data[..needed].chunks_exact(stride).enumerate() {
        let y = if info.top_down {
            row_index as u32
        } else {
            info.height - 1 - row_index as u32
        };
        for x in 0..info.width {
            let at = x as usize * 3;
            frame.put_pixel(x, y, image::Rgb([row[at + 2], row[at + 1], row[at]]));
        }
    }
    Ok(frame)
}

fn chunk(id: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 9);
    out.extend_from_slice(id);
    put_u32(&mut out, data.len() as u32);
    out.extend_from_slice(data);
    if data.len() % 2 == 1 {
        out.push(0);
    }
    out
}

fn list(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(body.len() + 4);
    data.extend_from_slice(kind);
    data.extend_from_slice(body);
    chunk(b"LIST", &data)
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn read_u32(data: &[u8], at: usize) -> Result<u32, CarrierError> {
    data.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| CarrierError::Read("unexpected end of AVI data".to_string()))
}

fn read_u16(data: &[u8], at: usize) -> Result<u16, CarrierError> {
    data.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| CarrierError::Read("unexpected end of AVI data".to_string()))
}

fn fourcc_name(code: u32) -> String {
    let bytes = code.to_le_bytes();
    if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        String::from_utf8_lossy(&bytes).into_owned()
    } else {
        format!("{:#x}", code)
    }
}
