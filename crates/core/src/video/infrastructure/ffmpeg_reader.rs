use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec).
///
/// Converts each decoded frame to RGB24 and wraps it in a [`Frame`].
/// Rewinding reopens the container, which restarts decoding from the first
/// keyframe regardless of how the container indexes seek points.
pub struct FfmpegReader {
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    path: Option<PathBuf>,
    video_stream_index: usize,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

type DecodeSetup = (
    ffmpeg_next::decoder::Video,
    ffmpeg_next::software::scaling::Context,
);

impl FfmpegReader {
    pub fn new() -> Self {
        Self {
            input_ctx: None,
            path: None,
            video_stream_index: 0,
        }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames: stream.frames().max(0) as usize,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };

        log::debug!(
            "Opened {}: {}x{} @ {:.2} fps, {} frames declared ({})",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames,
            metadata.codec
        );

        self.video_stream_index = video_stream_index;
        self.path = Some(path.to_path_buf());
        self.input_ctx = Some(ictx);

        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let video_stream_index = self.video_stream_index;
        let Some(ictx) = self.input_ctx.as_mut() else {
            return Box::new(std::iter::once(Err("FfmpegReader: not opened".into())));
        };

        let (decoder, scaler) = match build_decoder(ictx, video_stream_index) {
            Ok(setup) => setup,
            Err(e) => return Box::new(std::iter::once(Err(e))),
        };

        let width = decoder.width();
        let height = decoder.height();

        Box::new(FfmpegFrameIter {
            ictx,
            decoder,
            scaler,
            width,
            height,
            video_stream_index,
            frame_index: 0,
            state: DecodeState::Reading,
        })
    }

    fn rewind(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.path.clone().ok_or("FfmpegReader: not opened")?;
        self.input_ctx = Some(ffmpeg_next::format::input(&path)?);
        log::debug!("Rewound {}", path.display());
        Ok(())
    }

    fn close(&mut self) {
        self.input_ctx = None;
        self.path = None;
    }
}

fn build_decoder(
    ictx: &ffmpeg_next::format::context::Input,
    video_stream_index: usize,
) -> Result<DecodeSetup, Box<dyn std::error::Error>> {
    let stream = ictx
        .stream(video_stream_index)
        .ok_or("FfmpegReader: video stream disappeared")?;
    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
    let decoder = codec_ctx.decoder().video()?;

    let scaler = ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        ffmpeg_next::format::Pixel::RGB24,
        decoder.width(),
        decoder.height(),
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )?;

    Ok((decoder, scaler))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Packets are still being read from the container.
    Reading,
    /// End of file reached, the decoder is emitting buffered frames.
    Draining,
    Finished,
}

/// Decodes one frame per `next` call so a whole clip is never held in memory.
struct FfmpegFrameIter<'a> {
    ictx: &'a mut ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    video_stream_index: usize,
    frame_index: usize,
    state: DecodeState,
}

impl FfmpegFrameIter<'_> {
    /// Pulls one decoded frame from the codec, if it has one ready.
    fn receive(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        self.decoder.receive_frame(&mut decoded).ok()?;

        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        let converted = self
            .scaler
            .run(&decoded, &mut rgb)
            .map(|()| {
                let pixels = packed_rgb(rgb.data(0), rgb.stride(0), self.width, self.height);
                Frame::new(pixels, self.width, self.height, 3, self.frame_index)
            })
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>);
        self.frame_index += 1;
        Some(converted)
    }

    /// Feeds the next video packet to the decoder. Returns false at end of file.
    fn feed(&mut self) -> bool {
        for (stream, packet) in self.ictx.packets() {
            if stream.index() != self.video_stream_index {
                continue;
            }
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {e}");
                continue;
            }
            return true;
        }
        false
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                DecodeState::Finished => return None,
                DecodeState::Draining => {
                    let frame = self.receive();
                    if frame.is_none() {
                        self.state = DecodeState::Finished;
                    }
                    return frame;
                }
                DecodeState::Reading => {
                    if let Some(frame) = self.receive() {
                        return Some(frame);
                    }
                    if !self.feed() {
                        let _ = self.decoder.send_eof();
                        self.state = DecodeState::Draining;
                    }
                }
            }
        }
    }
}

/// Drops the per-row padding ffmpeg may add after `width * 3` bytes.
fn packed_rgb(data: &[u8], stride: usize, width: u32, height: u32) -> Vec<u8> {
    let row_bytes = width as usize * 3;
    data.chunks(stride)
        .take(height as usize)
        .flat_map(|row| &row[..row_bytes])
        .copied()
        .collect()
}
