// private.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Private module for top-level items
use crate::{
    block::{
        Application, ColorTableConfig, DisposalMethod, GlobalColorTable,
        GraphicControl, Header, ImageData, ImageDesc, LocalColorTable,
        LogicalScreenDesc, Trailer,
    },
    encode::BlockEnc,
    indexer::{rgb_channels, screen_bgr, ColorMatch, IndexedFrame},
    palette::PaletteIndex,
    quant::{clamp_quality, Network},
    Error, Result,
};
use pix::{rgb::SRgb8, Raster};
use std::io::Write;

/// Default quality (sample factor)
const DEFAULT_QUALITY: u8 = 10;

/// Bits per palette index
const COLOR_DEPTH: u8 = 8;

/// Convert a delay in milliseconds to centiseconds
fn delay_cs(delay_ms: u32) -> u16 {
    u16::try_from(delay_ms / 10).unwrap_or(u16::MAX)
}

/// One captured frame.
///
/// Pixels are true color; the palette is learned when the frame is added
/// to an [Encoder].
///
/// [Encoder]: struct.Encoder.html
pub struct Frame {
    /// Frame pixels
    raster: Raster<SRgb8>,
    /// Delay before the next frame (ms)
    delay_ms: Option<u32>,
    /// Disposal method override
    disposal_method: Option<DisposalMethod>,
    /// Transparent color override
    transparent_color: Option<(SRgb8, ColorMatch)>,
    /// Quality override
    quality: Option<u8>,
}

impl Clone for Frame {
    fn clone(&self) -> Self {
        let raster = Raster::with_pixels(
            self.raster.width(),
            self.raster.height(),
            self.raster.pixels().to_vec(),
        );
        Frame {
            raster,
            delay_ms: self.delay_ms,
            disposal_method: self.disposal_method,
            transparent_color: self.transparent_color,
            quality: self.quality,
        }
    }
}

impl Frame {
    /// Create a frame from a raster
    pub fn new(raster: Raster<SRgb8>) -> Self {
        Frame {
            raster,
            delay_ms: None,
            disposal_method: None,
            transparent_color: None,
            quality: None,
        }
    }

    /// Create a frame from packed RGB bytes
    pub fn with_rgb(width: u32, height: u32, rgb: &[u8]) -> Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(3))
            .ok_or(Error::InvalidFrameDimensions)?;
        if rgb.len() != len {
            return Err(Error::InvalidPixelData);
        }
        let pixels: Vec<SRgb8> = rgb
            .chunks_exact(3)
            .map(|c| SRgb8::new(c[0], c[1], c[2]))
            .collect();
        Ok(Self::new(Raster::with_pixels(width, height, pixels)))
    }

    /// Adjust the delay before the next frame, in milliseconds
    pub fn with_delay_ms(mut self, delay_ms: u32) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    /// Adjust the disposal method
    pub fn with_disposal_method(mut self, method: DisposalMethod) -> Self {
        self.disposal_method = Some(method);
        self
    }

    /// Adjust the transparent color
    pub fn with_transparent_color(
        mut self,
        clr: SRgb8,
        matching: ColorMatch,
    ) -> Self {
        self.transparent_color = Some((clr, matching));
        self
    }

    /// Adjust the quality (1 is best, 30 is fastest)
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(clamp_quality(quality));
        self
    }

    /// Get the frame width
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    /// Get the frame height
    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// Get the raster
    pub fn raster(&self) -> &Raster<SRgb8> {
        &self.raster
    }

    /// Get the delay override, in milliseconds
    pub fn delay_ms(&self) -> Option<u32> {
        self.delay_ms
    }
}

/// State of an encoding session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Not started
    Idle,
    /// Started, awaiting the first frame
    Started,
    /// At least one frame written
    Streaming,
    /// Trailer written
    Finished,
}

/// Animated GIF encoder
///
/// One session runs from [start] to [finish]; the encoder can then be
/// started again with a new sink.
///
/// ## Encoding Example
/// ```
/// use gifrec::{Encoder, Frame};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut enc = Encoder::new().with_loop_count(0);
/// enc.start(Vec::new())?;
/// for shade in [0, 128, 255] {
///     let rgb = [shade; 4 * 4 * 3];
///     let frame = Frame::with_rgb(4, 4, &rgb)?.with_delay_ms(100);
///     enc.add_frame(&frame)?;
/// }
/// let gif = enc.finish()?;
/// assert_eq!(&gif[..6], b"GIF89a");
/// assert_eq!(gif.last(), Some(&0x3B));
/// # Ok(())
/// # }
/// ```
///
/// [finish]: struct.Encoder.html#method.finish
/// [start]: struct.Encoder.html#method.start
pub struct Encoder<W: Write> {
    /// Quality (sample factor)
    quality: u8,
    /// Default frame delay (ms)
    delay_ms: u32,
    /// Default delay from frame rate (cs)
    frame_rate_cs: Option<u16>,
    /// Default disposal method
    disposal_method: Option<DisposalMethod>,
    /// Default transparent color
    transparent_color: Option<(SRgb8, ColorMatch)>,
    /// Background for uncovered screen areas
    background_color: Option<SRgb8>,
    /// NETSCAPE loop count
    loop_count: Option<u16>,
    /// Configured screen size
    size: Option<(u16, u16)>,
    /// Session state
    state: SessionState,
    /// Block encoder for the sink
    block_enc: Option<BlockEnc<W>>,
    /// Logical screen size of the session
    screen: Option<(u16, u16)>,
    /// Frames written in the session
    n_frames: usize,
}

impl<W: Write> Default for Encoder<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Encoder<W> {
    /// Create a new GIF encoder.
    pub fn new() -> Self {
        Encoder {
            quality: DEFAULT_QUALITY,
            delay_ms: 0,
            frame_rate_cs: None,
            disposal_method: None,
            transparent_color: None,
            background_color: None,
            loop_count: None,
            size: None,
            state: SessionState::Idle,
            block_enc: None,
            screen: None,
            n_frames: 0,
        }
    }

    /// Set the logical screen size.
    ///
    /// Without this, the size of the first frame is used.
    pub fn with_size(mut self, width: u16, height: u16) -> Self {
        self.size = Some((width, height));
        self
    }

    /// Set the number of animation loops (0 loops forever).
    ///
    /// Without this, the animation plays once.
    pub fn with_loop_count(mut self, loop_count: u16) -> Self {
        self.loop_count = Some(loop_count);
        self
    }

    /// Set the quality (1 is best, 30 is fastest)
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = clamp_quality(quality);
        self
    }

    /// Set the default delay between frames, in milliseconds
    pub fn with_delay_ms(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self.frame_rate_cs = None;
        self
    }

    /// Set the default delay from a frame rate (frames per second)
    pub fn with_frame_rate(mut self, fps: f32) -> Self {
        if fps.is_finite() && fps > 0.0 {
            let cs = (100.0 / fps).round().min(f32::from(u16::MAX));
            self.frame_rate_cs = Some(cs as u16);
        }
        self
    }

    /// Set the default disposal method
    pub fn with_disposal_method(mut self, method: DisposalMethod) -> Self {
        self.disposal_method = Some(method);
        self
    }

    /// Set the default transparent color
    pub fn with_transparent_color(
        mut self,
        clr: SRgb8,
        matching: ColorMatch,
    ) -> Self {
        self.transparent_color = Some((clr, matching));
        self
    }

    /// Set the background color for screen areas not covered by a frame
    pub fn with_background_color(mut self, clr: SRgb8) -> Self {
        self.background_color = Some(clr);
        self
    }

    /// Get the session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get the number of frames written in the current session
    pub fn frame_count(&self) -> usize {
        self.n_frames
    }

    /// Start a session, writing the GIF signature to a sink
    pub fn start(&mut self, sink: W) -> Result<()> {
        match self.state {
            SessionState::Started | SessionState::Streaming => {
                return Err(Error::AlreadyStarted)
            }
            SessionState::Idle | SessionState::Finished => (),
        }
        if let Some((width, height)) = self.size {
            if width == 0 || height == 0 {
                return Err(Error::InvalidFrameDimensions);
            }
        }
        let mut block_enc = BlockEnc::new(sink);
        block_enc.encode(Header::default())?;
        self.block_enc = Some(block_enc);
        self.screen = self.size;
        self.n_frames = 0;
        self.state = SessionState::Started;
        info!("session started, screen {:?}", self.screen);
        Ok(())
    }

    /// Add a frame to the session.
    ///
    /// The frame palette is learned, the pixels are indexed and all blocks
    /// for the frame are written before returning.
    pub fn add_frame(&mut self, frame: &Frame) -> Result<()> {
        let first = match self.state {
            SessionState::Started => true,
            SessionState::Streaming => false,
            _ => return Err(Error::NotStarted),
        };
        let (width, height) = self.screen_size(frame)?;
        let quality = frame.quality.unwrap_or(self.quality);
        let background =
            self.background_color.unwrap_or(SRgb8::new(0, 0, 0));
        let bgr = screen_bgr(
            &frame.raster,
            usize::from(width),
            usize::from(height),
            background,
        );
        let network = Network::learn(&bgr, quality);
        let palette = PaletteIndex::new(&network);
        let mut indexed = IndexedFrame::new(&bgr, &palette);
        let transparent = frame.transparent_color.or(self.transparent_color);
        if let Some((clr, matching)) = transparent {
            let rgb = rgb_channels(clr);
            if indexed
                .resolve_transparent(rgb, matching, &palette)
                .is_none()
            {
                warn!("transparent color {:?} not in frame palette", rgb);
            }
        }
        debug!(
            "frame {}: {}x{}, quality {}, {} colors used",
            self.n_frames,
            width,
            height,
            quality,
            indexed.used_count()
        );
        let control = self.graphic_control(frame, &indexed, transparent);
        let color_table = palette.color_table();
        let block_enc = self.block_enc.as_mut().ok_or(Error::NotStarted)?;
        let tbl_cfg = ColorTableConfig::full();
        if first {
            block_enc.encode(
                LogicalScreenDesc::default()
                    .with_screen_width(width)
                    .with_screen_height(height)
                    .with_color_table_config(&tbl_cfg)
                    .with_background_color_idx(0),
            )?;
            block_enc.encode(GlobalColorTable::with_colors(&color_table))?;
            if let Some(loop_count) = self.loop_count {
                block_enc.encode(Application::with_loop_count(loop_count))?;
            }
        }
        block_enc.encode(control)?;
        let local_cfg = if first {
            ColorTableConfig::default()
        } else {
            tbl_cfg
        };
        block_enc.encode(
            ImageDesc::default()
                .with_width(width)
                .with_height(height)
                .with_color_table_config(&local_cfg),
        )?;
        if !first {
            block_enc.encode(LocalColorTable::with_colors(&color_table))?;
        }
        block_enc.encode(ImageData::new(COLOR_DEPTH, indexed.into_indices()))?;
        self.n_frames += 1;
        self.state = SessionState::Streaming;
        Ok(())
    }

    /// Get the logical screen size, fixing it on the first frame
    fn screen_size(&mut self, frame: &Frame) -> Result<(u16, u16)> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(Error::InvalidFrameDimensions);
        }
        if let Some(screen) = self.screen {
            return Ok(screen);
        }
        let width = u16::try_from(frame.width())
            .map_err(|_| Error::InvalidFrameDimensions)?;
        let height = u16::try_from(frame.height())
            .map_err(|_| Error::InvalidFrameDimensions)?;
        self.screen = Some((width, height));
        Ok((width, height))
    }

    /// Build the graphic control extension for a frame
    fn graphic_control(
        &self,
        frame: &Frame,
        indexed: &IndexedFrame,
        transparent: Option<(SRgb8, ColorMatch)>,
    ) -> GraphicControl {
        let mut control = GraphicControl::default();
        let disposal = frame
            .disposal_method
            .or(self.disposal_method)
            .unwrap_or(if transparent.is_some() {
                DisposalMethod::Background
            } else {
                DisposalMethod::NoAction
            });
        control.set_disposal_method(disposal);
        control.set_transparent_color(indexed.transparent());
        let delay = match (frame.delay_ms, self.frame_rate_cs) {
            (Some(ms), _) => delay_cs(ms),
            (None, Some(cs)) => cs,
            (None, None) => delay_cs(self.delay_ms),
        };
        control.set_delay_time_cs(delay);
        control
    }

    /// Finish the session, writing the trailer.
    ///
    /// Returns the sink, flushed.  A session without any frames writes
    /// nothing more and fails with `NoFrames`; its sink can then be
    /// recovered with [take_sink].
    ///
    /// [take_sink]: struct.Encoder.html#method.take_sink
    pub fn finish(&mut self) -> Result<W> {
        let streaming = match self.state {
            SessionState::Started => false,
            SessionState::Streaming => true,
            _ => return Err(Error::NotStarted),
        };
        let n_frames = self.n_frames;
        self.screen = None;
        self.n_frames = 0;
        if !streaming {
            self.state = SessionState::Idle;
            return Err(Error::NoFrames);
        }
        self.state = SessionState::Finished;
        let mut block_enc = self.block_enc.take().ok_or(Error::NotStarted)?;
        block_enc.encode(Trailer::default())?;
        block_enc.flush()?;
        info!("session finished, {} frames", n_frames);
        Ok(block_enc.into_inner())
    }

    /// Take back the sink without writing a trailer.
    ///
    /// An unfinished session is abandoned, leaving the encoder `Idle`.
    /// After a `NoFrames` failure, this returns the sink holding only the
    /// signature.
    pub fn take_sink(&mut self) -> Option<W> {
        if self.state != SessionState::Finished {
            self.state = SessionState::Idle;
        }
        self.screen = None;
        self.n_frames = 0;
        self.block_enc.take().map(BlockEnc::into_inner)
    }
}
