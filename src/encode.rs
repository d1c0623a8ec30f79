// encode.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Block-level GIF writing
use crate::block::*;
use crate::error::Result;
use crate::lzw::Compressor;
use std::io::{self, Write};

/// Block encoder
///
/// Writes each [Block] exactly as it appears in a GIF file.
///
/// ## Example
/// ```
/// use gifrec::block::*;
/// use gifrec::BlockEnc;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut enc = BlockEnc::new(Vec::new());
/// enc.encode(Header::default())?;
/// enc.encode(
///     LogicalScreenDesc::default()
///         .with_screen_width(2)
///         .with_screen_height(2),
/// )?;
/// enc.encode(Trailer::default())?;
/// assert_eq!(&enc.into_inner()[..6], b"GIF89a");
/// # Ok(())
/// # }
/// ```
///
/// [Block]: block/enum.Block.html
pub struct BlockEnc<W: Write> {
    /// Writer for blocks
    writer: W,
}

impl<W: Write> BlockEnc<W> {
    /// Create a new block encoder
    pub fn new(writer: W) -> Self {
        BlockEnc { writer }
    }

    /// Encode one block
    pub fn encode<B>(&mut self, block: B) -> Result<()>
    where
        B: Into<Block>,
    {
        use crate::block::Block::*;
        let w = &mut self.writer;
        match block.into() {
            Header(b) => b.format(w)?,
            LogicalScreenDesc(b) => b.format(w)?,
            GlobalColorTable(b) => b.format(w)?,
            GraphicControl(b) => b.format(w)?,
            Application(b) => b.format(w)?,
            ImageDesc(b) => b.format(w)?,
            LocalColorTable(b) => b.format(w)?,
            ImageData(b) => b.format(w)?,
            Trailer(b) => b.format(w)?,
        }
        Ok(())
    }

    /// Flush the writer
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Get the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl Header {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(b"GIF")?;
        w.write_all(&self.version())
    }
}

impl LogicalScreenDesc {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut buf = Vec::with_capacity(7);
        buf.extend_from_slice(&self.screen_width().to_le_bytes());
        buf.extend_from_slice(&self.screen_height().to_le_bytes());
        buf.push(self.flags());
        buf.push(self.background_color_idx());
        buf.push(self.pixel_aspect_ratio());
        w.write_all(&buf)
    }
}

impl GlobalColorTable {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.colors())
    }
}

impl GraphicControl {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(BlockCode::Extension_.signature())?;
        let mut buf = Vec::with_capacity(7);
        buf.push(ExtensionCode::GraphicControl_.into());
        buf.push(4); // block size
        buf.push(self.flags());
        buf.extend_from_slice(&self.delay_time_cs().to_le_bytes());
        buf.push(self.transparent_color_idx());
        buf.push(0); // block size
        w.write_all(&buf)
    }
}

impl Application {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(BlockCode::Extension_.signature())?;
        w.write_all(&[ExtensionCode::Application_.into()])?;
        for c in self.app_data() {
            assert!(c.len() < 256);
            let len = c.len() as u8;
            w.write_all(&[len])?; // block size
            w.write_all(c)?;
        }
        w.write_all(&[0]) // block size
    }
}

impl ImageDesc {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(BlockCode::ImageDesc_.signature())?;
        let mut buf = Vec::with_capacity(9);
        buf.extend_from_slice(&[0; 4]); // left, top
        buf.extend_from_slice(&self.width().to_le_bytes());
        buf.extend_from_slice(&self.height().to_le_bytes());
        buf.push(self.flags());
        w.write_all(&buf)
    }
}

impl LocalColorTable {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.colors())
    }
}

impl ImageData {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut compressor = Compressor::new(self.min_code_size());
        w.write_all(&[compressor.min_code_size()])?;
        compressor.compress(self.data(), w)?;
        w.write_all(&[0]) // block size
    }
}

impl Trailer {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(BlockCode::Trailer_.signature())
    }
}
