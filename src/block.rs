// block.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! GIF file blocks, as written by the encoder
const CHANNELS: usize = 3;

/// Size of a color table, as packed into descriptor flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorTableConfig {
    /// Number of entries (0 when absent)
    table_len: usize,
}

impl ColorTableConfig {
    /// Presence bit, shared by screen and image descriptors
    const PRESENT: u8 = 0b1000_0000;

    /// Create a config for a table with at least `table_len` entries.
    ///
    /// Lengths are rounded up to a power of two between 2 and 256; zero
    /// means no table.
    pub fn with_len(table_len: usize) -> Self {
        let table_len = match table_len {
            0 => 0,
            n => n.max(2).next_power_of_two().min(256),
        };
        ColorTableConfig { table_len }
    }

    /// Full 256-entry table (size field 7)
    pub fn full() -> Self {
        Self::with_len(256)
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.table_len
    }

    /// Check whether the table is absent
    pub fn is_empty(&self) -> bool {
        self.table_len == 0
    }

    /// Get the table size in bytes
    pub fn size_bytes(&self) -> usize {
        self.table_len * CHANNELS
    }

    /// Size field: table holds 2^(bits + 1) entries
    fn len_bits(&self) -> u8 {
        match self.table_len {
            0..=2 => 0,
            n => (n.trailing_zeros() - 1) as u8,
        }
    }
}

/// Method of disposing a frame before drawing the next one
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DisposalMethod {
    /// No disposal specified
    #[default]
    NoAction,
    /// Leave the frame in place
    Keep,
    /// Restore to background color
    Background,
    /// Restore to previous frame
    Previous,
    /// Undefined disposal code (4-7)
    Reserved(u8),
}

impl From<u8> for DisposalMethod {
    fn from(n: u8) -> Self {
        use self::DisposalMethod::*;
        match n & 0b0111 {
            0 => NoAction,
            1 => Keep,
            2 => Background,
            3 => Previous,
            n => Reserved(n),
        }
    }
}

impl From<DisposalMethod> for u8 {
    fn from(d: DisposalMethod) -> Self {
        use self::DisposalMethod::*;
        match d {
            NoAction => 0,
            Keep => 1,
            Background => 2,
            Previous => 3,
            Reserved(n) => n & 0b0111,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BlockCode {
    Extension_,
    ImageDesc_,
    Trailer_,
}

impl BlockCode {
    pub fn signature(&self) -> &'static [u8] {
        use self::BlockCode::*;
        match self {
            ImageDesc_ => b",", // (0x2C) Image separator
            Extension_ => b"!", // (0x21) Extension introducer
            Trailer_ => b";",   // (0x3B) GIF trailer
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ExtensionCode {
    GraphicControl_,
    Application_,
}

impl From<ExtensionCode> for u8 {
    fn from(t: ExtensionCode) -> Self {
        use self::ExtensionCode::*;
        match t {
            GraphicControl_ => 0xF9,
            Application_ => 0xFF,
        }
    }
}

/// GIF signature and version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    version: [u8; 3],
}

impl Default for Header {
    fn default() -> Self {
        Header { version: *b"89a" }
    }
}

impl Header {
    pub fn version(&self) -> [u8; 3] {
        self.version
    }
}

/// Logical screen size and global color table flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalScreenDesc {
    screen_width: u16,
    screen_height: u16,
    flags: u8,
    background_color_idx: u8, // index into global color table
}

impl LogicalScreenDesc {
    pub fn with_screen_width(mut self, screen_width: u16) -> Self {
        self.screen_width = screen_width;
        self
    }
    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }
    pub fn with_screen_height(mut self, screen_height: u16) -> Self {
        self.screen_height = screen_height;
        self
    }
    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Set global table flags; color resolution mirrors the size field
    pub fn with_color_table_config(mut self, tbl: &ColorTableConfig) -> Self {
        self.flags = if tbl.is_empty() {
            0
        } else {
            let bits = tbl.len_bits();
            ColorTableConfig::PRESENT | (bits << 4) | bits
        };
        self
    }
    pub fn with_background_color_idx(
        mut self,
        background_color_idx: u8,
    ) -> Self {
        self.background_color_idx = background_color_idx;
        self
    }
    pub fn background_color_idx(&self) -> u8 {
        self.background_color_idx
    }

    /// Pixel aspect ratio (always unspecified)
    pub fn pixel_aspect_ratio(&self) -> u8 {
        0
    }
}

/// Packed RGB color table following the screen descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalColorTable {
    colors: Vec<u8>,
}

impl GlobalColorTable {
    pub fn with_colors(colors: &[u8]) -> Self {
        debug_assert_eq!(colors.len() % CHANNELS, 0);
        GlobalColorTable {
            colors: colors.to_vec(),
        }
    }
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }
}

/// Graphic control extension: disposal, delay and transparency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphicControl {
    flags: u8,
    delay_time_cs: u16, // delay in centiseconds (hundredths of a second)
    transparent_color_idx: u8,
}

impl GraphicControl {
    const DISPOSAL_METHOD: u8 = 0b0001_1100;
    const TRANSPARENT_COLOR: u8 = 0b0000_0001;

    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn disposal_method(&self) -> DisposalMethod {
        ((self.flags & Self::DISPOSAL_METHOD) >> 2).into()
    }
    pub fn set_disposal_method(&mut self, disposal_method: DisposalMethod) {
        let d: u8 = disposal_method.into();
        self.flags = (self.flags & !Self::DISPOSAL_METHOD) | (d << 2);
    }
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }
    pub fn set_delay_time_cs(&mut self, delay_time_cs: u16) {
        self.delay_time_cs = delay_time_cs;
    }
    pub fn transparent_color(&self) -> Option<u8> {
        (self.flags & Self::TRANSPARENT_COLOR != 0)
            .then_some(self.transparent_color_idx)
    }
    pub fn transparent_color_idx(&self) -> u8 {
        self.transparent_color_idx
    }
    pub fn set_transparent_color(&mut self, transparent_color: Option<u8>) {
        self.transparent_color_idx = transparent_color.unwrap_or(0);
        if transparent_color.is_some() {
            self.flags |= Self::TRANSPARENT_COLOR;
        } else {
            self.flags &= !Self::TRANSPARENT_COLOR;
        }
    }
}

/// NETSCAPE2.0 application extension for looping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Application {
    app_data: Vec<Vec<u8>>, // sequence of sub-blocks
}

impl Application {
    /// Application identifier and authentication code
    const NETSCAPE: &'static [u8] = b"NETSCAPE2.0";

    /// Create a looping extension (zero loops forever)
    pub fn with_loop_count(loop_count: u16) -> Self {
        let [lo, hi] = loop_count.to_le_bytes();
        Application {
            app_data: vec![Self::NETSCAPE.to_vec(), vec![1, lo, hi]],
        }
    }
    pub fn app_data(&self) -> &[Vec<u8>] {
        &self.app_data
    }
    pub fn loop_count(&self) -> Option<u16> {
        match &self.app_data[..] {
            [id, sub] if id == Self::NETSCAPE && sub.len() == 3 => {
                (sub[0] == 1).then(|| u16::from_le_bytes([sub[1], sub[2]]))
            }
            _ => None,
        }
    }
}

/// Image descriptor; images always cover the screen from the origin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageDesc {
    width: u16,
    height: u16,
    flags: u8,
}

impl ImageDesc {
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }
    pub fn width(&self) -> u16 {
        self.width
    }
    pub fn with_height(mut self, height: u16) -> Self {
        self.height = height;
        self
    }
    pub fn height(&self) -> u16 {
        self.height
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Set local table flags
    pub fn with_color_table_config(mut self, tbl: &ColorTableConfig) -> Self {
        self.flags = if tbl.is_empty() {
            0
        } else {
            ColorTableConfig::PRESENT | tbl.len_bits()
        };
        self
    }
}

/// Packed RGB color table following an image descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalColorTable {
    colors: Vec<u8>,
}

impl LocalColorTable {
    pub fn with_colors(colors: &[u8]) -> Self {
        debug_assert_eq!(colors.len() % CHANNELS, 0);
        LocalColorTable {
            colors: colors.to_vec(),
        }
    }
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }
}

/// Indexed pixel data, compressed when written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    min_code_size: u8,
    data: Vec<u8>,
}

impl ImageData {
    pub fn new(min_code_size: u8, data: Vec<u8>) -> Self {
        ImageData {
            min_code_size,
            data,
        }
    }
    pub fn min_code_size(&self) -> u8 {
        self.min_code_size.max(2) // must be >= 2
    }
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trailer {}

/// Any block written by the encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Header(Header),
    LogicalScreenDesc(LogicalScreenDesc),
    GlobalColorTable(GlobalColorTable),
    GraphicControl(GraphicControl),
    Application(Application),
    ImageDesc(ImageDesc),
    LocalColorTable(LocalColorTable),
    ImageData(ImageData),
    Trailer(Trailer),
}

macro_rules! block_from {
    ($($name:ident),*) => {
        $(
            impl From<$name> for Block {
                fn from(b: $name) -> Self {
                    Block::$name(b)
                }
            }
        )*
    };
}

block_from!(
    Header,
    LogicalScreenDesc,
    GlobalColorTable,
    GraphicControl,
    Application,
    ImageDesc,
    LocalColorTable,
    ImageData,
    Trailer
);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn color_table_len() {
        let t = ColorTableConfig::with_len(1);
        assert_eq!((t.len(), t.len_bits()), (2, 0));
        let t = ColorTableConfig::with_len(7);
        assert_eq!((t.len(), t.len_bits()), (8, 2));
        let t = ColorTableConfig::with_len(65);
        assert_eq!((t.len(), t.len_bits()), (128, 6));
        let t = ColorTableConfig::with_len(1000);
        assert_eq!(t.len(), 256);
        let t = ColorTableConfig::full();
        assert_eq!(t.len_bits(), 7);
        assert_eq!(t.size_bytes(), 768);
        let t = ColorTableConfig::default();
        assert!(t.is_empty());
        assert_eq!(t.size_bytes(), 0);
    }

    #[test]
    fn screen_flags() {
        let d = LogicalScreenDesc::default()
            .with_color_table_config(&ColorTableConfig::full());
        // table present, color resolution 7, size 7
        assert_eq!(d.flags(), 0xF7);
        let d = LogicalScreenDesc::default()
            .with_color_table_config(&ColorTableConfig::with_len(16));
        assert_eq!(d.flags(), 0xB3);
    }

    #[test]
    fn image_flags() {
        let d = ImageDesc::default()
            .with_color_table_config(&ColorTableConfig::default());
        assert_eq!(d.flags(), 0);
        let d = ImageDesc::default()
            .with_color_table_config(&ColorTableConfig::full());
        assert_eq!(d.flags(), 0x87);
    }

    #[test]
    fn disposal() {
        let mut c = GraphicControl::default();
        c.set_disposal_method(DisposalMethod::Background);
        assert_eq!(c.flags(), 0b0000_1000);
        assert_eq!(c.disposal_method(), DisposalMethod::Background);
        c.set_transparent_color(Some(3));
        c.set_disposal_method(DisposalMethod::Keep);
        assert_eq!(c.flags(), 0b0000_0101);
        assert_eq!(DisposalMethod::from(9), DisposalMethod::Keep);
        assert_eq!(DisposalMethod::from(6), DisposalMethod::Reserved(6));
        assert_eq!(u8::from(DisposalMethod::Reserved(6)), 6);
    }

    #[test]
    fn transparent() {
        let mut c = GraphicControl::default();
        assert_eq!(c.transparent_color(), None);
        c.set_transparent_color(Some(42));
        assert_eq!(c.transparent_color(), Some(42));
        assert_eq!(c.flags(), 1);
        c.set_transparent_color(None);
        assert_eq!(c.transparent_color(), None);
        assert_eq!(c.transparent_color_idx(), 0);
        assert_eq!(c.flags(), 0);
    }

    #[test]
    fn loop_count() {
        let b = Application::default();
        assert_eq!(b.loop_count(), None);
        let b = Application::with_loop_count(0);
        assert_eq!(b.loop_count(), Some(0));
        let b = Application::with_loop_count(0x0102);
        assert_eq!(b.app_data()[1], [1, 0x02, 0x01]);
        assert_eq!(b.loop_count(), Some(0x0102));
    }
}
