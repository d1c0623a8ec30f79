// Minimal GIF reader for checking encoder output
#![allow(dead_code)]

/// Graphic control fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    pub flags: u8,
    pub delay_cs: u16,
    pub transparent_idx: u8,
}

impl Control {
    pub fn disposal(&self) -> u8 {
        (self.flags >> 2) & 0b111
    }

    pub fn transparent(&self) -> Option<u8> {
        if self.flags & 1 != 0 {
            Some(self.transparent_idx)
        } else {
            None
        }
    }
}

/// One parsed image
#[derive(Debug)]
pub struct Image {
    pub control: Option<Control>,
    pub width: u16,
    pub height: u16,
    pub flags: u8,
    pub local_table: Option<Vec<u8>>,
    pub min_code_size: u8,
    pub indices: Vec<u8>,
}

impl Image {
    /// Get the RGB color of one pixel
    pub fn rgb(&self, gif: &Gif, i: usize) -> [u8; 3] {
        let tbl = self.local_table.as_ref().unwrap_or(&gif.global_table);
        let idx = usize::from(self.indices[i]) * 3;
        [tbl[idx], tbl[idx + 1], tbl[idx + 2]]
    }
}

/// Parsed GIF file
#[derive(Debug)]
pub struct Gif {
    pub version: [u8; 3],
    pub width: u16,
    pub height: u16,
    pub screen_flags: u8,
    pub background_idx: u8,
    pub global_table: Vec<u8>,
    pub loop_count: Option<u16>,
    pub images: Vec<Image>,
}

struct Cursor<'a> {
    data: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> &'a [u8] {
        assert!(self.data.len() >= n, "truncated GIF");
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        head
    }

    fn byte(&mut self) -> u8 {
        self.take(1)[0]
    }

    fn u16(&mut self) -> u16 {
        let b = self.take(2);
        u16::from_le_bytes([b[0], b[1]])
    }

    fn sub_blocks(&mut self) -> Vec<Vec<u8>> {
        let mut blocks = vec![];
        loop {
            let len = usize::from(self.byte());
            if len == 0 {
                return blocks;
            }
            blocks.push(self.take(len).to_vec());
        }
    }
}

/// Decompress image data with the `lzw` crate
pub fn decompress(min_code_size: u8, data: &[u8]) -> Vec<u8> {
    let mut dec = lzw::Decoder::new(lzw::LsbReader::new(), min_code_size);
    let mut out = vec![];
    let mut buf = data;
    while !buf.is_empty() {
        let (consumed, bytes) = dec.decode_bytes(buf).unwrap();
        if consumed == 0 && bytes.is_empty() {
            break;
        }
        out.extend_from_slice(bytes);
        buf = &buf[consumed..];
    }
    out
}

/// Parse a complete GIF, panicking on malformed input
pub fn parse(data: &[u8]) -> Gif {
    let mut c = Cursor { data };
    assert_eq!(c.take(3), b"GIF");
    let mut version = [0; 3];
    version.copy_from_slice(c.take(3));
    let width = c.u16();
    let height = c.u16();
    let screen_flags = c.byte();
    let background_idx = c.byte();
    let _aspect = c.byte();
    let global_table = if screen_flags & 0x80 != 0 {
        let sz = 3 << ((screen_flags & 0x07) + 1);
        c.take(sz).to_vec()
    } else {
        vec![]
    };
    let mut gif = Gif {
        version,
        width,
        height,
        screen_flags,
        background_idx,
        global_table,
        loop_count: None,
        images: vec![],
    };
    let mut control = None;
    loop {
        match c.byte() {
            0x21 => {
                let label = c.byte();
                let blocks = c.sub_blocks();
                match label {
                    0xF9 => {
                        let b = &blocks[0];
                        assert_eq!(b.len(), 4);
                        control = Some(Control {
                            flags: b[0],
                            delay_cs: u16::from_le_bytes([b[1], b[2]]),
                            transparent_idx: b[3],
                        });
                    }
                    0xFF => {
                        assert!(control.is_none());
                        if blocks[0] == b"NETSCAPE2.0" {
                            let b = &blocks[1];
                            assert_eq!(b.len(), 3);
                            assert_eq!(b[0], 1);
                            gif.loop_count =
                                Some(u16::from_le_bytes([b[1], b[2]]));
                        }
                    }
                    _ => (),
                }
            }
            0x2C => {
                assert_eq!(c.u16(), 0);
                assert_eq!(c.u16(), 0);
                let width = c.u16();
                let height = c.u16();
                let flags = c.byte();
                let local_table = if flags & 0x80 != 0 {
                    let sz = 3 << ((flags & 0x07) + 1);
                    Some(c.take(sz).to_vec())
                } else {
                    None
                };
                let min_code_size = c.byte();
                let data: Vec<u8> = c.sub_blocks().concat();
                let indices = decompress(min_code_size, &data);
                gif.images.push(Image {
                    control: control.take(),
                    width,
                    height,
                    flags,
                    local_table,
                    min_code_size,
                    indices,
                });
            }
            0x3B => break,
            b => panic!("unexpected block: {:02X}", b),
        }
    }
    assert!(c.data.is_empty(), "data after trailer");
    gif
}

/// Packed RGB buffer of one color
pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    rgb.iter()
        .copied()
        .cycle()
        .take((width * height * 3) as usize)
        .collect()
}
