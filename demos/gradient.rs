// Animated gradient recording example
use gifrec::{Encoder, Frame, Recorder};
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;

/// Render one frame of a scrolling gradient
fn render(step: u32) -> Result<Frame, Box<dyn Error>> {
    let mut rgb = Vec::with_capacity((WIDTH * HEIGHT * 3) as usize);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            rgb.push(((x + step * 4) * 4 % 256) as u8);
            rgb.push((y * 5) as u8);
            rgb.push((255 - step * 8) as u8);
        }
    }
    Ok(Frame::with_rgb(WIDTH, HEIGHT, &rgb)?.with_delay_ms(80))
}

fn main() -> Result<(), Box<dyn Error>> {
    let f = BufWriter::new(File::create("gradient.gif")?);
    let enc = Encoder::new().with_loop_count(0).with_quality(10);
    let mut rec = Recorder::spawn(enc, f, 8)?;
    for step in 0..24 {
        rec.capture(render(step)?)?;
    }
    let (_f, stats) = rec.finish()?;
    println!("encoded {}, dropped {}", stats.encoded, stats.dropped);
    Ok(())
}
