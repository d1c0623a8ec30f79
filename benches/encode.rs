use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gifrec::{Encoder, Frame, Network};

/// Packed RGB gradient with a diagonal stripe
fn gradient(width: u32, height: u32) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let stripe = if (x + y) % 16 < 2 { 255 } else { 0 };
            rgb.push((x * 255 / width) as u8);
            rgb.push((y * 255 / height) as u8);
            rgb.push(stripe);
        }
    }
    rgb
}

fn learn_palette(crit: &mut Criterion) {
    let rgb = gradient(160, 120);
    let bgr: Vec<u8> = rgb
        .chunks_exact(3)
        .flat_map(|p| [p[2], p[1], p[0]])
        .collect();
    crit.bench_function("learn_q10", |b| {
        b.iter(|| Network::learn(black_box(&bgr), 10))
    });
    crit.bench_function("learn_q30", |b| {
        b.iter(|| Network::learn(black_box(&bgr), 30))
    });
}

fn encode_frames(crit: &mut Criterion) {
    let frame = Frame::with_rgb(160, 120, &gradient(160, 120)).unwrap();
    crit.bench_function("encode_frames", |b| {
        b.iter(|| {
            let mut enc = Encoder::new().with_quality(20);
            enc.start(Vec::with_capacity(65536)).unwrap();
            for _ in 0..4 {
                enc.add_frame(black_box(&frame)).unwrap();
            }
            enc.finish().unwrap()
        })
    });
}

criterion_group!(benches, learn_palette, encode_frames);
criterion_main!(benches);
