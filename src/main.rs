// main.rs      gifrec command
//
// Copyright (c) 2019-2025  Douglas Lau
//
#![forbid(unsafe_code)]

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use gifrec::{Encoder, Frame};
use std::error::Error;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &'static str = std::env!("CARGO_PKG_VERSION");

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stdout(ColorChoice::Auto);
    match create_app().get_matches().subcommand() {
        ("wrap", Some(matches)) => wrap(&mut out, matches)?,
        _ => unreachable!(),
    }
    out.reset()?;
    Ok(())
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    App::new("gifrec")
        .version(VERSION)
        .setting(AppSettings::GlobalVersion)
        .about("Animated GIF recorder")
        .setting(AppSettings::ArgRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("wrap")
                .about("Wrap PPM frames into an animated GIF")
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .required(true)
                        .help("output GIF file"),
                )
                .arg(
                    Arg::with_name("delay")
                        .long("delay")
                        .takes_value(true)
                        .default_value("100")
                        .help("delay between frames (ms)"),
                )
                .arg(
                    Arg::with_name("quality")
                        .long("quality")
                        .takes_value(true)
                        .default_value("10")
                        .help("quality: 1 (best) to 30 (fastest)"),
                )
                .arg(
                    Arg::with_name("repeat")
                        .long("repeat")
                        .takes_value(true)
                        .help("loop count (0 loops forever)"),
                )
                .arg(
                    Arg::with_name("files")
                        .required(true)
                        .min_values(1)
                        .help("input PPM file(s)"),
                ),
        )
}

/// Handle wrap subcommand
fn wrap(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let mut green = ColorSpec::new();
    green.set_fg(Some(Color::Green)).set_intense(true);
    let mut magenta = ColorSpec::new();
    magenta.set_fg(Some(Color::Magenta));
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    let delay: u32 = matches.value_of("delay").unwrap_or("100").parse()?;
    let quality: u8 = matches.value_of("quality").unwrap_or("10").parse()?;
    let output = matches.value_of_os("output").ok_or("missing output")?;
    let mut enc = Encoder::new().with_quality(quality).with_delay_ms(delay);
    if let Some(repeat) = matches.value_of("repeat") {
        enc = enc.with_loop_count(repeat.parse()?);
    }
    let files = matches.values_of_os("files").ok_or("missing files")?;
    enc.start(BufWriter::new(File::create(output)?))?;
    for path in files {
        let frame = read_ppm(path)?;
        out.set_color(&magenta)?;
        write!(out, "{:?}", path)?;
        out.set_color(&bold)?;
        writeln!(out, " {}x{}", frame.width(), frame.height())?;
        enc.add_frame(&frame)?;
    }
    let n_frames = enc.frame_count();
    enc.finish()?;
    out.set_color(&green)?;
    writeln!(out, "wrote {} frames to {:?}", n_frames, output)?;
    Ok(())
}

/// Read a binary PPM (P6) file as a frame
fn read_ppm(path: &OsStr) -> Result<Frame, Box<dyn Error>> {
    let mut buf = vec![];
    File::open(path)?.read_to_end(&mut buf)?;
    let mut data = &buf[..];
    let magic = next_token(&mut data).ok_or("missing PPM header")?;
    if magic != b"P6" {
        return Err("only binary PPM (P6) is supported".into());
    }
    let mut fields = [0u32; 3];
    for field in fields.iter_mut() {
        let tok = next_token(&mut data).ok_or("truncated PPM header")?;
        *field = std::str::from_utf8(tok)?.parse()?;
    }
    let [width, height, max_val] = fields;
    if max_val != 255 {
        return Err("only 8-bit PPM is supported".into());
    }
    // single whitespace byte before the raster
    let len = (width as usize) * (height as usize) * 3;
    let raster = data.get(1..1 + len).ok_or("truncated PPM raster")?;
    Ok(Frame::with_rgb(width, height, raster)?)
}

/// Take the next header token, skipping whitespace and comments
fn next_token<'a>(data: &mut &'a [u8]) -> Option<&'a [u8]> {
    loop {
        match *data.first()? {
            b'#' => {
                let end = data.iter().position(|b| *b == b'\n')?;
                *data = &data[end..];
            }
            b if b.is_ascii_whitespace() => *data = &data[1..],
            _ => break,
        }
    }
    let end = data
        .iter()
        .position(|b| b.is_ascii_whitespace())
        .unwrap_or(data.len());
    let (tok, rest) = data.split_at(end);
    *data = rest;
    Some(tok)
}
