// lib.rs      gifrec crate.
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! An animated GIF encoder for recording captured frames.
//!
//! Each frame gets its own 256-color palette, learned with a neural-net
//! quantizer.  Frames can be encoded directly with an [Encoder], or
//! queued from a capture loop with a [Recorder], which encodes on a
//! worker thread.
//!
//! [Encoder]: struct.Encoder.html
//! [Recorder]: struct.Recorder.html
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

pub mod block;
mod encode;
mod error;
mod indexer;
mod lzw;
mod palette;
mod private;
mod quant;
mod record;

pub use crate::block::DisposalMethod;
pub use crate::encode::BlockEnc;
pub use crate::error::{Error, Result};
pub use crate::indexer::{find_closest, find_exact, ColorMatch, IndexedFrame};
pub use crate::palette::PaletteIndex;
pub use crate::private::{Encoder, Frame, SessionState};
pub use crate::quant::{Network, QUALITY_BEST, QUALITY_FASTEST};
pub use crate::record::{RecordStats, Recorder};
