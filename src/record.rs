// record.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Frame recording on an encoder thread
use crate::{Encoder, Error, Frame, Result};
use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use std::io::Write;
use std::thread::{self, JoinHandle};

/// Statistics for a finished recording
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordStats {
    /// Number of frames written to the GIF
    pub encoded: usize,
    /// Number of frames dropped because the queue was full
    pub dropped: usize,
}

/// Animated GIF recorder
///
/// Captured frames are queued for an encoder thread.  Capturing never
/// blocks; when the queue is full, the oldest pending frame is dropped.
///
/// ## Example
/// ```
/// use gifrec::{Encoder, Frame, Recorder};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut rec = Recorder::spawn(Encoder::new(), Vec::new(), 4)?;
/// for shade in [0, 64, 128] {
///     let frame = Frame::with_rgb(2, 2, &[shade; 12])?.with_delay_ms(50);
///     rec.capture(frame)?;
/// }
/// let (gif, stats) = rec.finish()?;
/// assert_eq!(stats.encoded + stats.dropped, 3);
/// assert_eq!(gif.last(), Some(&0x3B));
/// # Ok(())
/// # }
/// ```
pub struct Recorder<W: Write + Send + 'static> {
    /// Capture side of the queue
    tx: Option<Sender<Frame>>,
    /// Receiver used to drop the oldest frame
    rx: Receiver<Frame>,
    /// Count of dropped frames
    dropped: usize,
    /// Encoder thread
    worker: Option<JoinHandle<Result<(W, usize)>>>,
}

/// Encode queued frames until the queue is closed
fn encode_frames<W: Write>(
    mut encoder: Encoder<W>,
    rx: Receiver<Frame>,
) -> Result<(W, usize)> {
    let mut encoded = 0;
    let mut failure = None;
    for frame in rx.iter() {
        if failure.is_some() {
            warn!("skipping frame after encoding failure");
            continue;
        }
        match encoder.add_frame(&frame) {
            Ok(()) => encoded += 1,
            Err(e) => {
                warn!("encoding frame {}: {}", encoded, e);
                failure = Some(e);
            }
        }
    }
    let sink = encoder.finish();
    if let Some(e) = failure {
        return Err(e);
    }
    Ok((sink?, encoded))
}

impl<W: Write + Send + 'static> Recorder<W> {
    /// Start a recording session on a new encoder thread.
    ///
    /// * `encoder` Configured encoder (must not be started).
    /// * `sink` Writer for the GIF.
    /// * `capacity` Maximum number of pending frames (at least 1).
    pub fn spawn(
        mut encoder: Encoder<W>,
        sink: W,
        capacity: usize,
    ) -> Result<Self> {
        encoder.start(sink)?;
        let (tx, rx) = bounded(capacity.max(1));
        let worker_rx = rx.clone();
        let worker = thread::Builder::new()
            .name("gifrec-encoder".into())
            .spawn(move || encode_frames(encoder, worker_rx))?;
        debug!("recorder started, capacity {}", capacity.max(1));
        Ok(Recorder {
            tx: Some(tx),
            rx,
            dropped: 0,
            worker: Some(worker),
        })
    }

    /// Capture a frame without blocking
    pub fn capture(&mut self, frame: Frame) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(Error::QueueClosed)?;
        // the worker only exits early by panicking
        match &self.worker {
            Some(worker) if !worker.is_finished() => (),
            Some(_) => return Err(Error::WorkerPanicked),
            None => return Err(Error::QueueClosed),
        }
        let mut frame = frame;
        loop {
            match tx.try_send(frame) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(f)) => {
                    if self.rx.try_recv().is_ok() {
                        self.dropped += 1;
                        warn!("capture queue full, dropped oldest frame");
                    }
                    frame = f;
                }
                Err(TrySendError::Disconnected(_)) => {
                    return Err(Error::QueueClosed)
                }
            }
        }
    }

    /// Get the number of frames waiting to be encoded
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Get the number of frames dropped so far
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Close the queue and wait for the encoder thread.
    ///
    /// Every pending frame is encoded before the trailer is written.
    pub fn finish(mut self) -> Result<(W, RecordStats)> {
        let (sink, encoded) = self.join()?;
        let stats = RecordStats {
            encoded,
            dropped: self.dropped,
        };
        info!("recording finished: {:?}", stats);
        Ok((sink, stats))
    }

    /// Close the queue and join the encoder thread
    fn join(&mut self) -> Result<(W, usize)> {
        self.tx.take();
        let worker = self.worker.take().ok_or(Error::QueueClosed)?;
        worker.join().map_err(|_| Error::WorkerPanicked)?
    }
}

impl<W: Write + Send + 'static> Drop for Recorder<W> {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.join() {
                error!("recording dropped: {}", e);
            }
        }
    }
}
