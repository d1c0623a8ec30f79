// error.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
use std::fmt;
use std::io;
use std::num::TryFromIntError;

/// Errors encountered while encoding or recording
#[derive(Debug)]
pub enum Error {
    /// A wrapped I/O error from the sink.
    Io(io::Error),
    /// Integer out of bounds.
    TryFromInt(TryFromIntError),
    /// Operation requires a started session.
    NotStarted,
    /// Session was already started.
    AlreadyStarted,
    /// Session finished before any frame was added.
    NoFrames,
    /// Frame or screen size is zero or larger than a GIF can hold.
    InvalidFrameDimensions,
    /// Pixel buffer length does not match the frame dimensions.
    InvalidPixelData,
    /// Capture queue has been closed.
    QueueClosed,
    /// Encoder worker thread panicked.
    WorkerPanicked,
}

/// Gifrec result type
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(fmt),
            Error::TryFromInt(err) => err.fmt(fmt),
            _ => fmt::Debug::fmt(self, fmt),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::TryFromInt(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<TryFromIntError> for Error {
    fn from(err: TryFromIntError) -> Self {
        Error::TryFromInt(err)
    }
}
