use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaletteError {
    #[error("unknown color {0}")]
    UnknownColor(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer of {len} bytes does not match {width}x{height} rgba dimensions")]
    SizeMismatch { len: usize, width: u32, height: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssembleError {
    #[error("layout expects {expected} tiles, got {actual}")]
    WrongTileCount { expected: usize, actual: usize },
    #[error("tile {tile} is {actual} bytes, layout expects {expected}")]
    LayoutMismatch {
        tile: usize,
        expected: usize,
        actual: usize,
    },
}
