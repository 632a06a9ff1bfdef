mod buffer;
mod errors;
mod layout;
pub mod palette;
mod workset;

pub use crate::buffer::PixelBuffer;
pub use crate::errors::{AssembleError, BufferError, PaletteError};
pub use crate::layout::{quadrant_for, CanvasLayout, PLACE_LAYOUT};
pub use crate::workset::{pending_work, real_work, TargetState};
