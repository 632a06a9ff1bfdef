use crate::errors::BufferError;
use crate::palette;

/// A decoded image as a flat RGBA byte buffer. Fresh buffers come out of
/// every fetch; nothing mutates one after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) data: Vec<u8>,
}

impl PixelBuffer {
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, BufferError> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(BufferError::SizeMismatch {
                len: data.len(),
                width,
                height,
            });
        }

        Ok(PixelBuffer {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn alpha(&self, index: u32) -> u8 {
        self.data[index as usize * 4 + 3]
    }

    pub fn rgb(&self, index: u32) -> (u8, u8, u8) {
        let offset = index as usize * 4;
        (self.data[offset], self.data[offset + 1], self.data[offset + 2])
    }

    /// Canonical hex color at the given pixel index. Alpha is deliberately
    /// excluded so buffers from different sources compare by color alone.
    pub fn hex(&self, index: u32) -> String {
        let (r, g, b) = self.rgb(index);
        palette::rgb_to_hex(r, g, b)
    }

    pub fn coords(&self, index: u32) -> (u32, u32) {
        (index % self.width, index / self.width)
    }

    pub fn index(&self, x: u32, y: u32) -> u32 {
        y * self.width + x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_buffer_length() {
        assert_eq!(
            PixelBuffer::from_rgba(2, 2, vec![0; 15]),
            Err(BufferError::SizeMismatch {
                len: 15,
                width: 2,
                height: 2,
            })
        );
    }

    #[test]
    fn channel_accessors_use_linear_index() {
        let mut data = vec![0u8; 2 * 2 * 4];
        // pixel (1, 1)
        data[12..16].copy_from_slice(&[0xFF, 0x45, 0x00, 0xFF]);
        let buffer = PixelBuffer::from_rgba(2, 2, data).unwrap();

        assert_eq!(buffer.index(1, 1), 3);
        assert_eq!(buffer.coords(3), (1, 1));
        assert_eq!(buffer.alpha(3), 0xFF);
        assert_eq!(buffer.hex(3), "#FF4500");
        assert_eq!(buffer.alpha(0), 0);
    }
}
