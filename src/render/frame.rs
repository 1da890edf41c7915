use crate::foundation::core::{Canvas, Rgb8};

/// A rendered frame as opaque RGBA8 pixels, tightly packed, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// A frame filled with `color`.
    pub fn filled(canvas: Canvas, color: Rgb8) -> Self {
        let mut frame = Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.rgba_len()],
        };
        frame.fill(color);
        frame
    }

    /// Overwrite every pixel with `color`.
    pub fn fill(&mut self, color: Rgb8) {
        let px = color.to_rgba();
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    /// Pixel at `(x, y)`, if inside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Number of pixels equal to `color`.
    pub fn count_color(&self, color: Rgb8) -> usize {
        let px = color.to_rgba();
        self.data.chunks_exact(4).filter(|c| *c == px).count()
    }
}
