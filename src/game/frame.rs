/// Number of color channels in a rendered frame.
pub const CHANNELS: usize = 3;

/// Background color of the court. Channel 0 is what the preprocessor erases.
pub const BACKGROUND: [u8; CHANNELS] = [43, 48, 58];

/// Color used for paddles and the ball.
pub const FOREGROUND: [u8; CHANNELS] = [255, 255, 255];

/// A rendered RGB observation, row-major with interleaved channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    height: usize,
    width: usize,
    data: Vec<u8>,
}

impl Frame {
    /// A frame filled with one color.
    pub fn filled(height: usize, width: usize, color: [u8; CHANNELS]) -> Self {
        let mut data = Vec::with_capacity(height * width * CHANNELS);
        for _ in 0..height * width {
            data.extend_from_slice(&color);
        }
        Frame {
            height,
            width,
            data,
        }
    }

    /// Wrap raw interleaved pixel data. Returns `None` on a size mismatch.
    pub fn from_raw(height: usize, width: usize, data: Vec<u8>) -> Option<Self> {
        if data.len() != height * width * CHANNELS {
            return None;
        }
        Some(Frame {
            height,
            width,
            data,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, row: usize, col: usize, channel: usize) -> u8 {
        self.data[(row * self.width + col) * CHANNELS + channel]
    }

    pub fn set_pixel(&mut self, row: usize, col: usize, color: [u8; CHANNELS]) {
        let idx = (row * self.width + col) * CHANNELS;
        self.data[idx..idx + CHANNELS].copy_from_slice(&color);
    }

    /// Paint an axis-aligned rectangle, clipped to the frame.
    pub fn fill_rect(
        &mut self,
        top: isize,
        left: isize,
        height: usize,
        width: usize,
        color: [u8; CHANNELS],
    ) {
        let row_start = top.max(0) as usize;
        let col_start = left.max(0) as usize;
        let row_end = ((top + height as isize).max(0) as usize).min(self.height);
        let col_end = ((left + width as isize).max(0) as usize).min(self.width);
        for row in row_start..row_end {
            for col in col_start..col_end {
                self.set_pixel(row, col, color);
            }
        }
    }

    /// Left-right mirror image, used for the second player's point of view.
    pub fn mirrored(&self) -> Frame {
        let mut out = self.clone();
        for row in 0..self.height {
            for col in 0..self.width {
                let src = (row * self.width + (self.width - 1 - col)) * CHANNELS;
                let dst = (row * self.width + col) * CHANNELS;
                out.data[dst..dst + CHANNELS].copy_from_slice(&self.data[src..src + CHANNELS]);
            }
        }
        out
    }

    pub fn is_background(&self, row: usize, col: usize) -> bool {
        self.get(row, col, 0) == BACKGROUND[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_clips() {
        let mut frame = Frame::filled(4, 4, BACKGROUND);
        frame.fill_rect(-1, 2, 3, 5, FOREGROUND);
        assert_eq!(frame.get(0, 2, 0), 255);
        assert_eq!(frame.get(1, 3, 1), 255);
        assert_eq!(frame.get(2, 3, 0), BACKGROUND[0]);
        assert_eq!(frame.get(0, 1, 0), BACKGROUND[0]);
    }

    #[test]
    fn test_mirrored() {
        let mut frame = Frame::filled(2, 3, BACKGROUND);
        frame.set_pixel(1, 0, FOREGROUND);
        let mirrored = frame.mirrored();
        assert_eq!(mirrored.get(1, 2, 0), 255);
        assert!(mirrored.is_background(1, 0));
        assert_eq!(mirrored.mirrored(), frame);
    }

    #[test]
    fn test_from_raw_checks_size() {
        assert!(Frame::from_raw(2, 2, vec![0; 12]).is_some());
        assert!(Frame::from_raw(2, 2, vec![0; 11]).is_none());
    }
}
