//! Binary masks

/// A binary grid with one byte (0 or 1) per pixel, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Mask {
    /// An all-zero mask
    pub fn new(width: u32, height: u32) -> Self {
        Mask { width, height, data: vec![0; width as usize * height as usize] }
    }

    /// Build from a predicate over (col, row)
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut mask = Mask::new(width, height);
        for row in 0..height {
            for col in 0..width {
                if f(col, row) {
                    mask.set(col, row, true);
                }
            }
        }
        mask
    }

    pub fn get(&self, col: u32, row: u32) -> bool {
        col < self.width && row < self.height && self.data[self.index(col, row)] != 0
    }

    pub fn set(&mut self, col: u32, row: u32, value: bool) {
        let index = self.index(col, row);
        self.data[index] = value as u8;
    }

    fn index(&self, col: u32, row: u32) -> usize {
        row as usize * self.width as usize + col as usize
    }

    /// Number of set pixels
    pub fn count(&self) -> usize {
        self.data.iter().filter(|v| **v != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|v| *v == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_and_count() {
        let mask = Mask::from_fn(4, 3, |col, row| col == row);
        assert_eq!(mask.count(), 3);
        assert!(mask.get(2, 2));
        assert!(!mask.get(3, 2));
        assert!(!mask.get(10, 0));
    }
}
