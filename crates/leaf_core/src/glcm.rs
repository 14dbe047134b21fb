//! Gray-level co-occurrence matrix for horizontally adjacent pixels.

use image::GrayImage;

pub const LEVELS: usize = 256;

/// Joint histogram of `(pixel, right neighbour)` intensities.
#[derive(Debug, Clone, PartialEq)]
pub struct Glcm {
    counts: Vec<u32>,
    pairs: u64,
}

impl Glcm {
    /// Counts every pixel against its right neighbour; the last column has
    /// no neighbour and only appears as a right-hand value.
    pub fn horizontal(gray: &GrayImage) -> Self {
        let mut counts = vec![0u32; LEVELS * LEVELS];
        let mut pairs = 0u64;
        let width = gray.width() as usize;
        if width >= 2 {
            for row in gray.as_raw().chunks_exact(width) {
                for pair in row.windows(2) {
                    counts[usize::from(pair[0]) * LEVELS + usize::from(pair[1])] += 1;
                    pairs += 1;
                }
            }
        }
        Self { counts, pairs }
    }

    pub fn pairs(&self) -> u64 {
        self.pairs
    }

    pub fn count(&self, i: u8, j: u8) -> u32 {
        self.counts[usize::from(i) * LEVELS + usize::from(j)]
    }

    /// Normalized joint probability `P(i, j)`; zero for an empty matrix.
    pub fn probability(&self, i: u8, j: u8) -> f64 {
        match self.pairs() {
            0 => 0.0,
            pairs => f64::from(self.count(i, j)) / pairs as f64,
        }
    }

    /// Expected squared intensity difference, `sum (i - j)^2 * P(i, j)`.
    pub fn contrast(&self) -> f64 {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .map(|(idx, _)| {
                let (i, j) = ((idx / LEVELS) as u8, (idx % LEVELS) as u8);
                let diff = f64::from(i) - f64::from(j);
                diff * diff * self.probability(i, j)
            })
            .sum()
    }
}
