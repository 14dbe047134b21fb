//! Canny edge detection run directly on the grayscale image.
//!
//! No smoothing happens before the Sobel step. Gradient magnitude is the L1
//! norm `|gx| + |gy|`, the direction is quantised to four sectors, and weak
//! edges survive only when 8-connected to a strong one.

use image::{GrayImage, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

// tan(22.5 deg) in Q15
const TG22: i64 = 13_573;

const NONE: u8 = 0;
const WEAK: u8 = 1;
const STRONG: u8 = 2;

/// Binary edge map, 255 on edges and 0 elsewhere.
pub fn canny(gray: &GrayImage, low: f32, high: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as usize, height as usize);

    let dx: Vec<i32> = horizontal_sobel(gray)
        .pixels()
        .map(|p| i32::from(p.0[0]))
        .collect();
    let dy: Vec<i32> = vertical_sobel(gray)
        .pixels()
        .map(|p| i32::from(p.0[0]))
        .collect();
    let mag: Vec<i32> = dx.iter().zip(&dy).map(|(x, y)| x.abs() + y.abs()).collect();

    // out-of-image magnitudes count as zero
    let at = |x: isize, y: isize| -> i32 {
        if x < 0 || y < 0 || x >= w as isize || y >= h as isize {
            0
        } else {
            mag[y as usize * w + x as usize]
        }
    };

    let mut state = vec![NONE; w * h];
    let mut strong: Vec<usize> = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let m = mag[idx];
            if m as f32 <= low {
                continue;
            }
            let (xi, yi) = (x as isize, y as isize);
            let xs = i64::from(dx[idx].abs());
            let ys = i64::from(dy[idx].abs()) << 15;
            let tg22x = xs * TG22;

            let is_max = if ys < tg22x {
                m > at(xi - 1, yi) && m >= at(xi + 1, yi)
            } else if ys > tg22x + (xs << 16) {
                m > at(xi, yi - 1) && m >= at(xi, yi + 1)
            } else {
                let s = if (dx[idx] ^ dy[idx]) < 0 { -1 } else { 1 };
                m > at(xi - s, yi - 1) && m > at(xi + s, yi + 1)
            };
            if !is_max {
                continue;
            }
            if m as f32 > high {
                state[idx] = STRONG;
                strong.push(idx);
            } else {
                state[idx] = WEAK;
            }
        }
    }

    while let Some(idx) = strong.pop() {
        let (x, y) = (idx % w, idx / w);
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                let n = ny * w + nx;
                if state[n] == WEAK {
                    state[n] = STRONG;
                    strong.push(n);
                }
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let s = state[y as usize * w + x as usize];
        Luma([if s == STRONG { 255 } else { 0 }])
    })
}
