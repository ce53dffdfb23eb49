//! Fills fully transparent pixels with the average color of their nearest
//! opaque neighbors, working outward from the artwork's edges. Alpha stays
//! untouched, so the image looks identical, but resampling no longer drags
//! black from the transparent background into anti-aliased edges.
//!
//! Adapted from Asphalt (https://github.com/jackTabsCode/asphalt).

use std::collections::VecDeque;

use bit_vec::BitVec;
use image::{Rgba, RgbaImage};

pub fn alpha_bleed(img: &mut RgbaImage) {
    let (w, h) = img.dimensions();

    let mut sampled = Mask::new(w, h);
    let mut queued = Mask::new(w, h);
    let mut frontier = VecDeque::new();

    for (x, y, pixel) in img.enumerate_pixels() {
        if pixel[3] != 0 {
            sampled.set(x, y);
            queued.set(x, y);
        }
    }

    for y in 0..h {
        for x in 0..w {
            if queued.get(x, y) {
                continue;
            }
            if neighbors(x, y, w, h).any(|(nx, ny)| img.get_pixel(nx, ny)[3] != 0) {
                queued.set(x, y);
                frontier.push_back((x, y));
            }
        }
    }

    while !frontier.is_empty() {
        let ring: Vec<(u32, u32)> = frontier.drain(..).collect();
        let mut filled = Vec::with_capacity(ring.len());

        for (x, y) in ring {
            let mut sum = [0u32; 3];
            let mut count = 0u32;

            for (nx, ny) in neighbors(x, y, w, h) {
                if sampled.get(nx, ny) {
                    let source = img.get_pixel(nx, ny);
                    sum[0] += source[0] as u32;
                    sum[1] += source[1] as u32;
                    sum[2] += source[2] as u32;
                    count += 1;
                } else if !queued.get(nx, ny) {
                    queued.set(nx, ny);
                    frontier.push_back((nx, ny));
                }
            }

            let count = count.max(1);
            img.put_pixel(
                x,
                y,
                Rgba([
                    (sum[0] / count) as u8,
                    (sum[1] / count) as u8,
                    (sum[2] / count) as u8,
                    0,
                ]),
            );
            filled.push((x, y));
        }

        // Pixels filled in this ring only become sources for the next one.
        for (x, y) in filled {
            sampled.set(x, y);
        }
    }
}

const DIRECTIONS: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

fn neighbors(x: u32, y: u32, w: u32, h: u32) -> impl Iterator<Item = (u32, u32)> {
    DIRECTIONS.iter().filter_map(move |&(dx, dy)| {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
            return None;
        }
        Some((nx as u32, ny as u32))
    })
}

struct Mask {
    width: u32,
    bits: BitVec,
}

impl Mask {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            bits: BitVec::from_elem(width as usize * height as usize, false),
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        x as usize + y as usize * self.width as usize
    }

    fn get(&self, x: u32, y: u32) -> bool {
        self.bits.get(self.index(x, y)).unwrap_or(false)
    }

    fn set(&mut self, x: u32, y: u32) {
        let index = self.index(x, y);
        self.bits.set(index, true);
    }
}
