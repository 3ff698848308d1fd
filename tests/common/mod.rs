// Common test utilities for detiling integration tests
//
// This module provides scratch files, deterministic dump contents and
// frame comparison helpers shared by the integration suites.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use xenos_fb::{LinearFrame, Resolution, TiledFramebuffer};

/// Padded sizes the permutation checks sweep over
pub const PADDED_WIDTHS: [u32; 4] = [32, 64, 96, 1280];
pub const PADDED_HEIGHTS: [u32; 3] = [32, 64, 736];

/// Path in the system temp directory, unique to this test process
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("xenos_fb_it_{}_{}", std::process::id(), name))
}

/// Write `bytes` to a scratch file and return its path
pub fn write_dump(name: &str, bytes: &[u8]) -> PathBuf {
    let path = temp_path(name);
    fs::write(&path, bytes).expect("Failed to write scratch dump");
    path
}

/// Deterministic pseudo-random bytes (xorshift32)
pub fn noise_bytes(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

/// Tiled dump filled with noise, so every source pixel is distinguishable
pub fn noise_dump(internal: Resolution, seed: u32) -> TiledFramebuffer {
    let padded = internal.padded();
    TiledFramebuffer::from_bytes(internal, noise_bytes(padded.area() * 4, seed))
        .expect("noise dump has the padded size")
}

/// Assert two frames match, reporting the first differing pixel
pub fn assert_frames_equal(actual: &LinearFrame, expected: &LinearFrame) {
    assert_eq!(actual.resolution(), expected.resolution());
    let mismatch = actual
        .as_slice()
        .iter()
        .zip(expected.as_slice())
        .position(|(a, b)| a != b);
    if let Some(index) = mismatch {
        let width = actual.width() as usize;
        panic!(
            "pixel ({}, {}) differs: {:#010x} != {:#010x}",
            index % width,
            index / width,
            actual.as_slice()[index],
            expected.as_slice()[index]
        );
    }
}
