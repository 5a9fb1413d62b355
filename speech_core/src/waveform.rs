//! Time-domain waveform sampling for whatever the device is sounding
//! out, read as unsigned bytes with silence centered on 128.

/// Samples per analyser window
pub const WINDOW_SIZE: usize = 256;

/// Byte value of a silent sample
pub const CENTER: u8 = 128;

fn to_byte(sample: f32) -> u8 {
    let clamped = sample.clamp(-1.0, 1.0);
    (clamped * 127.0 + 128.0).round() as u8
}

/// Cut one window out of `samples` starting at `offset`, mapped to
/// bytes. Positions past the end of the clip read as silence.
pub fn byte_window(samples: &[f32], offset: usize) -> Vec<u8> {
    (offset..offset + WINDOW_SIZE)
        .map(|i| samples.get(i).map_or(CENTER, |s| to_byte(*s)))
        .collect()
}

/// Downsample a byte window into at most `n` display bins, each the
/// average of its slice
pub fn bins(window: &[u8], n: usize) -> Vec<u8> {
    if n == 0 || window.is_empty() {
        return Vec::new();
    }
    let per_bin = window.len().div_ceil(n);
    window
        .chunks(per_bin)
        .map(|chunk| (chunk.iter().map(|&b| b as u32).sum::<u32>() / chunk.len() as u32) as u8)
        .collect()
}
