use std::io::Cursor;

use bytes::Bytes;

/// One synthesized audio payload for exactly one increment's text.
///
/// The encoded bytes are opaque to the queue. `text` rides along as the
/// label for logs and the now-speaking readout.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub text: String,
    pub bytes: Bytes,
}

impl AudioClip {
    pub fn new(text: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            text: text.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the clip as WAV into mono PCM in [-1, 1] plus its sample
    /// rate. Clips in any other container yield `None`; the waveform
    /// view simply has nothing to draw for them. Unreadable samples in a
    /// truncated file are dropped rather than failing the whole decode.
    pub fn pcm(&self) -> Option<(Vec<f32>, u32)> {
        let mut reader = hound::WavReader::new(Cursor::new(self.bytes.as_ref())).ok()?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => {
                reader.samples::<f32>().filter_map(Result::ok).collect()
            }
            hound::SampleFormat::Int => {
                let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .filter_map(Result::ok)
                    .map(|s| s as f32 / full_scale)
                    .collect()
            }
        };

        let mono = if channels == 1 {
            samples
        } else {
            samples
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };
        Some((mono, spec.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &sample in samples {
                writer.write_sample(sample).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_pcm_decodes_mono_wav() {
        let clip = AudioClip::new("hi", wav_bytes(&[0, i16::MAX, i16::MIN], 1, 22_050));

        let (pcm, sample_rate) = clip.pcm().expect("wav should decode");
        assert_eq!(sample_rate, 22_050);
        assert_eq!(pcm.len(), 3);
        assert_eq!(pcm[0], 0.0);
        assert!((pcm[1] - 1.0).abs() < 1e-3);
        assert!((pcm[2] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_pcm_downmixes_stereo_to_mono() {
        let clip = AudioClip::new("hi", wav_bytes(&[1000, 3000, -2000, 2000], 2, 16_000));

        let (pcm, _) = clip.pcm().expect("wav should decode");
        assert_eq!(pcm.len(), 2);
        assert!((pcm[0] - 2000.0 / 32_768.0).abs() < 1e-6);
        assert!(pcm[1].abs() < 1e-6);
    }

    #[test]
    fn test_pcm_rejects_other_containers() {
        let clip = AudioClip::new("hi", &b"ID3\x04not a wav at all"[..]);
        assert!(clip.pcm().is_none());
    }
}
