/// Sound engine: square-wave buzzer effects via rodio, in the spirit of a
/// piezo on a handheld.
///
/// Every effect is rendered to an in-memory WAV buffer at startup.
/// Playback is fire-and-forget through a detached rodio Sink.
///
/// Without the "sound" feature the stub SoundEngine does nothing.

use crate::sim::event::GameEvent;

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_jump: Arc<Vec<u8>>,
        sfx_push: Arc<Vec<u8>>,
        sfx_die: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, sound disabled: {}", e);
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_jump: Arc::new(make_wav(&gen_jump())),
                sfx_push: Arc::new(make_wav(&gen_push())),
                sfx_die: Arc::new(make_wav(&gen_die())),
                sfx_clear: Arc::new(make_wav(&gen_clear())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_jump(&self) {
            self.play(&self.sfx_jump);
        }
        pub fn play_push(&self) {
            self.play(&self.sfx_push);
        }
        pub fn play_die(&self) {
            self.play(&self.sfx_die);
        }
        pub fn play_clear(&self) {
            self.play(&self.sfx_clear);
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples
    // ════════════════════════════════════════════════════════════

    fn square(t: f32, freq: f32) -> f32 {
        if (t * freq).fract() < 0.5 { 1.0 } else { -1.0 }
    }

    /// Square tone gliding from `from` to `to` Hz.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let k = i as f32 / n as f32;
                phase += (from + (to - from) * k) / SAMPLE_RATE as f32;
                let s = if phase.fract() < 0.5 { 1.0 } else { -1.0 };
                s * (1.0 - k) * volume
            })
            .collect()
    }

    /// Square notes back to back, each with a short release.
    fn notes(freqs: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * note_dur) as usize;
        let mut samples = Vec::with_capacity(n * freqs.len());
        for &freq in freqs {
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = if i > n * 3 / 4 { (n - i) as f32 / (n / 4) as f32 } else { 1.0 };
                samples.push(square(t, freq) * env * volume);
            }
        }
        samples
    }

    /// Jump: quick rising chirp
    fn gen_jump() -> Vec<f32> {
        sweep(330.0, 880.0, 0.09, 0.15)
    }

    /// Push: low scrape
    fn gen_push() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.07) as usize;
        let mut rng: u32 = 2004;
        (0..n)
            .map(|i| {
                rng = rng.wrapping_mul(1664525).wrapping_add(1013904223);
                let noise = (rng >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                (square(t, 110.0) * 0.5 + noise * 0.5) * env * 0.18
            })
            .collect()
    }

    /// Death: falling sweep, then two low beeps
    fn gen_die() -> Vec<f32> {
        let mut samples = sweep(700.0, 150.0, 0.35, 0.18);
        samples.extend(notes(&[196.0, 147.0], 0.14, 0.16));
        samples
    }

    /// Level complete: rising arpeggio with a held top note
    fn gen_clear() -> Vec<f32> {
        let mut samples = notes(&[523.0, 659.0, 784.0], 0.08, 0.15);
        samples.extend(notes(&[1047.0], 0.3, 0.15));
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine)
    }
    pub fn play_jump(&self) {}
    pub fn play_push(&self) {}
    pub fn play_die(&self) {}
    pub fn play_clear(&self) {}
}

impl SoundEngine {
    /// Effect for a simulation event, if it has one.
    pub fn play_event(&self, event: &GameEvent) {
        match event {
            GameEvent::Jumped => self.play_jump(),
            GameEvent::Pushed { .. } => self.play_push(),
            GameEvent::PlayerKilled { .. } => self.play_die(),
            GameEvent::LevelComplete => self.play_clear(),
            GameEvent::GoalReached | GameEvent::LevelReset => {}
        }
    }
}
