//! Synthesized fallback alarm.
//!
//! Used when no alarm file is present in the sounds directory.

use std::time::Duration;

use rodio::source::{Amplify, SineWave, Source, TakeDuration};
use rodio::Sink;

/// Frequencies of the two chime tones (A5, E6).
const CHIME_TONES_HZ: [f32; 2] = [880.0, 1318.5];

/// Length of each tone.
const TONE_DURATION: Duration = Duration::from_millis(220);

/// Builds one chime tone.
#[must_use]
fn tone(frequency: f32) -> Amplify<TakeDuration<SineWave>> {
    SineWave::new(frequency)
        .take_duration(TONE_DURATION)
        .amplify(0.8)
}

/// Queues the full chime on `sink`.
pub fn append_chime(sink: &Sink) {
    for frequency in CHIME_TONES_HZ {
        sink.append(tone(frequency));
    }
}
