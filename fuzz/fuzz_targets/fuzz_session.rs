//! Fuzz target: `PetService` event interleavings
//!
//! Decodes the input as a stream of (opcode, argument) byte pairs that
//! press buttons, feed classifier output and advance the clock, then
//! verifies:
//! - No panics under arbitrary input
//! - `last_fed_at` never moves backwards
//! - `pending_detection_since` is never in the future
//!
//! cargo fuzz run fuzz_session

#![no_main]

use libfuzzer_sys::fuzz_target;
use petpal::app::events::AppEvent;
use petpal::app::ports::{DisplayPort, DisplayView, EventSink};
use petpal::app::service::PetService;
use petpal::config::PetConfig;
use petpal::smoother::ConfidenceSample;

struct Null;

impl DisplayPort for Null {
    fn render(&mut self, _view: &DisplayView) {}
}

impl EventSink for Null {
    fn emit(&mut self, _event: &AppEvent) {}
}

const LABELS: [&str; 4] = ["carrot", "ball", "mug", "Carrot Cake"];

fuzz_target!(|data: &[u8]| {
    let Ok(mut app) = PetService::new(PetConfig::default()) else {
        return;
    };
    let (mut display, mut sink) = (Null, Null);
    app.start(0, &mut display, &mut sink);

    let mut now = 0u64;
    let mut last_fed = 0u64;
    for pair in data.chunks_exact(2) {
        let (op, arg) = (pair[0], pair[1]);
        let label = LABELS[usize::from(arg) % LABELS.len()];
        match op % 4 {
            0 => app.press(now, label, &mut display, &mut sink),
            1 => {
                // Includes out-of-range probabilities on purpose.
                let p = f32::from(arg) / 200.0;
                app.observe(now, &[ConfidenceSample::new(label, p)], &mut display, &mut sink);
            }
            2 => {
                now += u64::from(arg) * 250;
                app.advance(now, &mut display, &mut sink);
            }
            _ => app.observe(now, &[], &mut display, &mut sink),
        }

        assert!(app.last_fed_at() >= last_fed);
        last_fed = app.last_fed_at();
        if let Some(since) = app.pending_detection_since() {
            assert!(since <= now);
        }
    }
});
