//! Console display adapter.
//!
//! Implements [`DisplayPort`] by logging each rendered view: the eyes
//! image file, the status line and whether the start overlay is up.

use log::info;

use crate::app::ports::{DisplayPort, DisplayView};

/// Text-mode stand-in for the pet's window.
#[derive(Debug, Default)]
pub struct ConsoleDisplay;

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self
    }
}

impl DisplayPort for ConsoleDisplay {
    fn render(&mut self, view: &DisplayView) {
        info!(
            "VIEW  | eyes={} | status=\"{}\"{}",
            view.image.image_name(),
            view.status,
            if view.overlay_visible { " | [start overlay]" } else { "" }
        );
    }
}
