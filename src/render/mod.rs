// src/render/mod.rs
pub mod card;
pub mod fitter;

use anyhow::Result;

/// Measurement capability of the rendering backend: pixel size of `text`
/// drawn at `font_size`. Pure, so the fitter is testable without fonts.
pub trait TextMeasure {
    fn measure(&self, text: &str, font_size: u32) -> (u32, u32);
}

/// Drawing capability: rasterize a fitted title into the card image.
pub trait CardRender: TextMeasure {
    fn draw(&self, lines: &[String], font_size: u32, footer: &str) -> Result<Vec<u8>>;
}
