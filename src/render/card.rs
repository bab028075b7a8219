// src/render/card.rs
//! Raster backend for the title card: a 1024×512 banner with a soft
//! two-tone gradient (seeded by the title so re-renders are deterministic),
//! brand header, the fitted title and a source/time footer.

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_text_mut};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::render::{CardRender, TextMeasure};

pub const IMG_W: u32 = 1024;
pub const IMG_H: u32 = 512;
/// Pixel box the fitted title must stay inside.
pub const TITLE_BOX_W: u32 = 940;
pub const TITLE_BOX_H: u32 = 220;
pub const TITLE_MAX_LINES: usize = 4;
/// Candidate font sizes, largest first.
pub const TITLE_SIZES: &[u32] = &[64, 58, 52, 46, 40, 34, 30];

const MARGIN_X: i32 = 42;
const TITLE_Y: i32 = 150;
const FOOTER_SIZE: u32 = 24;
const BRAND_SIZE: u32 = 28;

pub struct CardRenderer {
    font: FontVec,
    brand: String,
}

impl CardRenderer {
    pub fn from_font_path(path: &Path, brand: &str) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("reading font from {}", path.display()))?;
        let font = FontVec::try_from_vec(data).context("parsing font file")?;
        Ok(Self {
            font,
            brand: brand.to_string(),
        })
    }
}

impl TextMeasure for CardRenderer {
    fn measure(&self, text: &str, font_size: u32) -> (u32, u32) {
        let scaled = self.font.as_scaled(PxScale::from(font_size as f32));
        let w: f32 = text
            .chars()
            .map(|c| scaled.h_advance(self.font.glyph_id(c)))
            .sum();
        (w.ceil() as u32, scaled.height().ceil() as u32)
    }
}

impl CardRender for CardRenderer {
    fn draw(&self, lines: &[String], font_size: u32, footer: &str) -> Result<Vec<u8>> {
        let seed_text = lines.join(" ");
        let mut img = gradient_background(&seed_text);

        // Brand badge, top-left.
        draw_filled_circle_mut(&mut img, (40, 40), 20, Rgb([245, 245, 245]));
        draw_text_mut(
            &mut img,
            Rgb([245, 245, 245]),
            70,
            26,
            PxScale::from(BRAND_SIZE as f32),
            &self.font,
            &self.brand,
        );

        let line_h = self.measure("Ag", font_size).1 as i32 + 6;
        let mut y = TITLE_Y;
        for line in lines.iter().take(TITLE_MAX_LINES) {
            draw_text_mut(
                &mut img,
                Rgb([245, 245, 248]),
                MARGIN_X,
                y,
                PxScale::from(font_size as f32),
                &self.font,
                line,
            );
            y += line_h;
        }

        draw_text_mut(
            &mut img,
            Rgb([235, 235, 240]),
            MARGIN_X,
            (IMG_H - 42) as i32,
            PxScale::from(FOOTER_SIZE as f32),
            &self.font,
            footer,
        );

        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .context("encoding card png")?;
        Ok(bytes)
    }
}

/// Diagonal blend between two tones of the same hue family. The hue comes
/// from a hash of the title, so the same article always gets the same card.
fn gradient_background(seed_text: &str) -> RgbImage {
    let digest = Sha256::digest(seed_text.as_bytes());
    let base_hue = 200.0 + (u16::from_be_bytes([digest[0], digest[1]]) % 140) as f32;
    let c1 = hsv_to_rgb(base_hue, 0.25, 0.95);
    let c2 = hsv_to_rgb((base_hue + 25.0) % 360.0, 0.35, 0.85);

    RgbImage::from_fn(IMG_W, IMG_H, |x, y| {
        let t = (x + y) as f32 / (IMG_W + IMG_H) as f32;
        Rgb([
            lerp(c1[0], c2[0], t),
            lerp(c1[1], c2[1], t),
            lerp(c1[2], c2[2], t),
        ])
    })
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

/// h in degrees, s/v in 0..1.
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    ]
}
