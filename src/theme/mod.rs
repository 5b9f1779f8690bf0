//! Theme Module
//!
//! Derives the ten-step shade palette used for embed theming from a single
//! seed color.

mod palette;

pub use palette::{generate_palette, hex_to_rgb, hsl_to_rgb, rgb_to_hex, rgb_to_hsl, Hsl, Palette, Rgb, SHADE_STEPS};
