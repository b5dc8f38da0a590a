//! Paper texture: faint dots scattered over a page.
//!
//! Dots come from a [`StdRng`] seeded with `seed ^ page`, so every page gets its own
//! pattern and the same inputs always give the same operations.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::ops::DrawOperation;
use crate::color::Color;

/// Dots per 100 cm² of page area.
const DOTS_PER_100_CM2: f32 = 40.0;
const MIN_RADIUS_MM: f32 = 0.08;
const MAX_RADIUS_MM: f32 = 0.3;
/// How far the accent color is pushed towards white.
pub const TEXTURE_LIGHTEN: f32 = 0.85;

pub fn texture_dots(
    seed: u64,
    page: usize,
    page_width: f32,
    page_height: f32,
    accent: Color,
) -> Vec<DrawOperation> {
    if !(page_width > 0.0 && page_height > 0.0) {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed ^ page as u64);
    let color = accent.lighten(TEXTURE_LIGHTEN);
    let area_cm2 = page_width * page_height / 100.0;
    let count = (area_cm2 / 100.0 * DOTS_PER_100_CM2).round() as usize;

    (0..count)
        .map(|_| DrawOperation::Circle {
            page,
            cx: rng.random_range(0.0..page_width),
            cy: rng.random_range(0.0..page_height),
            radius: rng.random_range(MIN_RADIUS_MM..MAX_RADIUS_MM),
            color,
            filled: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_is_deterministic_per_page() {
        let accent = Color::rgb(200, 0, 0);
        let a = texture_dots(7, 3, 148.0, 210.0, accent);
        let b = texture_dots(7, 3, 148.0, 210.0, accent);
        assert_eq!(a, b);
        assert!(!a.is_empty());

        let other_page = texture_dots(7, 4, 148.0, 210.0, accent);
        assert_ne!(a, other_page);
    }

    #[test]
    fn test_dots_stay_on_page_in_light_color() {
        let accent = Color::rgb(0, 0, 0);
        for op in texture_dots(1, 0, 100.0, 50.0, accent) {
            match op {
                DrawOperation::Circle { cx, cy, radius, color, page, .. } => {
                    assert_eq!(page, 0);
                    assert!((0.0..100.0).contains(&cx));
                    assert!((0.0..50.0).contains(&cy));
                    assert!(radius >= MIN_RADIUS_MM && radius < MAX_RADIUS_MM);
                    assert_eq!(color, accent.lighten(TEXTURE_LIGHTEN));
                }
                other => panic!("unexpected op {:?}", other),
            }
        }
        assert!(texture_dots(1, 0, 0.0, 50.0, accent).is_empty());
    }
}
