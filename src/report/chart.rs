//! Keyword weight bar chart rendered straight into an RGB image.
//!
//! ```text
//!   12
//!  ┌██──────────────────────────────────┐
//!  │██   7                              │
//!  │██  ██   4   3                      │
//!  │██  ██  ██  ██   1   1   1   1      │
//!  └──────────────────────────────────────
//!    1   2   3   4   5   6   7   8  (≤ 10 bars, heaviest first)
//! ```
//!
//! A bar's weight is the number of times its keyword occurs in the source
//! text (at least 1, since every keyword was chosen for the text). Bars are
//! numbered by rank with their weight drawn on top; the numbers map to
//! keywords through the `<chart>.txt` legend written next to the PNG.

use std::path::{Path, PathBuf};

use image::{ImageResult, Rgb, RgbImage};

use crate::cache::{self, DiskCache};

pub const WIDTH: u32 = 1000;
pub const HEIGHT: u32 = 600;
pub const MAX_BARS: usize = 10;

const MARGIN: u32 = 40;
/// Room above the tallest bar for its value.
const VALUE_ROOM: u32 = 24;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([64, 64, 64]);
const BAR: Rgb<u8> = Rgb([135, 206, 235]);

/// 3×5 digit bitmaps, one row per entry, high bit on the left.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b001, 0b001, 0b001],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];
const GLYPH_SCALE: u32 = 3;

/// Weight each keyword by its occurrences in `source_text`, heaviest first.
///
/// Matching is case-insensitive and counts non-overlapping occurrences.
/// Duplicates are dropped and ties keep keyword order.
pub fn keyword_weights(keywords: &[String], source_text: &str) -> Vec<(String, usize)> {
    let text = source_text.to_lowercase();
    let mut weights: Vec<(String, usize)> = Vec::new();
    for kw in keywords {
        if weights.iter().any(|(k, _)| k == kw) {
            continue;
        }
        let needle = kw.to_lowercase();
        let count = if needle.is_empty() {
            0
        } else {
            text.matches(needle.as_str()).count()
        };
        weights.push((kw.clone(), count.max(1)));
    }
    weights.sort_by(|a, b| b.1.cmp(&a.1));
    weights.truncate(MAX_BARS);
    weights
}

/// Draw the chart. An empty list yields a blank canvas.
pub fn render_chart(bars: &[(String, usize)]) -> RgbImage {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
    if bars.is_empty() {
        return img;
    }

    let plot_w = WIDTH - 2 * MARGIN;
    let plot_h = HEIGHT - 2 * MARGIN;
    let baseline = HEIGHT - MARGIN;

    fill_rect(&mut img, MARGIN, baseline, plot_w, 2, AXIS);
    fill_rect(&mut img, MARGIN, MARGIN, 2, plot_h, AXIS);

    let max = bars.iter().map(|(_, n)| *n).max().unwrap_or(1).max(1) as u64;
    let slot = plot_w / bars.len() as u32;
    let bar_w = (slot * 3 / 5).max(1);
    let max_h = plot_h - VALUE_ROOM;

    for (i, (_, weight)) in bars.iter().enumerate() {
        let h = ((max_h as u64 * *weight as u64 / max) as u32).max(1);
        let centre = MARGIN + i as u32 * slot + slot / 2;
        fill_rect(&mut img, centre - bar_w / 2, baseline - h, bar_w, h, BAR);

        let value_top = baseline - h - 4 - glyph_height();
        draw_number(&mut img, *weight, centre, value_top, AXIS);
        draw_number(&mut img, i + 1, centre, baseline + 8, AXIS);
    }
    img
}

fn glyph_height() -> u32 {
    5 * GLYPH_SCALE
}

/// Draw `n` horizontally centred on `centre_x` with its top edge at `top`.
fn draw_number(img: &mut RgbImage, n: usize, centre_x: u32, top: u32, color: Rgb<u8>) {
    let digits = n.to_string();
    let advance = 4 * GLYPH_SCALE;
    let width = digits.len() as u32 * advance - GLYPH_SCALE;
    let left = centre_x.saturating_sub(width / 2);

    for (i, d) in digits.chars().filter_map(|c| c.to_digit(10)).enumerate() {
        let x0 = left + i as u32 * advance;
        for (row, bits) in DIGITS[d as usize].iter().enumerate() {
            for col in 0..3 {
                if (bits >> (2 - col)) & 1 == 1 {
                    fill_rect(
                        img,
                        x0 + col * GLYPH_SCALE,
                        top + row as u32 * GLYPH_SCALE,
                        GLYPH_SCALE,
                        GLYPH_SCALE,
                        color,
                    );
                }
            }
        }
    }
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for yy in y..(y + h).min(img.height()) {
        for xx in x..(x + w).min(img.width()) {
            img.put_pixel(xx, yy, color);
        }
    }
}

/// `<chart>.txt` next to the chart image.
pub fn legend_path(output: &Path) -> PathBuf {
    output.with_extension("txt")
}

/// Text mapping bar numbers to keywords.
pub fn render_legend(bars: &[(String, usize)]) -> String {
    let mut out = String::from("Keyword Chart Legend\n--------------------\n");
    if bars.is_empty() {
        out.push_str("No keywords available\n");
    }
    for (i, (kw, weight)) in bars.iter().enumerate() {
        out.push_str(&format!("{}. {kw} ({weight})\n", i + 1));
    }
    out
}

/// Write the chart PNG to `output` and its legend next to it, reusing a
/// cached rendering for the same weighted keyword set.
pub fn keyword_chart(
    bars: &[(String, usize)],
    output: &Path,
    cache: Option<&DiskCache>,
) -> ImageResult<PathBuf> {
    std::fs::write(legend_path(output), render_legend(bars))?;

    let mut key: Vec<String> = bars.iter().map(|(k, w)| format!("{k}:{w}")).collect();
    key.sort();
    let cached = cache.map(|c| {
        c.path_for(
            cache::VISUALIZATIONS,
            &format!("{}.png", cache::key_hash(&key.join("-"))),
        )
    });

    if let Some(path) = cached.as_ref().filter(|p| p.exists()) {
        match std::fs::copy(path, output) {
            Ok(_) => {
                log::info!("Keyword chart loaded from cache");
                return Ok(output.to_path_buf());
            }
            Err(e) => log::warn!("Failed to copy cached chart: {e}"),
        }
    }

    if bars.is_empty() {
        log::info!("No keywords to visualize");
    }
    let img = render_chart(bars);
    img.save(output)?;

    if let (Some(c), Some(path)) = (cache, cached) {
        let stored = c
            .ensure_namespace(cache::VISUALIZATIONS)
            .and_then(|_| std::fs::copy(output, &path));
        if let Err(e) = stored {
            log::warn!("Failed to cache keyword chart: {e}");
        }
    }
    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn weighted(list: &[(&str, usize)]) -> Vec<(String, usize)> {
        list.iter().map(|(k, w)| (k.to_string(), *w)).collect()
    }

    /// Number of bar-coloured pixels in the column through bar `i`'s centre.
    fn bar_height(img: &RgbImage, i: usize, count: usize) -> u32 {
        let slot = (WIDTH - 2 * MARGIN) / count as u32;
        let x = MARGIN + i as u32 * slot + slot / 2;
        (0..HEIGHT).filter(|&y| *img.get_pixel(x, y) == BAR).count() as u32
    }

    #[test]
    fn weights_count_occurrences_in_text() {
        let kws = vec!["rain".to_string(), "City".to_string(), "umbrella".to_string()];
        let text = "Rain fell on the city. The rain did not stop. RAIN again.";
        assert_eq!(
            keyword_weights(&kws, text),
            weighted(&[("rain", 3), ("City", 1), ("umbrella", 1)])
        );
    }

    #[test]
    fn weights_dedupe_and_cap() {
        let mut many: Vec<String> = (0..15).map(|i| format!("k{i}")).collect();
        many.push("k0".into());
        let w = keyword_weights(&many, "k3 k3");
        assert_eq!(w.len(), MAX_BARS);
        assert_eq!(w[0], ("k3".to_string(), 2));
        assert_eq!(w[1].0, "k0");
        assert!(w.iter().filter(|(k, _)| k == "k0").count() == 1);
    }

    #[test]
    fn empty_chart_is_blank() {
        let img = render_chart(&[]);
        assert_eq!(img.dimensions(), (WIDTH, HEIGHT));
        assert!(img.pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn bar_heights_follow_weights() {
        let bars = weighted(&[("rain", 5), ("city", 3), ("night", 1)]);
        let img = render_chart(&bars);

        let heights: Vec<u32> = (0..3).map(|i| bar_height(&img, i, 3)).collect();
        assert!(heights[0] > heights[1] && heights[1] > heights[2], "{heights:?}");
        assert_eq!(heights[0], HEIGHT - 2 * MARGIN - VALUE_ROOM);
        // 3/5 and 1/5 of the tallest bar, within rounding.
        assert!(heights[1].abs_diff(heights[0] * 3 / 5) <= 1);
        assert!(heights[2].abs_diff(heights[0] / 5) <= 1);
    }

    #[test]
    fn bars_are_numbered() {
        let img = render_chart(&weighted(&[("rain", 2)]));
        let slot = WIDTH - 2 * MARGIN;
        let centre = MARGIN + slot / 2;
        let below = HEIGHT - MARGIN + 8;
        let label = (below..below + glyph_height())
            .flat_map(|y| (centre - 10..centre + 10).map(move |x| (x, y)))
            .filter(|&(x, y)| *img.get_pixel(x, y) == AXIS)
            .count();
        assert!(label > 0);
    }

    #[test]
    fn legend_lists_ranked_keywords() {
        let legend = render_legend(&weighted(&[("rain", 3), ("비", 1)]));
        assert!(legend.starts_with("Keyword Chart Legend\n"));
        assert!(legend.contains("1. rain (3)\n"));
        assert!(legend.ends_with("2. 비 (1)\n"));
        assert!(render_legend(&[]).contains("No keywords available"));
    }

    #[test]
    fn chart_is_cached_by_weighted_keywords() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::new(dir.path().join("cache"));

        let first = dir.path().join("one.png");
        keyword_chart(&weighted(&[("b", 2), ("a", 1)]), &first, Some(&cache)).unwrap();
        assert!(first.exists());
        assert!(legend_path(&first).exists());

        let key = cache::key_hash("a:1-b:2");
        assert!(cache
            .path_for(cache::VISUALIZATIONS, &format!("{key}.png"))
            .exists());

        let second = dir.path().join("two.png");
        keyword_chart(&weighted(&[("a", 1), ("b", 2)]), &second, Some(&cache)).unwrap();
        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());

        // Different weights render a different chart.
        let third = dir.path().join("three.png");
        keyword_chart(&weighted(&[("a", 3), ("b", 2)]), &third, Some(&cache)).unwrap();
        assert_ne!(std::fs::read(&first).unwrap(), std::fs::read(&third).unwrap());
    }

    #[test]
    fn works_without_cache() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("chart.png");
        keyword_chart(&[], &out, None).unwrap();
        let img = image::open(&out).unwrap();
        assert_eq!(img.width(), WIDTH);
        let legend = std::fs::read_to_string(legend_path(&out)).unwrap();
        assert!(legend.contains("No keywords available"));
    }
}
