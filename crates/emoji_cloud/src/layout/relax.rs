use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

use super::opacity::OpacityMask;
use super::order::canvas_candidates;
use super::placement::{FreePositions, LayoutState, Stencil};
use super::resize::{normalized_weights, resize_sprites};
use super::Sprite;
use crate::canvas::shape::Canvas;
use crate::instrument::timed;
use crate::{CloudError, CloudOptions, Placement, RenderOutput};

/// How relaxation attempts are scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RelaxStrategy {
    /// One attempt after another, stopping at the first full layout.
    #[default]
    Sequential,
    /// All attempts on the rayon pool. Attempts with a higher ratio than a
    /// known success are abandoned and the lowest successful ratio wins.
    Parallel,
}

pub fn relax_ratio(step_size: f64, attempt: usize) -> f64 {
    1.0 + step_size * attempt as f64
}

struct AttemptOutcome {
    index: usize,
    relax_ratio: f64,
    state: LayoutState,
    placements: Vec<Placement>,
}

/// Inputs shared by every attempt of one render.
struct Attempts<'s, 'a> {
    canvas: &'s Canvas,
    candidates: &'s [(u32, u32)],
    sprites: &'s [Sprite<'a>],
    normalized: &'s [f64],
    options: &'s CloudOptions,
}

impl Attempts<'_, '_> {
    /// Runs one full layout. `None` when cancelled because an attempt with a
    /// lower index already succeeded.
    fn run(&self, index: usize, best: Option<&AtomicUsize>) -> Option<AttemptOutcome> {
        let started = Instant::now();
        let ratio = relax_ratio(self.options.step_size, index);
        let instrument = self.options.instrument.as_ref();

        let resized = timed(instrument, "resize", || {
            resize_sprites(self.sprites, self.normalized, self.canvas.area, ratio)
        });

        let free = FreePositions::new(self.candidates.iter().copied());
        let mut state = LayoutState::new(self.canvas, free);
        let mut placements = Vec::with_capacity(resized.len());

        for emoji in &resized {
            if best.is_some_and(|best| best.load(Ordering::Relaxed) < index) {
                debug!("attempt {index} cancelled");
                return None;
            }

            let mask = match OpacityMask::from_bitmap(&emoji.bitmap, self.options.alpha_threshold) {
                Ok(mask) => mask,
                Err(err) => {
                    debug!("attempt {index}: cannot place {}: {err}", emoji.unicode);
                    break;
                },
            };
            let stencil = Stencil::new(&mask);

            let Some(placed) = state.place(&stencil) else {
                debug!(
                    "attempt {index}: no room for {} at scale {:.3} ({}x{})",
                    emoji.unicode,
                    emoji.scale,
                    stencil.width(),
                    stencil.height()
                );
                break;
            };

            placements.push(Placement {
                unicode: emoji.unicode.to_owned(),
                anchor: placed.anchor,
                width: stencil.width(),
                height: stencil.height(),
                pixels: placed.occupied.len(),
            });
        }

        debug!(
            "attempt {index} (relax ratio {ratio:.2}) placed {}/{}",
            placements.len(),
            self.sprites.len()
        );
        if let Some(instrument) = instrument {
            instrument.record("attempt", started.elapsed());
        }

        Some(AttemptOutcome { index, relax_ratio: ratio, state, placements })
    }

    fn is_complete(&self, outcome: &AttemptOutcome) -> bool {
        outcome.placements.len() == self.sprites.len()
    }
}

/// Repeats full layouts with an increasing relax ratio until every sprite
/// fits or the attempt budget runs out.
pub(crate) fn relax(
    canvas: &Canvas,
    sprites: &[Sprite<'_>],
    options: &CloudOptions,
) -> Result<RenderOutput, CloudError> {
    if sprites.is_empty() {
        return Ok(RenderOutput {
            image: canvas.image.clone(),
            relax_ratio: relax_ratio(options.step_size, 0),
            attempt: 0,
            placements: Vec::new(),
        });
    }

    let weights: Vec<f64> = sprites.iter().map(|sprite| sprite.weight).collect();
    let normalized = normalized_weights(&weights)?;

    let candidates = timed(options.instrument.as_ref(), "candidate_order", || {
        canvas_candidates(&canvas.occupancy, canvas.center())
    });

    let attempts = Attempts {
        canvas,
        candidates: &candidates,
        sprites,
        normalized: &normalized,
        options,
    };

    let winner = match options.strategy {
        RelaxStrategy::Sequential => (0..options.num_try)
            .filter_map(|index| attempts.run(index, None))
            .find(|outcome| attempts.is_complete(outcome)),
        RelaxStrategy::Parallel => {
            let best = AtomicUsize::new(usize::MAX);
            (0..options.num_try)
                .into_par_iter()
                .filter_map(|index| {
                    if best.load(Ordering::Relaxed) < index {
                        return None;
                    }
                    let outcome = attempts.run(index, Some(&best))?;
                    if !attempts.is_complete(&outcome) {
                        return None;
                    }
                    best.fetch_min(index, Ordering::Relaxed);
                    Some(outcome)
                })
                .min_by_key(|outcome| outcome.index)
        },
    };

    let Some(outcome) = winner else {
        return Err(CloudError::LayoutInfeasible { attempts: options.num_try });
    };

    info!(
        "placed {} emoji on attempt {} (relax ratio {:.2})",
        outcome.placements.len(),
        outcome.index,
        outcome.relax_ratio
    );

    Ok(RenderOutput {
        image: outcome.state.into_image(),
        relax_ratio: outcome.relax_ratio,
        attempt: outcome.index,
        placements: outcome.placements,
    })
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::canvas::shape::CanvasShape;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn rectangle(width: u32, height: u32) -> Canvas {
        Canvas::new(&CanvasShape::Rectangle { width, height }, WHITE).unwrap()
    }

    #[test]
    fn ratios_follow_step_size() {
        assert_eq!(relax_ratio(0.1, 0), 1.0);
        assert!((relax_ratio(0.1, 19) - 2.9).abs() < 1e-12);
    }

    #[test]
    fn single_square_success_is_monotonic_in_ratio() {
        // A 30x10 bitmap zoomed to the area of a 30x30 canvas is too wide
        // until the ratio reaches sqrt(3).
        let canvas = rectangle(30, 30);
        let bitmap = RgbaImage::from_pixel(30, 10, Rgba([200, 0, 0, 255]));
        let sprites = [Sprite { unicode: "U+1F7E5", weight: 1.0, bitmap: &bitmap }];
        let candidates = canvas_candidates(&canvas.occupancy, canvas.center());
        let options = CloudOptions::default();
        let attempts = Attempts {
            canvas: &canvas,
            candidates: &candidates,
            sprites: &sprites,
            normalized: &[1.0],
            options: &options,
        };

        let results: Vec<bool> = (0..options.num_try)
            .map(|index| attempts.is_complete(&attempts.run(index, None).unwrap()))
            .collect();

        let first = results.iter().position(|&ok| ok).expect("some ratio should fit");
        assert!(first > 0);
        assert!(results[first..].iter().all(|&ok| ok));
    }

    #[test]
    fn cancelled_attempt_yields_nothing() {
        let canvas = rectangle(10, 10);
        let bitmap = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let sprites = [Sprite { unicode: "U+2B1B", weight: 1.0, bitmap: &bitmap }];
        let candidates = canvas_candidates(&canvas.occupancy, canvas.center());
        let options = CloudOptions::default();
        let attempts = Attempts {
            canvas: &canvas,
            candidates: &candidates,
            sprites: &sprites,
            normalized: &[1.0],
            options: &options,
        };

        let best = AtomicUsize::new(0);
        assert!(attempts.run(3, Some(&best)).is_none());
        assert!(attempts.run(0, Some(&best)).is_some());
    }

    #[test]
    fn empty_sprite_list_returns_blank_canvas() {
        let canvas = rectangle(4, 4);
        let output = relax(&canvas, &[], &CloudOptions::default()).unwrap();
        assert_eq!(output.image, canvas.image);
        assert!(output.placements.is_empty());
    }

    #[test]
    fn parallel_matches_sequential() {
        let canvas = rectangle(60, 40);
        let red = RgbaImage::from_pixel(12, 12, Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(12, 6, Rgba([0, 0, 255, 255]));
        let sprites = [
            Sprite { unicode: "U+1F534", weight: 2.0, bitmap: &red },
            Sprite { unicode: "U+1F535", weight: 1.0, bitmap: &blue },
            Sprite { unicode: "U+1F7E5", weight: 1.5, bitmap: &red },
        ];

        let sequential = relax(&canvas, &sprites, &CloudOptions::default()).unwrap();
        let parallel = relax(
            &canvas,
            &sprites,
            &CloudOptions { strategy: RelaxStrategy::Parallel, ..CloudOptions::default() },
        )
        .unwrap();

        assert_eq!(sequential.attempt, parallel.attempt);
        assert_eq!(sequential.placements, parallel.placements);
        assert_eq!(sequential.image, parallel.image);
    }
}
