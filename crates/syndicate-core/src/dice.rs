//! Randomness source for outcome rolls and reward draws.
//!
//! The engine never touches an ambient RNG. It is handed a [`Dice`]
//! value at construction: any [`rand::Rng`] works through the blanket
//! impl (production uses a `StdRng`), and [`ScriptedDice`] replays fixed
//! values so both outcome branches can be forced in tests.

use std::collections::VecDeque;

use rand::Rng;

/// A source of the two draws a crime attempt needs.
pub trait Dice {
    /// A uniform draw in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// A uniform integer in `[min, max]` inclusive.
    ///
    /// When `min >= max` the result is `min` and no draw is consumed.
    fn between(&mut self, min: i64, max: i64) -> i64;
}

impl<R: Rng + ?Sized> Dice for R {
    fn unit(&mut self) -> f64 {
        self.random::<f64>()
    }

    fn between(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.random_range(min..=max)
    }
}

/// Deterministic dice that replay queued values.
///
/// Unit draws come from the queue until it runs dry, then repeat the
/// fallback. Reward draws come from their own queue (clamped into the
/// requested range) and fall back to the range minimum.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    units: VecDeque<f64>,
    rewards: VecDeque<i64>,
    fallback_unit: f64,
}

impl ScriptedDice {
    /// Dice whose every unit draw is `unit`.
    pub fn always(unit: f64) -> Self {
        Self {
            units: VecDeque::new(),
            rewards: VecDeque::new(),
            fallback_unit: unit,
        }
    }

    /// Queue unit draws to be returned in order.
    #[must_use]
    pub fn with_units(mut self, units: impl IntoIterator<Item = f64>) -> Self {
        self.units.extend(units);
        self
    }

    /// Queue reward draws to be returned in order.
    #[must_use]
    pub fn with_rewards(mut self, rewards: impl IntoIterator<Item = i64>) -> Self {
        self.rewards.extend(rewards);
        self
    }
}

impl Dice for ScriptedDice {
    fn unit(&mut self) -> f64 {
        self.units.pop_front().unwrap_or(self.fallback_unit)
    }

    fn between(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.rewards
            .pop_front()
            .map_or(min, |reward| reward.clamp(min, max))
    }
}
