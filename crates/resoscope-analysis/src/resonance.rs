//! Spring/mass resonance model.
//!
//! A mass `m` on a spring of stiffness `k` oscillates at
//! `f = sqrt(k / m) / 2π`. The spring's own mass `m0` adds roughly a third
//! of itself to the effective load, which gives the "loaded" frequency the
//! adaptive filter tracks:
//!
//! ```text
//! f_bare   = sqrt(k / m)          / 2π
//! f_loaded = sqrt(k / (m + m0/3)) / 2π
//! ```

use std::f64::consts::PI;

/// Physical constants of the oscillator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResonanceParameters {
    /// Spring mass `m0` in kilograms.
    pub added_mass_kg: f64,
    /// Spring constant `k` in N/m.
    pub spring_constant: f64,
}

impl Default for ResonanceParameters {
    fn default() -> Self {
        Self {
            added_mass_kg: 0.028,
            spring_constant: 26.07,
        }
    }
}

/// Model frequencies for one mass setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelFrequencies {
    /// Mass the frequencies were computed for, in grams.
    pub mass_grams: f64,
    /// Ignoring the spring's mass, in Hz.
    pub f_bare: f64,
    /// Including a third of the spring's mass, in Hz.
    pub f_loaded: f64,
}

impl ResonanceParameters {
    /// Natural frequency of `mass_kg` alone.
    pub fn bare_frequency(&self, mass_kg: f64) -> f64 {
        (self.spring_constant / mass_kg).sqrt() / (2.0 * PI)
    }

    /// Natural frequency of `mass_kg` plus a third of the spring mass.
    pub fn loaded_frequency(&self, mass_kg: f64) -> f64 {
        (self.spring_constant / (mass_kg + self.added_mass_kg / 3.0)).sqrt() / (2.0 * PI)
    }

    /// Both model frequencies for a mass given in grams.
    pub fn frequencies(&self, mass_grams: f64) -> ModelFrequencies {
        let kg = mass_grams / 1000.0;
        ModelFrequencies {
            mass_grams,
            f_bare: self.bare_frequency(kg),
            f_loaded: self.loaded_frequency(kg),
        }
    }

    /// Inverts the loaded model: the mass (grams) that would oscillate at
    /// `observed_hz`.
    ///
    /// Returns `None` for non-positive or non-finite frequencies. The result
    /// can be negative when the observation is above what the spring alone
    /// supports; callers decide how to present that.
    pub fn infer_mass_grams(&self, observed_hz: f64) -> Option<f64> {
        if !(observed_hz.is_finite() && observed_hz > 0.0) {
            return None;
        }
        let omega = 2.0 * PI * observed_hz;
        let kg = self.spring_constant / (omega * omega) - self.added_mass_kg / 3.0;
        Some(kg * 1000.0)
    }
}

/// The user-adjustable mass, restricted to a stepped range.
///
/// Any requested value is snapped to the nearest multiple of `step`
/// (exact halves go to the even multiple) and clamped into `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MassSelector {
    grams: u32,
    step: u32,
    min: u32,
    max: u32,
}

impl MassSelector {
    /// Default step between selectable masses, grams.
    pub const DEFAULT_STEP: u32 = 20;
    /// Default smallest selectable mass, grams.
    pub const DEFAULT_MIN: u32 = 20;
    /// Default largest selectable mass, grams.
    pub const DEFAULT_MAX: u32 = 200;

    /// Creates a selector positioned at `min`.
    ///
    /// A zero step is treated as one; `max` is raised to `min` if smaller.
    pub fn new(step: u32, min: u32, max: u32) -> Self {
        let step = step.max(1);
        let max = max.max(min);
        Self {
            grams: min,
            step,
            min,
            max,
        }
    }

    /// Snaps and stores `requested_grams`, returning the stored value.
    pub fn set(&mut self, requested_grams: f64) -> u32 {
        self.grams = self.snap(requested_grams);
        self.grams
    }

    /// What `set` would store, without storing it.
    pub fn snap(&self, requested_grams: f64) -> u32 {
        if !requested_grams.is_finite() {
            return self.grams;
        }
        let step = f64::from(self.step);
        let snapped = (requested_grams / step).round_ties_even() * step;
        snapped.clamp(f64::from(self.min), f64::from(self.max)) as u32
    }

    /// Moves one step up, stopping at `max`.
    pub fn step_up(&mut self) -> u32 {
        self.set(f64::from(self.grams + self.step))
    }

    /// Moves one step down, stopping at `min`.
    pub fn step_down(&mut self) -> u32 {
        self.set(f64::from(self.grams.saturating_sub(self.step)))
    }

    /// Current mass in grams.
    pub fn grams(&self) -> u32 {
        self.grams
    }

    /// Current mass in kilograms.
    pub fn kilograms(&self) -> f64 {
        f64::from(self.grams) / 1000.0
    }

    /// Inclusive selectable range.
    pub fn range(&self) -> (u32, u32) {
        (self.min, self.max)
    }

    /// Distance between selectable masses.
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Every selectable mass, ascending.
    pub fn choices(&self) -> impl Iterator<Item = u32> + '_ {
        (self.snap(f64::from(self.min))..=self.max).step_by(self.step as usize)
    }
}

impl Default for MassSelector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STEP, Self::DEFAULT_MIN, Self::DEFAULT_MAX)
    }
}
