//! Digital Butterworth filter design in second-order-section form.
//!
//! The design follows the classic analog-prototype route:
//!
//! 1. Poles of the order-N analog Butterworth low-pass prototype on the unit
//!    circle of the left half plane.
//! 2. Pre-warp the requested cutoffs so the bilinear transform lands them
//!    exactly where asked.
//! 3. Frequency-transform the prototype (low-pass → high-pass or
//!    low-pass → band-pass) in zero/pole/gain form.
//! 4. Bilinear transform to the z-plane.
//! 5. Pair conjugate poles into biquads; the overall gain rides on the first
//!    section.
//!
//! Cascaded sections are used instead of a single high-order polynomial: the
//! band-pass designs here place poles within 1e-3 of the unit circle, and a
//! direct-form polynomial of order 20 loses all precision there.
//!
//! Coefficients agree with the conventional `butter(N, Wn, output="sos")`
//! design to floating-point tolerance. Only the section ordering may differ,
//! which does not change the cascade's response.

use alloc::vec::Vec;
use core::f64::consts::PI;

use libm::{cos, sin, tan};
use num_complex::Complex;

use crate::error::DesignError;

/// Highest order accepted by the designers.
pub const MAX_FILTER_ORDER: usize = 24;

/// One second-order section, `[b0, b1, b2, a0, a1, a2]` with `a0 == 1`.
pub type SosSection = [f64; 6];

type C64 = Complex<f64>;

/// Response type and cutoff frequencies of a design.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterKind {
    /// Attenuates below `cutoff_hz`.
    HighPass {
        /// -3 dB corner in Hz.
        cutoff_hz: f64,
    },
    /// Passes `low_hz..high_hz`.
    BandPass {
        /// Lower -3 dB edge in Hz.
        low_hz: f64,
        /// Upper -3 dB edge in Hz.
        high_hz: f64,
    },
}

impl FilterKind {
    /// Short lowercase name for logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::HighPass { .. } => "highpass",
            Self::BandPass { .. } => "bandpass",
        }
    }
}

/// An immutable filter design: the request plus the resulting cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    kind: FilterKind,
    order: usize,
    sampling_rate: f64,
    sections: Vec<SosSection>,
}

impl FilterSpec {
    /// Response type and cutoffs.
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Requested order (prototype pole count).
    pub fn order(&self) -> usize {
        self.order
    }

    /// Sampling rate the coefficients were computed for, in Hz.
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// The cascade, applied first to last.
    pub fn sections(&self) -> &[SosSection] {
        &self.sections
    }

    /// Returns `true` if every section's poles lie strictly inside the unit
    /// circle.
    ///
    /// Uses the Jury conditions for `1 + a1 z^-1 + a2 z^-2`:
    /// `|a2| < 1` and `|a1| < 1 + a2`.
    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(|s| {
            let a1 = s[4] / s[3];
            let a2 = s[5] / s[3];
            a2.abs() < 1.0 && a1.abs() < 1.0 + a2
        })
    }

    /// Magnitude of the cascade's frequency response at `freq_hz`.
    pub fn magnitude_at(&self, freq_hz: f64) -> f64 {
        let w = 2.0 * PI * freq_hz / self.sampling_rate;
        // z^-1 and z^-2 on the unit circle
        let z1 = C64::new(cos(w), -sin(w));
        let z2 = z1 * z1;

        let mut h = C64::new(1.0, 0.0);
        for s in &self.sections {
            let num = C64::new(s[0], 0.0) + z1 * s[1] + z2 * s[2];
            let den = C64::new(s[3], 0.0) + z1 * s[4] + z2 * s[5];
            h = h * num / den;
        }
        libm::hypot(h.re, h.im)
    }
}

/// Designs a digital Butterworth high-pass filter.
///
/// # Arguments
///
/// * `cutoff_hz` - -3 dB corner, must lie in `(0, sampling_rate_hz / 2)`
/// * `order` - Filter order, `1..=MAX_FILTER_ORDER`
/// * `sampling_rate_hz` - Sampling rate of the signal to be filtered
///
/// The result has `ceil(order / 2)` sections; an odd order ends up with one
/// first-order section (`b2 == a2 == 0`).
pub fn design_highpass(
    cutoff_hz: f64,
    order: usize,
    sampling_rate_hz: f64,
) -> Result<FilterSpec, DesignError> {
    check_rate(sampling_rate_hz)?;
    check_order(order)?;
    let nyquist = sampling_rate_hz / 2.0;
    check_cutoff(cutoff_hz, nyquist)?;

    let proto = prototype_poles(order);
    let warped = prewarp(cutoff_hz / nyquist);

    // Low-pass → high-pass: s → wc / s. All prototype zeros move to the origin.
    let poles: Vec<C64> = proto.iter().map(|&p| C64::new(warped, 0.0) / p).collect();
    let zeros: Vec<C64> = (0..order).map(|_| C64::new(0.0, 0.0)).collect();
    let neg_prod = proto.iter().fold(C64::new(1.0, 0.0), |acc, &p| acc * -p);
    let gain = (C64::new(1.0, 0.0) / neg_prod).re;

    let (z_poles, z_gain) = bilinear(&zeros, &poles, gain);
    let sections = pair_sections(&z_poles, z_gain, |first_order| {
        // Every digital zero sits at z = +1
        if first_order {
            [1.0, -1.0, 0.0]
        } else {
            [1.0, -2.0, 1.0]
        }
    });

    #[cfg(feature = "tracing")]
    tracing::debug!(
        cutoff_hz,
        order,
        sampling_rate_hz,
        sections = sections.len(),
        "designed highpass"
    );

    Ok(FilterSpec {
        kind: FilterKind::HighPass { cutoff_hz },
        order,
        sampling_rate: sampling_rate_hz,
        sections,
    })
}

/// Designs a digital Butterworth band-pass filter.
///
/// # Arguments
///
/// * `low_hz`, `high_hz` - -3 dB band edges, `0 < low_hz < high_hz < nyquist`
/// * `order` - Prototype order, `1..=MAX_FILTER_ORDER`
/// * `sampling_rate_hz` - Sampling rate of the signal to be filtered
///
/// The band-pass transform doubles the pole count, so the result has exactly
/// `order` sections.
pub fn design_bandpass(
    low_hz: f64,
    high_hz: f64,
    order: usize,
    sampling_rate_hz: f64,
) -> Result<FilterSpec, DesignError> {
    check_rate(sampling_rate_hz)?;
    check_order(order)?;
    let nyquist = sampling_rate_hz / 2.0;
    check_cutoff(low_hz, nyquist)?;
    check_cutoff(high_hz, nyquist)?;
    if low_hz >= high_hz {
        return Err(DesignError::InvertedBand {
            low: low_hz,
            high: high_hz,
        });
    }

    let proto = prototype_poles(order);
    let w1 = prewarp(low_hz / nyquist);
    let w2 = prewarp(high_hz / nyquist);
    let bw = w2 - w1;
    let wo2 = C64::new(w1 * w2, 0.0);

    // Low-pass → band-pass: each prototype pole splits into two.
    let mut poles = Vec::with_capacity(2 * order);
    for &p in &proto {
        let p_lp = p * (bw / 2.0);
        let root = (p_lp * p_lp - wo2).sqrt();
        poles.push(p_lp + root);
        poles.push(p_lp - root);
    }
    let zeros: Vec<C64> = (0..order).map(|_| C64::new(0.0, 0.0)).collect();
    let gain = libm::pow(bw, order as f64);

    let (z_poles, z_gain) = bilinear(&zeros, &poles, gain);
    // Half the digital zeros land on z = +1 and half on z = -1; one of each per
    // section gives (1 - z^-1)(1 + z^-1).
    let sections = pair_sections(&z_poles, z_gain, |_| [1.0, 0.0, -1.0]);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        low_hz,
        high_hz,
        order,
        sampling_rate_hz,
        sections = sections.len(),
        "designed bandpass"
    );

    Ok(FilterSpec {
        kind: FilterKind::BandPass { low_hz, high_hz },
        order,
        sampling_rate: sampling_rate_hz,
        sections,
    })
}

fn check_rate(rate: f64) -> Result<(), DesignError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(DesignError::InvalidSamplingRate(rate))
    }
}

fn check_order(order: usize) -> Result<(), DesignError> {
    if (1..=MAX_FILTER_ORDER).contains(&order) {
        Ok(())
    } else {
        Err(DesignError::InvalidOrder(order))
    }
}

fn check_cutoff(cutoff: f64, nyquist: f64) -> Result<(), DesignError> {
    if cutoff.is_finite() && cutoff > 0.0 && cutoff < nyquist {
        Ok(())
    } else {
        Err(DesignError::CutoffOutOfRange { cutoff, nyquist })
    }
}

/// Analog Butterworth low-pass prototype poles, unity cutoff.
fn prototype_poles(order: usize) -> Vec<C64> {
    let n = order as f64;
    (0..order)
        .map(|k| {
            let m = 2.0 * k as f64 - (n - 1.0);
            let theta = PI * m / (2.0 * n);
            C64::new(-cos(theta), -sin(theta))
        })
        .collect()
}

/// Pre-warps a normalized frequency (1.0 == nyquist) for a bilinear
/// transform with `fs = 2`.
fn prewarp(normalized: f64) -> f64 {
    4.0 * tan(PI * normalized / 2.0)
}

/// Bilinear transform of analog poles/zeros with `fs = 2`.
///
/// Returns the digital poles and the digital gain. Digital zeros are implied
/// by the caller's numerator template.
fn bilinear(zeros: &[C64], poles: &[C64], gain: f64) -> (Vec<C64>, f64) {
    let fs2 = C64::new(4.0, 0.0);
    let z_poles = poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();

    let num = zeros.iter().fold(C64::new(1.0, 0.0), |acc, &z| acc * (fs2 - z));
    let den = poles.iter().fold(C64::new(1.0, 0.0), |acc, &p| acc * (fs2 - p));
    (z_poles, gain * (num / den).re)
}

/// Groups digital poles into sections ordered by pole radius (the section
/// closest to the unit circle is applied last) and folds `gain` into the
/// first numerator.
///
/// `numerator(first_order)` supplies the zero polynomial for each section.
fn pair_sections<F>(poles: &[C64], gain: f64, numerator: F) -> Vec<SosSection>
where
    F: Fn(bool) -> [f64; 3],
{
    // (radius², a1, a2, is_first_order)
    let mut dens: Vec<(f64, f64, f64, bool)> = Vec::new();
    let mut reals: Vec<f64> = Vec::new();

    for p in poles {
        let tol = 1e-10 * (1.0 + p.norm_sqr());
        if p.im.abs() <= tol {
            reals.push(p.re);
        } else if p.im > 0.0 {
            dens.push((p.norm_sqr(), -2.0 * p.re, p.norm_sqr(), false));
        }
    }

    reals.sort_by(f64::total_cmp);
    let mut chunks = reals.chunks_exact(2);
    for pair in &mut chunks {
        let (r1, r2) = (pair[0], pair[1]);
        let radius = (r1 * r1).max(r2 * r2);
        dens.push((radius, -(r1 + r2), r1 * r2, false));
    }
    if let [r] = chunks.remainder() {
        dens.push((r * r, -r, 0.0, true));
    }

    dens.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut sections: Vec<SosSection> = dens
        .iter()
        .map(|&(_, a1, a2, first_order)| {
            let [b0, b1, b2] = numerator(first_order);
            [b0, b1, b2, 1.0, a1, a2]
        })
        .collect();

    if let Some(first) = sections.first_mut() {
        for b in &mut first[..3] {
            *b *= gain;
        }
    }
    sections
}
