// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pointwise reductions over a vertical window. The attribute enum is
//! closed and total: every variant here has a kernel, so an unrecognised
//! name is rejected as `bad_request` at parse time, never mid-computation.

use crate::error::{EngineError, Result};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Value,
    Min,
    Max,
    MaxAbs,
    Mean,
    MeanAbs,
    MeanPos,
    MeanNeg,
    Median,
    Rms,
    Var,
    Sd,
    SumPos,
    SumNeg,
}

impl FromStr for Attribute {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "value" => Ok(Self::Value),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "maxabs" => Ok(Self::MaxAbs),
            "mean" => Ok(Self::Mean),
            "meanabs" => Ok(Self::MeanAbs),
            "meanpos" => Ok(Self::MeanPos),
            "meanneg" => Ok(Self::MeanNeg),
            "median" => Ok(Self::Median),
            "rms" => Ok(Self::Rms),
            "var" => Ok(Self::Var),
            "sd" => Ok(Self::Sd),
            "sumpos" => Ok(Self::SumPos),
            "sumneg" => Ok(Self::SumNeg),
            other => Err(EngineError::bad_request(format!(
                "unknown attribute: {other}"
            ))),
        }
    }
}

impl Attribute {
    /// Reduce `window` (length N, already resampled onto the destination
    /// grid) to a single scalar. `reference_offset` is only consulted by
    /// `Value`.
    pub fn apply(self, window: &[f32], reference_offset: usize) -> f32 {
        match self {
            Self::Value => window[reference_offset],
            Self::Min => window.iter().copied().fold(f32::INFINITY, f32::min),
            Self::Max => window.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            Self::MaxAbs => window.iter().fold(0.0f32, |acc, &x| acc.max(x.abs())),
            Self::Mean => mean(window),
            Self::MeanAbs => mean(&window.iter().map(|x| x.abs()).collect::<Vec<_>>()),
            Self::MeanPos => mean_subset(window, |x| x > 0.0),
            Self::MeanNeg => mean_subset(window, |x| x < 0.0),
            Self::Median => median(window),
            Self::Rms => {
                let m: f32 = window.iter().map(|x| x * x).sum::<f32>() / window.len() as f32;
                m.sqrt()
            }
            Self::Var => variance(window),
            Self::Sd => variance(window).sqrt(),
            Self::SumPos => window.iter().copied().filter(|&x| x > 0.0).sum(),
            Self::SumNeg => window.iter().copied().filter(|&x| x < 0.0).sum(),
        }
    }
}

fn mean(window: &[f32]) -> f32 {
    window.iter().sum::<f32>() / window.len() as f32
}

fn mean_subset(window: &[f32], pred: impl Fn(f32) -> bool) -> f32 {
    let mut sum = 0.0f32;
    let mut count = 0usize;
    for &x in window {
        if pred(x) {
            sum += x;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

/// Lower median: for an even count this is the value at index `(N-1)/2`
/// of a sorted copy, chosen to keep output deterministic regardless of
/// sort-stability differences across platforms.
fn median(window: &[f32]) -> f32 {
    let mut sorted: Vec<f32> = window.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    sorted[(sorted.len() - 1) / 2]
}

fn variance(window: &[f32]) -> f32 {
    let m = mean(window);
    mean(&window.iter().map(|x| (x - m) * (x - m)).collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_picks_lower_of_even_count() {
        let window = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(median(&window), 2.0);
    }

    #[test]
    fn meanpos_and_meanneg_ignore_other_sign() {
        let window = [-2.0, -1.0, 1.0, 2.0];
        assert_eq!(Attribute::MeanPos.apply(&window, 0), 1.5);
        assert_eq!(Attribute::MeanNeg.apply(&window, 0), -1.5);
    }

    #[test]
    fn meanpos_of_all_negative_is_zero() {
        let window = [-2.0, -1.0];
        assert_eq!(Attribute::MeanPos.apply(&window, 0), 0.0);
    }

    #[test]
    fn maxabs_is_nonnegative() {
        let window = [-5.0, 1.0, 2.0];
        assert_eq!(Attribute::MaxAbs.apply(&window, 0), 5.0);
    }

    #[test]
    fn rms_matches_definition() {
        let window = [3.0, 4.0];
        let rms = Attribute::Rms.apply(&window, 0);
        assert!((rms - (12.5f32).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn value_reads_reference_offset() {
        let window = [10.0, 20.0, 30.0];
        assert_eq!(Attribute::Value.apply(&window, 1), 20.0);
    }

    #[test]
    fn unknown_attribute_name_is_bad_request() {
        assert!("bogus".parse::<Attribute>().is_err());
    }
}
