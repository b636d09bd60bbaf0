// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Trigger rate handling for randomized channels.
//!
//! A channel's rate is configured as "N triggers per unit" and converted into
//! the parameter of an exponential inter-arrival distribution over scheduler
//! ticks. Successive samples from that distribution are the waits between
//! one-shot triggers.

use std::fmt;

use rand::Rng;
use rand_distr::{Distribution, Exp};

/// The scheduler tick rate, in ticks per second.
pub const TICK_RATE: u32 = 10;

/// The time unit a channel's trigger count is expressed against.
///
/// The template spellings are "1m", "10m" and "1h".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateUnit {
    Minute,
    TenMinutes,
    Hour,
}

impl RateUnit {
    /// Parses the template spelling of a rate unit.
    pub fn from_template(value: &str) -> Option<RateUnit> {
        match value {
            "1m" => Some(RateUnit::Minute),
            "10m" => Some(RateUnit::TenMinutes),
            "1h" => Some(RateUnit::Hour),
            _ => None,
        }
    }

    /// The unit duration in seconds.
    fn duration_secs(&self) -> u64 {
        match self {
            RateUnit::Minute => 60,
            RateUnit::TenMinutes => 600,
            RateUnit::Hour => 3600,
        }
    }

    /// The unit duration in scheduler ticks.
    pub fn duration_ticks(&self) -> f64 {
        (self.duration_secs() * u64::from(TICK_RATE)) as f64
    }
}

impl fmt::Display for RateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateUnit::Minute => write!(f, "1m"),
            RateUnit::TenMinutes => write!(f, "10m"),
            RateUnit::Hour => write!(f, "1h"),
        }
    }
}

/// The configured trigger rate was not a positive, finite count.
#[derive(Debug, thiserror::Error)]
#[error("trigger rate must be a positive count per unit, got {count} per {unit}")]
pub struct InvalidRateError {
    pub count: f64,
    pub unit: RateUnit,
}

/// An exponential inter-arrival distribution over scheduler ticks.
#[derive(Clone, Copy)]
pub struct TriggerRate {
    lambda: f64,
    exp: Exp<f64>,
}

impl fmt::Debug for TriggerRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerRate")
            .field("lambda", &self.lambda)
            .finish()
    }
}

impl TriggerRate {
    /// Creates a trigger rate from "count triggers per unit".
    pub fn per_ticks(count: f64, unit: RateUnit) -> Result<TriggerRate, InvalidRateError> {
        if !count.is_finite() || count <= 0.0 {
            return Err(InvalidRateError { count, unit });
        }

        let lambda = count / unit.duration_ticks();
        let exp = Exp::new(lambda).map_err(|_| InvalidRateError { count, unit })?;
        Ok(TriggerRate { lambda, exp })
    }

    /// The rate parameter of the distribution, in triggers per tick.
    #[cfg(test)]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Draws the number of ticks until the next trigger.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.exp.sample(rng)
    }
}
