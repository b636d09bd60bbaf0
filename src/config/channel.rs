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
use crate::rate::{InvalidRateError, RateUnit};

use super::error::ConfigError;

/// How a channel plays its sound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackMode {
    /// The sound plays continuously.
    Looping,
    /// The sound fires as one-shots at randomized intervals.
    Randomized,
}

/// The immutable parameters of one mix channel, as read from the template.
#[derive(Clone, Debug)]
pub struct ChannelParameters {
    /// Zero-based channel index, derived from the entry's positional label.
    pub id: u16,
    /// Identifier of the sound asset to play.
    pub sound_id: String,
    /// Human-readable channel name.
    pub name: String,
    /// Playback volume in percent, 0 to 100.
    pub volume_percent: u8,
    /// Playback mode.
    pub mode: PlaybackMode,
    /// Trigger count per unit for randomized scheduling.
    pub random_count: f64,
    /// The unit the trigger count is expressed against.
    pub random_unit: RateUnit,
    /// Whether the channel is muted.
    pub muted: bool,
    /// Stereo balance in percent, -100 (full left) to 100 (full right).
    pub balance_percent: i8,
}

impl ChannelParameters {
    /// Returns true if the channel needs randomized one-shot scheduling.
    /// Muted channels are scheduled too, whatever their mode; only an
    /// unmuted looping channel plays without the scheduler.
    pub fn is_scheduled(&self) -> bool {
        self.mode == PlaybackMode::Randomized || self.muted
    }
}

/// A channel entry as it appears in the template document, all fields still
/// text. Converted into ChannelParameters after the scan.
#[derive(Debug)]
pub(super) struct RawChannel {
    pub label: String,
    pub index: u16,
    pub id_audio: String,
    pub name_audio: String,
    pub volume: Option<String>,
    pub random: Option<String>,
    pub random_counter: Option<String>,
    pub random_unit: Option<String>,
    pub mute: Option<String>,
    pub balance: Option<String>,
}

impl RawChannel {
    pub fn new(label: String, index: u16) -> RawChannel {
        RawChannel {
            label,
            index,
            id_audio: String::new(),
            name_audio: String::new(),
            volume: None,
            random: None,
            random_counter: None,
            random_unit: None,
            mute: None,
            balance: None,
        }
    }

    /// Records a child element's text. Unknown fields are ignored; templates
    /// carry plenty of entries this player has no use for.
    pub fn set_field(&mut self, name: &str, value: &str) {
        match name {
            "id_audio" => self.id_audio = value.to_string(),
            "name_audio" => self.name_audio = value.to_string(),
            "volume" => self.volume = Some(value.to_string()),
            "random" => self.random = Some(value.to_string()),
            "random_counter" => self.random_counter = Some(value.to_string()),
            "random_unit" => self.random_unit = Some(value.to_string()),
            "mute" => self.mute = Some(value.to_string()),
            "balance" => self.balance = Some(value.to_string()),
            _ => {}
        }
    }

    /// Validates and converts the raw entry into channel parameters.
    pub fn to_parameters(&self) -> Result<ChannelParameters, ConfigError> {
        let volume_percent = self.parse_ranged("volume", self.volume.as_deref(), 100, 0, 100)? as u8;
        let balance_percent =
            self.parse_ranged("balance", self.balance.as_deref(), 0, -100, 100)? as i8;

        let random = self.random.as_deref() == Some("true");
        let muted = self.mute.as_deref() == Some("true");

        let counter = self.random_counter.as_deref().unwrap_or("1");
        let random_count: f64 = counter.parse().map_err(|_| ConfigError::Malformed {
            label: self.label.clone(),
            reason: format!("random counter must be a number, got \"{}\"", counter),
        })?;

        let unit = self.random_unit.as_deref().unwrap_or("1h");
        let random_unit = RateUnit::from_template(unit).ok_or_else(|| ConfigError::Malformed {
            label: self.label.clone(),
            reason: format!("unknown rate unit \"{}\"", unit),
        })?;

        let mode = if random {
            PlaybackMode::Randomized
        } else {
            PlaybackMode::Looping
        };

        let parameters = ChannelParameters {
            id: self.index,
            sound_id: self.id_audio.clone(),
            name: self.name_audio.clone(),
            volume_percent,
            mode,
            random_count,
            random_unit,
            muted,
            balance_percent,
        };

        // Channels that will be randomly scheduled need a usable rate.
        if parameters.is_scheduled() && !(random_count.is_finite() && random_count > 0.0) {
            return Err(ConfigError::InvalidRate {
                label: self.label.clone(),
                source: InvalidRateError {
                    count: random_count,
                    unit: random_unit,
                },
            });
        }

        Ok(parameters)
    }

    fn parse_ranged(
        &self,
        name: &str,
        value: Option<&str>,
        default: i64,
        min: i64,
        max: i64,
    ) -> Result<i64, ConfigError> {
        let Some(value) = value else {
            return Ok(default);
        };
        match value.parse::<i64>() {
            Ok(parsed) if (min..=max).contains(&parsed) => Ok(parsed),
            _ => Err(ConfigError::Malformed {
                label: self.label.clone(),
                reason: format!(
                    "{} must be an integer between {} and {}, got \"{}\"",
                    name, min, max, value
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(label: &str, index: u16) -> RawChannel {
        let mut raw = RawChannel::new(label.to_string(), index);
        raw.id_audio = "2523".to_string();
        raw.name_audio = "Thunder".to_string();
        raw
    }

    #[test]
    fn test_defaults() {
        let parameters = raw("channel1", 0).to_parameters().unwrap();
        assert_eq!(parameters.id, 0);
        assert_eq!(parameters.sound_id, "2523");
        assert_eq!(parameters.volume_percent, 100);
        assert_eq!(parameters.mode, PlaybackMode::Looping);
        assert_eq!(parameters.random_unit, RateUnit::Hour);
        assert!(!parameters.muted);
        assert_eq!(parameters.balance_percent, 0);
        assert!(!parameters.is_scheduled());
    }

    #[test]
    fn test_randomized_channel() {
        let mut entry = raw("channel3", 2);
        entry.set_field("random", "true");
        entry.set_field("random_counter", "2");
        entry.set_field("random_unit", "10m");
        entry.set_field("volume", "57");
        entry.set_field("balance", "-25");

        let parameters = entry.to_parameters().unwrap();
        assert_eq!(parameters.mode, PlaybackMode::Randomized);
        assert_eq!(parameters.random_count, 2.0);
        assert_eq!(parameters.random_unit, RateUnit::TenMinutes);
        assert_eq!(parameters.volume_percent, 57);
        assert_eq!(parameters.balance_percent, -25);
        assert!(parameters.is_scheduled());
    }

    #[test]
    fn test_muted_looping_channel_is_scheduled() {
        let mut entry = raw("channel2", 1);
        entry.set_field("mute", "true");

        let parameters = entry.to_parameters().unwrap();
        assert_eq!(parameters.mode, PlaybackMode::Looping);
        assert!(parameters.muted);
        assert!(parameters.is_scheduled());
    }

    #[test]
    fn test_out_of_range_volume() {
        let mut entry = raw("channel1", 0);
        entry.set_field("volume", "150");
        assert!(matches!(
            entry.to_parameters(),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn test_unknown_rate_unit() {
        let mut entry = raw("channel1", 0);
        entry.set_field("random_unit", "fortnight");
        assert!(matches!(
            entry.to_parameters(),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn test_zero_rate_on_scheduled_channel() {
        let mut entry = raw("channel1", 0);
        entry.set_field("random", "true");
        entry.set_field("random_counter", "0");
        assert!(matches!(
            entry.to_parameters(),
            Err(ConfigError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_zero_rate_on_looping_channel_is_fine() {
        // An unmuted looping channel never consults its rate.
        let mut entry = raw("channel1", 0);
        entry.set_field("random_counter", "0");
        assert!(entry.to_parameters().is_ok());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let mut entry = raw("channel1", 0);
        entry.set_field("crossfade", "0.5");
        entry.set_field("id_template", "177");
        assert!(entry.to_parameters().is_ok());
    }
}
