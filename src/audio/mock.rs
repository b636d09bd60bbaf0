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
use std::{
    collections::{HashMap, HashSet},
    fmt,
    path::PathBuf,
};

use parking_lot::Mutex;

use super::sound::{Sound, SoundError};

/// A recorded play call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Play {
    pub channel: u16,
    pub looped: bool,
}

/// A mock device. Doesn't actually play anything, just records what it was
/// asked to do.
pub struct Device {
    name: String,
    gains: Mutex<HashMap<u16, (f32, f32)>>,
    plays: Mutex<Vec<Play>>,
    missing: Mutex<HashSet<String>>,
}

impl Device {
    /// Creates a new mock device.
    pub fn new() -> Device {
        Device {
            name: "mock".to_string(),
            gains: Mutex::new(HashMap::new()),
            plays: Mutex::new(Vec::new()),
            missing: Mutex::new(HashSet::new()),
        }
    }

    /// Makes load_sound fail for the given sound identifier.
    pub fn fail_to_load(&self, sound_id: &str) {
        self.missing.lock().insert(sound_id.to_string());
    }

    /// Returns all recorded play calls, in order.
    pub fn plays(&self) -> Vec<Play> {
        self.plays.lock().clone()
    }

    /// Returns the number of recorded play calls matching the given shape.
    pub fn play_count(&self, channel: u16, looped: bool) -> usize {
        self.plays
            .lock()
            .iter()
            .filter(|play| play.channel == channel && play.looped == looped)
            .count()
    }

    /// Returns the gains set for the given channel, if any.
    pub fn gains(&self, channel: u16) -> Option<(f32, f32)> {
        self.gains.lock().get(&channel).copied()
    }
}

impl super::Device for Device {
    fn load_sound(&self, sound_id: &str) -> Result<Sound, SoundError> {
        if self.missing.lock().contains(sound_id) {
            return Err(SoundError::Open {
                path: PathBuf::from(format!("sounds/{}.ogg", sound_id)),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such sound"),
            });
        }
        Ok(Sound::from_samples(vec![0.0; 64], 1, 44100))
    }

    fn set_gains(&self, channel: u16, left: f32, right: f32) {
        self.gains.lock().insert(channel, (left, right));
    }

    fn play(&self, channel: u16, sound: &Sound, looped: bool) {
        let _ = sound;
        self.plays.lock().push(Play { channel, looped });
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
