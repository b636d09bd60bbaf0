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
use std::fs;
use std::path::Path;

mod channel;
mod error;
mod template;

pub use channel::{ChannelParameters, PlaybackMode};
pub use error::ConfigError;

/// Parses an ambient mix template from an XML file, returning the parameters
/// of every channel with a sound assigned, in document order.
pub fn parse_template(file: &Path) -> Result<Vec<ChannelParameters>, ConfigError> {
    let text = fs::read_to_string(file).map_err(|e| ConfigError::Io {
        path: file.to_path_buf(),
        source: e,
    })?;
    template::parse(&text)
}
