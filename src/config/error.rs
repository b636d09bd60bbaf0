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
use std::path::PathBuf;

use crate::rate::InvalidRateError;

/// Typed error for template load/parse failures so callers can distinguish
/// e.g. file-not-found from malformed channel entries without string matching.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse template: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("template has no root element")]
    Empty,

    #[error("not an audio template: root element is <{0}>")]
    UnexpectedRoot(String),

    #[error("channel {label}: {reason}")]
    Malformed { label: String, reason: String },

    #[error("channel {label}: {source}")]
    InvalidRate {
        label: String,
        #[source]
        source: InvalidRateError,
    },
}
