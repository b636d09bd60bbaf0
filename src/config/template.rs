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

//! Scanner for the ambient mix template document.
//!
//! The document shape is `<audio_template>` with one `<channelN>` element per
//! mix channel (N starting at 1), each holding flat text fields like
//! `<id_audio>` and `<random_counter>`. Only the fields this player needs are
//! read; everything else in the template is skipped.

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use super::channel::{ChannelParameters, RawChannel};
use super::error::ConfigError;

/// Parses the contents of an audio template document into channel parameters,
/// in document order. Entries without an assigned sound are skipped.
pub(super) fn parse(text: &str) -> Result<Vec<ChannelParameters>, ConfigError> {
    let mut reader = Reader::from_str(text);

    let mut raws: Vec<RawChannel> = Vec::new();
    let mut current: Option<RawChannel> = None;
    let mut field: Option<String> = None;
    let mut seen_root = false;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match depth {
                    1 => {
                        if name != "audio_template" {
                            return Err(ConfigError::UnexpectedRoot(name));
                        }
                        seen_root = true;
                    }
                    2 => current = channel_entry(&name),
                    3 => {
                        if current.is_some() {
                            field = Some(name);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(e) => {
                if depth == 3 {
                    if let (Some(raw), Some(field)) = (current.as_mut(), field.as_deref()) {
                        let value = e.unescape().map_err(quick_xml::Error::from)?;
                        raw.set_field(field, value.trim());
                    }
                }
            }
            Event::CData(e) => {
                if depth == 3 {
                    if let (Some(raw), Some(field)) = (current.as_mut(), field.as_deref()) {
                        let value = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        raw.set_field(field, value.trim());
                    }
                }
            }
            Event::End(_) => {
                match depth {
                    2 => {
                        if let Some(raw) = current.take() {
                            raws.push(raw);
                        }
                    }
                    3 => field = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(ConfigError::Empty);
    }

    let mut channels = Vec::with_capacity(raws.len());
    for raw in raws {
        // An empty identifier (or the literal "0") means no sound assigned.
        if raw.id_audio.is_empty() || raw.id_audio == "0" {
            debug!(label = raw.label, "Skipping channel with no sound assigned.");
            continue;
        }
        channels.push(raw.to_parameters()?);
    }

    Ok(channels)
}

/// Maps an element label like "channel3" to an empty raw entry with the
/// zero-based index 2. Anything else under the root is not a channel entry.
fn channel_entry(name: &str) -> Option<RawChannel> {
    let suffix = name.strip_prefix("channel")?;
    let position: u16 = suffix.parse().ok()?;
    if position == 0 {
        return None;
    }
    Some(RawChannel::new(name.to_string(), position - 1))
}

#[cfg(test)]
mod tests {
    use crate::config::PlaybackMode;
    use crate::rate::RateUnit;

    use super::*;

    const TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<audio_template>
    <channel1>
        <id_audio>2523</id_audio>
        <name_audio>Thunder</name_audio>
        <volume>57</volume>
        <random>true</random>
        <random_counter>2</random_counter>
        <random_unit>10m</random_unit>
        <mute>false</mute>
        <balance>0</balance>
    </channel1>
    <channel2>
        <id_audio>0</id_audio>
        <name_audio></name_audio>
        <volume>100</volume>
        <random>false</random>
        <random_counter>1</random_counter>
        <random_unit>1h</random_unit>
        <mute>false</mute>
        <balance>0</balance>
    </channel2>
    <channel3>
        <id_audio>104</id_audio>
        <name_audio>Rain</name_audio>
        <volume>80</volume>
        <random>false</random>
        <random_counter>1</random_counter>
        <random_unit>1h</random_unit>
        <mute>false</mute>
        <balance>-30</balance>
    </channel3>
</audio_template>
"#;

    #[test]
    fn test_parse_template() {
        let channels = parse(TEMPLATE).unwrap();

        // channel2 has the "no sound" placeholder and is skipped.
        assert_eq!(channels.len(), 2);

        assert_eq!(channels[0].id, 0);
        assert_eq!(channels[0].sound_id, "2523");
        assert_eq!(channels[0].name, "Thunder");
        assert_eq!(channels[0].mode, PlaybackMode::Randomized);
        assert_eq!(channels[0].random_count, 2.0);
        assert_eq!(channels[0].random_unit, RateUnit::TenMinutes);

        assert_eq!(channels[1].id, 2);
        assert_eq!(channels[1].sound_id, "104");
        assert_eq!(channels[1].mode, PlaybackMode::Looping);
        assert_eq!(channels[1].balance_percent, -30);
    }

    #[test]
    fn test_index_is_positional_label_minus_one() {
        let text = r#"<audio_template>
            <channel7><id_audio>9</id_audio></channel7>
        </audio_template>"#;

        let channels = parse(text).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].id, 6);
    }

    #[test]
    fn test_non_channel_entries_are_ignored() {
        let text = r#"<audio_template>
            <id_template>177</id_template>
            <name_template>Storm</name_template>
            <channel1><id_audio>9</id_audio></channel1>
        </audio_template>"#;

        let channels = parse(text).unwrap();
        assert_eq!(channels.len(), 1);
    }

    #[test]
    fn test_wrong_root_element() {
        let result = parse("<playlist><song/></playlist>");
        assert!(matches!(result, Err(ConfigError::UnexpectedRoot(root)) if root == "playlist"));
    }

    #[test]
    fn test_empty_document() {
        assert!(matches!(parse(""), Err(ConfigError::Empty)));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            parse("<audio_template><channel1></chanel1></audio_template>"),
            Err(ConfigError::Xml(_))
        ));
    }

    #[test]
    fn test_empty_sound_id_is_skipped() {
        let text = r#"<audio_template>
            <channel1><id_audio></id_audio></channel1>
            <channel2><id_audio/></channel2>
        </audio_template>"#;

        assert!(parse(text).unwrap().is_empty());
    }
}
