//! Protocol, environment and time-slot enums
//!
//! These replace the string constants the experiment suite otherwise
//! scatters around. The lowercase string forms are part of the collector
//! wire contract and the result-table format and must remain stable.

use serde::{Deserialize, Serialize};

/// Transport protocol under test
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[strum(serialize = "http3")]
    Http3,
    #[strum(serialize = "webtransport")]
    WebTransport,
    #[strum(serialize = "websockets")]
    WebSockets,
    #[strum(serialize = "webrtc")]
    WebRtc,
}

impl Protocol {
    /// The protocol-named sibling directory holding the external test client.
    pub fn client_dir_name(&self) -> String {
        format!("{}-client", self)
    }

    /// The WebRTC client is a Node script, everything else is a native binary.
    pub fn uses_script_host(&self) -> bool {
        matches!(self, Self::WebRtc)
    }
}

/// Where the test clients run relative to the server
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[strum(serialize = "local")]
    Local,
    #[strum(serialize = "remote")]
    Remote,
}

impl Environment {
    pub fn from_local_flag(local: bool) -> Self {
        if local {
            Self::Local
        } else {
            Self::Remote
        }
    }
}

/// Coarse time bucket used to stratify experiment conditions
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    #[strum(serialize = "morning")]
    Morning,
    #[strum(serialize = "afternoon")]
    Afternoon,
    #[strum(serialize = "evening")]
    Evening,
    #[strum(serialize = "night")]
    Night,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_protocol_string_forms() {
        assert_eq!(Protocol::Http3.to_string(), "http3");
        assert_eq!(Protocol::WebTransport.to_string(), "webtransport");
        assert_eq!(Protocol::WebSockets.to_string(), "websockets");
        assert_eq!(Protocol::WebRtc.to_string(), "webrtc");

        assert_eq!(Protocol::from_str("webrtc").unwrap(), Protocol::WebRtc);
        assert_eq!(Protocol::from_str("HTTP3").unwrap(), Protocol::Http3);
        assert!(Protocol::from_str("quic").is_err());
    }

    #[test]
    fn test_client_dir_name() {
        assert_eq!(Protocol::Http3.client_dir_name(), "http3-client");
        assert_eq!(Protocol::WebRtc.client_dir_name(), "webrtc-client");
    }

    #[test]
    fn test_script_host_selection() {
        assert!(Protocol::WebRtc.uses_script_host());
        assert!(!Protocol::Http3.uses_script_host());
        assert!(!Protocol::WebSockets.uses_script_host());
    }

    #[test]
    fn test_environment_from_flag() {
        assert_eq!(Environment::from_local_flag(true), Environment::Local);
        assert_eq!(Environment::from_local_flag(false), Environment::Remote);
    }

    #[test]
    fn test_time_slot_parse() {
        assert_eq!(TimeSlot::from_str("morning").unwrap(), TimeSlot::Morning);
        assert_eq!(TimeSlot::from_str("night").unwrap(), TimeSlot::Night);
        assert!(TimeSlot::from_str("noon").is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&Protocol::WebTransport).unwrap(),
            "\"webtransport\""
        );
        assert_eq!(
            serde_json::to_string(&Environment::Remote).unwrap(),
            "\"remote\""
        );
    }
}
