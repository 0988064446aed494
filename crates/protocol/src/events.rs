use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kinds of event published on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZoomEventKind {
    /// The effective zoom level left 1.
    ZoomStart,
    /// The effective zoom level returned to 1.
    ZoomEnd,
    /// The zoom percentage moved by more than the configured threshold.
    ZoomChange,
}

impl ZoomEventKind {
    pub const ALL: [ZoomEventKind; 3] = [
        ZoomEventKind::ZoomStart,
        ZoomEventKind::ZoomEnd,
        ZoomEventKind::ZoomChange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ZoomEventKind::ZoomStart => "zoomStart",
            ZoomEventKind::ZoomEnd => "zoomEnd",
            ZoomEventKind::ZoomChange => "zoomChange",
        }
    }
}

impl fmt::Display for ZoomEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown zoom event kind: {0}")]
pub struct UnknownEventKind(pub String);

impl FromStr for ZoomEventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ZoomEventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        assert_eq!("zoomStart".parse::<ZoomEventKind>(), Ok(ZoomEventKind::ZoomStart));
        assert_eq!("zoomEnd".parse::<ZoomEventKind>(), Ok(ZoomEventKind::ZoomEnd));
        assert_eq!("zoomChange".parse::<ZoomEventKind>(), Ok(ZoomEventKind::ZoomChange));
        let err = "zoom".parse::<ZoomEventKind>().unwrap_err();
        assert_eq!(err, UnknownEventKind("zoom".into()));
        assert_eq!(err.to_string(), "unknown zoom event kind: zoom");
    }

    #[test]
    fn serde_names_match_display() {
        for kind in ZoomEventKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
