pub mod ids;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusIndicator {
    Checkmark,
    Cloud,
}

pub fn emblem_for_indicator(indicator: StatusIndicator) -> &'static str {
    match indicator {
        StatusIndicator::Checkmark => "emblem-default",
        StatusIndicator::Cloud => "emblem-web",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeIcon {
    RemoteFolder,
    Information,
}

impl NoticeIcon {
    pub fn icon_name(self) -> &'static str {
        match self {
            Self::RemoteFolder => "folder-remote",
            Self::Information => "dialog-information",
        }
    }
}
