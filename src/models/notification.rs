use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

// ---------------------------------------------------------------------------
// NotificationKind
// ---------------------------------------------------------------------------

/// The emails a subscriber can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Welcome,
    ChangeOfStock,
    LowestPrice,
    ThresholdMet,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 4] = [
        NotificationKind::Welcome,
        NotificationKind::ChangeOfStock,
        NotificationKind::LowestPrice,
        NotificationKind::ThresholdMet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Welcome => "WELCOME",
            NotificationKind::ChangeOfStock => "CHANGE_OF_STOCK",
            NotificationKind::LowestPrice => "LOWEST_PRICE",
            NotificationKind::ThresholdMet => "THRESHOLD_MET",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                TrackerError::InvalidArgument(format!("Invalid notification type: {}", s))
            })
    }
}

// ---------------------------------------------------------------------------
// EmailProductInfo / EmailContent
// ---------------------------------------------------------------------------

/// The product fields an email is rendered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailProductInfo {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}
