//! Presence builder - turns a `PresenceSpec` into a wire-ready payload
//!
//! `PresenceBuilder::build` is a pure function of its inputs (the clock is
//! passed in). Field-level problems never fail the build; they drop the
//! offending field and are reported as [`PresenceWarning`]s for the caller
//! to log.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

use crate::entities::{
    ActivityAssets, ActivityMetadata, ActivityPayload, ActivityTimestamps, Button, ElapsedMode,
    ElapsedRecord, PresenceSpec, PresenceUpdatePayload,
};
use crate::error::PresenceValidationError;

/// Maximum number of buttons the gateway renders
pub const MAX_BUTTONS: usize = 2;

/// Maximum activity name length in characters
pub const MAX_NAME_LENGTH: usize = 128;

/// Non-fatal problem found while building a presence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceWarning {
    /// A rich field was set without a usable application id
    RequiresApplicationId { field: &'static str },
    /// Button at `index` had an empty label
    EmptyButtonLabel { index: usize },
    /// Button at `index` had a URL that does not parse
    InvalidButtonUrl { index: usize, url: String },
    /// More than [`MAX_BUTTONS`] valid buttons; the rest were dropped
    ButtonsTruncated { kept: usize, dropped: usize },
}

impl fmt::Display for PresenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequiresApplicationId { field } => {
                write!(f, "{field} requires an application id and was dropped")
            }
            Self::EmptyButtonLabel { index } => {
                write!(f, "button {index} has an empty label and was dropped")
            }
            Self::InvalidButtonUrl { index, url } => {
                write!(f, "button {index} has an invalid url '{url}' and was dropped")
            }
            Self::ButtonsTruncated { kept, dropped } => {
                write!(f, "only {kept} buttons are shown; {dropped} dropped")
            }
        }
    }
}

/// Builder output: the payload plus everything that was dropped on the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPresence {
    pub payload: PresenceUpdatePayload,
    pub warnings: Vec<PresenceWarning>,
}

/// Stateless presence payload builder
#[derive(Debug, Clone, Copy, Default)]
pub struct PresenceBuilder;

impl PresenceBuilder {
    /// Build the presence update for `spec`.
    ///
    /// `elapsed` seeds the auto timer; absent means the timer starts at `now`.
    pub fn build(
        spec: &PresenceSpec,
        elapsed: Option<&ElapsedRecord>,
        now: DateTime<Utc>,
    ) -> Result<BuiltPresence, PresenceValidationError> {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(PresenceValidationError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(PresenceValidationError::NameTooLong {
                max: MAX_NAME_LENGTH,
            });
        }

        let mut warnings = Vec::new();
        let mut activity = ActivityPayload {
            name: name.to_string(),
            activity_type: spec.activity_type,
            application_id: None,
            details: None,
            state: None,
            assets: None,
            buttons: Vec::new(),
            metadata: None,
            timestamps: Self::timestamps(spec, elapsed, now),
        };

        match spec.effective_application_id() {
            Some(app_id) => {
                activity.application_id = Some(app_id.to_string());
                activity.details = non_blank(spec.details.as_deref());
                activity.state = non_blank(spec.state.as_deref());

                let assets = ActivityAssets {
                    large_image: non_blank(spec.large_image_key.as_deref()),
                    large_text: non_blank(spec.large_image_text.as_deref()),
                    small_image: non_blank(spec.small_image_key.as_deref()),
                    small_text: non_blank(spec.small_image_text.as_deref()),
                };
                if !assets.is_empty() {
                    activity.assets = Some(assets);
                }

                let buttons = Self::valid_buttons(&spec.buttons, &mut warnings);
                if !buttons.is_empty() {
                    activity.buttons = buttons.iter().map(|b| b.label.trim().to_string()).collect();
                    activity.metadata = Some(ActivityMetadata {
                        button_urls: buttons.iter().map(|b| b.url.trim().to_string()).collect(),
                    });
                }
            }
            None => Self::warn_rich_fields(spec, &mut warnings),
        }

        Ok(BuiltPresence {
            payload: PresenceUpdatePayload::new(activity, spec.status),
            warnings,
        })
    }

    fn timestamps(
        spec: &PresenceSpec,
        elapsed: Option<&ElapsedRecord>,
        now: DateTime<Utc>,
    ) -> Option<ActivityTimestamps> {
        let start = match spec.elapsed_mode {
            ElapsedMode::None => return None,
            ElapsedMode::Auto => elapsed.map_or(now, |record| record.start_reference(now)),
            ElapsedMode::Custom => {
                let minutes = i64::try_from(spec.custom_elapsed_minutes).unwrap_or(i64::MAX);
                Duration::try_minutes(minutes)
                    .and_then(|offset| now.checked_sub_signed(offset))
                    .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
            }
        };

        Some(ActivityTimestamps {
            start: start.timestamp_millis(),
        })
    }

    fn valid_buttons<'a>(buttons: &'a [Button], warnings: &mut Vec<PresenceWarning>) -> Vec<&'a Button> {
        let mut valid = Vec::with_capacity(MAX_BUTTONS);

        for (index, button) in buttons.iter().enumerate() {
            if button.label.trim().is_empty() {
                warnings.push(PresenceWarning::EmptyButtonLabel { index });
                continue;
            }
            if url::Url::parse(button.url.trim()).is_err() {
                warnings.push(PresenceWarning::InvalidButtonUrl {
                    index,
                    url: button.url.clone(),
                });
                continue;
            }
            valid.push(button);
        }

        if valid.len() > MAX_BUTTONS {
            warnings.push(PresenceWarning::ButtonsTruncated {
                kept: MAX_BUTTONS,
                dropped: valid.len() - MAX_BUTTONS,
            });
            valid.truncate(MAX_BUTTONS);
        }

        valid
    }

    fn warn_rich_fields(spec: &PresenceSpec, warnings: &mut Vec<PresenceWarning>) {
        let fields = [
            ("details", spec.details.as_deref()),
            ("state", spec.state.as_deref()),
            ("large_image_key", spec.large_image_key.as_deref()),
            ("large_image_text", spec.large_image_text.as_deref()),
            ("small_image_key", spec.small_image_key.as_deref()),
            ("small_image_text", spec.small_image_text.as_deref()),
        ];
        for (field, value) in fields {
            if non_blank(value).is_some() {
                warnings.push(PresenceWarning::RequiresApplicationId { field });
            }
        }
        if !spec.buttons.is_empty() {
            warnings.push(PresenceWarning::RequiresApplicationId { field: "buttons" });
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
