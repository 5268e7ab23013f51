//! Validation and formatting helpers for slides

use crate::types::{MAX_SLIDE_MINUTES, MIN_SLIDE_MINUTES, Slide};
use crate::{Error, Result};
use tracing::{debug, warn};
use validator::ValidateUrl;

/// Normalize a slide URL the way the console stores it
///
/// Blank input is rejected. A value without an `http://` or `https://` scheme is
/// prefixed with `https://`. The result must be a valid URL whose host contains a dot.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the URL is empty or malformed.
pub fn normalize_slide_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("url", "this field is required"));
    }

    let adjusted = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let host = adjusted
        .split_once("://")
        .map(|(_, rest)| rest)
        .and_then(|rest| rest.split(['/', ':', '?', '#']).next())
        .unwrap_or_default();

    let dotted = host
        .split('.')
        .filter(|label| !label.is_empty())
        .count()
        >= 2;

    if adjusted.chars().any(char::is_whitespace) || !dotted || !adjusted.validate_url() {
        return Err(Error::validation("url", "please enter a valid URL"));
    }

    Ok(adjusted)
}

/// Check a slide duration against the accepted range
///
/// # Errors
///
/// Returns [`Error::Validation`] if the duration is zero or above the maximum.
pub fn validate_duration_minutes(minutes: u32) -> Result<u32> {
    if minutes < MIN_SLIDE_MINUTES {
        return Err(Error::validation(
            "duration",
            "duration must be a positive number",
        ));
    }
    if minutes > MAX_SLIDE_MINUTES {
        return Err(Error::validation(
            "duration",
            format!("duration cannot exceed {MAX_SLIDE_MINUTES} minutes"),
        ));
    }
    Ok(minutes)
}

/// Active slides in the order given, ready to be put on screen
///
/// Inactive slides are dropped. Active slides are never dropped: a target that
/// normalizes (see [`normalize_slide_url`]) is replaced by its normalized form, any
/// other target is kept as stored. A zero duration is raised to
/// [`MIN_SLIDE_MINUTES`] with a warning.
pub fn playable_slides<I>(slides: I) -> Vec<Slide>
where
    I: IntoIterator<Item = Slide>,
{
    slides
        .into_iter()
        .filter(|slide| slide.active)
        .map(|mut slide| {
            match normalize_slide_url(&slide.target) {
                Ok(url) => slide.target = url,
                Err(e) => debug!(
                    slide_id = %slide.id,
                    url = %slide.target,
                    error = %e,
                    "Keeping slide URL as stored"
                ),
            }

            if slide.duration_minutes < MIN_SLIDE_MINUTES {
                warn!(
                    slide_id = %slide.id,
                    board_id = %slide.board_id,
                    minutes = slide.duration_minutes,
                    "Slide duration below minimum, showing it for one unit"
                );
                slide.duration_minutes = MIN_SLIDE_MINUTES;
            }
            slide
        })
        .collect()
}

/// Format a duration in minutes for listings
#[must_use]
pub fn format_minutes(minutes: u32) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;

    match (hours, rest) {
        (0, m) => format!("{m} min"),
        (h, 0) => format!("{h} h"),
        (h, m) => format!("{h} h {m} min"),
    }
}
