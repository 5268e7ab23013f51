//! Core data types for the signage backend
//!
//! Field names on the wire follow the backend's JSON (`titleSlide`, `uRL`,
//! `statusSlide`, ...). Rust-side names describe what the field means.

use serde::{Deserialize, Serialize};
use std::{fmt, num::ParseIntError, str::FromStr};
use validator::Validate;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Board (display screen) identifier
    BoardId
);
id_type!(
    /// Slide identifier, unique within a board
    SlideId
);
id_type!(
    /// Category identifier
    CategoryId
);

/// Lowest accepted slide duration, in minutes
pub const MIN_SLIDE_MINUTES: u32 = 1;

/// Highest accepted slide duration, in minutes
pub const MAX_SLIDE_MINUTES: u32 = 10_000;

/// A timed content item belonging to one board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Slide {
    /// Slide identifier
    #[serde(rename = "slideId")]
    pub id: SlideId,

    /// Display label, not used for playback
    #[serde(rename = "titleSlide", default)]
    #[validate(length(min = 1))]
    pub title: String,

    /// URL shown while the slide is on screen
    #[serde(rename = "uRL")]
    #[validate(url)]
    pub target: String,

    /// How long the slide stays on screen, in minutes
    #[serde(rename = "time")]
    #[validate(range(min = 1, max = 10_000))]
    pub duration_minutes: u32,

    /// Only active slides take part in rotation
    #[serde(rename = "statusSlide", default)]
    pub active: bool,

    /// Owning board
    #[serde(rename = "boardId")]
    pub board_id: BoardId,
}

/// A named display target owning an ordered set of slides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Board identifier
    #[serde(rename = "boardId")]
    pub id: BoardId,

    /// Board title
    #[serde(rename = "titleBoard", default)]
    pub title: String,

    /// Free-form description
    #[serde(rename = "descriptionBoard", default)]
    pub description: Option<String>,

    /// Whether the board is enabled
    #[serde(rename = "statusBoard", default)]
    pub active: bool,

    /// Category the board is filed under
    #[serde(rename = "categoryId", default)]
    pub category_id: Option<CategoryId>,
}

/// Organizational grouping of boards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category identifier
    #[serde(rename = "categoryId")]
    pub id: CategoryId,

    /// Category title
    #[serde(rename = "titleCategory", default)]
    pub title: String,

    /// Whether the category is enabled
    #[serde(rename = "statusCategory", default)]
    pub active: bool,
}

/// One page of a paginated listing
///
/// Category pages arrive as `{items, totalPages}` and board pages as
/// `{boards, totalPages}`; both decode into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    #[serde(alias = "boards", default = "Vec::new")]
    pub items: Vec<T>,

    /// Total number of pages, never zero
    #[serde(rename = "totalPages", default = "default_total_pages")]
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Clamp a reported page count of zero up to one
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.total_pages = self.total_pages.max(1);
        self
    }
}

const fn default_total_pages() -> u32 {
    1
}

/// Body of the login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// User name
    pub user: String,
    /// Password
    pub password: String,
}

/// Body of a successful login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token
    pub token: String,
    /// Display name of the signed-in user
    #[serde(rename = "userName", default)]
    pub user_name: String,
}

/// Credential persisted between invocations
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token sent with every authenticated request
    pub token: String,
    /// User the token was issued to
    pub user_name: String,
}

impl From<LoginResponse> for Credentials {
    fn from(response: LoginResponse) -> Self {
        Self {
            token: response.token,
            user_name: response.user_name,
        }
    }
}

// Keep the token out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("user_name", &self.user_name)
            .finish()
    }
}
