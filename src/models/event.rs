//! Life events and media attached to a tree.

use super::person::normalize;
use super::{EventId, MediaId, PersonId, TreeId};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Input for recording a life event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    /// Person the event belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<PersonId>,
    /// Short title.
    pub title: String,
    /// Date as entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Free-form type, e.g. "graduation" or "immigration".
    #[serde(rename = "type", default)]
    pub event_type: String,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Attached media record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_id: Option<MediaId>,
}

impl EventData {
    /// Creates event data with a title and type.
    #[must_use]
    pub fn new(title: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            event_type: event_type.into(),
            ..Self::default()
        }
    }

    /// Attaches the event to a person.
    #[must_use]
    pub fn for_person(mut self, person_id: PersonId) -> Self {
        self.person_id = Some(person_id);
        self
    }

    /// Sets the date.
    #[must_use]
    pub fn on(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches a media record.
    #[must_use]
    pub fn with_media(mut self, media_id: MediaId) -> Self {
        self.media_id = Some(media_id);
        self
    }

    /// Returns a normalized copy, or a validation error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the title is blank.
    pub fn validated(self) -> Result<Self> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::Validation("event title is required".to_string()));
        }
        Ok(Self {
            person_id: self.person_id,
            title,
            date: normalize(self.date),
            event_type: self.event_type.trim().to_lowercase(),
            description: normalize(self.description),
            media_id: self.media_id,
        })
    }
}

/// A recorded life event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique identifier.
    pub id: EventId,
    /// Owning tree.
    pub tree_id: TreeId,
    /// Event attributes.
    #[serde(flatten)]
    pub data: EventData,
    /// Creation time (Unix seconds).
    #[serde(default)]
    pub created_at: u64,
}

impl Event {
    /// Creates an event with a fresh id.
    #[must_use]
    pub fn new(tree_id: TreeId, data: EventData) -> Self {
        Self {
            id: EventId::generate(),
            tree_id,
            data,
            created_at: crate::current_timestamp(),
        }
    }
}

/// Kind of media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Photograph or scan.
    #[default]
    Image,
    /// Video recording.
    Video,
    /// Audio recording.
    Audio,
    /// Document such as a certificate.
    Document,
}

impl MediaType {
    /// Returns the media type as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }

    /// Parses a media type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "image" | "photo" | "picture" => Some(Self::Image),
            "video" | "movie" => Some(Self::Video),
            "audio" | "sound" | "recording" => Some(Self::Audio),
            "document" | "doc" | "pdf" => Some(Self::Document),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::Validation(format!("unknown media type: {s}")))
    }
}

/// Input for registering a media record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaData {
    /// Person the media depicts or belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<PersonId>,
    /// Location of the file.
    pub url: String,
    /// Kind of media.
    #[serde(rename = "type", default)]
    pub media_type: MediaType,
    /// Tags, kept sorted and unique.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl MediaData {
    /// Creates media data for a URL.
    #[must_use]
    pub fn new(url: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            url: url.into(),
            media_type,
            ..Self::default()
        }
    }

    /// Attaches the media to a person.
    #[must_use]
    pub fn for_person(mut self, person_id: PersonId) -> Self {
        self.person_id = Some(person_id);
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Returns a normalized copy, or a validation error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the URL is blank.
    pub fn validated(self) -> Result<Self> {
        let url = self.url.trim().to_string();
        if url.is_empty() {
            return Err(Error::Validation("media url is required".to_string()));
        }
        let tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Ok(Self {
            person_id: self.person_id,
            url,
            media_type: self.media_type,
            tags,
        })
    }
}

/// A media record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    /// Unique identifier.
    pub id: MediaId,
    /// Owning tree.
    pub tree_id: TreeId,
    /// Media attributes.
    #[serde(flatten)]
    pub data: MediaData,
    /// Creation time (Unix seconds).
    #[serde(default)]
    pub created_at: u64,
}

impl Media {
    /// Creates a media record with a fresh id.
    #[must_use]
    pub fn new(tree_id: TreeId, data: MediaData) -> Self {
        Self {
            id: MediaId::generate(),
            tree_id,
            data,
            created_at: crate::current_timestamp(),
        }
    }
}
