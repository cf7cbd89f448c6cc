//! People in the family graph.

use super::{PersonId, TreeId};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recorded gender of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Any other or unknown gender.
    #[default]
    Other,
}

impl Gender {
    /// Returns all gender variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Male, Self::Female, Self::Other]
    }

    /// Returns the gender as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }

    /// Parses a gender from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "man" => Some(Self::Male),
            "female" | "f" | "woman" => Some(Self::Female),
            "other" | "o" | "u" | "unknown" | "x" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::Validation(format!("unknown gender: {s}")))
    }
}

/// Editable attributes of a person.
///
/// Used both to add a person and to replace the attributes of an existing one.
/// [`PersonData::validated`] trims every field and rejects a blank first name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonData {
    /// Given name (required).
    pub first_name: String,
    /// Middle name(s).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Family name at birth, when it differs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maiden_name: Option<String>,
    /// Recorded gender.
    #[serde(default)]
    pub gender: Gender,
    /// Whether the person is alive.
    #[serde(default = "default_living")]
    pub is_living: bool,
    /// Birth date as entered (ISO `YYYY-MM-DD` preferred).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    /// Birth place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    /// Death date as entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
    /// Death place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_place: Option<String>,
    /// Free-form biography.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    /// Photo URL or storage reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

const fn default_living() -> bool {
    true
}

impl PersonData {
    /// Creates person data with a first and last name.
    #[must_use]
    pub fn named(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            is_living: true,
            ..Self::default()
        }
    }

    /// Sets the gender.
    #[must_use]
    pub const fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    /// Sets the middle name.
    #[must_use]
    pub fn with_middle_name(mut self, middle_name: impl Into<String>) -> Self {
        self.middle_name = Some(middle_name.into());
        self
    }

    /// Sets the maiden name.
    #[must_use]
    pub fn with_maiden_name(mut self, maiden_name: impl Into<String>) -> Self {
        self.maiden_name = Some(maiden_name.into());
        self
    }

    /// Sets birth date and place.
    #[must_use]
    pub fn born(mut self, date: impl Into<String>, place: Option<&str>) -> Self {
        self.birth_date = Some(date.into());
        self.birth_place = place.map(str::to_string);
        self
    }

    /// Sets death date and place and marks the person deceased.
    #[must_use]
    pub fn died(mut self, date: impl Into<String>, place: Option<&str>) -> Self {
        self.death_date = Some(date.into());
        self.death_place = place.map(str::to_string);
        self.is_living = false;
        self
    }

    /// Sets the biography.
    #[must_use]
    pub fn with_biography(mut self, biography: impl Into<String>) -> Self {
        self.biography = Some(biography.into());
        self
    }

    /// Sets the photo reference.
    #[must_use]
    pub fn with_photo(mut self, photo_url: impl Into<String>) -> Self {
        self.photo_url = Some(photo_url.into());
        self
    }

    /// Returns a normalized copy, or a validation error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the first name is blank.
    pub fn validated(self) -> Result<Self> {
        let first_name = self.first_name.trim().to_string();
        if first_name.is_empty() {
            return Err(Error::Validation("first name is required".to_string()));
        }
        Ok(Self {
            first_name,
            middle_name: normalize(self.middle_name),
            last_name: self.last_name.trim().to_string(),
            maiden_name: normalize(self.maiden_name),
            gender: self.gender,
            is_living: self.is_living && self.death_date.is_none(),
            birth_date: normalize(self.birth_date),
            birth_place: normalize(self.birth_place),
            death_date: normalize(self.death_date),
            death_place: normalize(self.death_place),
            biography: normalize(self.biography),
            photo_url: normalize(self.photo_url),
        })
    }
}

/// Trims an optional string, mapping blank values to `None`.
pub(crate) fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A person in a family tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Unique identifier.
    pub id: PersonId,
    /// Owning tree.
    pub tree_id: TreeId,
    /// Editable attributes.
    #[serde(flatten)]
    pub data: PersonData,
    /// Creation time (Unix seconds).
    #[serde(default)]
    pub created_at: u64,
    /// Last update time (Unix seconds).
    #[serde(default)]
    pub updated_at: u64,
}

impl Person {
    /// Creates a person from validated data with a fresh id.
    #[must_use]
    pub fn new(tree_id: TreeId, data: PersonData) -> Self {
        let now = crate::current_timestamp();
        Self {
            id: PersonId::generate(),
            tree_id,
            data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the person with a specific id.
    #[must_use]
    pub fn with_id(mut self, id: PersonId) -> Self {
        self.id = id;
        self
    }

    /// Returns given names (first plus middle).
    #[must_use]
    pub fn given_names(&self) -> String {
        match &self.data.middle_name {
            Some(middle) => format!("{} {middle}", self.data.first_name),
            None => self.data.first_name.clone(),
        }
    }

    /// Returns the full display name.
    #[must_use]
    pub fn display_name(&self) -> String {
        let given = self.given_names();
        if self.data.last_name.is_empty() {
            given
        } else {
            format!("{given} {}", self.data.last_name)
        }
    }
}
