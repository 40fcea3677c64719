//! Person domain model.
//!
//! # Responsibility
//! - Define the canonical person record and its external wire shape.
//! - Provide write-side inputs that exclude relationship lists.
//!
//! # Invariants
//! - `id` is stable and never reused for another person. Ids are opaque
//!   text: generated ids are uuid v4 strings, imported ids are kept verbatim.
//! - Relationship lists have set semantics; order is kept only so records
//!   round-trip unchanged through external stores.
//! - `PersonPatch` has no relationship fields, so field updates can never
//!   break edge symmetry.

use crate::model::date::PartialDate;
use crate::model::relationship::RelationList;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every person in the family graph.
///
/// Serialized as a bare string. Snapshots written by other tools may carry
/// short or timestamp-based ids, so no format is enforced on input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    /// Fresh random id (uuid v4, hyphenated lowercase).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PersonId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PersonId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(Self::Male),
            "female" | "f" => Some(Self::Female),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeEventKind {
    Birth,
    Marriage,
    Death,
    Other,
}

impl LifeEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Birth => "birth",
            Self::Marriage => "marriage",
            Self::Death => "death",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "birth" => Some(Self::Birth),
            "marriage" => Some(Self::Marriage),
            "death" => Some(Self::Death),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Dated entry in a person's biography.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LifeEventKind,
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// View-only state stored alongside the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonUi {
    /// Hides this person's descendants from tree layouts.
    #[serde(default)]
    pub collapsed: bool,
}

/// Canonical person record.
///
/// Serialized in camelCase (`firstName`, `parentIds`, `ui.collapsed`) to
/// match the external snapshot format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
    /// URL or data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub life_events: Vec<LifeEvent>,
    #[serde(default)]
    pub parent_ids: Vec<PersonId>,
    #[serde(default)]
    pub spouse_ids: Vec<PersonId>,
    #[serde(default)]
    pub children_ids: Vec<PersonId>,
    #[serde(default)]
    pub ui: PersonUi,
}

impl Person {
    /// Creates a person with a generated id and no relationships.
    pub fn new(draft: PersonDraft) -> Self {
        Self::with_id(PersonId::generate(), draft)
    }

    /// Creates a person with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(id: PersonId, draft: PersonDraft) -> Self {
        Self {
            id,
            first_name: draft.first_name,
            last_name: draft.last_name,
            nickname: draft.nickname,
            gender: draft.gender,
            birth_date: draft.birth_date,
            death_date: draft.death_date,
            photo: draft.photo,
            notes: draft.notes,
            tags: normalize_tags(draft.tags),
            life_events: draft.life_events,
            parent_ids: Vec::new(),
            spouse_ids: Vec::new(),
            children_ids: Vec::new(),
            ui: PersonUi::default(),
        }
    }

    /// `"First Last"`, trimmed when either part is empty.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn is_collapsed(&self) -> bool {
        self.ui.collapsed
    }

    pub fn birth(&self) -> Option<PartialDate> {
        self.birth_date.as_deref().and_then(PartialDate::parse)
    }

    pub fn death(&self) -> Option<PartialDate> {
        self.death_date.as_deref().and_then(PartialDate::parse)
    }

    /// Age in whole years on `today`, or at death for deceased people.
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        let birth = self.birth()?;
        let until = match self.death() {
            Some(death) => death.first_day()?,
            None => today,
        };
        birth.years_until(until)
    }

    pub fn relation_ids(&self, list: RelationList) -> &[PersonId] {
        match list {
            RelationList::Parents => &self.parent_ids,
            RelationList::Spouses => &self.spouse_ids,
            RelationList::Children => &self.children_ids,
        }
    }

    pub(crate) fn relation_ids_mut(&mut self, list: RelationList) -> &mut Vec<PersonId> {
        match list {
            RelationList::Parents => &mut self.parent_ids,
            RelationList::Spouses => &mut self.spouse_ids,
            RelationList::Children => &mut self.children_ids,
        }
    }

    /// Whether `other` appears in any relationship list.
    pub fn is_related_to(&self, other: &PersonId) -> bool {
        RelationList::ALL
            .iter()
            .any(|list| self.relation_ids(*list).contains(other))
    }

    pub fn has_relationships(&self) -> bool {
        !(self.parent_ids.is_empty() && self.spouse_ids.is_empty() && self.children_ids.is_empty())
    }
}

/// Input for creating a person.
///
/// Carries biographical fields only; relationship lists always start empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonDraft {
    pub first_name: String,
    pub last_name: String,
    pub nickname: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    pub photo: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub life_events: Vec<LifeEvent>,
}

impl PersonDraft {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }

    /// Form-level validation applied by callers before `add_person`.
    ///
    /// The store itself accepts any draft.
    ///
    /// # Errors
    /// - `MissingName` when both names are blank.
    /// - `InvalidDate` when a date is not `YYYY[-MM[-DD]]`.
    /// - `DeathBeforeBirth` when both dates parse and are reversed.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        if self.first_name.trim().is_empty() && self.last_name.trim().is_empty() {
            return Err(PersonValidationError::MissingName);
        }
        validate_dates(self.birth_date.as_deref(), self.death_date.as_deref())?;
        for event in &self.life_events {
            if let Some(date) = event.date.as_deref() {
                parse_date_field("life_event.date", date)?;
            }
        }
        Ok(())
    }
}

/// Partial field update for an existing person.
///
/// `None` leaves a field untouched. For optional fields, `Some(None)` clears
/// the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<Option<String>>,
    pub gender: Option<Option<Gender>>,
    pub birth_date: Option<Option<String>>,
    pub death_date: Option<Option<String>>,
    pub photo: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub life_events: Option<Vec<LifeEvent>>,
    pub collapsed: Option<bool>,
}

impl PersonPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges patch fields into `person`.
    pub(crate) fn apply_to(&self, person: &mut Person) {
        if let Some(value) = &self.first_name {
            person.first_name = value.clone();
        }
        if let Some(value) = &self.last_name {
            person.last_name = value.clone();
        }
        if let Some(value) = &self.nickname {
            person.nickname = value.clone();
        }
        if let Some(value) = self.gender {
            person.gender = value;
        }
        if let Some(value) = &self.birth_date {
            person.birth_date = value.clone();
        }
        if let Some(value) = &self.death_date {
            person.death_date = value.clone();
        }
        if let Some(value) = &self.photo {
            person.photo = value.clone();
        }
        if let Some(value) = &self.notes {
            person.notes = value.clone();
        }
        if let Some(value) = &self.tags {
            person.tags = normalize_tags(value.clone());
        }
        if let Some(value) = &self.life_events {
            person.life_events = value.clone();
        }
        if let Some(value) = self.collapsed {
            person.ui.collapsed = value;
        }
    }
}

/// Form-level validation failures for person input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    MissingName,
    InvalidDate { field: &'static str, value: String },
    DeathBeforeBirth { birth: String, death: String },
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "first or last name is required"),
            Self::InvalidDate { field, value } => {
                write!(f, "{field} `{value}` must be YYYY, YYYY-MM or YYYY-MM-DD")
            }
            Self::DeathBeforeBirth { birth, death } => {
                write!(f, "death_date ({death}) must not be before birth_date ({birth})")
            }
        }
    }
}

impl Error for PersonValidationError {}

/// Lowercases, trims and deduplicates tags, keeping first occurrence order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

fn validate_dates(birth: Option<&str>, death: Option<&str>) -> Result<(), PersonValidationError> {
    let birth_date = birth
        .map(|value| parse_date_field("birth_date", value))
        .transpose()?;
    let death_date = death
        .map(|value| parse_date_field("death_date", value))
        .transpose()?;
    if let (Some(birth_date), Some(death_date)) = (birth_date, death_date) {
        if is_definitely_before(death_date, birth_date) {
            return Err(PersonValidationError::DeathBeforeBirth {
                birth: birth_date.to_string(),
                death: death_date.to_string(),
            });
        }
    }
    Ok(())
}

// Components missing on either side are compatible with any value.
fn is_definitely_before(left: PartialDate, right: PartialDate) -> bool {
    if left.year != right.year {
        return left.year < right.year;
    }
    match (left.month, right.month) {
        (Some(left_month), Some(right_month)) if left_month != right_month => {
            left_month < right_month
        }
        (Some(_), Some(_)) => {
            matches!((left.day, right.day), (Some(left_day), Some(right_day)) if left_day < right_day)
        }
        _ => false,
    }
}

fn parse_date_field(
    field: &'static str,
    value: &str,
) -> Result<PartialDate, PersonValidationError> {
    PartialDate::parse(value).ok_or_else(|| PersonValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}
