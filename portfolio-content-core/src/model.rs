//! # model: typed portfolio entities
//!
//! Field structs mirror the CMS content models (`proyecto`, `experiencia`, `habilidad`).
//! Remote field names are kept on the wire through serde renames; Rust code uses the
//! English names. A [`Record`] wraps a field struct with the system metadata that the
//! remote service assigns to every entry.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::assets::{resolve_image_url, resolve_url};

/// Category tags used by experience entries.
pub mod tags {
    pub const EDUCATION: &str = "Educación";
    pub const CERTIFICATION: &str = "Certificación";
    pub const WORK: &str = "Experiencia";
}

/// Label reported for an experience without an end date.
pub const ONGOING_LABEL: &str = "ongoing";

/// A normalized entry: the typed field bag plus the remote system envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<T> {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: T,
}

impl<T> Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.fields
    }
}

pub type Project = Record<ProjectFields>;
pub type Experience = Record<ExperienceFields>;
pub type Skill = Record<SkillFields>;

/// Skills bucketed by category. Buckets iterate in [`SkillCategory`] order; within a
/// bucket, skills keep the order in which they were fetched.
pub type SkillGroups = BTreeMap<SkillCategory, Vec<Skill>>;

/// A CMS date field: the literal authored value, its calendar date and the instant it
/// denotes.
///
/// Accepts `YYYY-MM-DD` as well as ISO-8601 timestamps with or without seconds and offset
/// (`2023-04-01T00:00+02:00`, `2023-04-01T09:30:00Z`, `2023-04-01T09:30`). A bare date or a
/// timestamp without offset is read as UTC. Values order by instant.
/// Display and serialization give back the literal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDate {
    raw: String,
    date: NaiveDate,
    instant: DateTime<Utc>,
}

const TIMESTAMP_WITH_OFFSET: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"];
const TIMESTAMP_WITHOUT_OFFSET: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

impl ContentDate {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        let (date, instant) = if raw.len() == 10 {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|e| format!("invalid date `{raw}`: {e}"))?;
            (date, date.and_time(NaiveTime::MIN).and_utc())
        } else if let Some(stamp) = parse_timestamp(raw) {
            let date = NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d")
                .map_err(|e| format!("invalid date `{raw}`: {e}"))?;
            (date, stamp)
        } else {
            return Err(format!(
                "invalid date `{raw}`: expected YYYY-MM-DD or an ISO-8601 timestamp"
            ));
        };
        Ok(Self {
            raw: raw.to_string(),
            date,
            instant,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The calendar date as authored, before any offset is applied.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.with_timezone(&Utc));
    }
    TIMESTAMP_WITH_OFFSET
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
        .map(|stamp| stamp.with_timezone(&Utc))
        .or_else(|| {
            TIMESTAMP_WITHOUT_OFFSET
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|stamp| stamp.and_utc())
        })
}

impl PartialOrd for ContentDate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ContentDate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.instant
            .cmp(&other.instant)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl fmt::Display for ContentDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for ContentDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for ContentDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ContentDate::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A media asset referenced from an entry, already resolved from the response includes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<AssetFile>,
}

impl ImageAsset {
    /// Absolute URL of the asset file, if any.
    pub fn url(&self) -> Option<String> {
        resolve_image_url(Some(self))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFile {
    /// May be protocol-relative (`//images.ctfassets.net/...`).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub details: Option<FileDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDetails {
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub image: Option<ImageDimensions>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFields {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcionCorta")]
    pub short_description: String,
    /// Markdown.
    #[serde(rename = "descripcionCompleta", default)]
    pub long_description: String,
    #[serde(rename = "tecnologias", default)]
    pub technologies: Vec<String>,
    #[serde(
        rename = "imagenPrincipal",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<ImageAsset>,
    #[serde(rename = "urlGithub", default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(rename = "urlDemo", default, skip_serializing_if = "Option::is_none")]
    pub demo_url: Option<String>,
    #[serde(rename = "destacado", default)]
    pub featured: bool,
    #[serde(rename = "fecha")]
    pub date: ContentDate,
    #[serde(rename = "orden")]
    pub order: i64,
}

impl ProjectFields {
    pub fn image_url(&self) -> Option<String> {
        resolve_image_url(self.image.as_ref())
    }

    pub fn uses(&self, technology: &str) -> bool {
        self.technologies.iter().any(|t| t == technology)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceFields {
    #[serde(rename = "institucion")]
    pub institution: String,
    #[serde(rename = "cargoTitulo")]
    pub role: String,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "fechaInicio")]
    pub start_date: ContentDate,
    /// Absent while the position is still held.
    #[serde(rename = "fechaFin", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<ContentDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<ImageAsset>,
    /// Never empty once normalized.
    #[serde(rename = "tipo")]
    pub kinds: Vec<String>,
    #[serde(rename = "ubicacion", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ExperienceFields {
    pub fn is_ongoing(&self) -> bool {
        self.end_date.is_none()
    }

    /// The literal end date, or [`ONGOING_LABEL`].
    pub fn end_label(&self) -> &str {
        self.end_date
            .as_ref()
            .map(ContentDate::as_str)
            .unwrap_or(ONGOING_LABEL)
    }

    pub fn period_label(&self) -> String {
        format!("{} - {}", self.start_date, self.end_label())
    }

    /// The tag shown as the entry's badge.
    pub fn primary_kind(&self) -> Option<&str> {
        self.kinds.first().map(String::as_str)
    }

    pub fn has_kind(&self, tag: &str) -> bool {
        self.kinds.iter().any(|k| k == tag)
    }

    pub fn logo_url(&self) -> Option<String> {
        resolve_image_url(self.logo.as_ref())
    }
}

/// Fixed set of skill buckets, in display order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SkillCategory {
    Frontend,
    Backend,
    #[serde(rename = "Herramientas")]
    Tools,
    #[serde(rename = "Lenguajes")]
    Languages,
    #[default]
    #[serde(rename = "Otros")]
    Other,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 5] = [
        SkillCategory::Frontend,
        SkillCategory::Backend,
        SkillCategory::Tools,
        SkillCategory::Languages,
        SkillCategory::Other,
    ];

    /// The value stored in the CMS.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::Frontend => "Frontend",
            SkillCategory::Backend => "Backend",
            SkillCategory::Tools => "Herramientas",
            SkillCategory::Languages => "Lenguajes",
            SkillCategory::Other => "Otros",
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillCategory {
    type Err = String;

    /// Accepts both the CMS value and the English name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "frontend" => Ok(SkillCategory::Frontend),
            "backend" => Ok(SkillCategory::Backend),
            "herramientas" | "tools" => Ok(SkillCategory::Tools),
            "lenguajes" | "languages" => Ok(SkillCategory::Languages),
            "otros" | "other" => Ok(SkillCategory::Other),
            other => Err(format!("unknown skill category `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillFields {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "categoria", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<SkillCategory>,
    #[serde(rename = "nivel")]
    pub level: f64,
    #[serde(rename = "iconoUrl", default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl SkillFields {
    /// The bucket this skill is grouped under.
    pub fn bucket(&self) -> SkillCategory {
        self.category.unwrap_or_default()
    }

    pub fn icon(&self) -> Option<String> {
        self.icon_url.as_deref().map(resolve_url)
    }
}
