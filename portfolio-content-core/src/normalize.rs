//! # normalize: remote entries into typed records
//!
//! The delivery API returns every entry as a system envelope plus a loosely typed field
//! bag, with media references left as links into a side table (`includes.Asset`). This
//! module is the single translation point from that shape into [`Record`]s:
//!
//! 1. asset links in the field bag are replaced by the linked asset (or dropped, if the
//!    response did not include it),
//! 2. the field bag is deserialized into the entity's field struct,
//! 3. entity-level checks run ([`EntryFields::validate`]),
//! 4. `id`, `createdAt` and `updatedAt` are lifted from the envelope.
//!
//! Any failure is a [`SchemaViolation`]; the gateway reports it as a schema error rather
//! than letting half-filled entities reach the page.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::model::{ExperienceFields, ProjectFields, Record, SkillFields};
use crate::query::{EXPERIENCE_TYPE, PROJECT_TYPE, SKILL_TYPE};

/// Raw `GET /entries` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryCollection {
    #[serde(default)]
    pub items: Vec<RawEntry>,
    #[serde(default)]
    pub includes: Includes,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Includes {
    #[serde(rename = "Asset", default)]
    pub assets: Vec<RawAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEntry {
    pub sys: SysMeta,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAsset {
    pub sys: SysMeta,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// The system envelope assigned by the remote service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SysMeta {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// A link object: `{"sys": {"type": "Link", "linkType": "ContentType", "id": ...}}`.
    #[serde(default)]
    pub content_type: Option<Value>,
}

impl SysMeta {
    pub fn content_type_id(&self) -> Option<&str> {
        self.content_type.as_ref()?.get("sys")?.get("id")?.as_str()
    }
}

/// A field struct that can be normalized from an entry of one content type.
pub trait EntryFields: DeserializeOwned {
    const CONTENT_TYPE: &'static str;

    /// Checks serde cannot express.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl EntryFields for ProjectFields {
    const CONTENT_TYPE: &'static str = PROJECT_TYPE;
}

impl EntryFields for ExperienceFields {
    const CONTENT_TYPE: &'static str = EXPERIENCE_TYPE;

    fn validate(&self) -> Result<(), String> {
        if self.kinds.is_empty() {
            return Err("`tipo` must contain at least one category".to_string());
        }
        Ok(())
    }
}

impl EntryFields for SkillFields {
    const CONTENT_TYPE: &'static str = SKILL_TYPE;

    fn validate(&self) -> Result<(), String> {
        if !self.level.is_finite() {
            return Err(format!("`nivel` must be a finite number, got {}", self.level));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("entry `{entry_id}`: {detail}")]
pub struct SchemaViolation {
    pub entry_id: String,
    pub detail: String,
}

/// Lookup table over the assets included in one response.
pub struct AssetIndex<'a> {
    assets: HashMap<&'a str, &'a RawAsset>,
}

impl<'a> AssetIndex<'a> {
    pub fn new(includes: &'a Includes) -> Self {
        Self {
            assets: includes
                .assets
                .iter()
                .map(|asset| (asset.sys.id.as_str(), asset))
                .collect(),
        }
    }

    /// The asset in the flat shape [`crate::model::ImageAsset`] deserializes from.
    fn resolve(&self, id: &str) -> Option<Value> {
        let asset = self.assets.get(id)?;
        let mut flat = Map::new();
        flat.insert("id".to_string(), Value::String(asset.sys.id.clone()));
        for key in ["title", "description", "file"] {
            if let Some(value) = asset.fields.get(key) {
                flat.insert(key.to_string(), value.clone());
            }
        }
        Some(Value::Object(flat))
    }
}

fn asset_link_id(value: &Value) -> Option<&str> {
    let sys = value.get("sys")?;
    if sys.get("type")?.as_str()? == "Link" && sys.get("linkType")?.as_str()? == "Asset" {
        sys.get("id")?.as_str()
    } else {
        None
    }
}

fn resolve_links(value: Value, assets: &AssetIndex<'_>, entry_id: &str) -> Value {
    if let Some(asset_id) = asset_link_id(&value) {
        return match assets.resolve(asset_id) {
            Some(asset) => asset,
            None => {
                warn!(entry_id, asset_id, "Unresolved asset link, treating field as absent");
                Value::Null
            }
        };
    }
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter_map(|item| match asset_link_id(&item) {
                    Some(asset_id) => {
                        let resolved = assets.resolve(asset_id);
                        if resolved.is_none() {
                            warn!(entry_id, asset_id, "Unresolved asset link in list, dropping it");
                        }
                        resolved
                    }
                    None => Some(item),
                })
                .collect(),
        ),
        other => other,
    }
}

/// Normalizes one entry. Performs the checks listed in the module docs.
pub fn normalize_entry<T: EntryFields>(
    entry: &RawEntry,
    assets: &AssetIndex<'_>,
) -> Result<Record<T>, SchemaViolation> {
    let violation = |detail: String| SchemaViolation {
        entry_id: entry.sys.id.clone(),
        detail,
    };

    if let Some(content_type) = entry.sys.content_type_id() {
        if content_type != T::CONTENT_TYPE {
            return Err(violation(format!(
                "expected content type `{}`, got `{content_type}`",
                T::CONTENT_TYPE
            )));
        }
    }
    let created_at = entry
        .sys
        .created_at
        .ok_or_else(|| violation("missing sys.createdAt".to_string()))?;
    let updated_at = entry
        .sys
        .updated_at
        .ok_or_else(|| violation("missing sys.updatedAt".to_string()))?;

    let bag: Map<String, Value> = entry
        .fields
        .iter()
        .map(|(key, value)| (key.clone(), resolve_links(value.clone(), assets, &entry.sys.id)))
        .collect();
    let fields: T = serde_json::from_value(Value::Object(bag)).map_err(|e| violation(e.to_string()))?;
    fields.validate().map_err(violation)?;

    Ok(Record {
        id: entry.sys.id.clone(),
        created_at,
        updated_at,
        fields,
    })
}

/// Normalizes every item of a response, failing on the first bad entry.
pub fn normalize_collection<T: EntryFields>(
    collection: &EntryCollection,
) -> Result<Vec<Record<T>>, SchemaViolation> {
    let assets = AssetIndex::new(&collection.includes);
    collection
        .items
        .iter()
        .map(|entry| normalize_entry(entry, &assets))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SkillCategory;
    use serde_json::json;

    fn collection(value: Value) -> EntryCollection {
        serde_json::from_value(value).expect("fixture should parse")
    }

    fn sys(id: &str, content_type: &str) -> Value {
        json!({
            "id": id,
            "type": "Entry",
            "createdAt": "2024-01-10T09:00:00.000Z",
            "updatedAt": "2024-03-01T12:30:00.000Z",
            "contentType": { "sys": { "type": "Link", "linkType": "ContentType", "id": content_type } }
        })
    }

    #[test]
    fn project_asset_link_is_resolved_from_includes() {
        let response = collection(json!({
            "items": [{
                "sys": sys("p1", "proyecto"),
                "fields": {
                    "titulo": "Portfolio",
                    "descripcionCorta": "This site",
                    "descripcionCompleta": "## Stack\n- Rust",
                    "tecnologias": ["Rust", "React"],
                    "imagenPrincipal": { "sys": { "type": "Link", "linkType": "Asset", "id": "img1" } },
                    "destacado": true,
                    "fecha": "2024-01-01",
                    "orden": 2
                }
            }],
            "includes": { "Asset": [{
                "sys": { "id": "img1", "type": "Asset" },
                "fields": {
                    "title": "Screenshot",
                    "file": {
                        "url": "//images.ctfassets.net/space/img1/shot.png",
                        "contentType": "image/png",
                        "fileName": "shot.png",
                        "details": { "size": 1024, "image": { "width": 800, "height": 600 } }
                    }
                }
            }]}
        }));

        let projects = normalize_collection::<ProjectFields>(&response).unwrap();
        assert_eq!(projects.len(), 1);
        let project = &projects[0];
        assert_eq!(project.id, "p1");
        assert_eq!(project.technologies, vec!["Rust", "React"]);
        assert!(project.featured);
        assert_eq!(
            project.image_url().as_deref(),
            Some("https://images.ctfassets.net/space/img1/shot.png")
        );
        let dims = project
            .image
            .as_ref()
            .and_then(|i| i.file.as_ref())
            .and_then(|f| f.details.as_ref())
            .and_then(|d| d.image);
        assert_eq!(dims.map(|d| (d.width, d.height)), Some((800, 600)));
        assert_eq!(project.updated_at.to_rfc3339(), "2024-03-01T12:30:00+00:00");
    }

    #[test]
    fn unresolved_asset_link_becomes_absent() {
        let response = collection(json!({
            "items": [{
                "sys": sys("e1", "experiencia"),
                "fields": {
                    "institucion": "Universidad",
                    "cargoTitulo": "Student",
                    "fechaInicio": "2019-02-01",
                    "fechaFin": "2023-12-15",
                    "logo": { "sys": { "type": "Link", "linkType": "Asset", "id": "missing" } },
                    "tipo": ["Educación"]
                }
            }]
        }));
        let experiences = normalize_collection::<ExperienceFields>(&response).unwrap();
        assert!(experiences[0].logo.is_none());
        assert_eq!(experiences[0].end_label(), "2023-12-15");
    }

    #[test]
    fn missing_required_field_is_a_violation() {
        let response = collection(json!({
            "items": [{
                "sys": sys("p2", "proyecto"),
                "fields": { "descripcionCorta": "no title", "fecha": "2024-01-01", "orden": 1 }
            }]
        }));
        let err = normalize_collection::<ProjectFields>(&response).unwrap_err();
        assert_eq!(err.entry_id, "p2");
        assert!(err.detail.contains("titulo"), "detail was: {}", err.detail);
    }

    #[test]
    fn wrong_content_type_is_a_violation() {
        let response = collection(json!({
            "items": [{ "sys": sys("s1", "habilidad"), "fields": { "nombre": "Rust", "nivel": 90 } }]
        }));
        let err = normalize_collection::<ProjectFields>(&response).unwrap_err();
        assert!(err.detail.contains("expected content type `proyecto`"));
    }

    #[test]
    fn empty_category_list_fails_validation() {
        let response = collection(json!({
            "items": [{
                "sys": sys("e2", "experiencia"),
                "fields": {
                    "institucion": "Acme",
                    "cargoTitulo": "Dev",
                    "fechaInicio": "2020-01-01",
                    "tipo": []
                }
            }]
        }));
        let err = normalize_collection::<ExperienceFields>(&response).unwrap_err();
        assert!(err.detail.contains("tipo"));
    }

    #[test]
    fn unknown_skill_category_fails_but_missing_one_is_accepted() {
        let response = collection(json!({
            "items": [
                { "sys": sys("s1", "habilidad"), "fields": { "nombre": "Rust", "nivel": 90, "categoria": "Lenguajes" } },
                { "sys": sys("s2", "habilidad"), "fields": { "nombre": "Figma", "nivel": 40 } }
            ]
        }));
        let skills = normalize_collection::<SkillFields>(&response).unwrap();
        assert_eq!(skills[0].bucket(), SkillCategory::Languages);
        assert_eq!(skills[1].bucket(), SkillCategory::Other);

        let bad = collection(json!({
            "items": [{ "sys": sys("s3", "habilidad"), "fields": { "nombre": "Paint", "nivel": 10, "categoria": "Design" } }]
        }));
        assert!(normalize_collection::<SkillFields>(&bad).is_err());
    }

    #[test]
    fn missing_timestamps_are_a_violation() {
        let response = collection(json!({
            "items": [{ "sys": { "id": "s9" }, "fields": { "nombre": "Rust", "nivel": 90 } }]
        }));
        let err = normalize_collection::<SkillFields>(&response).unwrap_err();
        assert_eq!(err.detail, "missing sys.createdAt");
    }
}
