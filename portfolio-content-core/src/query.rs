//! # query: entry queries against the content service
//!
//! [`EntryQuery`] is the transport-neutral description of a `GET /entries` call: a content
//! type, a list of field filters and an ordering. [`EntryQuery::to_params`] renders it
//! into the delivery API's query-string dialect:
//!
//! | clause                 | parameter                        |
//! |------------------------|----------------------------------|
//! | content type           | `content_type=proyecto`          |
//! | equality filter        | `fields.destacado=true`          |
//! | membership filter      | `fields.tecnologias[in]=Rust`    |
//! | ordering               | `order=-fields.fecha`            |
//!
//! The per-entity builders (`projects_query`, `experiences_query`, `skills_query`) are
//! the only place where CMS field names appear in query form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{tags, SkillCategory};

pub const PROJECT_TYPE: &str = "proyecto";
pub const EXPERIENCE_TYPE: &str = "experiencia";
pub const SKILL_TYPE: &str = "habilidad";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction `{other}`")),
        }
    }
}

/// A field filter clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Equals { field: String, value: String },
    /// Matches entries whose (array) field contains any of `values`.
    In { field: String, values: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub field: String,
    pub direction: SortDirection,
}

impl fmt::Display for OrderClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Asc => write!(f, "fields.{}", self.field),
            SortDirection::Desc => write!(f, "-fields.{}", self.field),
        }
    }
}

/// A query for entries of one content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuery {
    content_type: String,
    filters: Vec<Filter>,
    order: Vec<OrderClause>,
    locale: Option<String>,
}

impl EntryQuery {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            filters: Vec::new(),
            order: Vec::new(),
            locale: None,
        }
    }

    pub fn equals(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::Equals {
            field: field.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn contains_any<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.push(Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order.push(OrderClause {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn order(&self) -> &[OrderClause] {
        &self.order
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Rejects queries the remote service would silently misread.
    ///
    /// `[in]` takes a comma separated list, so a value containing a comma would be split
    /// into several tags.
    pub fn validate(&self) -> Result<(), String> {
        for filter in &self.filters {
            if let Filter::In { field, values } = filter {
                if values.is_empty() {
                    return Err(format!("membership filter on `{field}` has no values"));
                }
                if let Some(bad) = values.iter().find(|v| v.contains(',')) {
                    return Err(format!(
                        "membership filter on `{field}` cannot contain a comma: `{bad}`"
                    ));
                }
            }
        }
        Ok(())
    }

    /// Query-string parameters in delivery API syntax.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("content_type".to_string(), self.content_type.clone())];
        for filter in &self.filters {
            match filter {
                Filter::Equals { field, value } => {
                    params.push((format!("fields.{field}"), value.clone()));
                }
                Filter::In { field, values } => {
                    params.push((format!("fields.{field}[in]"), values.join(",")));
                }
            }
        }
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_string(), order));
        }
        if let Some(locale) = &self.locale {
            params.push(("locale".to_string(), locale.clone()));
        }
        params
    }
}

/// Field a project list is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectSort {
    /// Publication date (`fecha`).
    Date,
    /// Manual sort order (`orden`).
    #[default]
    Order,
}

impl ProjectSort {
    pub fn field(&self) -> &'static str {
        match self {
            ProjectSort::Date => "fecha",
            ProjectSort::Order => "orden",
        }
    }
}

impl FromStr for ProjectSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" | "fecha" => Ok(ProjectSort::Date),
            "order" | "orden" | "manual" => Ok(ProjectSort::Order),
            other => Err(format!("unknown project sort field `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
}

/// Parameters of a project listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectQuery {
    #[serde(default)]
    pub filters: ProjectFilters,
    #[serde(default)]
    pub sort_by: ProjectSort,
    #[serde(default)]
    pub direction: SortDirection,
}

impl ProjectQuery {
    /// Featured projects in manual order.
    pub fn featured() -> Self {
        Self {
            filters: ProjectFilters {
                featured: Some(true),
                technology: None,
            },
            sort_by: ProjectSort::Order,
            direction: SortDirection::Asc,
        }
    }
}

pub fn projects_query(query: &ProjectQuery) -> EntryQuery {
    let mut entries = EntryQuery::new(PROJECT_TYPE);
    if let Some(featured) = query.filters.featured {
        entries = entries.equals("destacado", featured);
    }
    if let Some(technology) = &query.filters.technology {
        entries = entries.contains_any("tecnologias", [technology.as_str()]);
    }
    entries.order_by(query.sort_by.field(), query.direction)
}

/// Experience entries, most recent first, optionally restricted to one category tag.
pub fn experiences_query(category: Option<&str>) -> EntryQuery {
    let mut entries = EntryQuery::new(EXPERIENCE_TYPE);
    if let Some(category) = category {
        entries = entries.contains_any("tipo", [category]);
    }
    entries.order_by("fechaInicio", SortDirection::Desc)
}

pub fn education_query() -> EntryQuery {
    experiences_query(Some(tags::EDUCATION))
}

pub fn certifications_query() -> EntryQuery {
    experiences_query(Some(tags::CERTIFICATION))
}

/// Skills by descending level, optionally restricted to one category.
pub fn skills_query(category: Option<SkillCategory>) -> EntryQuery {
    let mut entries = EntryQuery::new(SKILL_TYPE);
    if let Some(category) = category {
        entries = entries.equals("categoria", category.as_str());
    }
    entries.order_by("nivel", SortDirection::Desc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn unfiltered_project_query_has_only_type_and_order() {
        let params = projects_query(&ProjectQuery::default()).to_params();
        assert_eq!(
            params,
            vec![
                ("content_type".to_string(), "proyecto".to_string()),
                ("order".to_string(), "fields.orden".to_string()),
            ]
        );
    }

    #[test]
    fn each_provided_filter_adds_exactly_one_clause() {
        let cases = [
            (None, None, 0),
            (Some(true), None, 1),
            (Some(false), None, 1),
            (None, Some("Rust"), 1),
            (Some(true), Some("Rust"), 2),
        ];
        for (featured, technology, expected) in cases {
            let query = ProjectQuery {
                filters: ProjectFilters {
                    featured,
                    technology: technology.map(str::to_string),
                },
                ..ProjectQuery::default()
            };
            let params = projects_query(&query).to_params();
            let field_clauses = params.iter().filter(|(k, _)| k.starts_with("fields.")).count();
            assert_eq!(field_clauses, expected, "featured={featured:?} tech={technology:?}");
            assert_eq!(
                param(&params, "fields.destacado"),
                featured.map(|f| if f { "true" } else { "false" })
            );
            assert_eq!(param(&params, "fields.tecnologias[in]"), technology);
        }
    }

    #[test]
    fn descending_date_sort_uses_minus_prefix() {
        let query = ProjectQuery {
            sort_by: ProjectSort::Date,
            direction: SortDirection::Desc,
            ..ProjectQuery::default()
        };
        let params = projects_query(&query).to_params();
        assert_eq!(param(&params, "order"), Some("-fields.fecha"));
    }

    #[test]
    fn featured_query_matches_general_query_with_featured_flag() {
        let general = ProjectQuery {
            filters: ProjectFilters {
                featured: Some(true),
                technology: None,
            },
            sort_by: ProjectSort::Order,
            direction: SortDirection::Asc,
        };
        assert_eq!(ProjectQuery::featured(), general);
        assert_eq!(
            projects_query(&ProjectQuery::featured()),
            projects_query(&general)
        );
    }

    #[test]
    fn education_and_certification_fix_the_category_tag() {
        assert_eq!(education_query(), experiences_query(Some("Educación")));
        assert_eq!(certifications_query(), experiences_query(Some("Certificación")));
        let params = experiences_query(None).to_params();
        assert_eq!(param(&params, "fields.tipo[in]"), None);
        assert_eq!(param(&params, "order"), Some("-fields.fechaInicio"));
    }

    #[test]
    fn skills_by_category_filters_on_cms_value() {
        let params = skills_query(Some(SkillCategory::Tools)).to_params();
        assert_eq!(param(&params, "fields.categoria"), Some("Herramientas"));
        assert_eq!(param(&params, "order"), Some("-fields.nivel"));
        assert_eq!(param(&skills_query(None).to_params(), "fields.categoria"), None);
    }

    #[test]
    fn membership_values_with_commas_are_rejected() {
        let query = EntryQuery::new(PROJECT_TYPE).contains_any("tecnologias", ["C, C++"]);
        assert!(query.validate().is_err());
        let empty = EntryQuery::new(PROJECT_TYPE).contains_any("tecnologias", Vec::<String>::new());
        assert!(empty.validate().is_err());
        assert!(projects_query(&ProjectQuery::default()).validate().is_ok());
    }

    #[test]
    fn locale_is_appended_last() {
        let params = skills_query(None).with_locale("es").to_params();
        assert_eq!(params.last(), Some(&("locale".to_string(), "es".to_string())));
    }
}
