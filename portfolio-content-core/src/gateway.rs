//! # gateway: typed read access to portfolio content
//!
//! [`ContentGateway`] is the only boundary between the typed model and the remote entry
//! representation. Every operation follows the same pipeline:
//!
//! 1. build an [`EntryQuery`] with the per-entity builder from [`crate::query`],
//! 2. validate it (bad membership filters fail as `InvalidQuery` without a request),
//! 3. run it against the injected [`ContentSource`], bounded by the configured timeout,
//! 4. normalize the raw collection into [`Record`]s (`Schema` on any violation),
//! 5. re-assert the requested ordering locally with a stable sort.
//!
//! Failures are classified into [`ContentError`], logged, and returned. Nothing is
//! swallowed and nothing panics.
//!
//! The source is injected at construction; there is no process-wide client. The gateway
//! is cheap to clone and is shared by every binding of a page.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::config::ContentfulConfig;
use crate::contract::ContentSource;
use crate::error::ContentError;
use crate::model::{
    tags, Experience, ExperienceFields, Project, ProjectFields, Record, Skill, SkillCategory,
    SkillFields, SkillGroups,
};
use crate::normalize::{normalize_collection, EntryFields};
use crate::query::{
    experiences_query, projects_query, skills_query, EntryQuery, ProjectQuery, ProjectSort,
    SortDirection,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct ContentGateway {
    source: Arc<dyn ContentSource>,
    timeout: Duration,
    locale: Option<String>,
}

impl ContentGateway {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            timeout: DEFAULT_TIMEOUT,
            locale: None,
        }
    }

    /// Gateway with the timeout and locale of a loaded configuration.
    pub fn from_config(source: Arc<dyn ContentSource>, config: &ContentfulConfig) -> Self {
        let gateway = Self::new(source).with_timeout(config.timeout());
        match &config.locale {
            Some(locale) => gateway.with_locale(locale.clone()),
            None => gateway,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Projects matching `query`, in the requested order.
    pub async fn projects(&self, query: &ProjectQuery) -> Result<Vec<Project>, ContentError> {
        info!(query = ?query, "[GATEWAY] Fetching projects");
        let mut projects: Vec<Project> = self.fetch("projects", projects_query(query)).await?;
        sort_projects(&mut projects, query.sort_by, query.direction);
        Ok(projects)
    }

    /// Same result as [`ContentGateway::projects`] with [`ProjectQuery::featured`].
    pub async fn featured_projects(&self) -> Result<Vec<Project>, ContentError> {
        self.projects(&ProjectQuery::featured()).await
    }

    /// Experience entries, most recent start date first.
    pub async fn experiences(&self, category: Option<&str>) -> Result<Vec<Experience>, ContentError> {
        info!(category = ?category, "[GATEWAY] Fetching experiences");
        let mut experiences: Vec<Experience> = self
            .fetch("experiences", experiences_query(category))
            .await?;
        sort_experiences(&mut experiences);
        Ok(experiences)
    }

    pub async fn education(&self) -> Result<Vec<Experience>, ContentError> {
        self.experiences(Some(tags::EDUCATION)).await
    }

    pub async fn certifications(&self) -> Result<Vec<Experience>, ContentError> {
        self.experiences(Some(tags::CERTIFICATION)).await
    }

    /// All skills, grouped by category.
    pub async fn skills(&self) -> Result<SkillGroups, ContentError> {
        info!("[GATEWAY] Fetching skills");
        let mut skills: Vec<Skill> = self.fetch("skills", skills_query(None)).await?;
        sort_skills(&mut skills);
        Ok(group_skills(skills))
    }

    pub async fn skills_by_category(
        &self,
        category: SkillCategory,
    ) -> Result<Vec<Skill>, ContentError> {
        info!(category = %category, "[GATEWAY] Fetching skills by category");
        let mut skills: Vec<Skill> = self
            .fetch("skills_by_category", skills_query(Some(category)))
            .await?;
        sort_skills(&mut skills);
        Ok(skills)
    }

    async fn fetch<T: EntryFields>(
        &self,
        operation: &'static str,
        query: EntryQuery,
    ) -> Result<Vec<Record<T>>, ContentError> {
        if let Err(detail) = query.validate() {
            let err = ContentError::invalid_query(operation, detail);
            error!(operation, error = %err, "[GATEWAY][ERROR] Rejected query");
            return Err(err);
        }
        let query = match (&self.locale, query.locale()) {
            (Some(locale), None) => query.with_locale(locale.clone()),
            _ => query,
        };
        debug!(operation, params = ?query.to_params(), "[GATEWAY] Querying entries");

        let collection = match tokio::time::timeout(self.timeout, self.source.get_entries(&query))
            .await
        {
            Ok(Ok(collection)) => collection,
            Ok(Err(source_err)) => {
                let err = ContentError::from_source(operation, &source_err);
                error!(
                    operation,
                    kind = err.kind().code(),
                    error = %source_err,
                    "[GATEWAY][ERROR] Remote call failed"
                );
                return Err(err);
            }
            Err(_) => {
                let err = ContentError::timeout(operation, self.timeout);
                error!(operation, timeout = ?self.timeout, "[GATEWAY][ERROR] Remote call timed out");
                return Err(err);
            }
        };

        let records = normalize_collection::<T>(&collection).map_err(|violation| {
            let err = ContentError::schema(operation, violation.to_string());
            error!(operation, error = %violation, "[GATEWAY][ERROR] Entry failed normalization");
            err
        })?;
        info!(operation, count = records.len(), "[GATEWAY] Fetched entries");
        Ok(records)
    }
}

/// Buckets skills by category, keeping their relative order within each bucket.
pub fn group_skills(skills: Vec<Record<SkillFields>>) -> SkillGroups {
    let mut groups = SkillGroups::new();
    for skill in skills {
        groups.entry(skill.bucket()).or_default().push(skill);
    }
    groups
}

fn sort_projects(projects: &mut [Record<ProjectFields>], sort_by: ProjectSort, direction: SortDirection) {
    projects.sort_by(|a, b| {
        let ordering = match sort_by {
            ProjectSort::Order => a.order.cmp(&b.order),
            ProjectSort::Date => a.date.instant().cmp(&b.date.instant()),
        };
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn sort_experiences(experiences: &mut [Record<ExperienceFields>]) {
    experiences.sort_by(|a, b| b.start_date.instant().cmp(&a.start_date.instant()));
}

fn sort_skills(skills: &mut [Record<SkillFields>]) {
    skills.sort_by(|a, b| b.level.total_cmp(&a.level));
}
