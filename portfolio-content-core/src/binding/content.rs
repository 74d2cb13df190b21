//! Bindings for each entity kind, backed by a shared [`ContentGateway`].

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;

use super::Binding;
use crate::error::ContentError;
use crate::gateway::ContentGateway;
use crate::model::{Experience, Project, Skill, SkillCategory, SkillGroups};
use crate::query::ProjectQuery;

fn bind<P, T, F, Fut>(name: &'static str, gateway: &ContentGateway, params: P, fetch: F) -> Binding<P, T>
where
    P: Serialize + Clone + Send + 'static,
    T: Clone + Default + Send + Sync + 'static,
    F: Fn(ContentGateway, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ContentError>> + Send + 'static,
{
    let gateway = gateway.clone();
    Binding::new(
        name,
        params,
        Arc::new(move |params| fetch(gateway.clone(), params).boxed()),
    )
}

pub fn projects(gateway: &ContentGateway, query: ProjectQuery) -> Binding<ProjectQuery, Vec<Project>> {
    bind("projects", gateway, query, |gateway, query| async move {
        gateway.projects(&query).await
    })
}

pub fn featured_projects(gateway: &ContentGateway) -> Binding<(), Vec<Project>> {
    bind("featured_projects", gateway, (), |gateway, ()| async move {
        gateway.featured_projects().await
    })
}

/// Experiences, optionally restricted to one category tag.
pub fn experiences(
    gateway: &ContentGateway,
    category: Option<String>,
) -> Binding<Option<String>, Vec<Experience>> {
    bind("experiences", gateway, category, |gateway, category| async move {
        gateway.experiences(category.as_deref()).await
    })
}

pub fn education(gateway: &ContentGateway) -> Binding<(), Vec<Experience>> {
    bind("education", gateway, (), |gateway, ()| async move {
        gateway.education().await
    })
}

pub fn certifications(gateway: &ContentGateway) -> Binding<(), Vec<Experience>> {
    bind("certifications", gateway, (), |gateway, ()| async move {
        gateway.certifications().await
    })
}

pub fn skills(gateway: &ContentGateway) -> Binding<(), SkillGroups> {
    bind("skills", gateway, (), |gateway, ()| async move {
        gateway.skills().await
    })
}

pub fn skills_by_category(
    gateway: &ContentGateway,
    category: SkillCategory,
) -> Binding<SkillCategory, Vec<Skill>> {
    bind("skills_by_category", gateway, category, |gateway, category| async move {
        gateway.skills_by_category(category).await
    })
}
