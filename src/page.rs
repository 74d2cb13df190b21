//! Page assembly: loads every CMS-backed section of the portfolio page through its own
//! binding, concurrently, and renders the result as plain text.
//!
//! A failing section is shown with its error message; the other sections are unaffected.

use portfolio_content_core::binding::{content, Binding};
use portfolio_content_core::gateway::ContentGateway;
use portfolio_content_core::model::{Experience, Project, SkillGroups};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum Section<T> {
    Loaded(T),
    Failed(String),
}

impl<T> Section<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Section::Loaded(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub projects: Section<Vec<Project>>,
    pub experience: Section<Vec<Experience>>,
    pub skills: Section<SkillGroups>,
}

fn section<P, T>(binding: &Binding<P, T>) -> Section<T>
where
    P: Serialize + Clone + Send + 'static,
    T: Clone + Default + Send + Sync + 'static,
{
    let state = binding.state();
    match state.error {
        Some(message) => Section::Failed(message),
        None => Section::Loaded(state.data),
    }
}

/// Mounts the featured projects, experience and skills bindings and waits for all three.
pub async fn load_page(gateway: &ContentGateway) -> Page {
    let projects = content::featured_projects(gateway);
    let experience = content::experiences(gateway, None);
    let skills = content::skills(gateway);

    tokio::join!(projects.mount(), experience.mount(), skills.mount());

    let page = Page {
        projects: section(&projects),
        experience: section(&experience),
        skills: section(&skills),
    };
    info!(
        projects_loaded = page.projects.is_loaded(),
        experience_loaded = page.experience.is_loaded(),
        skills_loaded = page.skills.is_loaded(),
        "Page sections loaded"
    );
    page
}

fn render_section<T>(
    lines: &mut Vec<String>,
    title: &str,
    section: &Section<T>,
    render: impl Fn(&T) -> Vec<String>,
) {
    lines.push(format!("== {title} =="));
    match section {
        Section::Loaded(data) => {
            let rendered = render(data);
            if rendered.is_empty() {
                lines.push("(nothing to show)".to_string());
            } else {
                lines.extend(rendered);
            }
        }
        Section::Failed(message) => lines.push(format!("! {message}")),
    }
    lines.push(String::new());
}

fn project_lines(projects: &[Project]) -> Vec<String> {
    let mut lines = Vec::new();
    for project in projects {
        let mut line = format!("- {} ({})", project.title, project.date);
        if !project.technologies.is_empty() {
            line.push_str(&format!(" [{}]", project.technologies.join(", ")));
        }
        lines.push(line);
        lines.push(format!("    {}", project.short_description));
        for url in [&project.source_url, &project.demo_url].into_iter().flatten() {
            lines.push(format!("    {url}"));
        }
    }
    lines
}

fn experience_lines(experiences: &[Experience]) -> Vec<String> {
    experiences
        .iter()
        .map(|experience| {
            let mut line = format!(
                "- {} @ {} | {}",
                experience.role,
                experience.institution,
                experience.period_label()
            );
            if let Some(kind) = experience.primary_kind() {
                line.push_str(&format!(" | {kind}"));
            }
            if let Some(location) = &experience.location {
                line.push_str(&format!(" | {location}"));
            }
            line
        })
        .collect()
}

fn skill_lines(groups: &SkillGroups) -> Vec<String> {
    groups
        .iter()
        .map(|(category, skills)| {
            let names: Vec<String> = skills
                .iter()
                .map(|skill| format!("{} ({})", skill.name, skill.level))
                .collect();
            format!("{category}: {}", names.join(", "))
        })
        .collect()
}

pub fn render_page(page: &Page) -> String {
    let mut lines = Vec::new();
    render_section(&mut lines, "Featured projects", &page.projects, |projects| {
        project_lines(projects)
    });
    render_section(&mut lines, "Experience", &page.experience, |experiences| {
        experience_lines(experiences)
    });
    render_section(&mut lines, "Skills", &page.skills, skill_lines);
    lines.join("\n")
}
