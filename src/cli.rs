//! This module implements the CLI for portfolio-content: command parsing, application start-up
//! (configuration, client construction, gateway injection) and output.
//!
//! All content logic (queries, normalization, bindings) lives in the
//! [`portfolio-content-core`] crate. This module is strictly glue.
//!
//! ## How To Use
//! - Command line: `portfolio-content --help`.
//! - Programmatic/integration use: call [`run`] with a constructed [`Cli`], or [`execute`]
//!   with an already built gateway.
//!
//! [`portfolio-content-core`]: ../../portfolio-content-core/
use crate::delivery::DeliveryClient;
use crate::load_config::load_config;
use crate::page::{load_page, render_page};
use anyhow::Result;
use clap::{Parser, Subcommand};
use portfolio_content_core::gateway::ContentGateway;
use portfolio_content_core::model::SkillCategory;
use portfolio_content_core::query::{ProjectFilters, ProjectQuery, ProjectSort, SortDirection};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI for portfolio-content: preview the CMS-backed sections of the portfolio.
#[derive(Parser)]
#[clap(
    name = "portfolio-content",
    version,
    about = "Fetch and preview portfolio content from the headless CMS"
)]
pub struct Cli {
    /// Optional YAML settings file (environment, host, locale, timeout_secs)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List projects as JSON
    Projects {
        /// Only featured projects
        #[clap(long)]
        featured: bool,
        /// Only projects tagged with this technology
        #[clap(long)]
        technology: Option<String>,
        /// `date` or `order`
        #[clap(long, default_value = "order")]
        sort_by: ProjectSort,
        /// `asc` or `desc`
        #[clap(long, default_value = "asc")]
        direction: SortDirection,
    },
    /// List featured projects as JSON
    Featured,
    /// List experience entries as JSON
    Experience {
        /// Category tag, e.g. "Experiencia"
        #[clap(long)]
        category: Option<String>,
    },
    /// List education entries as JSON
    Education,
    /// List certifications as JSON
    Certifications,
    /// List skills as JSON, grouped by category unless one is given
    Skills {
        #[clap(long)]
        category: Option<SkillCategory>,
    },
    /// Print every page section, each failing on its own
    Page,
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Runs one command against the gateway and returns what should be printed.
pub async fn execute(command: Commands, gateway: &ContentGateway) -> Result<String> {
    match command {
        Commands::Projects {
            featured,
            technology,
            sort_by,
            direction,
        } => {
            let query = ProjectQuery {
                filters: ProjectFilters {
                    featured: featured.then_some(true),
                    technology,
                },
                sort_by,
                direction,
            };
            to_json(&gateway.projects(&query).await?)
        }
        Commands::Featured => to_json(&gateway.featured_projects().await?),
        Commands::Experience { category } => {
            to_json(&gateway.experiences(category.as_deref()).await?)
        }
        Commands::Education => to_json(&gateway.education().await?),
        Commands::Certifications => to_json(&gateway.certifications().await?),
        Commands::Skills { category: None } => to_json(&gateway.skills().await?),
        Commands::Skills {
            category: Some(category),
        } => to_json(&gateway.skills_by_category(category).await?),
        Commands::Page => {
            let page = load_page(gateway).await;
            Ok(render_page(&page))
        }
    }
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = load_config(cli.config.as_deref())?;
    let client = DeliveryClient::new(&config)?;
    let gateway = ContentGateway::from_config(Arc::new(client), &config);

    match execute(cli.command, &gateway).await {
        Ok(output) => {
            println!("{output}");
            tracing::info!("Command completed");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            Err(e)
        }
    }
}
