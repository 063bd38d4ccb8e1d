//! Subcommand execution.

use std::time::Duration;

use anyhow::bail;
use serde_json::json;
use tracing::{debug, warn};
use vetclinic_persistence::clinic::{Clinic, EntityServices};
use vetclinic_persistence::domain::Entity;
use vetclinic_persistence::query::{Criteria, CriteriaRequest, parse_query};
use vetclinic_persistence::types::Pageable;

use crate::config::{CliConfig, Command, EntityKind};

const MIRROR_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of one command: what to print and whether it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Pretty JSON on success, a message otherwise.
    pub output: String,
    /// Drives the process exit code.
    pub success: bool,
}

impl Outcome {
    fn ok(value: &impl serde::Serialize) -> anyhow::Result<Self> {
        Ok(Self {
            output: serde_json::to_string_pretty(value)?,
            success: true,
        })
    }

    fn failed(message: String) -> Self {
        Self {
            output: message,
            success: false,
        }
    }
}

/// An entity subcommand with its entity kind split off.
#[derive(Debug, Clone, Copy)]
enum Action<'a> {
    Find(Option<&'a str>),
    Count(Option<&'a str>),
    Get(i64),
    Save(&'a str),
    Delete(i64),
    Search {
        query: &'a str,
        page: u32,
        size: Option<u32>,
    },
}

impl Command {
    /// Splits an entity subcommand into its target and action; `None` for
    /// commands that span every entity type.
    fn action(&self) -> Option<(EntityKind, Action<'_>)> {
        let split = match self {
            Command::Find { entity, query } => (*entity, Action::Find(query.as_deref())),
            Command::Count { entity, query } => (*entity, Action::Count(query.as_deref())),
            Command::Get { entity, id } => (*entity, Action::Get(*id)),
            Command::Save { entity, json } => (*entity, Action::Save(json)),
            Command::Delete { entity, id } => (*entity, Action::Delete(*id)),
            Command::Search {
                entity,
                query,
                page,
                size,
            } => (
                *entity,
                Action::Search {
                    query,
                    page: *page,
                    size: *size,
                },
            ),
            Command::Reindex => return None,
        };
        Some(split)
    }
}

/// Runs the configured command against the clinic.
pub async fn run(clinic: &Clinic, config: &CliConfig) -> anyhow::Result<Outcome> {
    let Some((entity, action)) = config.command.action() else {
        let reports = clinic.reindex_all().await?;
        let mut outcome = Outcome::ok(&reports)?;
        outcome.success = reports.iter().all(|r| !r.has_errors());
        return Ok(outcome);
    };

    match entity {
        EntityKind::Owner => run_entity(&clinic.owners, action, config).await,
        EntityKind::Pet => run_entity(&clinic.pets, action, config).await,
        EntityKind::Vet => run_entity(&clinic.vets, action, config).await,
        EntityKind::Slot => run_entity(&clinic.slots, action, config).await,
        EntityKind::Appointment => run_entity(&clinic.appointments, action, config).await,
    }
}

async fn run_entity<C: Criteria>(
    services: &EntityServices<C>,
    action: Action<'_>,
    config: &CliConfig,
) -> anyhow::Result<Outcome> {
    let name = C::Entity::NAME;

    match action {
        Action::Find(query) => {
            let request = parse_request::<C>(query, config)?;
            let page = services
                .queries
                .find_page_by_criteria(&request.criteria, &request.pageable)
                .await?;
            Outcome::ok(&page)
        }

        Action::Count(query) => {
            let request = parse_request::<C>(query, config)?;
            let count = services.queries.count_by_criteria(&request.criteria).await?;
            Outcome::ok(&json!({ "count": count }))
        }

        Action::Get(id) => match services.entities.find_one(id).await? {
            Some(entity) => Outcome::ok(&entity),
            None => Ok(Outcome::failed(format!("{} {} not found", name, id))),
        },

        Action::Save(json) => {
            let entity: C::Entity = serde_json::from_str(json)?;
            let saved = if entity.id().is_some() {
                services.entities.update(entity).await?
            } else {
                services.entities.create(entity).await?
            };
            drain_mirror(services).await;
            Outcome::ok(&saved)
        }

        Action::Delete(id) => match services.entities.delete(id).await {
            Ok(()) => {
                drain_mirror(services).await;
                Outcome::ok(&json!({ "deleted": id }))
            }
            Err(e) if e.is_not_found() => Ok(Outcome::failed(format!("{} {} not found", name, id))),
            Err(e) => Err(e.into()),
        },

        Action::Search { query, page, size } => {
            let pageable = Pageable::new(page, size.unwrap_or(config.default_page_size));
            check_page_size(&pageable, config)?;
            let results = services.entities.search(query, &pageable).await?;
            Outcome::ok(&results)
        }
    }
}

/// Parses a criteria query, applying the configured default page size when
/// the query does not name one.
fn parse_request<C: Criteria>(
    query: Option<&str>,
    config: &CliConfig,
) -> anyhow::Result<CriteriaRequest<C>> {
    let query = query.unwrap_or_default();
    let query = query.strip_prefix('?').unwrap_or(query);

    // a later `size` in the user query overrides this one
    let request = parse_query::<C>(&format!("size={}&{}", config.default_page_size, query))?;
    debug!(entity = C::Entity::NAME, criteria = ?request.criteria, "Parsed criteria query");

    check_page_size(&request.pageable, config)?;
    Ok(request)
}

fn check_page_size(pageable: &Pageable, config: &CliConfig) -> anyhow::Result<()> {
    if pageable.size > config.max_page_size {
        bail!(
            "page size {} exceeds the maximum of {}",
            pageable.size,
            config.max_page_size
        );
    }
    Ok(())
}

async fn drain_mirror<C: Criteria>(services: &EntityServices<C>) {
    if !services.entities.wait_for_mirror(MIRROR_DRAIN_TIMEOUT).await {
        warn!(
            entity = C::Entity::NAME,
            "Search index writes still pending at exit"
        );
    }
}
