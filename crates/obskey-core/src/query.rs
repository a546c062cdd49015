//! Read-only lookups of what OBS currently exposes.
//!
//! Nothing here is cached; every call asks the server again.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use obskey_rpc::requests::{
    FilterEntry, GetInputList, GetSceneList, GetSourceFilterList, GetVersion, InputEntry,
    SceneEntry, VersionInfo,
};
use obskey_rpc::{CommandError, Connection, send};
use tracing::debug;

use crate::action::Action;

/// All inputs, in the order OBS reports them.
///
/// # Errors
///
/// `Disconnected` or `Backend`.
pub async fn list_inputs<C>(session: &C) -> Result<Vec<InputEntry>, CommandError>
where
    C: Connection + ?Sized,
{
    let list = send(session, &GetInputList::default()).await?;
    debug!("OBS reports {} inputs", list.inputs.len());
    Ok(list.inputs)
}

/// Filters attached to one source, in chain order.
///
/// # Errors
///
/// `NotFound` if the source does not exist.
pub async fn list_filters<C>(
    session: &C,
    source_name: &str,
) -> Result<Vec<FilterEntry>, CommandError>
where
    C: Connection + ?Sized,
{
    let list = send(
        session,
        &GetSourceFilterList {
            source_name: source_name.to_string(),
        },
    )
    .await?;
    debug!("Source '{}' has {} filters", source_name, list.filters.len());
    Ok(list.filters)
}

/// # Errors
///
/// `Disconnected` or `Backend`.
pub async fn list_scenes<C>(session: &C) -> Result<Vec<SceneEntry>, CommandError>
where
    C: Connection + ?Sized,
{
    Ok(send(session, &GetSceneList).await?.scenes)
}

/// # Errors
///
/// `Disconnected` or `Backend`.
pub async fn version<C>(session: &C) -> Result<VersionInfo, CommandError>
where
    C: Connection + ?Sized,
{
    send(session, &GetVersion).await
}

/// A configured reference that OBS cannot resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    MissingScene { scene: String },
    MissingSource { source: String },
    MissingFilter { source: String, filter: String },
    MissingMicInput { input: String },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::MissingScene { scene } => write!(f, "scene '{scene}' does not exist"),
            Finding::MissingSource { source } => write!(f, "source '{source}' does not exist"),
            Finding::MissingFilter { source, filter } => {
                write!(f, "source '{source}' has no filter '{filter}'")
            }
            Finding::MissingMicInput { input } => {
                write!(f, "mic input '{input}' does not exist")
            }
        }
    }
}

/// Check configured actions against the live server.
///
/// Reports each unresolved scene, source, filter or mic input once, in slot
/// order. Scenes are only fetched when a `Set Scene` slot exists, and inputs
/// only when a `Toggle Mic` slot exists.
///
/// # Errors
///
/// Any error other than a missing source aborts validation.
pub async fn validate_actions<C>(
    session: &C,
    actions: &[Action],
    mic_input: &str,
) -> Result<Vec<Finding>, CommandError>
where
    C: Connection + ?Sized,
{
    let mut findings = Vec::new();

    if actions.iter().any(|a| matches!(a, Action::SetScene { .. })) {
        let scenes: BTreeSet<String> = list_scenes(session)
            .await?
            .into_iter()
            .map(|scene| scene.scene_name)
            .collect();

        for action in actions {
            if let Action::SetScene { scene } = action
                && !scene.is_empty()
                && !scenes.contains(scene)
            {
                push_unique(
                    &mut findings,
                    Finding::MissingScene {
                        scene: scene.clone(),
                    },
                );
            }
        }
    }

    // None marks a source OBS does not know
    let mut filters_by_source: HashMap<String, Option<BTreeSet<String>>> = HashMap::new();

    for action in actions {
        let Action::ToggleFilter { source, filter } = action else {
            continue;
        };
        if source.is_empty() || filter.is_empty() {
            continue;
        }

        if !filters_by_source.contains_key(source) {
            let filters = match list_filters(session, source).await {
                Ok(filters) => Some(filters.into_iter().map(|f| f.filter_name).collect()),
                Err(CommandError::NotFound(_)) => None,
                Err(e) => return Err(e),
            };
            filters_by_source.insert(source.clone(), filters);
        }

        match filters_by_source.get(source) {
            Some(None) => push_unique(
                &mut findings,
                Finding::MissingSource {
                    source: source.clone(),
                },
            ),
            Some(Some(filters)) if !filters.contains(filter) => push_unique(
                &mut findings,
                Finding::MissingFilter {
                    source: source.clone(),
                    filter: filter.clone(),
                },
            ),
            _ => {}
        }
    }

    if actions.iter().any(|a| matches!(a, Action::ToggleMic)) {
        let inputs = list_inputs(session).await?;
        if !inputs.iter().any(|input| input.input_name == mic_input) {
            findings.push(Finding::MissingMicInput {
                input: mic_input.to_string(),
            });
        }
    }

    Ok(findings)
}

fn push_unique(findings: &mut Vec<Finding>, finding: Finding) {
    if !findings.contains(&finding) {
        findings.push(finding);
    }
}
