//! Shared helpers for command handlers.

use std::sync::Arc;

use easypv_core::{Coordinator, Snapshot, Station};

use crate::config::Session;
use crate::error::CliError;

/// Validate the token, refresh once and return the snapshot.
pub async fn fetch_snapshot(session: Session) -> Result<Arc<Snapshot>, CliError> {
    let snapshot = Coordinator::oneshot(session.coordinator, session.client, |c| async move {
        Ok(c.snapshot())
    })
    .await?;
    Ok(snapshot)
}

/// Stations matching `--station`, or all of them.
pub fn select_stations<'a>(
    snapshot: &'a Snapshot,
    station: Option<&str>,
) -> Result<Vec<&'a Station>, CliError> {
    match station {
        Some(id) => snapshot
            .station(id)
            .map(|s| vec![s])
            .ok_or_else(|| CliError::NotFound {
                resource_type: "station".into(),
                identifier: id.into(),
                list_command: "stations".into(),
            }),
        None => Ok(snapshot.stations().collect()),
    }
}

/// Map an interactive prompt failure to an IO error.
pub fn prompt_error(err: dialoguer::Error) -> CliError {
    CliError::Io(std::io::Error::other(err))
}
