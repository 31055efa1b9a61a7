//! Long-running poll: reconcile entities on every snapshot and print their
//! readings until Ctrl-C.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use easypv_core::{
    Coordinator, CoordinatorEvent, DeviceRegistry, EntityHandle, EntityValue, MemoryRegistry,
    Reconciler, Snapshot, default_factories,
};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

type Handles = Arc<Mutex<Vec<EntityHandle>>>;

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = config::connect(global)?;
    let mut coordinator_config = session.coordinator;
    if let Some(secs) = args.interval {
        coordinator_config =
            coordinator_config.with_refresh_interval(Duration::from_secs(secs.max(1)));
    }

    let coordinator = Coordinator::new(coordinator_config, session.client);
    let registry = Arc::new(MemoryRegistry::new());
    let handles: Handles = Arc::default();

    let sink_handles = Arc::clone(&handles);
    let sink_registry = Arc::clone(&registry);
    let sink_coordinator = coordinator.clone();
    let mut reconciler = Reconciler::new(
        default_factories(),
        move |created: Vec<EntityHandle>| {
            let snapshot = sink_coordinator.snapshot();
            for handle in &created {
                if let Some(entry) = handle.device_info(&snapshot) {
                    sink_registry.update(entry);
                }
            }
            info!(count = created.len(), "entities created");
            sink_handles
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend(created);
        },
        Arc::clone(&registry) as Arc<dyn DeviceRegistry>,
    );

    let mut events = coordinator.subscribe();
    if let Err(e) = coordinator.first_refresh().await {
        coordinator.shutdown().await;
        return Err(e.into());
    }

    let color = output::should_color(global.color);
    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            event = events.recv() => match event {
                Ok(CoordinatorEvent::SnapshotUpdated(snapshot)) => {
                    let report = reconciler.reconcile(&snapshot);
                    if !report.removed.is_empty() {
                        handles
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .retain(|h| h.device_info(&snapshot).is_some());
                    }
                    if !global.quiet {
                        print_readings(&handles, &snapshot, color);
                    }
                }
                Ok(CoordinatorEvent::UpdateFailed { message }) => {
                    warn!(error = %message, "refresh failed, showing previous readings");
                }
                Ok(CoordinatorEvent::ReauthRequired { message }) => {
                    break Err(CliError::AuthFailed { message });
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event stream lagged");
                }
                Err(RecvError::Closed) => break Ok(()),
            }
        }
    };

    coordinator.shutdown().await;
    info!(registered = registry.len(), "watch stopped");
    result
}

fn print_readings(handles: &Handles, snapshot: &Snapshot, color: bool) {
    let handles = handles.lock().unwrap_or_else(PoisonError::into_inner);
    let mut lines = Vec::with_capacity(handles.len());

    for handle in handles.iter() {
        let Some(value) = handle.value_in(snapshot) else {
            continue;
        };
        let reading = match value {
            EntityValue::Number(v) => match handle.display_precision() {
                Some(p) => format!("{v:.prec$}", prec = usize::from(p)),
                None => v.to_string(),
            },
            EntityValue::Location {
                name,
                latitude,
                longitude,
            } => format!(
                "{} ({}, {})",
                name.unwrap_or_default(),
                latitude.map_or_else(|| "-".into(), |v| v.to_string()),
                longitude.map_or_else(|| "-".into(), |v| v.to_string()),
            ),
        };
        let unit = handle.unit().unwrap_or_default();

        if color {
            lines.push(format!(
                "{} = {} {}",
                handle.unique_id.cyan(),
                reading.bold(),
                unit.dimmed()
            ));
        } else {
            lines.push(format!("{} = {reading} {unit}", handle.unique_id));
        }
    }

    output::print_output(&lines.join("\n"), false);
}
