// ── Entity reconciliation ──
//
// Diffs the entity-id set of each published snapshot against the previous
// one. New ids get entities through injected factories; vanished ids are
// retired from the device registry. Only ids are compared, so a station
// whose measurements changed does not churn its entities.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coordinator::{Coordinator, CoordinatorEvent};
use crate::model::{Device, Entity, Panel, Snapshot, Station};
use crate::registry::DeviceRegistry;

type StationFactory<H> = Box<dyn Fn(&Station) -> Vec<H> + Send + Sync>;
type DeviceFactory<H> = Box<dyn Fn(&Station, &Device) -> Vec<H> + Send + Sync>;
type PanelFactory<H> = Box<dyn Fn(&Station, &Device, &Panel) -> Vec<H> + Send + Sync>;

// ── Factories & sink ─────────────────────────────────────────────

/// Creation callbacks, one per level. Each defaults to "no entities".
pub struct EntityFactories<H> {
    station: StationFactory<H>,
    device: DeviceFactory<H>,
    panel: PanelFactory<H>,
}

impl<H> Default for EntityFactories<H> {
    fn default() -> Self {
        Self {
            station: Box::new(|_| Vec::new()),
            device: Box::new(|_, _| Vec::new()),
            panel: Box::new(|_, _, _| Vec::new()),
        }
    }
}

impl<H> EntityFactories<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_station<F>(mut self, f: F) -> Self
    where
        F: Fn(&Station) -> Vec<H> + Send + Sync + 'static,
    {
        self.station = Box::new(f);
        self
    }

    pub fn with_device<F>(mut self, f: F) -> Self
    where
        F: Fn(&Station, &Device) -> Vec<H> + Send + Sync + 'static,
    {
        self.device = Box::new(f);
        self
    }

    pub fn with_panel<F>(mut self, f: F) -> Self
    where
        F: Fn(&Station, &Device, &Panel) -> Vec<H> + Send + Sync + 'static,
    {
        self.panel = Box::new(f);
        self
    }

    pub fn station_entities(&self, station: &Station) -> Vec<H> {
        (self.station)(station)
    }

    pub fn device_entities(&self, station: &Station, device: &Device) -> Vec<H> {
        (self.device)(station, device)
    }

    pub fn panel_entities(&self, station: &Station, device: &Device, panel: &Panel) -> Vec<H> {
        (self.panel)(station, device, panel)
    }
}

/// Receives the entities created in one reconciliation, as one batch.
pub trait EntitySink<H>: Send {
    fn add_entities(&mut self, entities: Vec<H>);
}

impl<H, F> EntitySink<H> for F
where
    F: FnMut(Vec<H>) + Send,
{
    fn add_entities(&mut self, entities: Vec<H>) {
        self(entities);
    }
}

// ── Reconciler ───────────────────────────────────────────────────

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    /// Number of entities handed to the sink.
    pub created: usize,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

pub struct Reconciler<H> {
    factories: EntityFactories<H>,
    sink: Box<dyn EntitySink<H>>,
    registry: Arc<dyn DeviceRegistry>,
    known: BTreeSet<String>,
}

impl<H> Reconciler<H> {
    pub fn new(
        factories: EntityFactories<H>,
        sink: impl EntitySink<H> + 'static,
        registry: Arc<dyn DeviceRegistry>,
    ) -> Self {
        Self {
            factories,
            sink: Box::new(sink),
            registry,
            known: BTreeSet::new(),
        }
    }

    /// Ids seen in the last reconciled snapshot.
    pub fn known(&self) -> &BTreeSet<String> {
        &self.known
    }

    /// Diff `snapshot` against the previous run, create entities for new
    /// ids and retire vanished ones.
    pub fn reconcile(&mut self, snapshot: &Snapshot) -> ReconcileReport {
        let current = snapshot.entity_ids();
        let added: BTreeSet<String> = current.difference(&self.known).cloned().collect();
        let removed: BTreeSet<String> = self.known.difference(&current).cloned().collect();
        self.known = current;

        let mut created = 0;
        if !added.is_empty() {
            let entities = self.create_entities(snapshot, &added);
            created = entities.len();
            self.sink.add_entities(entities);
        }

        for id in &removed {
            self.retire(id);
        }

        if !added.is_empty() || !removed.is_empty() {
            info!(
                added = added.len(),
                removed = removed.len(),
                created,
                "entities reconciled"
            );
        }

        ReconcileReport {
            added,
            removed,
            created,
        }
    }

    fn create_entities(&self, snapshot: &Snapshot, added: &BTreeSet<String>) -> Vec<H> {
        let mut entities = Vec::new();
        for station in snapshot.stations() {
            if added.contains(station.entity_id()) {
                entities.extend(self.factories.station_entities(station));
            }
            for device in station.devices.values() {
                if added.contains(device.entity_id()) {
                    entities.extend(self.factories.device_entities(station, device));
                }
                for panel in &device.panels {
                    if added.contains(panel.entity_id()) {
                        entities.extend(self.factories.panel_entities(station, device, panel));
                    }
                }
            }
        }
        entities
    }

    fn retire(&self, id: &str) {
        if self.registry.get(id).is_some() && self.registry.remove(id) {
            info!(id, "retired stale device");
        } else {
            debug!(id, "stale id not registered, nothing to retire");
        }
    }
}

impl<H: Send + 'static> Reconciler<H> {
    /// Reconcile once now, then once per published snapshot until
    /// `cancel` fires or the coordinator goes away.
    pub fn spawn(mut self, coordinator: Coordinator, cancel: CancellationToken) -> JoinHandle<()> {
        let mut events = coordinator.subscribe();

        tokio::spawn(async move {
            self.reconcile(&coordinator.snapshot());

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        // Buffered payloads may be older than the store.
                        Ok(CoordinatorEvent::SnapshotUpdated(_)) => {
                            self.reconcile(&coordinator.snapshot());
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "reconciler lagged, catching up with latest snapshot");
                            self.reconcile(&coordinator.snapshot());
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        })
    }
}
