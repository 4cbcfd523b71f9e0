use crate::client::{ActivityClient, CatalogSource, ClientError};
use crate::ledger::CompletionLedger;
use crate::models::{Activity, ActivityPatch, NewActivity};
use crate::stats::{build_stats, StatsReport};
use rand::Rng;
use tracing::{info, warn};

/// Loading is the in-flight future of [`ActivityController::refresh`]; the
/// controller itself is only ever observed between refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState<'a> {
    NoActivity,
    Displaying(&'a Activity),
}

/// Client-side view of the catalog: a cached copy of the server list, the
/// activity on display, and the durable completion ledger.
///
/// Every mutation goes to the server and is followed by a full re-fetch.
pub struct ActivityController {
    client: ActivityClient,
    ledger: CompletionLedger,
    catalog: Vec<Activity>,
    current: Option<Activity>,
}

impl ActivityController {
    pub fn new(client: ActivityClient, ledger: CompletionLedger) -> Self {
        Self {
            client,
            ledger,
            catalog: Vec::new(),
            current: None,
        }
    }

    /// Initial load: the ledger from disk, then the catalog from the server.
    pub async fn load(
        client: ActivityClient,
        ledger_path: impl Into<std::path::PathBuf>,
    ) -> Result<Self, ClientError> {
        let ledger = CompletionLedger::load(ledger_path).await;
        let mut controller = Self::new(client, ledger);
        controller.refresh().await?;
        Ok(controller)
    }

    pub fn view_state(&self) -> ViewState<'_> {
        match &self.current {
            Some(activity) => ViewState::Displaying(activity),
            None => ViewState::NoActivity,
        }
    }

    pub fn catalog(&self) -> &[Activity] {
        &self.catalog
    }

    pub fn current(&self) -> Option<&Activity> {
        self.current.as_ref()
    }

    pub fn completion_count(&self, id: &str) -> u64 {
        self.ledger.count(id)
    }

    pub fn total_completions(&self) -> u64 {
        self.ledger.total()
    }

    /// Re-fetches the catalog. Server counters are mirrored into the ledger;
    /// a fallback catalog instead takes its counters from the ledger.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let (catalog, source) = self.client.list_with_source().await?;
        self.catalog = catalog;

        match source {
            CatalogSource::Server => {
                self.ledger.sync_from(&self.catalog);
                self.ledger.persist().await?;
            }
            CatalogSource::Fallback => {
                warn!("server unreachable, keeping local completion counts");
                for activity in &mut self.catalog {
                    activity.completion_count = self.ledger.count(&activity.id);
                }
            }
        }

        // Keep the displayed activity in step with the fresh copy.
        if let Some(id) = self.current.as_ref().map(|activity| activity.id.clone()) {
            self.current = self
                .catalog
                .iter()
                .find(|activity| activity.id == id)
                .cloned();
        }
        Ok(())
    }

    /// Re-fetches first when the cache is empty.
    pub async fn pick_another(&mut self) -> Result<&Activity, ClientError> {
        if self.catalog.is_empty() {
            self.refresh().await?;
        }
        self.pick_with(&mut rand::thread_rng())
    }

    /// Uniform pick over the cached catalog; the same activity may come up twice in a row.
    pub fn pick_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&Activity, ClientError> {
        if self.catalog.is_empty() {
            return Err(ClientError::EmptyCatalog);
        }

        let index = rng.gen_range(0..self.catalog.len());
        Ok(&*self.current.insert(self.catalog[index].clone()))
    }

    /// Puts the catalog entry with `id` on display.
    pub fn show(&mut self, id: &str) -> Result<&Activity, ClientError> {
        let activity = self
            .catalog
            .iter()
            .find(|activity| activity.id == id)
            .cloned()
            .ok_or_else(|| ClientError::UnknownActivity(id.to_string()))?;
        Ok(&*self.current.insert(activity))
    }

    /// Records a completion of the displayed activity on the server and
    /// returns the new count.
    pub async fn mark_done(&mut self) -> Result<u64, ClientError> {
        let id = self
            .current
            .as_ref()
            .map(|activity| activity.id.clone())
            .ok_or(ClientError::NothingDisplayed)?;

        let updated = self.client.complete(&id).await?;
        let count = updated.completion_count;

        self.ledger.record(&updated.id, count);
        self.ledger.persist().await?;

        if let Some(entry) = self.catalog.iter_mut().find(|activity| activity.id == id) {
            *entry = updated.clone();
        }
        self.current = Some(updated);

        info!(id = %id, count = count, "marked activity done");
        Ok(count)
    }

    /// Creates an activity, resyncs, and displays it.
    pub async fn add(&mut self, activity: NewActivity) -> Result<Activity, ClientError> {
        let created = self.client.create(&activity).await?;
        self.refresh().await?;
        self.current = self
            .catalog
            .iter()
            .find(|candidate| candidate.id == created.id)
            .cloned()
            .or(Some(created.clone()));
        Ok(created)
    }

    pub async fn edit(&mut self, id: &str, patch: &ActivityPatch) -> Result<Activity, ClientError> {
        let updated = self.client.update_fields(id, patch).await?;
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn set_count(&mut self, id: &str, count: u64) -> Result<Activity, ClientError> {
        let updated = self.client.update_counter(id, count).await?;
        self.refresh().await?;
        Ok(updated)
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), ClientError> {
        self.client.delete_by_id(id).await?;
        self.refresh().await
    }

    pub fn stats(&self, category: Option<&str>) -> StatsReport {
        build_stats(&self.catalog, &self.ledger, category)
    }
}
