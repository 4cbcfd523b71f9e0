use crate::gate::WriteGate;
use crate::store::ActivityStore;

#[derive(Clone)]
pub struct AppState {
    pub store: ActivityStore,
    pub gate: WriteGate,
}

impl AppState {
    pub fn new(store: ActivityStore, gate: WriteGate) -> Self {
        Self { store, gate }
    }
}
