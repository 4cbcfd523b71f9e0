pub mod app;
pub mod client;
pub mod config;
pub mod controller;
pub mod errors;
pub mod gate;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod state;
pub mod stats;
pub mod store;

pub use app::router;
pub use client::{ActivityClient, CatalogSource, ClientError};
pub use config::ServerConfig;
pub use controller::{ActivityController, ViewState};
pub use gate::{Environment, WriteGate};
pub use ledger::CompletionLedger;
pub use models::{Activity, ActivityPatch, NewActivity};
pub use state::AppState;
pub use store::{ActivityStore, StoreError};
