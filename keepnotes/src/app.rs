//! Application state and initialization
//!
//! All services are built here from one configuration and made available
//! through AppState.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::NotesClient;
use crate::config::Config;
use crate::error::Result;
use crate::services::{Autosaver, LabelsService, NotesService};

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub notes: NotesService,
    pub labels: LabelsService,
}

impl AppState {
    /// Start a debounced autosaver for one open note
    pub fn autosaver(&self) -> Autosaver {
        Autosaver::spawn(self.notes.clone(), self.config.autosave_delay)
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Calling this more than once is
/// harmless; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keepnotes=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Application setup - builds the shared client and services
pub fn setup(config: Config) -> Result<AppState> {
    tracing::info!("Initializing notes client for {}", config.base_url);

    let client = NotesClient::new(&config)?;
    let state = AppState {
        notes: NotesService::new(client.clone()),
        labels: LabelsService::new(client),
        config,
    };

    tracing::info!("Application initialized successfully");
    Ok(state)
}
