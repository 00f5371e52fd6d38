//! Stocklot
//!
//! Multi-tenant unit-conversion and lot-based inventory consumption engine:
//! UnitType conversion tables, a FEFO inventory ledger with movement-replay
//! restoration, an order-event-driven consumption orchestrator, and an
//! append-only supply consumption log.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod migrator;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<EventSender>,
    pub services: services::AppServices,
}

impl AppState {
    /// Connects to the database (running migrations when the configuration
    /// asks for it), wires up the engine services, and returns the state
    /// together with the receiving end of the notification channel.
    ///
    /// The embedding application decides what to do with the receiver —
    /// typically forwarding notification events to its own bus — and feeds
    /// order lifecycle events into
    /// [`services::ConsumptionOrchestrator::run`].
    pub async fn from_config(
        cfg: config::AppConfig,
    ) -> Result<(Self, mpsc::Receiver<Event>), ServiceError> {
        let db = Arc::new(db::establish_connection_from_app_config(&cfg).await?);
        let (event_sender, rx) = events::event_channel(cfg.event_buffer);
        let event_sender = Arc::new(event_sender);
        let services = services::AppServices::build(db.clone(), event_sender.clone());

        Ok((
            Self {
                db,
                config: cfg,
                event_sender,
                services,
            },
            rx,
        ))
    }
}
