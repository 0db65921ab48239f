// src/app.rs
use crate::api::ApiClient;
use crate::config::Config;
use crate::error::Result;
use crate::events::EventBus;
use crate::presenter::{AuthPresenter, DashboardPresenter, View};
use log::info;
use std::sync::Arc;

/// Application root. Built once at startup; owns the backend client and the
/// event bus and hands them to each presenter it creates.
pub struct App {
    pub config: Config,
    pub api: ApiClient,
    pub bus: EventBus,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        info!("Using trading backend at {}", api.base_url());
        Ok(Self {
            config,
            api,
            bus: EventBus::default(),
        })
    }

    pub fn auth_presenter(&self, view: Arc<dyn View>) -> AuthPresenter {
        AuthPresenter::new(self.api.clone(), &self.bus, view)
    }

    pub fn dashboard_presenter(&self, view: Arc<dyn View>) -> DashboardPresenter {
        DashboardPresenter::new(
            self.api.clone(),
            &self.bus,
            view,
            self.config.recent_transactions,
        )
    }
}
