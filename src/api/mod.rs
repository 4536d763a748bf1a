use std::sync::Arc;

use actix_web::web::{self, ServiceConfig};

use crate::db::store::DocumentStore;
use crate::reconciler::JobReconciler;

pub mod candidate;
pub mod error;
pub mod health;
pub mod history;
pub mod job;
pub mod validation;

#[cfg(test)]
pub mod testing;

use candidate::{handlers::candidate_config, CandidateService};
use health::health_config;
use history::{handlers::history_config, HistoryService};
use job::{handlers::job_config, JobService};

/// Shared handles every HTTP worker is built from
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn DocumentStore>,
    reconciler: Arc<JobReconciler>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, reconciler: Arc<JobReconciler>) -> Self {
        Self { store, reconciler }
    }

    /// Register services, extractor config and routes
    pub fn configure(&self, config: &mut ServiceConfig) {
        config
            .app_data(web::Data::from(self.store.clone()))
            .app_data(web::Data::new(JobService::new(
                self.store.clone(),
                self.reconciler.clone(),
            )))
            .app_data(web::Data::new(CandidateService::new(
                self.store.clone(),
                self.reconciler.clone(),
            )))
            .app_data(web::Data::new(HistoryService::new(self.store.clone())))
            .app_data(validation::json_config())
            .configure(health_config)
            .configure(job_config)
            .configure(candidate_config)
            .configure(history_config);
    }
}
