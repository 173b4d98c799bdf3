use crate::{
    config::{RuntimeConfiguration, StoreConfig},
    error::StudentsResult,
    service::RecordService,
    store::{StudentStore, memory::MemoryStudentStore, postgres::PgStudentStore},
};
use maud::{DOCTYPE, Markup, html};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct StudentsState {
    service: RecordService,
}

impl StudentsState {
    pub async fn new(options: PgPoolOptions, config: &RuntimeConfiguration) -> StudentsResult<Self> {
        let store_config = config.store_config();
        info!(kind = ?store_config.kind(), "Opening student store");

        let store: Arc<dyn StudentStore> = match &*store_config {
            StoreConfig::Postgres(db_config) => {
                Arc::new(PgStudentStore::connect(options, db_config).await?)
            }
            StoreConfig::Memory => {
                warn!("Using the in-memory student store, nothing will survive a restart");
                Arc::new(MemoryStudentStore::default())
            }
        };

        Ok(Self::from_store(store))
    }

    pub fn from_store(store: Arc<dyn StudentStore>) -> Self {
        Self {
            service: RecordService::new(store),
        }
    }

    pub fn service(&self) -> RecordService {
        self.service.clone()
    }

    #[allow(clippy::unused_self)] //in case self is ever needed :)
    pub fn render(&self, markup: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8" {}
                    meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                    script src="https://unpkg.com/htmx.org@2.0.4" integrity="sha384-HGfztofotfshcF7+8n44JQL2oJmowVChPTg48S+jvZoztPfvwD79OC/LTtG6dMp+" crossorigin="anonymous" {}
                    script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                    title { "Students" }
                }
                body class="bg-gray-900 min-h-screen flex flex-col items-center justify-center text-white" {
                    (markup)
                }
            }
        }
    }

    pub async fn sensible_shutdown(&self) {
        self.service.close().await;
    }
}
