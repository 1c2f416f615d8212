use std::sync::Arc;

use wayfarer_domain::itinerary::{DestinationWritePolicy, ItineraryService};
use wayfarer_domain::ports::db::DbAdapter;
use wayfarer_domain::ports::itinerary::ItineraryRepository;
use wayfarer_domain::ports::media::BannerStore;
use wayfarer_infra::booking_client::BookingClient;
use wayfarer_infra::config::AppConfig;
use wayfarer_infra::db::{DbConfig, SurrealAdapter};
use wayfarer_infra::media::ObjectStoreBannerStore;
use wayfarer_infra::repositories::{InMemoryItineraryRepository, SurrealItineraryRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub itinerary_repo: Arc<dyn ItineraryRepository>,
    pub banner_store: Arc<dyn BannerStore>,
    pub booking: Arc<BookingClient>,
    /// Present only when a real database backend is configured; the in-memory
    /// backend has nothing to probe.
    pub db_adapter: Option<Arc<dyn DbAdapter>>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let mut db_adapter: Option<Arc<dyn DbAdapter>> = None;
        let itinerary_repo: Arc<dyn ItineraryRepository> =
            if config.data_backend.eq_ignore_ascii_case("surreal") {
                let db_config = DbConfig::from_app_config(&config);
                db_adapter = Some(Arc::new(SurrealAdapter::new(db_config.clone())));
                Arc::new(SurrealItineraryRepository::new(&db_config).await?)
            } else {
                Arc::new(InMemoryItineraryRepository::new())
            };
        let banner_store: Arc<dyn BannerStore> =
            Arc::new(ObjectStoreBannerStore::from_config(&config)?);
        let booking = Arc::new(BookingClient::from_config(&config)?);
        Ok(Self {
            config,
            itinerary_repo,
            banner_store,
            booking,
            db_adapter,
        })
    }

    #[allow(dead_code)]
    pub fn with_components(
        config: AppConfig,
        itinerary_repo: Arc<dyn ItineraryRepository>,
        banner_store: Arc<dyn BannerStore>,
        booking: Arc<BookingClient>,
    ) -> Self {
        Self {
            config,
            itinerary_repo,
            banner_store,
            booking,
            db_adapter: None,
        }
    }

    pub fn itinerary_service(&self) -> ItineraryService {
        ItineraryService::with_write_policy(
            self.itinerary_repo.clone(),
            DestinationWritePolicy {
                upsert_on_missing: self.config.destination_write_upsert,
            },
        )
    }
}
