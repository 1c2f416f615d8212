use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Value, to_value};
use surrealdb::{
    Surreal,
    engine::remote::ws::{Client, Ws},
    opt::auth::Root,
};
use tokio::sync::RwLock;
use wayfarer_domain::DomainResult;
use wayfarer_domain::destinations::Destination;
use wayfarer_domain::error::DomainError;
use wayfarer_domain::itinerary::{HotelStay, Itinerary, ItinerarySummary};
use wayfarer_domain::ports::BoxFuture;
use wayfarer_domain::ports::itinerary::ItineraryRepository;
use wayfarer_domain::util::now_ms;

use crate::db::DbConfig;

/// Map-backed repository used by the `memory` data backend and by tests.
/// Every mutation happens under a single write lock, which gives the atomic
/// append the storage contract requires.
#[derive(Default)]
pub struct InMemoryItineraryRepository {
    store: Arc<RwLock<HashMap<String, Itinerary>>>,
}

impl InMemoryItineraryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItineraryRepository for InMemoryItineraryRepository {
    fn create(&self, itinerary: &Itinerary) -> BoxFuture<'_, DomainResult<Itinerary>> {
        let itinerary = itinerary.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if store.contains_key(&itinerary.itinerary_id) {
                return Err(DomainError::Validation(
                    "itinerary id already exists".into(),
                ));
            }
            store.insert(itinerary.itinerary_id.clone(), itinerary.clone());
            Ok(itinerary)
        })
    }

    fn get(&self, itinerary_id: &str) -> BoxFuture<'_, DomainResult<Option<Itinerary>>> {
        let itinerary_id = itinerary_id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.get(&itinerary_id).cloned()) })
    }

    fn get_summary(
        &self,
        itinerary_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<ItinerarySummary>>> {
        let itinerary_id = itinerary_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            Ok(store
                .read()
                .await
                .get(&itinerary_id)
                .map(ItinerarySummary::from))
        })
    }

    fn list_by_owner(&self, owner_user_id: &str) -> BoxFuture<'_, DomainResult<Vec<Itinerary>>> {
        let owner_user_id = owner_user_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            let mut itineraries: Vec<Itinerary> = store
                .read()
                .await
                .values()
                .filter(|itinerary| itinerary.owner_user_id == owner_user_id)
                .cloned()
                .collect();
            itineraries.sort_by(|left, right| {
                right
                    .created_at_ms
                    .cmp(&left.created_at_ms)
                    .then_with(|| right.itinerary_id.cmp(&left.itinerary_id))
            });
            Ok(itineraries)
        })
    }

    fn push_hotel(
        &self,
        itinerary_id: &str,
        hotel: &HotelStay,
    ) -> BoxFuture<'_, DomainResult<bool>> {
        let itinerary_id = itinerary_id.to_string();
        let hotel = hotel.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            match store.get_mut(&itinerary_id) {
                Some(itinerary) => {
                    itinerary.hotels.push(hotel);
                    itinerary.updated_at_ms = now_ms();
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn append_destinations(
        &self,
        itinerary_id: &str,
        destinations: &[Destination],
        seed: Option<&Itinerary>,
    ) -> BoxFuture<'_, DomainResult<bool>> {
        let itinerary_id = itinerary_id.to_string();
        let destinations = destinations.to_vec();
        let seed = seed.cloned();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if let Some(itinerary) = store.get_mut(&itinerary_id) {
                itinerary.destinations.extend(destinations);
                itinerary.updated_at_ms = now_ms();
                return Ok(true);
            }
            match seed {
                Some(mut seed) => {
                    seed.destinations = destinations;
                    store.insert(itinerary_id, seed);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn replace_destinations(
        &self,
        itinerary_id: &str,
        destinations: &[Destination],
        seed: Option<&Itinerary>,
    ) -> BoxFuture<'_, DomainResult<bool>> {
        let itinerary_id = itinerary_id.to_string();
        let destinations = destinations.to_vec();
        let seed = seed.cloned();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if let Some(itinerary) = store.get_mut(&itinerary_id) {
                itinerary.destinations = destinations;
                itinerary.updated_at_ms = now_ms();
                return Ok(true);
            }
            match seed {
                Some(mut seed) => {
                    seed.destinations = destinations;
                    store.insert(itinerary_id, seed);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn delete(&self, itinerary_id: &str) -> BoxFuture<'_, DomainResult<bool>> {
        let itinerary_id = itinerary_id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.write().await.remove(&itinerary_id).is_some()) })
    }
}

#[derive(Clone)]
pub struct SurrealItineraryRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealItineraryRepository {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }

    pub async fn new(db_config: &DbConfig) -> anyhow::Result<Self> {
        let db = Surreal::<Client>::init();
        db.connect::<Ws>(&db_config.endpoint).await?;
        db.signin(Root {
            username: db_config.username.as_str(),
            password: db_config.password.as_str(),
        })
        .await?;
        db.use_ns(&db_config.namespace)
            .use_db(&db_config.database)
            .await?;
        Ok(Self {
            client: Arc::new(db),
        })
    }

    fn map_surreal_error(operation: &'static str) -> impl Fn(surrealdb::Error) -> DomainError {
        move |err| DomainError::Upstream {
            operation,
            detail: err.to_string(),
        }
    }

    fn decode_error(operation: &'static str) -> impl Fn(serde_json::Error) -> DomainError {
        move |err| DomainError::Upstream {
            operation,
            detail: format!("invalid itinerary row: {err}"),
        }
    }

    fn decode_itineraries(
        rows: Vec<Value>,
        operation: &'static str,
    ) -> DomainResult<Vec<Itinerary>> {
        rows.into_iter()
            .map(|row| {
                serde_json::from_value::<Itinerary>(row).map_err(Self::decode_error(operation))
            })
            .collect()
    }
}

impl ItineraryRepository for SurrealItineraryRepository {
    fn create(&self, itinerary: &Itinerary) -> BoxFuture<'_, DomainResult<Itinerary>> {
        let itinerary = itinerary.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let itinerary_id = itinerary.itinerary_id.clone();
            let payload = to_value(&itinerary).map_err(Self::decode_error("itinerary_create"))?;
            let mut response = client
                .query(
                    "CREATE type::record('itinerary', $itinerary_id) CONTENT $payload; \
                     SELECT * FROM itinerary WHERE itinerary_id = $itinerary_id LIMIT 1",
                )
                .bind(("itinerary_id", itinerary_id))
                .bind(("payload", payload))
                .await
                .map_err(Self::map_surreal_error("itinerary_create"))?;
            let rows: Vec<Value> = response
                .take(1)
                .map_err(Self::map_surreal_error("itinerary_create"))?;
            let mut itineraries = Self::decode_itineraries(rows, "itinerary_create")?;
            itineraries.pop().ok_or(DomainError::Upstream {
                operation: "itinerary_create",
                detail: "create returned no row".to_string(),
            })
        })
    }

    fn get(&self, itinerary_id: &str) -> BoxFuture<'_, DomainResult<Option<Itinerary>>> {
        let itinerary_id = itinerary_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query("SELECT * FROM itinerary WHERE itinerary_id = $itinerary_id LIMIT 1")
                .bind(("itinerary_id", itinerary_id))
                .await
                .map_err(Self::map_surreal_error("itinerary_get"))?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(Self::map_surreal_error("itinerary_get"))?;
            let mut itineraries = Self::decode_itineraries(rows, "itinerary_get")?;
            Ok(itineraries.pop())
        })
    }

    fn get_summary(
        &self,
        itinerary_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<ItinerarySummary>>> {
        let itinerary_id = itinerary_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            // Partial projection keeps the large nested arrays out of the
            // round trip.
            let mut response = client
                .query(
                    "SELECT itinerary_id, owner_user_id, title, location, days, budget, \
                            created_at_ms, updated_at_ms \
                     FROM itinerary WHERE itinerary_id = $itinerary_id LIMIT 1",
                )
                .bind(("itinerary_id", itinerary_id))
                .await
                .map_err(Self::map_surreal_error("itinerary_get_summary"))?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(Self::map_surreal_error("itinerary_get_summary"))?;
            let mut summaries = rows
                .into_iter()
                .map(|row| {
                    serde_json::from_value::<ItinerarySummary>(row)
                        .map_err(Self::decode_error("itinerary_get_summary"))
                })
                .collect::<DomainResult<Vec<ItinerarySummary>>>()?;
            Ok(summaries.pop())
        })
    }

    fn list_by_owner(&self, owner_user_id: &str) -> BoxFuture<'_, DomainResult<Vec<Itinerary>>> {
        let owner_user_id = owner_user_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(
                    "SELECT * FROM itinerary \
                     WHERE owner_user_id = $owner_user_id \
                     ORDER BY created_at_ms DESC, itinerary_id DESC",
                )
                .bind(("owner_user_id", owner_user_id))
                .await
                .map_err(Self::map_surreal_error("itinerary_list_by_owner"))?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(Self::map_surreal_error("itinerary_list_by_owner"))?;
            Self::decode_itineraries(rows, "itinerary_list_by_owner")
        })
    }

    fn push_hotel(
        &self,
        itinerary_id: &str,
        hotel: &HotelStay,
    ) -> BoxFuture<'_, DomainResult<bool>> {
        let itinerary_id = itinerary_id.to_string();
        let hotel = hotel.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let hotel = to_value(&hotel).map_err(Self::decode_error("hotel_append"))?;
            let mut response = client
                .query(
                    "UPDATE itinerary \
                     SET hotels += $hotel, updated_at_ms = $now \
                     WHERE itinerary_id = $itinerary_id RETURN AFTER",
                )
                .bind(("itinerary_id", itinerary_id))
                .bind(("hotel", hotel))
                .bind(("now", now_ms()))
                .await
                .map_err(Self::map_surreal_error("hotel_append"))?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(Self::map_surreal_error("hotel_append"))?;
            Ok(!rows.is_empty())
        })
    }

    fn append_destinations(
        &self,
        itinerary_id: &str,
        destinations: &[Destination],
        seed: Option<&Itinerary>,
    ) -> BoxFuture<'_, DomainResult<bool>> {
        let itinerary_id = itinerary_id.to_string();
        let destinations = destinations.to_vec();
        let seed = seed.cloned();
        let client = self.client.clone();
        Box::pin(async move {
            let batch =
                to_value(&destinations).map_err(Self::decode_error("destinations_append"))?;
            let updated = run_destination_update(
                &client,
                "UPDATE itinerary \
                 SET destinations += $destinations, updated_at_ms = $now \
                 WHERE itinerary_id = $itinerary_id RETURN AFTER",
                &itinerary_id,
                batch.clone(),
                "destinations_append",
            )
            .await?;
            if updated {
                return Ok(true);
            }
            let Some(mut seed) = seed else {
                return Ok(false);
            };
            seed.destinations = destinations;
            match create_seed(&client, &itinerary_id, &seed, "destinations_append").await {
                Ok(()) => Ok(true),
                // Lost the create race; the document now exists, so the
                // append must land on it instead.
                Err(_) => {
                    run_destination_update(
                        &client,
                        "UPDATE itinerary \
                         SET destinations += $destinations, updated_at_ms = $now \
                         WHERE itinerary_id = $itinerary_id RETURN AFTER",
                        &itinerary_id,
                        batch,
                        "destinations_append",
                    )
                    .await
                }
            }
        })
    }

    fn replace_destinations(
        &self,
        itinerary_id: &str,
        destinations: &[Destination],
        seed: Option<&Itinerary>,
    ) -> BoxFuture<'_, DomainResult<bool>> {
        let itinerary_id = itinerary_id.to_string();
        let destinations = destinations.to_vec();
        let seed = seed.cloned();
        let client = self.client.clone();
        Box::pin(async move {
            let batch =
                to_value(&destinations).map_err(Self::decode_error("destinations_replace"))?;
            let updated = run_destination_update(
                &client,
                "UPDATE itinerary \
                 SET destinations = $destinations, updated_at_ms = $now \
                 WHERE itinerary_id = $itinerary_id RETURN AFTER",
                &itinerary_id,
                batch.clone(),
                "destinations_replace",
            )
            .await?;
            if updated {
                return Ok(true);
            }
            let Some(mut seed) = seed else {
                return Ok(false);
            };
            seed.destinations = destinations;
            match create_seed(&client, &itinerary_id, &seed, "destinations_replace").await {
                Ok(()) => Ok(true),
                Err(_) => {
                    run_destination_update(
                        &client,
                        "UPDATE itinerary \
                         SET destinations = $destinations, updated_at_ms = $now \
                         WHERE itinerary_id = $itinerary_id RETURN AFTER",
                        &itinerary_id,
                        batch,
                        "destinations_replace",
                    )
                    .await
                }
            }
        })
    }

    fn delete(&self, itinerary_id: &str) -> BoxFuture<'_, DomainResult<bool>> {
        let itinerary_id = itinerary_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query("DELETE itinerary WHERE itinerary_id = $itinerary_id RETURN BEFORE")
                .bind(("itinerary_id", itinerary_id))
                .await
                .map_err(Self::map_surreal_error("itinerary_delete"))?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(Self::map_surreal_error("itinerary_delete"))?;
            Ok(!rows.is_empty())
        })
    }
}

async fn run_destination_update(
    client: &Surreal<Client>,
    query: &str,
    itinerary_id: &str,
    batch: Value,
    operation: &'static str,
) -> DomainResult<bool> {
    let mut response = client
        .query(query)
        .bind(("itinerary_id", itinerary_id.to_string()))
        .bind(("destinations", batch))
        .bind(("now", now_ms()))
        .await
        .map_err(SurrealItineraryRepository::map_surreal_error(operation))?;
    let rows: Vec<Value> = response
        .take(0)
        .map_err(SurrealItineraryRepository::map_surreal_error(operation))?;
    Ok(!rows.is_empty())
}

async fn create_seed(
    client: &Surreal<Client>,
    itinerary_id: &str,
    seed: &Itinerary,
    operation: &'static str,
) -> DomainResult<()> {
    let payload =
        to_value(seed).map_err(SurrealItineraryRepository::decode_error(operation))?;
    client
        .query("CREATE type::record('itinerary', $itinerary_id) CONTENT $payload")
        .bind(("itinerary_id", itinerary_id.to_string()))
        .bind(("payload", payload))
        .await
        .map_err(SurrealItineraryRepository::map_surreal_error(operation))?
        .check()
        .map_err(SurrealItineraryRepository::map_surreal_error(operation))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_domain::permissions::{AccessLevel, Permission};

    fn itinerary(id: &str, owner: &str) -> Itinerary {
        Itinerary {
            itinerary_id: id.to_string(),
            owner_user_id: owner.to_string(),
            title: "Goa Trip".to_string(),
            location: "goa".to_string(),
            days: 2,
            budget: 500.0,
            hotels: Vec::new(),
            destinations: Vec::new(),
            permissions: vec![Permission {
                user_id: owner.to_string(),
                access: AccessLevel::Owner,
            }],
            created_at_ms: 1,
            updated_at_ms: 1,
        }
    }

    fn destination(id: &str) -> Destination {
        Destination {
            external_id: id.to_string(),
            name: format!("{id}-name"),
            significance: None,
            city: None,
            state: None,
            kind: None,
            date: None,
            has_nearby_airport: false,
            start_time: None,
            end_time: None,
            cost_per_day: 0.0,
            banner_url: None,
        }
    }

    #[tokio::test]
    async fn read_your_writes_on_create() {
        let repo = InMemoryItineraryRepository::new();
        repo.create(&itinerary("itn-1", "u1")).await.unwrap();
        let stored = repo.get("itn-1").await.unwrap().unwrap();
        assert_eq!(stored.owner_user_id, "u1");
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let repo = InMemoryItineraryRepository::new();
        repo.create(&itinerary("itn-1", "u1")).await.unwrap();
        let result = repo.create(&itinerary("itn-1", "u2")).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn concurrent_appends_both_land() {
        let repo = Arc::new(InMemoryItineraryRepository::new());
        repo.create(&itinerary("itn-1", "u1")).await.unwrap();

        let mut handles = Vec::new();
        for n in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.append_destinations("itn-1", &[destination(&format!("d{n}"))], None)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = repo.get("itn-1").await.unwrap().unwrap();
        assert_eq!(stored.destinations.len(), 8);
    }

    #[tokio::test]
    async fn summary_projection_matches_document() {
        let repo = InMemoryItineraryRepository::new();
        repo.create(&itinerary("itn-1", "u1")).await.unwrap();
        let summary = repo.get_summary("itn-1").await.unwrap().unwrap();
        assert_eq!(summary.title, "Goa Trip");
        assert_eq!(summary.days, 2);
    }

    #[tokio::test]
    async fn list_by_owner_filters_other_owners() {
        let repo = InMemoryItineraryRepository::new();
        repo.create(&itinerary("itn-1", "u1")).await.unwrap();
        repo.create(&itinerary("itn-2", "u2")).await.unwrap();
        let listed = repo.list_by_owner("u1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].itinerary_id, "itn-1");
    }

    #[tokio::test]
    async fn delete_removes_document_and_nested_data() {
        let repo = InMemoryItineraryRepository::new();
        repo.create(&itinerary("itn-1", "u1")).await.unwrap();
        assert!(repo.delete("itn-1").await.unwrap());
        assert!(repo.get("itn-1").await.unwrap().is_none());
        assert!(!repo.delete("itn-1").await.unwrap());
    }
}
