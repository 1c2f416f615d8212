use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use wayfarer_domain::DomainResult;
use wayfarer_domain::destinations::{Destination, RawDestination, RawDestinationEntry};
use wayfarer_domain::error::DomainError;
use wayfarer_domain::identity::ActorIdentity;
use wayfarer_domain::itinerary::{
    DestinationWritePolicy, HotelStay, Itinerary, ItineraryCreate, ItinerarySummary,
    ItineraryService,
};
use wayfarer_domain::permissions::AccessLevel;
use wayfarer_domain::ports::BoxFuture;
use wayfarer_domain::ports::itinerary::ItineraryRepository;

#[derive(Default)]
struct MapRepository {
    store: Arc<Mutex<HashMap<String, Itinerary>>>,
}

impl MapRepository {
    fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self, itinerary_id: &str) -> Option<Itinerary> {
        self.store.lock().unwrap().get(itinerary_id).cloned()
    }
}

impl ItineraryRepository for MapRepository {
    fn create(&self, itinerary: &Itinerary) -> BoxFuture<'_, DomainResult<Itinerary>> {
        let itinerary = itinerary.clone();
        let store = self.store.clone();
        Box::pin(async move {
            store
                .lock()
                .unwrap()
                .insert(itinerary.itinerary_id.clone(), itinerary.clone());
            Ok(itinerary)
        })
    }

    fn get(&self, itinerary_id: &str) -> BoxFuture<'_, DomainResult<Option<Itinerary>>> {
        let itinerary_id = itinerary_id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.lock().unwrap().get(&itinerary_id).cloned()) })
    }

    fn get_summary(
        &self,
        itinerary_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<ItinerarySummary>>> {
        let itinerary_id = itinerary_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            Ok(store
                .lock()
                .unwrap()
                .get(&itinerary_id)
                .map(ItinerarySummary::from))
        })
    }

    fn list_by_owner(&self, owner_user_id: &str) -> BoxFuture<'_, DomainResult<Vec<Itinerary>>> {
        let owner_user_id = owner_user_id.to_string();
        let store = self.store.clone();
        Box::pin(async move {
            Ok(store
                .lock()
                .unwrap()
                .values()
                .filter(|itinerary| itinerary.owner_user_id == owner_user_id)
                .cloned()
                .collect())
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
            let mut store = store.lock().unwrap();
            match store.get_mut(&itinerary_id) {
                Some(itinerary) => {
                    itinerary.hotels.push(hotel);
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
            let mut store = store.lock().unwrap();
            if let Some(itinerary) = store.get_mut(&itinerary_id) {
                itinerary.destinations.extend(destinations);
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
            let mut store = store.lock().unwrap();
            if let Some(itinerary) = store.get_mut(&itinerary_id) {
                itinerary.destinations = destinations;
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
        Box::pin(async move { Ok(store.lock().unwrap().remove(&itinerary_id).is_some()) })
    }
}

fn raw_entry(id: &str) -> RawDestinationEntry {
    RawDestinationEntry::One(RawDestination {
        id: id.to_string(),
        name: format!("{id}-name"),
        significance: None,
        city: None,
        state: None,
        kind: None,
        date: None,
        airport_within_50km_radius: false,
        start_time: None,
        end_time: None,
        cost_per_day: 10.0,
        image_url: None,
    })
}

fn create_input() -> ItineraryCreate {
    ItineraryCreate {
        title: "Goa Trip".to_string(),
        location: "Goa".to_string(),
        days: 2,
        budget: 500.0,
    }
}

fn service_with_repo() -> (Arc<MapRepository>, ItineraryService) {
    let repo = Arc::new(MapRepository::new());
    let service = ItineraryService::new(repo.clone());
    (repo, service)
}

#[tokio::test]
async fn create_establishes_owner_permission_atomically() {
    let (_repo, service) = service_with_repo();
    let itinerary = service
        .create(ActorIdentity::with_user_id("u1"), create_input())
        .await
        .unwrap();

    assert_eq!(itinerary.location, "goa");
    assert_eq!(itinerary.permissions.len(), 1);
    assert_eq!(itinerary.permissions[0].user_id, "u1");
    assert_eq!(itinerary.permissions[0].access, AccessLevel::Owner);

    let access = service
        .get_user_access(&itinerary.itinerary_id, "u1")
        .await
        .unwrap();
    assert_eq!(access, AccessLevel::Owner);
}

#[tokio::test]
async fn stranger_has_no_access_on_fresh_itinerary() {
    let (_repo, service) = service_with_repo();
    let itinerary = service
        .create(ActorIdentity::with_user_id("u1"), create_input())
        .await
        .unwrap();

    let result = service
        .get_user_access(&itinerary.itinerary_id, "u2")
        .await;
    assert!(matches!(result, Err(DomainError::NotAuthorized)));
}

#[tokio::test]
async fn append_twice_preserves_order() {
    let (repo, service) = service_with_repo();
    let actor = ActorIdentity::with_user_id("u1");
    let itinerary = service.create(actor.clone(), create_input()).await.unwrap();

    service
        .append_destinations(&actor, &itinerary.itinerary_id, vec![raw_entry("a")])
        .await
        .unwrap();
    service
        .append_destinations(&actor, &itinerary.itinerary_id, vec![raw_entry("b")])
        .await
        .unwrap();

    let stored = repo.snapshot(&itinerary.itinerary_id).unwrap();
    let ids: Vec<&str> = stored
        .destinations
        .iter()
        .map(|dest| dest.external_id.as_str())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn replace_is_last_writer_wins() {
    let (repo, service) = service_with_repo();
    let actor = ActorIdentity::with_user_id("u1");
    let itinerary = service.create(actor.clone(), create_input()).await.unwrap();

    service
        .replace_destinations(&actor, &itinerary.itinerary_id, vec![raw_entry("a")])
        .await
        .unwrap();
    service
        .replace_destinations(&actor, &itinerary.itinerary_id, vec![raw_entry("b")])
        .await
        .unwrap();

    let stored = repo.snapshot(&itinerary.itinerary_id).unwrap();
    assert_eq!(stored.destinations.len(), 1);
    assert_eq!(stored.destinations[0].external_id, "b");
}

#[tokio::test]
async fn destination_write_upserts_missing_document_with_owner() {
    let (repo, service) = service_with_repo();
    let actor = ActorIdentity::with_user_id("u1");

    service
        .append_destinations(&actor, "ghost-id", vec![raw_entry("a")])
        .await
        .unwrap();

    let stored = repo.snapshot("ghost-id").unwrap();
    assert_eq!(stored.owner_user_id, "u1");
    assert_eq!(stored.destinations.len(), 1);
    assert_eq!(stored.permissions.len(), 1);
    assert_eq!(stored.permissions[0].access, AccessLevel::Owner);
}

#[tokio::test]
async fn destination_write_without_upsert_fails_on_missing_id() {
    let repo = Arc::new(MapRepository::new());
    let service = ItineraryService::with_write_policy(
        repo.clone(),
        DestinationWritePolicy {
            upsert_on_missing: false,
        },
    );
    let actor = ActorIdentity::with_user_id("u1");

    let result = service
        .append_destinations(&actor, "ghost-id", vec![raw_entry("a")])
        .await;
    assert!(matches!(result, Err(DomainError::NotFound)));
    assert!(repo.snapshot("ghost-id").is_none());
}

#[tokio::test]
async fn append_hotel_rejects_missing_banner_and_leaves_hotels_unchanged() {
    let (repo, service) = service_with_repo();
    let actor = ActorIdentity::with_user_id("u1");
    let itinerary = service.create(actor, create_input()).await.unwrap();

    let result = service
        .append_hotel(
            &itinerary.itinerary_id,
            HotelStay {
                name: "Seaside Inn".to_string(),
                description: None,
                start_date: None,
                end_date: None,
                cost_per_day: 80.0,
                banner_url: String::new(),
            },
        )
        .await;
    assert!(matches!(result, Err(DomainError::Validation(_))));

    let stored = repo.snapshot(&itinerary.itinerary_id).unwrap();
    assert!(stored.hotels.is_empty());
}

#[tokio::test]
async fn append_hotel_on_unknown_id_is_not_found() {
    let (_repo, service) = service_with_repo();
    let result = service
        .append_hotel(
            "ghost-id",
            HotelStay {
                name: "Seaside Inn".to_string(),
                description: None,
                start_date: None,
                end_date: None,
                cost_per_day: 80.0,
                banner_url: "https://cdn.example/banner.jpg".to_string(),
            },
        )
        .await;
    assert!(matches!(result, Err(DomainError::NotFound)));
}

#[tokio::test]
async fn bucketed_view_uses_stored_days_not_destination_count() {
    let (_repo, service) = service_with_repo();
    let actor = ActorIdentity::with_user_id("u1");
    let itinerary = service.create(actor.clone(), create_input()).await.unwrap();

    let batch = (1..=7).map(|n| raw_entry(&format!("d{n}"))).collect();
    service
        .append_destinations(&actor, &itinerary.itinerary_id, batch)
        .await
        .unwrap();

    let buckets = service
        .get_bucketed_destinations(&itinerary.itinerary_id)
        .await
        .unwrap();
    assert_eq!(buckets.groups.len(), 2);
    assert!(buckets.groups[0].iter().all(|slot| !slot.is_empty()));
    assert_eq!(
        buckets.groups[1]
            .iter()
            .filter(|slot| !slot.is_empty())
            .count(),
        2
    );
    assert_eq!(buckets.overflow, 0);
}

#[tokio::test]
async fn delete_then_read_is_not_found() {
    let (_repo, service) = service_with_repo();
    let actor = ActorIdentity::with_user_id("u1");
    let itinerary = service.create(actor, create_input()).await.unwrap();

    service.delete(&itinerary.itinerary_id).await.unwrap();

    let result = service.get_summary(&itinerary.itinerary_id).await;
    assert!(matches!(result, Err(DomainError::NotFound)));
    let result = service.delete(&itinerary.itinerary_id).await;
    assert!(matches!(result, Err(DomainError::NotFound)));
}
