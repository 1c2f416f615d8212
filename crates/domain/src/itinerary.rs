use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::bucketing::{self, DayBuckets};
use crate::destinations::{Destination, RawDestinationEntry, normalize_destinations};
use crate::error::DomainError;
use crate::identity::ActorIdentity;
use crate::permissions::{AccessLevel, Permission, resolve_access};
use crate::ports::itinerary::ItineraryRepository;
use crate::util::now_ms;

const MAX_TITLE_LENGTH: usize = 200;
const MAX_LOCATION_LENGTH: usize = 120;
const MAX_DAYS: u32 = 365;

/// Root aggregate representing one planned trip.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Itinerary {
    pub itinerary_id: String,
    pub owner_user_id: String,
    pub title: String,
    /// Normalized to lowercase for case-insensitive matching.
    pub location: String,
    /// Total planned days; the authoritative divisor for bucketing. Never
    /// inferred from the destination count.
    pub days: u32,
    pub budget: f64,
    pub hotels: Vec<HotelStay>,
    pub destinations: Vec<Destination>,
    pub permissions: Vec<Permission>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HotelStay {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub cost_per_day: f64,
    /// Reference to an externally stored image; produced by the upload
    /// collaborator, never by this service.
    pub banner_url: String,
}

/// Metadata projection of an itinerary, excluding the large nested arrays.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ItinerarySummary {
    pub itinerary_id: String,
    pub owner_user_id: String,
    pub title: String,
    pub location: String,
    pub days: u32,
    pub budget: f64,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl From<&Itinerary> for ItinerarySummary {
    fn from(itinerary: &Itinerary) -> Self {
        Self {
            itinerary_id: itinerary.itinerary_id.clone(),
            owner_user_id: itinerary.owner_user_id.clone(),
            title: itinerary.title.clone(),
            location: itinerary.location.clone(),
            days: itinerary.days,
            budget: itinerary.budget,
            created_at_ms: itinerary.created_at_ms,
            updated_at_ms: itinerary.updated_at_ms,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ItineraryCreate {
    pub title: String,
    pub location: String,
    pub days: u32,
    pub budget: f64,
}

/// Policy for destination writes that target an id with no stored document.
/// The default is to create the document on the fly (upsert); the switch
/// exists so that can be turned off without touching the write path.
#[derive(Clone, Copy, Debug)]
pub struct DestinationWritePolicy {
    pub upsert_on_missing: bool,
}

impl Default for DestinationWritePolicy {
    fn default() -> Self {
        Self {
            upsert_on_missing: true,
        }
    }
}

#[derive(Clone)]
pub struct ItineraryService {
    repository: Arc<dyn ItineraryRepository>,
    write_policy: DestinationWritePolicy,
}

impl ItineraryService {
    pub fn new(repository: Arc<dyn ItineraryRepository>) -> Self {
        Self {
            repository,
            write_policy: DestinationWritePolicy::default(),
        }
    }

    pub fn with_write_policy(
        repository: Arc<dyn ItineraryRepository>,
        write_policy: DestinationWritePolicy,
    ) -> Self {
        Self {
            repository,
            write_policy,
        }
    }

    /// Creates a new itinerary. The owner permission is part of the created
    /// document, never a separate step observable by readers.
    pub async fn create(
        &self,
        actor: ActorIdentity,
        input: ItineraryCreate,
    ) -> DomainResult<Itinerary> {
        let payload = validate_itinerary_create(&input)?;
        let now = now_ms();
        let itinerary = Itinerary {
            itinerary_id: crate::util::uuid_v7_without_dashes(),
            owner_user_id: actor.user_id.clone(),
            title: payload.title,
            location: payload.location.to_lowercase(),
            days: payload.days,
            budget: payload.budget,
            hotels: Vec::new(),
            destinations: Vec::new(),
            permissions: vec![Permission {
                user_id: actor.user_id,
                access: AccessLevel::Owner,
            }],
            created_at_ms: now,
            updated_at_ms: now,
        };
        self.repository.create(&itinerary).await
    }

    /// Appends a hotel stay. Hotels are append-only; there is no update or
    /// remove operation.
    pub async fn append_hotel(&self, itinerary_id: &str, hotel: HotelStay) -> DomainResult<()> {
        let hotel = validate_hotel_stay(hotel)?;
        let found = self.repository.push_hotel(itinerary_id, &hotel).await?;
        if found {
            Ok(())
        } else {
            Err(DomainError::NotFound)
        }
    }

    /// Normalizes the raw batch and appends it to the stored destination
    /// list. The storage append is atomic so racing appends both land.
    pub async fn append_destinations(
        &self,
        actor: &ActorIdentity,
        itinerary_id: &str,
        raw: Vec<RawDestinationEntry>,
    ) -> DomainResult<()> {
        let destinations = normalize_destinations(raw)?;
        let seed = self.upsert_seed(actor, itinerary_id);
        let found = self
            .repository
            .append_destinations(itinerary_id, &destinations, seed.as_ref())
            .await?;
        if found {
            Ok(())
        } else {
            Err(DomainError::NotFound)
        }
    }

    /// Normalizes the raw batch and replaces the stored destination list
    /// wholesale. Concurrent replaces are last-writer-wins.
    pub async fn replace_destinations(
        &self,
        actor: &ActorIdentity,
        itinerary_id: &str,
        raw: Vec<RawDestinationEntry>,
    ) -> DomainResult<()> {
        let destinations = normalize_destinations(raw)?;
        let seed = self.upsert_seed(actor, itinerary_id);
        let found = self
            .repository
            .replace_destinations(itinerary_id, &destinations, seed.as_ref())
            .await?;
        if found {
            Ok(())
        } else {
            Err(DomainError::NotFound)
        }
    }

    pub async fn get_summary(&self, itinerary_id: &str) -> DomainResult<ItinerarySummary> {
        self.repository
            .get_summary(itinerary_id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn get_bucketed_destinations(&self, itinerary_id: &str) -> DomainResult<DayBuckets> {
        let itinerary = self
            .repository
            .get(itinerary_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        Ok(bucketing::bucket_by_day(
            &itinerary.destinations,
            itinerary.days,
        ))
    }

    pub async fn list_by_owner(&self, owner_user_id: &str) -> DomainResult<Vec<Itinerary>> {
        self.repository.list_by_owner(owner_user_id).await
    }

    /// Removes the document and all nested data.
    pub async fn delete(&self, itinerary_id: &str) -> DomainResult<()> {
        if self.repository.delete(itinerary_id).await? {
            Ok(())
        } else {
            Err(DomainError::NotFound)
        }
    }

    pub async fn get_user_access(
        &self,
        itinerary_id: &str,
        user_id: &str,
    ) -> DomainResult<AccessLevel> {
        let itinerary = self
            .repository
            .get(itinerary_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        resolve_access(&itinerary, user_id)
    }

    /// Skeleton document for the upsert path. The acting user becomes owner
    /// so the created document still holds at least one permission record.
    fn upsert_seed(&self, actor: &ActorIdentity, itinerary_id: &str) -> Option<Itinerary> {
        if !self.write_policy.upsert_on_missing {
            return None;
        }
        let now = now_ms();
        Some(Itinerary {
            itinerary_id: itinerary_id.to_string(),
            owner_user_id: actor.user_id.clone(),
            title: String::new(),
            location: String::new(),
            days: 1,
            budget: 0.0,
            hotels: Vec::new(),
            destinations: Vec::new(),
            permissions: vec![Permission {
                user_id: actor.user_id.clone(),
                access: AccessLevel::Owner,
            }],
            created_at_ms: now,
            updated_at_ms: now,
        })
    }
}

fn validate_itinerary_create(input: &ItineraryCreate) -> Result<ItineraryCreate, DomainError> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(DomainError::Validation("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(DomainError::Validation(format!(
            "title exceeds max length of {MAX_TITLE_LENGTH}"
        )));
    }

    let location = input.location.trim();
    if location.is_empty() {
        return Err(DomainError::Validation("location is required".into()));
    }
    if location.chars().count() > MAX_LOCATION_LENGTH {
        return Err(DomainError::Validation(format!(
            "location exceeds max length of {MAX_LOCATION_LENGTH}"
        )));
    }

    if input.days == 0 {
        return Err(DomainError::Validation(
            "days must be a positive integer".into(),
        ));
    }
    if input.days > MAX_DAYS {
        return Err(DomainError::Validation(format!(
            "days exceeds max of {MAX_DAYS}"
        )));
    }

    if !input.budget.is_finite() || input.budget < 0.0 {
        return Err(DomainError::Validation(
            "budget must be a non-negative number".into(),
        ));
    }

    Ok(ItineraryCreate {
        title: title.to_string(),
        location: location.to_string(),
        days: input.days,
        budget: input.budget,
    })
}

fn validate_hotel_stay(hotel: HotelStay) -> Result<HotelStay, DomainError> {
    let name = hotel.name.trim();
    if name.is_empty() {
        return Err(DomainError::Validation("hotel name is required".into()));
    }
    if !hotel.cost_per_day.is_finite() || hotel.cost_per_day < 0.0 {
        return Err(DomainError::Validation(
            "hotel cost_per_day must be a non-negative number".into(),
        ));
    }
    if hotel.banner_url.trim().is_empty() {
        return Err(DomainError::Validation(
            "hotel banner reference is required".into(),
        ));
    }
    Ok(HotelStay {
        name: name.to_string(),
        ..hotel
    })
}
