use crate::DomainResult;
use crate::destinations::Destination;
use crate::itinerary::{HotelStay, Itinerary, ItinerarySummary};
use crate::ports::BoxFuture;

/// Storage seam for the itinerary aggregate. Backed by a document store that
/// supports upsert, atomic array append, and partial-field projection.
///
/// Boolean results report whether the target document existed (or was
/// created via the `seed`); destination writes with `seed = Some(..)` never
/// return `false`.
pub trait ItineraryRepository: Send + Sync {
    fn create(&self, itinerary: &Itinerary) -> BoxFuture<'_, DomainResult<Itinerary>>;

    fn get(&self, itinerary_id: &str) -> BoxFuture<'_, DomainResult<Option<Itinerary>>>;

    /// Projection excluding the hotel and destination arrays.
    fn get_summary(
        &self,
        itinerary_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<ItinerarySummary>>>;

    fn list_by_owner(&self, owner_user_id: &str) -> BoxFuture<'_, DomainResult<Vec<Itinerary>>>;

    fn push_hotel(
        &self,
        itinerary_id: &str,
        hotel: &HotelStay,
    ) -> BoxFuture<'_, DomainResult<bool>>;

    /// Atomic array append; concurrent appends to the same document must all
    /// be reflected. When the document is missing and `seed` is provided, the
    /// seed is stored with `destinations` set to the given batch.
    fn append_destinations(
        &self,
        itinerary_id: &str,
        destinations: &[Destination],
        seed: Option<&Itinerary>,
    ) -> BoxFuture<'_, DomainResult<bool>>;

    /// Wholesale replacement; last writer wins under concurrency.
    fn replace_destinations(
        &self,
        itinerary_id: &str,
        destinations: &[Destination],
        seed: Option<&Itinerary>,
    ) -> BoxFuture<'_, DomainResult<bool>>;

    fn delete(&self, itinerary_id: &str) -> BoxFuture<'_, DomainResult<bool>>;
}
