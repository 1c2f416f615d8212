use crate::DomainResult;
use crate::ports::BoxFuture;

/// External object storage for banner images. The core only ever stores the
/// returned reference string.
pub trait BannerStore: Send + Sync {
    fn store_banner(
        &self,
        object_key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, DomainResult<String>>;
}
