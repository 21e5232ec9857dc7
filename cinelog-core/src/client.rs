use async_trait::async_trait;

use crate::{error::MetaError, media::MediaRef, meta::Meta};

/// Source of descriptive metadata for stream requests.
///
/// Implementations must report a missing title as [`MetaError::NotFound`] so
/// callers can tell it apart from transport failures.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MetaClient: Send + Sync {
    /// Look up a standalone title by its catalog id.
    async fn get_movie(&self, id: &str) -> Result<Meta, MetaError>;

    /// Look up a series and make sure the given episode exists.
    async fn get_tv_show(
        &self,
        series_id: &str,
        season: u64,
        episode: u64,
    ) -> Result<Meta, MetaError>;
}

/// Dispatch a parsed reference to the matching client call.
pub async fn lookup(client: &dyn MetaClient, media: &MediaRef) -> Result<Meta, MetaError> {
    match media {
        MediaRef::Movie { id } => client.get_movie(id).await,
        MediaRef::Episode {
            series_id,
            season,
            episode,
        } => client.get_tv_show(series_id, *season, *episode).await,
    }
}
