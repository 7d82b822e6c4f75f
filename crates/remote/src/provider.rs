use rustplex_core::{ContentItem, ContentList, TransportError};

/// Body and headers of a plain (non-listing) HTTP fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// Response headers, one `Name: value` line each, ending with a blank line.
    pub headers: String,
    pub body: String,
}

/// Requests the client core issues against remote library servers.
///
/// Implementations own transport concerns (addresses, auth, retries). Dropping
/// a returned future must abort the request.
#[async_trait::async_trait]
pub trait RemoteApi: Send + Sync {
    /// Fetch a listing. A `body` turns the request into a submission.
    async fn fetch_directory(
        &self,
        url: &str,
        body: Option<&str>,
    ) -> Result<ContentList, TransportError>;

    /// Fetch the full detail of one item (all media alternatives and parts).
    async fn fetch_detail(&self, item: &ContentItem) -> Result<ContentItem, TransportError> {
        let list = self.fetch_directory(&item.path, None).await?;
        list.first()
            .cloned()
            .ok_or_else(|| TransportError::Empty(item.path.clone()))
    }

    /// Plain GET used for pre-submission pages.
    async fn fetch_raw(
        &self,
        url: &str,
        user_agent: Option<&str>,
    ) -> Result<RawResponse, TransportError>;
}
