use async_trait::async_trait;
use serde::Serialize;
use valentine_core::content::{CollectionQuery, DataValue};
use valentine_core::endpoint::{
    Endpoint, EndpointContext, EndpointError, EndpointRequest, EndpointResponse, Result,
};

/// `GET /api/posts.json` - published blog posts, newest first. Pre-rendered.
pub struct PostsFeed;

#[derive(Debug, Serialize)]
struct PostSummary {
    id: String,
    title: Option<DataValue>,
    #[serde(rename = "pubDate")]
    pub_date: Option<DataValue>,
    url: String,
}

#[async_trait]
impl Endpoint for PostsFeed {
    fn pattern(&self) -> &str {
        "/api/posts.json"
    }

    fn prerender(&self) -> Option<bool> {
        Some(true)
    }

    async fn handle(
        &self,
        _request: EndpointRequest,
        ctx: &EndpointContext,
    ) -> Result<EndpointResponse> {
        let query = CollectionQuery::new()
            .exclude_drafts()
            .sort("-pubDate")
            .map_err(|e| EndpointError::Internal(e.to_string()))?;

        let posts: Vec<PostSummary> = ctx
            .content
            .get("blog")
            .map(|blog| blog.query(&query))
            .unwrap_or_default()
            .into_iter()
            .map(|entry| PostSummary {
                id: entry.id.clone(),
                title: entry.field("title"),
                pub_date: entry.field("pubDate"),
                url: ctx.config.url_for(&format!("/blog/{}", entry.id)),
            })
            .collect();

        EndpointResponse::json(200, &serde_json::json!({ "posts": posts }))
    }
}
