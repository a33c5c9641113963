//! [`ContentSource`] over the Notion REST API.

use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use quire_content_types::{BlockRecord, DatabaseQuery, ListResponse, PageRecord};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::{
    application::content::{ContentSource, SourceError},
    config::NotionSettings,
    domain::{
        blocks::{BlockKind, ContentBlock},
        types::StatusPropertyKind,
    },
    infra::error::InfraError,
};

const PAGE_SIZE: u32 = 100;
const VERSION_HEADER: &str = "Notion-Version";

#[derive(Clone)]
pub struct NotionClient {
    http: Client,
    base: Url,
    token: String,
    database_id: String,
    version: String,
    status_property: String,
    status_kind: StatusPropertyKind,
    published_status: String,
    slug_property: String,
}

impl NotionClient {
    pub fn new(settings: &NotionSettings) -> Result<Self, InfraError> {
        let token = settings.token.clone().ok_or_else(|| {
            InfraError::configuration("notion.token is required (QUIRE__NOTION__TOKEN)")
        })?;
        let database_id = settings.database_id.clone().ok_or_else(|| {
            InfraError::configuration("notion.database_id is required (QUIRE__NOTION__DATABASE_ID)")
        })?;

        let http = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self {
            http,
            base: settings.api_base.clone(),
            token,
            database_id,
            version: settings.version.clone(),
            status_property: settings.properties.status.clone(),
            status_kind: settings.status_kind,
            published_status: settings.published_status.clone(),
            slug_property: settings.properties.slug.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("quire/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, path: &str) -> Result<Url, SourceError> {
        self.base
            .join(path)
            .map_err(|err| SourceError::Configuration(format!("invalid url for `{path}`: {err}")))
    }

    fn published_filter(&self) -> Value {
        json!({
            "property": self.status_property,
            self.status_kind.as_str(): { "equals": self.published_status },
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, SourceError> {
        counter!("quire_notion_request_total", "operation" => operation).increment(1);
        let started = Instant::now();

        let result = self.send_inner(request).await;

        histogram!("quire_notion_request_ms", "operation" => operation)
            .record(started.elapsed().as_secs_f64() * 1000.0);
        if let Err(err) = &result {
            counter!("quire_notion_request_error_total", "operation" => operation).increment(1);
            warn!(operation, error = %err, "notion request failed");
        }
        result
    }

    async fn send_inner<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SourceError> {
        let response = request
            .bearer_auth(&self.token)
            .header(VERSION_HEADER, &self.version)
            .send()
            .await
            .map_err(|err| SourceError::Http(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| SourceError::Http(err.to_string()))?;
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        serde_json::from_slice(&bytes).map_err(|err| SourceError::Decode(err.to_string()))
    }

    async fn query_database(
        &self,
        operation: &'static str,
        filter: Value,
        limit: Option<usize>,
    ) -> Result<Vec<PageRecord>, SourceError> {
        let url = self.url(&format!("v1/databases/{}/query", self.database_id))?;
        let mut pages = Vec::new();
        let mut cursor = None;

        loop {
            let body = DatabaseQuery {
                filter: Some(filter.clone()),
                start_cursor: cursor.take(),
                page_size: Some(PAGE_SIZE),
            };
            let batch: ListResponse<PageRecord> = self
                .send(operation, self.http.post(url.clone()).json(&body))
                .await?;

            pages.extend(batch.results.into_iter().filter(|page| !page.archived));
            if limit.is_some_and(|limit| pages.len() >= limit) {
                break;
            }
            match batch.next_cursor {
                Some(next) if batch.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(pages)
    }
}

#[async_trait]
impl ContentSource for NotionClient {
    #[instrument(skip(self))]
    async fn query_published_pages(&self) -> Result<Vec<PageRecord>, SourceError> {
        let pages = self
            .query_database("query_published", self.published_filter(), None)
            .await?;
        debug!(count = pages.len(), "fetched published pages");
        Ok(pages)
    }

    #[instrument(skip(self))]
    async fn fetch_page_by_slug(&self, slug: &str) -> Result<Option<PageRecord>, SourceError> {
        let filter = json!({
            "and": [
                self.published_filter(),
                { "property": self.slug_property, "rich_text": { "equals": slug } },
            ]
        });

        match self.query_database("fetch_by_slug", filter, Some(1)).await {
            Ok(pages) => Ok(pages.into_iter().next()),
            // Databases without the slug property reject the filter.
            Err(SourceError::Status { status, .. }) if status == StatusCode::BAD_REQUEST.as_u16() => {
                debug!(slug, "slug property filter rejected; falling back to listing");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self))]
    async fn fetch_page_blocks(&self, page_id: &str) -> Result<Vec<ContentBlock>, SourceError> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut url = self.url(&format!("v1/blocks/{page_id}/children"))?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("page_size", &PAGE_SIZE.to_string());
                if let Some(cursor) = cursor.as_deref() {
                    query.append_pair("start_cursor", cursor);
                }
            }

            let batch: ListResponse<BlockRecord> =
                self.send("fetch_blocks", self.http.get(url)).await?;
            blocks.extend(batch.results.iter().map(to_content_block));

            match batch.next_cursor {
                Some(next) if batch.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(blocks)
    }
}

fn to_content_block(record: &BlockRecord) -> ContentBlock {
    ContentBlock {
        id: record.id.clone(),
        kind: BlockKind::from_type_name(&record.kind, record.language()),
        rich_text: record.rich_text(),
        has_children: record.has_children,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn block_records_convert_totally() {
        let record: BlockRecord = serde_json::from_value(json!({
            "id": "b1",
            "type": "code",
            "has_children": false,
            "code": {
                "language": "rust",
                "rich_text": [{ "plain_text": "fn main() {}" }]
            }
        }))
        .expect("block");

        let block = to_content_block(&record);
        assert_eq!(
            block.kind,
            BlockKind::Code {
                language: Some("rust".to_string())
            }
        );
        assert_eq!(block.rich_text, vec!["fn main() {}"]);

        let bare: BlockRecord = serde_json::from_value(json!({ "type": "table_of_contents" }))
            .expect("block");
        let block = to_content_block(&bare);
        assert!(block.rich_text.is_empty());
        assert!(matches!(block.kind, BlockKind::Other { .. }));
    }
}
