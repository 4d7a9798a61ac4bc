use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use gamenight_types::links::catalog_url;
use gamenight_types::models::CatalogLink;

use crate::error::EngineError;

const SEARCH_URL: &str = "https://boardgamegeek.com/search/boardgame";
const ITEMS_URL: &str = "https://api.geekdo.com/api/geekitems";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogHit {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDetails {
    pub max_players: Option<i64>,
    pub name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed catalog response: {0}")]
    Malformed(String),
    #[error("catalog item {0} not found")]
    NotFound(i64),
}

/// External game metadata service.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn search(&self, name: &str) -> Result<Vec<CatalogHit>, CatalogError>;

    async fn details(&self, id: i64) -> Result<CatalogDetails, CatalogError>;
}

/// Catalog metadata chosen for a game, plus the capacity the catalog suggests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMatch {
    pub link: CatalogLink,
    pub max_players: Option<i64>,
}

/// Fetches details for a known catalog id. `fallback_name` is used when the
/// catalog has no name for the item.
pub async fn lookup_by_id(
    client: &dyn CatalogClient,
    id: i64,
    fallback_name: &str,
) -> Result<CatalogMatch, CatalogError> {
    let details = client.details(id).await?;
    Ok(CatalogMatch {
        link: CatalogLink {
            id,
            name: details
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| fallback_name.to_string()),
            url: catalog_url(id),
            image_url: details.image_url.unwrap_or_default(),
        },
        max_players: details.max_players.filter(|n| *n > 0),
    })
}

/// Searches by name and takes the lowest-id hit. `Ok(None)` when nothing matches.
pub async fn lookup_by_name(
    client: &dyn CatalogClient,
    name: &str,
) -> Result<Option<CatalogMatch>, CatalogError> {
    let hits = client.search(name).await?;
    let Some(best) = hits.into_iter().min_by_key(|h| h.id) else {
        debug!("No catalog match for {}", name);
        return Ok(None);
    };

    let fallback = if best.name.is_empty() { name } else { best.name.as_str() };
    lookup_by_id(client, best.id, fallback).await.map(Some)
}

/// Runs a catalog call with a deadline. Failures are logged and discarded:
/// catalog metadata never decides whether a mutation succeeds.
pub async fn best_effort<T, F>(what: &str, timeout: Duration, call: F) -> Option<T>
where
    F: Future<Output = Result<T, CatalogError>>,
{
    let err = match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => return Some(value),
        Ok(Err(e)) => EngineError::CatalogUnavailable(e.to_string()),
        Err(_) => EngineError::CatalogUnavailable(format!("timed out after {:?}", timeout)),
    };
    warn!("Catalog {} skipped: {}", what, err);
    None
}

/// BoardGameGeek client over its JSON endpoints.
pub struct BggClient {
    http: reqwest::Client,
}

impl BggClient {
    pub fn new(timeout: Duration) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gamenight/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl CatalogClient for BggClient {
    async fn search(&self, name: &str) -> Result<Vec<CatalogHit>, CatalogError> {
        let body = self
            .http
            .get(SEARCH_URL)
            .query(&[("q", name), ("nosession", "1"), ("showcount", "20")])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_search(&body)
    }

    async fn details(&self, id: i64) -> Result<CatalogDetails, CatalogError> {
        let body = self
            .http
            .get(ITEMS_URL)
            .query(&[("objecttype", "thing".to_string()), ("objectid", id.to_string())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_details(id, &body)
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    objectid: Value,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct ItemResponse {
    item: Option<ItemBody>,
}

#[derive(Deserialize)]
struct ItemBody {
    name: Option<String>,
    maxplayers: Option<Value>,
    imageurl: Option<String>,
}

fn parse_search(body: &str) -> Result<Vec<CatalogHit>, CatalogError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| CatalogError::Malformed(e.to_string()))?;

    Ok(response
        .items
        .into_iter()
        .filter_map(|item| {
            Some(CatalogHit {
                id: as_i64(&item.objectid)?,
                name: item.name,
            })
        })
        .collect())
}

fn parse_details(id: i64, body: &str) -> Result<CatalogDetails, CatalogError> {
    let response: ItemResponse =
        serde_json::from_str(body).map_err(|e| CatalogError::Malformed(e.to_string()))?;
    let item = response.item.ok_or(CatalogError::NotFound(id))?;

    Ok(CatalogDetails {
        max_players: item.maxplayers.as_ref().and_then(as_i64),
        name: item.name,
        image_url: item.imageurl.filter(|u| !u.is_empty()),
    })
}

/// The catalog sends numbers both as JSON numbers and as strings.
fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
