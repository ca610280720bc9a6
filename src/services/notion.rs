use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::config::NotionSource;

const NOTION_API_BASE: &str = "https://api.notion.com/v1/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum NotionError {
    #[error("Notion credentials not configured")]
    NotConfigured,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Notion API error {status}: {body}")]
    Api { status: StatusCode, body: String },
}

/// Client for the Notion database query endpoint.
#[derive(Clone)]
pub struct NotionClient {
    http: reqwest::Client,
    base: Url,
    version: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Page>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateValue {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectValue {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileUrl {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Formula {
    String { string: Option<String> },
    Number { number: Option<f64> },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileRef {
    File { file: FileUrl },
    External { external: FileUrl },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rollup {
    Array { array: Vec<PropertyValue> },
    #[serde(other)]
    Other,
}

/// The property shapes the portal actually reads. Everything else lands in
/// `Other` and is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title { title: Vec<RichText> },
    RichText { rich_text: Vec<RichText> },
    Date { date: Option<DateValue> },
    Select { select: Option<SelectValue> },
    Formula { formula: Formula },
    Relation { relation: Vec<RelationRef> },
    Rollup { rollup: Rollup },
    Files { files: Vec<FileRef> },
    #[serde(other)]
    Other,
}

impl PropertyValue {
    fn as_plain_text(&self) -> Option<&str> {
        let fragments = match self {
            PropertyValue::Title { title } => title,
            PropertyValue::RichText { rich_text } => rich_text,
            _ => return None,
        };
        fragments
            .first()
            .map(|t| t.plain_text.as_str())
            .filter(|s| !s.is_empty())
    }
}

impl Page {
    fn prop(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn title_text(&self, name: &str) -> Option<&str> {
        match self.prop(name)? {
            value @ PropertyValue::Title { .. } => value.as_plain_text(),
            _ => None,
        }
    }

    /// Text of whichever property is the database title, regardless of name.
    pub fn first_title_text(&self) -> Option<&str> {
        self.properties
            .values()
            .find(|p| matches!(p, PropertyValue::Title { .. }))
            .and_then(|p| p.as_plain_text())
    }

    pub fn date_range(&self, name: &str) -> (Option<String>, Option<String>) {
        match self.prop(name) {
            Some(PropertyValue::Date { date: Some(d) }) => (d.start.clone(), d.end.clone()),
            _ => (None, None),
        }
    }

    pub fn date_start(&self, name: &str) -> Option<String> {
        self.date_range(name).0
    }

    pub fn select_name(&self, name: &str) -> Option<&str> {
        match self.prop(name)? {
            PropertyValue::Select { select: Some(s) } => Some(s.name.as_str()),
            _ => None,
        }
    }

    pub fn formula_string(&self, name: &str) -> Option<&str> {
        match self.prop(name)? {
            PropertyValue::Formula {
                formula: Formula::String { string: Some(s) },
            } => Some(s.as_str()).filter(|s| !s.is_empty()),
            _ => None,
        }
    }

    pub fn relation_first_id(&self, name: &str) -> Option<&str> {
        match self.prop(name)? {
            PropertyValue::Relation { relation } => relation.first().map(|r| r.id.as_str()),
            _ => None,
        }
    }

    /// Rollups wrap a list of title/rich_text fragments; the first one carries
    /// the text.
    pub fn rollup_title_text(&self, name: &str) -> Option<&str> {
        match self.prop(name)? {
            PropertyValue::Rollup {
                rollup: Rollup::Array { array },
            } => array.first().and_then(|item| item.as_plain_text()),
            _ => None,
        }
    }

    pub fn first_file_url(&self, name: &str) -> Option<&str> {
        match self.prop(name)? {
            PropertyValue::Files { files } => files.first().and_then(|f| match f {
                FileRef::File { file } => Some(file.url.as_str()),
                FileRef::External { external } => Some(external.url.as_str()),
                FileRef::Other => None,
            }),
            _ => None,
        }
    }
}

impl NotionClient {
    pub fn new(version: &str) -> Self {
        Self::with_base(NOTION_API_BASE, version)
    }

    /// Base override for tests against a local mock server.
    pub fn with_base(base: &str, version: &str) -> Self {
        let base = Url::parse(base).expect("invalid Notion API base URL");
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            base,
            version: version.to_string(),
        }
    }

    /// Query a database, following `next_cursor` until every page is read.
    /// The cursor is written into the request body each round, as the API
    /// expects.
    pub async fn query_all(
        &self,
        source: &NotionSource,
        body: Value,
    ) -> Result<Vec<Page>, NotionError> {
        let mut payload = body;
        let mut pages = Vec::new();

        loop {
            let response = self.query_once(source, &payload).await?;
            pages.extend(response.results);

            match (response.has_more, response.next_cursor) {
                (true, Some(cursor)) => {
                    payload["start_cursor"] = Value::String(cursor);
                }
                _ => break,
            }
        }

        Ok(pages)
    }

    /// Single query round returning the raw response body. Used by the
    /// inspect tool, which needs the unparsed property JSON.
    pub async fn query_raw(
        &self,
        source: &NotionSource,
        body: &Value,
    ) -> Result<Value, NotionError> {
        let response = self.post_query(source, body).await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(api_error(response).await)
        }
    }

    async fn query_once(
        &self,
        source: &NotionSource,
        body: &Value,
    ) -> Result<QueryResponse, NotionError> {
        let response = self.post_query(source, body).await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(api_error(response).await)
        }
    }

    async fn post_query(
        &self,
        source: &NotionSource,
        body: &Value,
    ) -> Result<reqwest::Response, NotionError> {
        let url = self
            .base
            .join(&format!("databases/{}/query", source.database_id))
            .map_err(|_| NotionError::NotConfigured)?;
        Ok(self
            .http
            .post(url)
            .bearer_auth(&source.token)
            .header("Notion-Version", &self.version)
            .json(body)
            .send()
            .await?)
    }
}

async fn api_error(response: reqwest::Response) -> NotionError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    NotionError::Api { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_page() -> Page {
        serde_json::from_value(json!({
            "id": "page-1",
            "properties": {
                "N": { "type": "title", "title": [{ "plain_text": "N-042" }] },
                "FECHA PLANEADA": {
                    "type": "date",
                    "date": { "start": "2025-05-01", "end": "2025-05-03" }
                },
                "MAQUINA": { "type": "select", "select": { "name": "CNC-1" } },
                "OPERADOR": { "type": "select", "select": null },
                "AREA": { "type": "formula", "formula": { "type": "string", "string": "Corte" } },
                "PARTIDA": { "type": "relation", "relation": [{ "id": "rel-9" }] },
                "NOMBRE PIEZA": {
                    "type": "rollup",
                    "rollup": {
                        "type": "array",
                        "array": [{ "type": "rich_text", "rich_text": [{ "plain_text": "Placa base" }] }]
                    }
                },
                "A MOSTRAR": {
                    "type": "files",
                    "files": [{ "type": "external", "external": { "url": "https://img.example/x.png" } }]
                },
                "RARO": { "type": "people", "people": [] }
            }
        }))
        .unwrap()
    }

    #[test]
    fn accessors_unwrap_each_property_kind() {
        let page = sample_page();
        assert_eq!(page.title_text("N"), Some("N-042"));
        assert_eq!(page.first_title_text(), Some("N-042"));
        assert_eq!(
            page.date_range("FECHA PLANEADA"),
            (Some("2025-05-01".into()), Some("2025-05-03".into()))
        );
        assert_eq!(page.select_name("MAQUINA"), Some("CNC-1"));
        assert_eq!(page.select_name("OPERADOR"), None);
        assert_eq!(page.formula_string("AREA"), Some("Corte"));
        assert_eq!(page.relation_first_id("PARTIDA"), Some("rel-9"));
        assert_eq!(page.rollup_title_text("NOMBRE PIEZA"), Some("Placa base"));
        assert_eq!(
            page.first_file_url("A MOSTRAR"),
            Some("https://img.example/x.png")
        );
    }

    #[test]
    fn unknown_property_types_deserialize_to_other() {
        let page = sample_page();
        assert!(matches!(
            page.properties.get("RARO"),
            Some(PropertyValue::Other)
        ));
        assert_eq!(page.title_text("RARO"), None);
    }

    #[test]
    fn missing_properties_are_none() {
        let page = sample_page();
        assert_eq!(page.title_text("NO EXISTE"), None);
        assert_eq!(page.date_range("NO EXISTE"), (None, None));
        assert_eq!(page.first_file_url("NO EXISTE"), None);
    }

    #[tokio::test]
    async fn query_all_follows_cursors() {
        let mut server = mockito::Server::new_async().await;
        let source = NotionSource {
            token: "secret".into(),
            database_id: "db1".into(),
        };

        let first = server
            .mock("POST", "/databases/db1/query")
            .match_body(mockito::Matcher::PartialJson(json!({ "page_size": 100 })))
            .with_status(200)
            .with_body(
                json!({
                    "results": [{ "id": "p1", "properties": {} }],
                    "has_more": true,
                    "next_cursor": "c1"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let second = server
            .mock("POST", "/databases/db1/query")
            .match_body(mockito::Matcher::PartialJson(json!({ "start_cursor": "c1" })))
            .with_status(200)
            .with_body(
                json!({
                    "results": [{ "id": "p2", "properties": {} }],
                    "has_more": false,
                    "next_cursor": null
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = NotionClient::with_base(&format!("{}/", server.url()), "2022-06-28");
        let pages = client
            .query_all(&source, json!({ "page_size": 100 }))
            .await
            .unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].id, "p1");
        assert_eq!(pages[1].id, "p2");
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn api_errors_carry_status() {
        let mut server = mockito::Server::new_async().await;
        let source = NotionSource {
            token: "secret".into(),
            database_id: "db1".into(),
        };
        let _m = server
            .mock("POST", "/databases/db1/query")
            .with_status(401)
            .with_body(r#"{"message":"API token is invalid."}"#)
            .create_async()
            .await;

        let client = NotionClient::with_base(&format!("{}/", server.url()), "2022-06-28");
        let err = client.query_all(&source, json!({})).await.unwrap_err();
        match err {
            NotionError::Api { status, .. } => assert_eq!(status, StatusCode::UNAUTHORIZED),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
