//! Instant-answer lookups for grounding the avatar's small talk.
//!
//! Date/time questions are answered locally; everything else goes through
//! Wikipedia's REST search with DuckDuckGo Instant Answer as the fallback.
//! Every outbound lookup is best-effort: an empty result is a valid answer.

use crate::api::ApiError;
use crate::AppState;
use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Timeout for each outbound lookup.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(6);

/// Request body for `POST /websearch`.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub q: String,
}

/// Response body for `POST /websearch`.
#[derive(Debug, Default, Serialize)]
pub struct SearchResponse {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub heading: String,
    #[serde(rename = "abstract", skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub timezone: String,
}

/// Handler for `POST /websearch`.
pub async fn websearch_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let q = payload.q.trim().to_string();
    if q.is_empty() {
        return Err(ApiError::BadRequest("q required".to_string()));
    }

    if let Some(answer) = local_datetime_answer(&q) {
        return Ok(Json(answer));
    }

    let mut result = wikipedia_lookup(&state, &q).await.unwrap_or_default();
    if result.summary.is_empty() {
        if let Some(ddg) = duckduckgo_lookup(&state, &q).await {
            if result.heading.is_empty() {
                result.heading = ddg.heading;
            }
            result.summary = ddg.summary;
            result.related = ddg.related;
        }
    }

    Ok(Json(result))
}

/// Answers "what's the date/time" style queries without going anywhere.
fn local_datetime_answer(q: &str) -> Option<SearchResponse> {
    let lower = q.to_lowercase();
    let phrases = [
        "today",
        "current date",
        "date today",
        "what's the date",
        "whats the date",
        "current time",
        "time now",
        "what's the time",
        "whats the time",
    ];
    if !phrases.iter().any(|p| lower.contains(p)) {
        return None;
    }

    let now = chrono::Local::now();
    Some(SearchResponse {
        heading: "Current date & time".to_string(),
        summary: now.format("%A, %B %-d, %Y %H:%M:%S %Z").to_string(),
        timezone: now.format("%Z").to_string(),
        ..SearchResponse::default()
    })
}

/// Wikipedia REST title search plus page summary.
async fn wikipedia_lookup(state: &AppState, q: &str) -> Option<SearchResponse> {
    #[derive(Deserialize)]
    struct TitleSearch {
        #[serde(default)]
        pages: Vec<TitlePage>,
    }
    #[derive(Deserialize)]
    struct TitlePage {
        title: String,
    }
    #[derive(Deserialize)]
    struct Summary {
        #[serde(default)]
        title: String,
        #[serde(default)]
        extract: String,
        #[serde(default)]
        content_urls: Option<ContentUrls>,
    }
    #[derive(Deserialize)]
    struct ContentUrls {
        desktop: Option<DesktopUrls>,
    }
    #[derive(Deserialize)]
    struct DesktopUrls {
        page: Option<String>,
    }

    let search: TitleSearch = state
        .http
        .get("https://en.wikipedia.org/w/rest.php/v1/search/title")
        .query(&[("q", q), ("limit", "1")])
        .timeout(LOOKUP_TIMEOUT)
        .send()
        .await
        .ok()?
        .json()
        .await
        .ok()?;
    let title = search.pages.into_iter().next()?.title;

    let summary: Summary = state
        .http
        .get(format!(
            "https://en.wikipedia.org/api/rest_v1/page/summary/{}",
            title
        ))
        .timeout(LOOKUP_TIMEOUT)
        .send()
        .await
        .ok()?
        .json()
        .await
        .ok()?;

    let url = summary
        .content_urls
        .and_then(|c| c.desktop)
        .and_then(|d| d.page)
        .unwrap_or_default();
    Some(SearchResponse {
        heading: if summary.title.is_empty() {
            title
        } else {
            summary.title
        },
        summary: summary.extract,
        url,
        ..SearchResponse::default()
    })
}

/// DuckDuckGo Instant Answer fallback.
async fn duckduckgo_lookup(state: &AppState, q: &str) -> Option<SearchResponse> {
    #[derive(Deserialize)]
    struct InstantAnswer {
        #[serde(rename = "Heading", default)]
        heading: String,
        #[serde(rename = "AbstractText", default)]
        abstract_text: String,
        #[serde(rename = "RelatedTopics", default)]
        related_topics: Vec<RelatedTopic>,
    }
    #[derive(Deserialize)]
    struct RelatedTopic {
        #[serde(rename = "Text", default)]
        text: String,
    }

    let answer: InstantAnswer = state
        .http
        .get("https://api.duckduckgo.com/")
        .query(&[
            ("q", q),
            ("format", "json"),
            ("no_html", "1"),
            ("skip_disambig", "1"),
        ])
        .timeout(LOOKUP_TIMEOUT)
        .send()
        .await
        .ok()?
        .json()
        .await
        .ok()?;

    Some(SearchResponse {
        heading: answer.heading,
        summary: answer.abstract_text,
        related: answer
            .related_topics
            .into_iter()
            .map(|t| t.text)
            .filter(|t| !t.is_empty())
            .take(5)
            .collect(),
        ..SearchResponse::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_queries_answer_locally() {
        let answer = local_datetime_answer("what's the time right now?").unwrap();
        assert_eq!(answer.heading, "Current date & time");
        assert!(!answer.summary.is_empty());
    }

    #[test]
    fn other_queries_are_not_datetime() {
        assert!(local_datetime_answer("rust programming language").is_none());
    }
}
