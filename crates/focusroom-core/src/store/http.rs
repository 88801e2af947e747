//! REST backend speaking the tracker API.
//!
//! Endpoints:
//! - `GET  /timer-settings/`     → settings (created with defaults server-side)
//! - `PUT  /timer-settings/`     → overwrite settings
//! - `POST /pomodoro-sessions/`  → append a session
//! - `GET  /pomodoro-sessions/`  → list sessions, paged with `skip`/`limit`
//!   (window filtered client-side)
//!
//! Field names on the wire follow the API, not this crate.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{SessionStore, SettingsStore};
use crate::error::{ConfigError, CoreError, StoreError};
use crate::session::{Session, SessionKind};
use crate::settings::TimerSettings;
use crate::storage::config::StoreConfig;

const SETTINGS_PATH: &str = "timer-settings/";
const SESSIONS_PATH: &str = "pomodoro-sessions/";
/// Largest page the API serves.
const SESSIONS_PAGE_SIZE: usize = 100;
/// Stop paging after this many pages if the server keeps returning full ones.
const MAX_SESSION_PAGES: usize = 1_000;

pub struct HttpStore {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl HttpStore {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, CoreError> {
        let mut base = Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            key: "store.api_url".into(),
            message: e.to_string(),
        })?;
        // Url::join replaces the last segment unless the path ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(StoreError::from)?;
        Ok(Self { client, base, token })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, CoreError> {
        let url = config
            .api_url
            .as_deref()
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "store.api_url".into(),
                message: "required when store.backend = \"http\"".into(),
            })?;
        let token = std::env::var(&config.api_token_env).ok().filter(|t| !t.is_empty());
        Self::new(
            url,
            token,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, StoreError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| StoreError::Unavailable(format!("bad endpoint {path}: {e}")))?;
        let builder = self.client.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SettingsDto {
    focus_session: u32,
    short_break: u32,
    long_break: u32,
    long_break_after: u32,
    sound_enabled: bool,
    focus_break_sound: bool,
    pause_start_sound: bool,
}

impl From<TimerSettings> for SettingsDto {
    fn from(s: TimerSettings) -> Self {
        Self {
            focus_session: s.focus_minutes,
            short_break: s.short_break_minutes,
            long_break: s.long_break_minutes,
            long_break_after: s.long_break_after,
            sound_enabled: s.sound_enabled,
            focus_break_sound: s.transition_sound_enabled,
            pause_start_sound: s.pause_resume_sound_enabled,
        }
    }
}

impl From<SettingsDto> for TimerSettings {
    fn from(d: SettingsDto) -> Self {
        Self {
            focus_minutes: d.focus_session,
            short_break_minutes: d.short_break,
            long_break_minutes: d.long_break,
            long_break_after: d.long_break_after,
            sound_enabled: d.sound_enabled,
            transition_sound_enabled: d.focus_break_sound,
            pause_resume_sound_enabled: d.pause_start_sound,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewSessionDto<'a> {
    date: NaiveDate,
    duration: u32,
    #[serde(rename = "type")]
    kind: &'a str,
    completed: bool,
}

#[derive(Debug, Deserialize)]
struct SessionDto {
    id: Option<i64>,
    date: NaiveDate,
    duration: u32,
    #[serde(rename = "type")]
    kind: String,
    completed: bool,
    #[serde(default)]
    completed_at: Option<String>,
}

impl SessionDto {
    fn into_session(self) -> Result<Session, StoreError> {
        let kind = SessionKind::parse(&self.kind)
            .ok_or_else(|| StoreError::Serialization(format!("unknown session type '{}'", self.kind)))?;
        let completed_at = self
            .completed_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);
        Ok(Session {
            id: self.id,
            date: self.date,
            duration_minutes: self.duration,
            kind,
            completed: self.completed,
            completed_at,
        })
    }
}

/// The API emits RFC 3339 or naive ISO timestamps depending on the column.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[async_trait]
impl SettingsStore for HttpStore {
    async fn get(&self) -> Result<TimerSettings, StoreError> {
        let response = self.request(Method::GET, SETTINGS_PATH)?.send().await?;
        let dto: SettingsDto = Self::check(response).await?.json().await?;
        Ok(dto.into())
    }

    async fn put(&self, settings: TimerSettings) -> Result<TimerSettings, StoreError> {
        let response = self
            .request(Method::PUT, SETTINGS_PATH)?
            .json(&SettingsDto::from(settings))
            .send()
            .await?;
        let dto: SettingsDto = Self::check(response).await?.json().await?;
        Ok(dto.into())
    }
}

#[async_trait]
impl SessionStore for HttpStore {
    async fn create(&self, session: Session) -> Result<Session, StoreError> {
        let body = NewSessionDto {
            date: session.date,
            duration: session.duration_minutes,
            kind: session.kind.as_str(),
            completed: session.completed,
        };
        let response = self
            .request(Method::POST, SESSIONS_PATH)?
            .json(&body)
            .send()
            .await?;
        let dto: SessionDto = Self::check(response).await?.json().await?;
        dto.into_session()
    }

    async fn list_for_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Session>, StoreError> {
        let mut sessions = Vec::new();
        for page in 0..MAX_SESSION_PAGES {
            let skip = page * SESSIONS_PAGE_SIZE;
            let response = self
                .request(Method::GET, SESSIONS_PATH)?
                .query(&[("skip", skip), ("limit", SESSIONS_PAGE_SIZE)])
                .send()
                .await?;
            let dtos: Vec<SessionDto> = Self::check(response).await?.json().await?;
            let fetched = dtos.len();
            for dto in dtos.into_iter().filter(|d| d.date >= start && d.date <= end) {
                sessions.push(dto.into_session()?);
            }
            if fetched < SESSIONS_PAGE_SIZE {
                return Ok(sessions);
            }
        }
        tracing::warn!(
            pages = MAX_SESSION_PAGES,
            "session listing still returning full pages, stopping"
        );
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn store(url: &str, token: Option<&str>) -> HttpStore {
        HttpStore::new(url, token.map(String::from), Duration::from_secs(5)).unwrap()
    }

    fn settings_body(focus: u32) -> String {
        json!({
            "id": 1,
            "user_id": 7,
            "focus_session": focus,
            "short_break": 5,
            "long_break": 15,
            "long_break_after": 4,
            "sound_enabled": true,
            "pause_start_sound": false,
            "focus_break_sound": true,
            "created_at": "2026-10-01T08:00:00+00:00"
        })
        .to_string()
    }

    #[tokio::test]
    async fn get_maps_wire_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/timer-settings/")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(settings_body(40))
            .create_async()
            .await;

        let settings = store(&server.url(), Some("secret")).get().await.unwrap();
        mock.assert_async().await;
        assert_eq!(settings.focus_minutes, 40);
        assert!(settings.transition_sound_enabled);
        assert!(!settings.pause_resume_sound_enabled);
    }

    #[tokio::test]
    async fn put_sends_full_document() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/timer-settings/")
            .match_body(Matcher::PartialJson(json!({
                "focus_session": 30,
                "short_break": 5,
                "pause_start_sound": true
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(settings_body(30))
            .create_async()
            .await;

        let url = format!("{}/api", server.url());
        let next = TimerSettings {
            focus_minutes: 30,
            ..TimerSettings::default()
        };
        let stored = store(&url, None).put(next).await.unwrap();
        mock.assert_async().await;
        assert_eq!(stored.focus_minutes, 30);
    }

    #[tokio::test]
    async fn rejected_write_surfaces_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/pomodoro-sessions/")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let session = Session::completed(
            SessionKind::Work,
            25,
            NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
            Utc::now(),
        );
        let err = store(&server.url(), None).create(session).await.unwrap_err();
        match err {
            StoreError::Rejected { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_posts_session_and_reads_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/pomodoro-sessions/")
            .match_body(Matcher::Json(json!({
                "date": "2026-10-14",
                "duration": 25,
                "type": "work",
                "completed": true
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": 12,
                    "user_id": 7,
                    "date": "2026-10-14",
                    "duration": 25,
                    "type": "work",
                    "completed": true,
                    "completed_at": "2026-10-14T09:25:00.123456",
                    "created_at": "2026-10-14T09:25:00.123456",
                    "updated_at": "2026-10-14T09:25:00.123456"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let session = Session::completed(
            SessionKind::Work,
            25,
            NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
            Utc::now(),
        );
        let stored = store(&server.url(), None).create(session).await.unwrap();
        mock.assert_async().await;
        assert_eq!(stored.id, Some(12));
        assert_eq!(stored.completed_at.to_rfc3339(), "2026-10-14T09:25:00.123456+00:00");
    }

    #[tokio::test]
    async fn list_filters_to_window() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/pomodoro-sessions/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"id": 1, "date": "2026-10-10", "duration": 25, "type": "work", "completed": true},
                    {"id": 2, "date": "2026-10-12", "duration": 25, "type": "work", "completed": true},
                    {"id": 3, "date": "2026-10-13", "duration": 5, "type": "break", "completed": true}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let listed = store(&server.url(), None)
            .list_for_window(
                NaiveDate::from_ymd_opt(2026, 10, 11).unwrap(),
                NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].kind, SessionKind::Break);
    }

    fn session_rows(date: &str, count: usize, first_id: usize) -> String {
        let rows: Vec<_> = (0..count)
            .map(|i| json!({"id": first_id + i, "date": date, "duration": 25, "type": "work", "completed": true}))
            .collect();
        serde_json::Value::Array(rows).to_string()
    }

    fn page(skip: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("skip".into(), skip.into()),
            Matcher::UrlEncoded("limit".into(), "100".into()),
        ])
    }

    #[tokio::test]
    async fn list_reads_every_page() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/pomodoro-sessions/")
            .match_query(page("0"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(session_rows("2025-01-01", 100, 1))
            .create_async()
            .await;
        let second = server
            .mock("GET", "/pomodoro-sessions/")
            .match_query(page("100"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(session_rows("2026-10-16", 1, 101))
            .create_async()
            .await;

        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let listed = store(&server.url(), None).list_for_window(day, day).await.unwrap();
        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, Some(101));
    }

    #[tokio::test]
    async fn list_stops_after_exactly_full_page_followed_by_empty_one() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/pomodoro-sessions/")
            .match_query(page("0"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(session_rows("2026-10-16", 100, 1))
            .create_async()
            .await;
        let empty = server
            .mock("GET", "/pomodoro-sessions/")
            .match_query(page("100"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let listed = store(&server.url(), None).list_for_window(day, day).await.unwrap();
        empty.assert_async().await;
        assert_eq!(listed.len(), 100);
    }

    #[test]
    fn from_config_requires_url() {
        let config = StoreConfig::default();
        assert!(HttpStore::from_config(&config).is_err());
    }
}
