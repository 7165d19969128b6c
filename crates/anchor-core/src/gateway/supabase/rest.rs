//! PostgREST access to the `user_profiles` and `check_ins` tables.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::SupabaseClient;
use crate::checkin::{CheckIn, CheckInInput, Rating};
use crate::error::GatewayError;
use crate::gateway::PersistenceGateway;
use crate::identity::UserId;
use crate::profile::{Profile, ProfileUpdate};

const PROFILES: &str = "rest/v1/user_profiles";
const CHECK_INS: &str = "rest/v1/check_ins";

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// [`PersistenceGateway`] over a Supabase project.
pub struct SupabaseGateway {
    client: Arc<SupabaseClient>,
    today: fn() -> NaiveDate,
}

impl SupabaseGateway {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self {
            client,
            today: utc_today,
        }
    }

    /// Override the date stamped on inserted check-ins.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }
}

#[derive(Deserialize)]
struct CheckInRow {
    mood: i64,
    energy: i64,
    stress: i64,
    #[serde(default)]
    note: Option<String>,
    date: NaiveDate,
}

impl CheckInRow {
    fn into_check_in(self) -> Result<CheckIn, GatewayError> {
        let rating = |field: &'static str, raw: i64| {
            Rating::new(field, raw).map_err(|e| GatewayError::Decode {
                endpoint: CHECK_INS.to_string(),
                message: e.to_string(),
            })
        };
        Ok(CheckIn {
            mood: rating("mood", self.mood)?,
            energy: rating("energy", self.energy)?,
            stress: rating("stress", self.stress)?,
            note: self.note,
            date: self.date,
        })
    }
}

#[derive(Serialize)]
struct NewCheckIn<'a> {
    user_id: &'a str,
    mood: u8,
    energy: u8,
    stress: u8,
    note: Option<&'a str>,
    date: NaiveDate,
}

#[derive(Serialize)]
struct ProfilePatch<'a> {
    #[serde(flatten)]
    update: &'a ProfileUpdate,
    updated_at: String,
}

#[async_trait]
impl PersistenceGateway for SupabaseGateway {
    async fn fetch_profile(&self, user: &UserId) -> Result<Option<Profile>, GatewayError> {
        let url = self.client.endpoint(PROFILES)?;
        let req = self
            .client
            .request(Method::GET, url)
            .query(&[("id", format!("eq.{user}")), ("select", "*".to_string())]);
        let resp = self.client.send(req, PROFILES).await?;
        let mut rows: Vec<Profile> = SupabaseClient::json(resp, PROFILES).await?;
        if rows.is_empty() {
            tracing::debug!(user = %user, "no profile row");
            return Ok(None);
        }
        Ok(Some(rows.swap_remove(0)))
    }

    async fn update_profile(
        &self,
        user: &UserId,
        update: &ProfileUpdate,
    ) -> Result<(), GatewayError> {
        let url = self.client.endpoint(PROFILES)?;
        let body = ProfilePatch {
            update,
            updated_at: Utc::now().to_rfc3339(),
        };
        let req = self
            .client
            .request(Method::PATCH, url)
            .query(&[("id", format!("eq.{user}"))])
            .header("Prefer", "return=minimal")
            .json(&body);
        self.client.send(req, PROFILES).await?;
        Ok(())
    }

    async fn list_check_ins(&self, user: &UserId) -> Result<Vec<CheckIn>, GatewayError> {
        let url = self.client.endpoint(CHECK_INS)?;
        let req = self.client.request(Method::GET, url).query(&[
            ("user_id", format!("eq.{user}")),
            ("select", "*".to_string()),
            ("order", "date.desc".to_string()),
        ]);
        let resp = self.client.send(req, CHECK_INS).await?;
        let rows: Vec<CheckInRow> = SupabaseClient::json(resp, CHECK_INS).await?;
        rows.into_iter().map(CheckInRow::into_check_in).collect()
    }

    async fn insert_check_in(
        &self,
        user: &UserId,
        input: &CheckInInput,
    ) -> Result<(), GatewayError> {
        let url = self.client.endpoint(CHECK_INS)?;
        let body = NewCheckIn {
            user_id: user.as_str(),
            mood: input.mood.get(),
            energy: input.energy.get(),
            stress: input.stress.get(),
            note: input.note.as_deref(),
            date: (self.today)(),
        };
        let req = self
            .client
            .request(Method::POST, url)
            .header("Prefer", "return=minimal")
            .json(&body);
        self.client.send(req, CHECK_INS).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamification::{Badge, BadgeId};
    use mockito::Matcher;
    use serde_json::json;

    fn fixed_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn gateway(server: &mockito::Server) -> SupabaseGateway {
        let client = SupabaseClient::new(&server.url(), "anon-key").unwrap();
        SupabaseGateway::new(Arc::new(client)).with_clock(fixed_day)
    }

    #[tokio::test]
    async fn fetch_profile_reads_first_row() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/user_profiles")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("id".into(), "eq.u1".into()),
                Matcher::UrlEncoded("select".into(), "*".into()),
            ]))
            .match_header("apikey", "anon-key")
            .match_header("authorization", "Bearer anon-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([{
                    "id": "u1",
                    "name": "Ada",
                    "streak": 2,
                    "total_check_ins": 2,
                    "level": 1,
                    "experience": 20,
                    "badges": ["first-streak", "retired_badge"],
                    "last_check_in": "2024-02-29",
                    "created_at": "2024-02-28T10:00:00Z"
                }])
                .to_string(),
            )
            .create_async()
            .await;

        let profile = gateway(&server)
            .fetch_profile(&UserId::new("u1"))
            .await
            .unwrap()
            .unwrap();
        mock.assert_async().await;

        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.experience, 20);
        assert!(profile.has_badge(Badge::FirstStreak));
        assert!(profile
            .badges
            .contains(&BadgeId::Unknown("retired_badge".into())));
        assert_eq!(
            profile.last_check_in,
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[tokio::test]
    async fn fetch_profile_empty_array_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/user_profiles")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let got = gateway(&server).fetch_profile(&UserId::new("u1")).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn update_profile_patches_partial_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/rest/v1/user_profiles")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.u1".into()))
            .match_header("prefer", "return=minimal")
            .match_body(Matcher::PartialJson(json!({ "name": "Grace" })))
            .with_status(204)
            .create_async()
            .await;

        let update = ProfileUpdate::name("  Grace ").unwrap();
        gateway(&server)
            .update_profile(&UserId::new("u1"), &update)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn insert_check_in_posts_dated_row() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/check_ins")
            .match_body(Matcher::Json(json!({
                "user_id": "u1",
                "mood": 4,
                "energy": 3,
                "stress": 2,
                "note": "walked",
                "date": "2024-03-01"
            })))
            .with_status(201)
            .create_async()
            .await;

        let input = CheckInInput::new(4, 3, 2, Some("walked".into())).unwrap();
        gateway(&server)
            .insert_check_in(&UserId::new("u1"), &input)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_check_ins_orders_by_date_desc() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/check_ins")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("user_id".into(), "eq.u1".into()),
                Matcher::UrlEncoded("order".into(), "date.desc".into()),
            ]))
            .with_status(200)
            .with_body(
                json!([
                    { "id": 2, "user_id": "u1", "mood": 5, "energy": 4, "stress": 1, "note": null, "date": "2024-03-01" },
                    { "id": 1, "user_id": "u1", "mood": 2, "energy": 2, "stress": 4, "note": "rough", "date": "2024-02-29" }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let list = gateway(&server)
            .list_check_ins(&UserId::new("u1"))
            .await
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].mood.get(), 5);
        assert_eq!(list[1].note.as_deref(), Some("rough"));
    }

    #[tokio::test]
    async fn error_status_carries_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/v1/check_ins")
            .with_status(401)
            .with_body(r#"{"message":"JWT expired"}"#)
            .create_async()
            .await;

        let err = gateway(&server)
            .insert_check_in(&UserId::new("u1"), &CheckInInput::default())
            .await
            .unwrap_err();
        match err {
            GatewayError::Status { status, body, .. } => {
                assert_eq!(status, 401);
                assert!(body.contains("JWT expired"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn out_of_range_rating_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/check_ins")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"mood": 9, "energy": 3, "stress": 3, "date": "2024-03-01"}]"#)
            .create_async()
            .await;

        let err = gateway(&server)
            .list_check_ins(&UserId::new("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Decode { .. }));
    }
}
