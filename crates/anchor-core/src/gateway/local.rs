//! Offline gateway backed by the local SQLite database.
//!
//! Mirrors the hosted `user_profiles` / `check_ins` tables so the same
//! session code runs with or without a network.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::PersistenceGateway;
use crate::checkin::{CheckIn, CheckInInput, Rating};
use crate::error::GatewayError;
use crate::gamification::{BadgeId, GamificationEngine, GamifyOutcome};
use crate::identity::UserId;
use crate::profile::{Profile, ProfileUpdate};
use crate::storage::Database;

const ENDPOINT: &str = "sqlite";

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Gateway over a [`Database`].
pub struct LocalGateway {
    db: Mutex<Database>,
    today: fn() -> NaiveDate,
}

impl LocalGateway {
    pub fn new(db: Database) -> Self {
        Self {
            db: Mutex::new(db),
            today: utc_today,
        }
    }

    /// Open the on-disk database in the data directory.
    pub fn open() -> Result<Self, GatewayError> {
        Ok(Self::new(Database::open()?))
    }

    pub fn open_memory() -> Result<Self, GatewayError> {
        Ok(Self::new(Database::open_memory()?))
    }

    /// Override the date stamped on inserted check-ins.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create the profile row if absent, as the hosted sign-up trigger does.
    ///
    /// Returns true when a row was created.
    pub fn ensure_profile(&self, user: &UserId, name: &str) -> Result<bool, GatewayError> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.db().conn().execute(
            "INSERT OR IGNORE INTO user_profiles (id, name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![user.as_str(), name, now],
        )?;
        if inserted > 0 {
            tracing::info!(user = %user, "created local profile");
        }
        Ok(inserted > 0)
    }
}

fn decode_err(message: impl Into<String>) -> GatewayError {
    GatewayError::Decode {
        endpoint: ENDPOINT.to_string(),
        message: message.into(),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, GatewayError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| decode_err(format!("bad date '{raw}': {e}")))
}

fn rating(field: &'static str, raw: i64) -> Result<Rating, GatewayError> {
    Rating::new(field, raw).map_err(|e| decode_err(e.to_string()))
}

struct ProfileRow {
    name: String,
    streak: u32,
    total_check_ins: u32,
    level: u32,
    experience: u32,
    badges: String,
    last_check_in: Option<String>,
}

impl ProfileRow {
    fn into_profile(self) -> Result<Profile, GatewayError> {
        let badges: BTreeSet<BadgeId> =
            serde_json::from_str(&self.badges).map_err(|e| decode_err(e.to_string()))?;
        let last_check_in = self.last_check_in.as_deref().map(parse_date).transpose()?;
        Ok(Profile {
            name: self.name,
            streak: self.streak,
            total_check_ins: self.total_check_ins,
            level: self.level,
            experience: self.experience,
            badges,
            last_check_in,
        })
    }
}

fn read_profile(conn: &Connection, user: &UserId) -> Result<Option<Profile>, GatewayError> {
    let row = conn
        .query_row(
            "SELECT name, streak, total_check_ins, level, experience, badges, last_check_in
             FROM user_profiles WHERE id = ?1",
            params![user.as_str()],
            |row| {
                Ok(ProfileRow {
                    name: row.get(0)?,
                    streak: row.get(1)?,
                    total_check_ins: row.get(2)?,
                    level: row.get(3)?,
                    experience: row.get(4)?,
                    badges: row.get(5)?,
                    last_check_in: row.get(6)?,
                })
            },
        )
        .optional()?;
    row.map(ProfileRow::into_profile).transpose()
}

fn write_profile(
    conn: &Connection,
    user: &UserId,
    update: &ProfileUpdate,
) -> Result<(), GatewayError> {
    let badges_json = update
        .badges
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| decode_err(e.to_string()))?;
    let last_check_in = update.last_check_in.map(|d| d.format("%Y-%m-%d").to_string());
    let updated_at = Utc::now().to_rfc3339();

    let mut columns: Vec<(&str, &dyn ToSql)> = Vec::new();
    if let Some(v) = &update.name {
        columns.push(("name", v as &dyn ToSql));
    }
    if let Some(v) = &update.streak {
        columns.push(("streak", v as &dyn ToSql));
    }
    if let Some(v) = &update.total_check_ins {
        columns.push(("total_check_ins", v as &dyn ToSql));
    }
    if let Some(v) = &update.level {
        columns.push(("level", v as &dyn ToSql));
    }
    if let Some(v) = &update.experience {
        columns.push(("experience", v as &dyn ToSql));
    }
    if let Some(v) = &badges_json {
        columns.push(("badges", v as &dyn ToSql));
    }
    if let Some(v) = &last_check_in {
        columns.push(("last_check_in", v as &dyn ToSql));
    }
    columns.push(("updated_at", &updated_at as &dyn ToSql));

    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, (col, _))| format!("{col} = ?{}", i + 1))
        .collect();
    let sql = format!(
        "UPDATE user_profiles SET {} WHERE id = ?{}",
        assignments.join(", "),
        columns.len() + 1
    );

    let user_id = user.as_str();
    let mut values: Vec<&dyn ToSql> = columns.iter().map(|(_, v)| *v).collect();
    values.push(&user_id as &dyn ToSql);

    let changed = conn.execute(&sql, values.as_slice())?;
    if changed == 0 {
        tracing::debug!(user = %user, "profile update matched no rows");
    }
    Ok(())
}

fn insert_row(
    conn: &Connection,
    user: &UserId,
    input: &CheckInInput,
    date: NaiveDate,
) -> Result<(), GatewayError> {
    conn.execute(
        "INSERT INTO check_ins (user_id, mood, energy, stress, note, date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.as_str(),
            input.mood.get(),
            input.energy.get(),
            input.stress.get(),
            input.note,
            date.format("%Y-%m-%d").to_string(),
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl PersistenceGateway for LocalGateway {
    async fn fetch_profile(&self, user: &UserId) -> Result<Option<Profile>, GatewayError> {
        read_profile(self.db().conn(), user)
    }

    async fn update_profile(
        &self,
        user: &UserId,
        update: &ProfileUpdate,
    ) -> Result<(), GatewayError> {
        write_profile(self.db().conn(), user, update)
    }

    async fn list_check_ins(&self, user: &UserId) -> Result<Vec<CheckIn>, GatewayError> {
        let db = self.db();
        let mut stmt = db.conn().prepare(
            "SELECT mood, energy, stress, note, date
             FROM check_ins
             WHERE user_id = ?1
             ORDER BY date DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user.as_str()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut check_ins = Vec::new();
        for row in rows {
            let (mood, energy, stress, note, date) = row?;
            check_ins.push(CheckIn {
                mood: rating("mood", mood)?,
                energy: rating("energy", energy)?,
                stress: rating("stress", stress)?,
                note,
                date: parse_date(&date)?,
            });
        }
        Ok(check_ins)
    }

    async fn insert_check_in(
        &self,
        user: &UserId,
        input: &CheckInInput,
    ) -> Result<(), GatewayError> {
        insert_row(self.db().conn(), user, input, (self.today)())
    }

    /// Runs read, insert and update in one `BEGIN IMMEDIATE` transaction, so
    /// other processes sharing the file wait for the write lock instead of
    /// advancing a stale copy of the profile.
    async fn record_check_in(
        &self,
        user: &UserId,
        input: &CheckInInput,
        engine: &GamificationEngine,
        today: NaiveDate,
    ) -> Result<Option<GamifyOutcome>, GatewayError> {
        let mut db = self.db();
        let tx = db
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(current) = read_profile(&tx, user)? else {
            return Ok(None);
        };
        let outcome = engine.apply(&current, input, today);
        insert_row(&tx, user, input, (self.today)())?;
        write_profile(&tx, user, &ProfileUpdate::progress(&outcome.profile))?;
        tx.commit()?;

        tracing::debug!(user = %user, total = outcome.profile.total_check_ins, "check-in committed");
        Ok(Some(outcome))
    }
}
