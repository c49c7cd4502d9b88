/*!
# Database Operations

[`DropDatabase`] owns one SQLite connection and implements
[`geodrop_claims::DropStore`] on top of it.
*/

use crate::{
    schema::{check_schema, initialize_database},
    DbError, DbResult,
};
use chrono::{DateTime, Utc};
use geodrop_claims::{
    store::rank_nearby, AttachOutcome, AudienceScope, CasOutcome, ClaimState, ClaimTransition,
    Drop, DropId, DropStore, NearbyDrop, SettlementRef, StoreError, StoreResult,
};
use geodrop_geo::{Coordinates, EARTH_RADIUS_METERS};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

const DROP_COLUMNS: &str = "id, latitude, longitude, amount, message, creator, audience_scope, \
     audience_group, expires_at, created_at, claim_state, claimant, claimed_at, settlement_ref";

/// Raw column values, converted to a [`Drop`] outside the rusqlite row closure
struct DropRow {
    id: String,
    latitude: f64,
    longitude: f64,
    amount: String,
    message: String,
    creator: String,
    audience_scope: String,
    audience_group: Option<String>,
    expires_at: Option<i64>,
    created_at: i64,
    claim_state: String,
    claimant: Option<String>,
    claimed_at: Option<i64>,
    settlement_ref: Option<String>,
}

impl DropRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            latitude: row.get(1)?,
            longitude: row.get(2)?,
            amount: row.get(3)?,
            message: row.get(4)?,
            creator: row.get(5)?,
            audience_scope: row.get(6)?,
            audience_group: row.get(7)?,
            expires_at: row.get(8)?,
            created_at: row.get(9)?,
            claim_state: row.get(10)?,
            claimant: row.get(11)?,
            claimed_at: row.get(12)?,
            settlement_ref: row.get(13)?,
        })
    }

    fn into_drop(self) -> DbResult<Drop> {
        let corrupt = |what: &str, detail: String| {
            DbError::Serialization(format!("drop {}: invalid {}: {}", self.id, what, detail))
        };

        let location = Coordinates::new(self.latitude, self.longitude)
            .map_err(|e| corrupt("location", e.to_string()))?;
        let amount =
            Decimal::from_str(&self.amount).map_err(|e| corrupt("amount", e.to_string()))?;
        let audience = match (self.audience_scope.as_str(), &self.audience_group) {
            ("public", _) => AudienceScope::Public,
            ("restricted", Some(group)) => AudienceScope::restricted(group.clone()),
            (scope, group) => return Err(corrupt("audience", format!("{} {:?}", scope, group))),
        };
        let claim_state = ClaimState::from_str(&self.claim_state)
            .map_err(|e| corrupt("claim state", e.to_string()))?;

        Ok(Drop {
            id: parse_text(&self.id, "id")?,
            location,
            amount,
            message: self.message.clone(),
            creator: parse_text(&self.creator, "creator")?,
            audience,
            expires_at: self.expires_at.map(from_millis).transpose()?,
            created_at: from_millis(self.created_at)?,
            claim_state,
            claimant: self
                .claimant
                .as_deref()
                .map(|c| parse_text(c, "claimant"))
                .transpose()?,
            claimed_at: self.claimed_at.map(from_millis).transpose()?,
            settlement_ref: self
                .settlement_ref
                .as_deref()
                .map(|s| parse_text(s, "settlement reference"))
                .transpose()?,
        })
    }
}

fn parse_text<T: FromStr>(value: &str, what: &str) -> DbResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| DbError::Serialization(format!("invalid {} '{}': {}", what, value, e)))
}

fn from_millis(millis: i64) -> DbResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| DbError::Serialization(format!("timestamp out of range: {}", millis)))
}

fn select_drop(conn: &Connection, id: &DropId) -> DbResult<Option<Drop>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM drops WHERE id = ?1", DROP_COLUMNS),
            params![id.as_str()],
            DropRow::read,
        )
        .optional()?;

    row.map(DropRow::into_drop).transpose()
}

fn select_drops(conn: &Connection, sql: &str, limit: usize) -> DbResult<Vec<Drop>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![sql_limit(limit)], DropRow::read)?;

    let mut drops = Vec::new();
    for row in rows {
        drops.push(row?.into_drop()?);
    }
    Ok(drops)
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// SQLite drop store
pub struct DropDatabase {
    conn: Mutex<Connection>,
    busy_timeout: Duration,
}

impl DropDatabase {
    /// Open an existing database file
    pub fn open(path: &Path, busy_timeout: Duration) -> DbResult<Self> {
        if !path.exists() {
            return Err(DbError::InvalidConfig(format!(
                "Database file does not exist: {}",
                path.display()
            )));
        }

        let conn = Connection::open(path)
            .map_err(|e| DbError::Connection(format!("Failed to open database: {}", e)))?;

        if !check_schema(&conn)? {
            return Err(DbError::InvalidConfig(format!(
                "Database file has invalid schema: {}",
                path.display()
            )));
        }

        Self::configure(conn, busy_timeout, true)
    }

    /// Create a new in-memory database with initialized schema
    pub fn create_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            DbError::Connection(format!("Failed to create in-memory database: {}", e))
        })?;

        initialize_database(&conn)?;

        Self::configure(conn, Duration::from_secs(2), false)
    }

    /// Create a new database file, overwriting if it exists
    pub fn create_file(path: &Path, overwrite: bool, busy_timeout: Duration) -> DbResult<Self> {
        if path.exists() && !overwrite {
            return Err(DbError::InvalidConfig(format!(
                "Database file already exists (use overwrite=true to replace): {}",
                path.display()
            )));
        }

        if path.exists() && overwrite {
            std::fs::remove_file(path)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| DbError::Connection(format!("Failed to create database file: {}", e)))?;

        initialize_database(&conn)?;

        Self::configure(conn, busy_timeout, true)
    }

    fn configure(conn: Connection, busy_timeout: Duration, on_disk: bool) -> DbResult<Self> {
        conn.busy_timeout(busy_timeout)?;
        if on_disk {
            // Readers keep going while a claim commits
            let mode: String =
                conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
            debug!(journal_mode = %mode, "opened drop database");
        }

        Ok(Self {
            conn: Mutex::new(conn),
            busy_timeout,
        })
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DbError::Connection("connection lock poisoned".to_string()))
    }

    /// Check if database has proper schema
    pub fn verify_schema(&self) -> DbResult<bool> {
        check_schema(&*self.conn()?)
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    fn store_error(&self, err: DbError) -> StoreError {
        if err.is_busy() {
            StoreError::Timeout(self.busy_timeout)
        } else {
            err.into()
        }
    }

    pub fn insert_drop(&self, drop: &Drop) -> DbResult<()> {
        let (scope, group) = match &drop.audience {
            AudienceScope::Public => ("public", None),
            AudienceScope::Restricted { group } => ("restricted", Some(group.as_str())),
        };

        let conn = self.conn()?;
        let result = conn.execute(
            &format!(
                "INSERT INTO drops ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                DROP_COLUMNS
            ),
            params![
                drop.id.as_str(),
                drop.location.latitude(),
                drop.location.longitude(),
                drop.amount.to_string(),
                drop.message,
                drop.creator.as_str(),
                scope,
                group,
                drop.expires_at.map(|t| t.timestamp_millis()),
                drop.created_at.timestamp_millis(),
                drop.claim_state.as_str(),
                drop.claimant.as_ref().map(|c| c.as_str()),
                drop.claimed_at.map(|t| t.timestamp_millis()),
                drop.settlement_ref.as_ref().map(|s| s.as_str()),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if DbError::is_constraint_violation(&e) && select_drop(&conn, &drop.id)?.is_some() => {
                Err(DbError::Duplicate(drop.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn read_drop(&self, id: &DropId) -> DbResult<Option<Drop>> {
        select_drop(&*self.conn()?, id)
    }

    /// The claim compare-and-swap: one conditional UPDATE in an immediate transaction
    pub fn claim_if_unclaimed(
        &self,
        id: &DropId,
        transition: &ClaimTransition,
    ) -> DbResult<CasOutcome> {
        let mut conn = self.conn()?;
        // Busy errors surface here under WAL; keep the rusqlite code for is_busy()
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let updated = tx.execute(
            "UPDATE drops
             SET claim_state = 'claimed', claimant = ?1, claimed_at = ?2,
                 settlement_ref = COALESCE(?3, settlement_ref)
             WHERE id = ?4 AND claim_state = 'unclaimed'",
            params![
                transition.claimant.as_str(),
                transition.claimed_at.timestamp_millis(),
                transition.settlement_ref.as_ref().map(|s| s.as_str()),
                id.as_str(),
            ],
        )?;

        let outcome = match (updated, select_drop(&tx, id)?) {
            (1, Some(drop)) => CasOutcome::Swapped(drop),
            (_, Some(_)) => CasOutcome::Conflict,
            (_, None) => CasOutcome::NotFound,
        };

        tx.commit()?;

        Ok(outcome)
    }

    pub fn attach_settlement(
        &self,
        id: &DropId,
        settlement_ref: &SettlementRef,
    ) -> DbResult<AttachOutcome> {
        let mut conn = self.conn()?;
        // Busy errors surface here under WAL; keep the rusqlite code for is_busy()
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let updated = tx.execute(
            "UPDATE drops SET settlement_ref = ?1
             WHERE id = ?2 AND claim_state = 'claimed' AND settlement_ref IS NULL",
            params![settlement_ref.as_str(), id.as_str()],
        )?;

        let outcome = match select_drop(&tx, id)? {
            None => AttachOutcome::NotFound,
            Some(drop) if updated == 1 => AttachOutcome::Attached(drop),
            Some(drop) if drop.claim_state == ClaimState::Unclaimed => AttachOutcome::NotClaimed,
            Some(drop) => AttachOutcome::AlreadySet(drop),
        };

        tx.commit()?;

        Ok(outcome)
    }

    /// Proximity search: a bounding-box prefilter in SQL, exact haversine ranking after
    pub fn read_nearby(
        &self,
        center: &Coordinates,
        radius_meters: f64,
        limit: usize,
    ) -> DbResult<Vec<NearbyDrop>> {
        let angular_radius = radius_meters / EARTH_RADIUS_METERS;
        let lat_delta = angular_radius.to_degrees();
        let min_lat = center.latitude() - lat_delta;
        let max_lat = center.latitude() + lat_delta;

        // Widest longitude offset reachable on the circle: asin(sin d / cos lat)
        let spread = angular_radius.sin() / center.latitude().to_radians().cos();
        let lon_delta = if spread.is_finite() && spread < 1.0 {
            spread.asin().to_degrees()
        } else {
            360.0
        };
        let min_lon = center.longitude() - lon_delta;
        let max_lon = center.longitude() + lon_delta;

        // Circle reaching a pole or box crossing the antimeridian: filter on latitude only
        let wraps = max_lat >= 90.0
            || min_lat <= -90.0
            || min_lon < -180.0
            || max_lon > 180.0;

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM drops
             WHERE latitude BETWEEN ?1 AND ?2
               AND (?3 OR longitude BETWEEN ?4 AND ?5)",
            DROP_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![min_lat, max_lat, wraps, min_lon, max_lon],
            DropRow::read,
        )?;

        let mut candidates = Vec::new();
        for row in rows {
            candidates.push(row?.into_drop()?);
        }

        Ok(rank_nearby(candidates, center, radius_meters, limit))
    }

    pub fn read_recent(&self, limit: usize) -> DbResult<Vec<Drop>> {
        select_drops(
            &*self.conn()?,
            &format!(
                "SELECT {} FROM drops ORDER BY created_at DESC LIMIT ?1",
                DROP_COLUMNS
            ),
            limit,
        )
    }

    pub fn read_unsettled(&self, limit: usize) -> DbResult<Vec<Drop>> {
        select_drops(
            &*self.conn()?,
            &format!(
                "SELECT {} FROM drops
                 WHERE claim_state = 'claimed' AND settlement_ref IS NULL
                 ORDER BY claimed_at ASC LIMIT ?1",
                DROP_COLUMNS
            ),
            limit,
        )
    }
}

impl DropStore for DropDatabase {
    fn insert(&self, drop: &Drop) -> StoreResult<()> {
        self.insert_drop(drop).map_err(|e| self.store_error(e))
    }

    fn load(&self, id: &DropId) -> StoreResult<Option<Drop>> {
        self.read_drop(id).map_err(|e| self.store_error(e))
    }

    fn compare_and_swap_claim(
        &self,
        id: &DropId,
        transition: &ClaimTransition,
    ) -> StoreResult<CasOutcome> {
        self.claim_if_unclaimed(id, transition)
            .map_err(|e| self.store_error(e))
    }

    fn attach_settlement_if_absent(
        &self,
        id: &DropId,
        settlement_ref: &SettlementRef,
    ) -> StoreResult<AttachOutcome> {
        self.attach_settlement(id, settlement_ref)
            .map_err(|e| self.store_error(e))
    }

    fn find_nearby(
        &self,
        center: &Coordinates,
        radius_meters: f64,
        limit: usize,
    ) -> StoreResult<Vec<NearbyDrop>> {
        self.read_nearby(center, radius_meters, limit)
            .map_err(|e| self.store_error(e))
    }

    fn list_recent(&self, limit: usize) -> StoreResult<Vec<Drop>> {
        self.read_recent(limit).map_err(|e| self.store_error(e))
    }

    fn list_unsettled(&self, limit: usize) -> StoreResult<Vec<Drop>> {
        self.read_unsettled(limit).map_err(|e| self.store_error(e))
    }
}
