//! SQLite-backed prediction store. The full record (patient identity included) is stored
//! AES-GCM encrypted; only risk tier, stage, confidences and timestamp stay queryable.
//! Key derived from a deployment secret.

use crate::assessment::PredictionRecord;
use crate::error::{PredictError, Result};
use crate::risk::{RiskLevel, Stage};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use rand::RngCore;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

fn derive_key(seed: &[u8]) -> [u8; KEY_LEN] {
    use ring::digest;
    let mut out = [0u8; KEY_LEN];
    let h = digest::digest(&digest::SHA256, seed);
    out[..h.as_ref().len().min(KEY_LEN)].copy_from_slice(h.as_ref());
    out
}

fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<String> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| PredictError::Storage(e.to_string()))?;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt((&nonce).into(), plaintext)
        .map_err(|_| PredictError::Storage("payload encryption failed".to_string()))?;
    let mut out = nonce.to_vec();
    out.extend(ciphertext);
    Ok(BASE64.encode(&out))
}

fn decrypt(key: &[u8; KEY_LEN], encoded: &str) -> Result<Vec<u8>> {
    let raw = BASE64
        .decode(encoded)
        .map_err(|e| PredictError::Storage(e.to_string()))?;
    if raw.len() < NONCE_LEN {
        return Err(PredictError::Storage("payload too short".to_string()));
    }
    let (nonce, ct) = raw.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| PredictError::Storage(e.to_string()))?;
    cipher
        .decrypt(nonce.into(), ct)
        .map_err(|_| PredictError::Storage("payload decryption failed (wrong secret?)".to_string()))
}

/// Query narrowing for [`PredictionStore::list`]. Empty filter matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PredictionFilter {
    pub risk: Option<RiskLevel>,
    pub stage: Option<Stage>,
    /// Inclusive lower bound on `created_at`
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`
    pub until: Option<DateTime<Utc>>,
}

/// One record where both classifiers ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelComparison {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub patient_name: String,
    pub tabular_risk: RiskLevel,
    pub tabular_confidence: f64,
    pub scan_risk: RiskLevel,
    pub scan_confidence: f64,
    pub final_risk: RiskLevel,
    pub final_stage: Option<Stage>,
}

/// Start of the retention window: `now` minus `days`. Negative or out-of-range day
/// counts are rejected.
pub fn retention_cutoff(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    if days < 0 {
        return Err(PredictError::Storage(format!("retention days must be >= 0, got {}", days)));
    }
    chrono::Duration::try_days(days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| PredictError::Storage(format!("retention window of {} days is out of range", days)))
}

/// Count of stored predictions per risk tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskDistribution {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

impl RiskDistribution {
    pub fn total(&self) -> u64 {
        self.low + self.medium + self.high
    }
}

pub struct PredictionStore {
    conn: Mutex<Connection>,
    key: [u8; KEY_LEN],
}

impl PredictionStore {
    /// Open or create DB at path. Key is derived from `secret`.
    pub fn open(path: &Path, secret: &[u8]) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS predictions (
                id TEXT PRIMARY KEY,
                ts INTEGER NOT NULL,
                risk TEXT NOT NULL,
                stage TEXT,
                confidence REAL NOT NULL,
                tabular_confidence REAL NOT NULL,
                scan_confidence REAL,
                payload_enc TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_predictions_ts ON predictions(ts);
            CREATE INDEX IF NOT EXISTS idx_predictions_risk ON predictions(risk);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            key: derive_key(secret),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PredictError::Storage("connection lock poisoned".to_string()))
    }

    /// Insert record (payload stored encrypted). Re-inserting an id replaces it.
    pub fn insert(&self, record: &PredictionRecord) -> Result<()> {
        let payload = serde_json::to_vec(record)?;
        let enc = encrypt(&self.key, &payload)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO predictions
                (id, ts, risk, stage, confidence, tabular_confidence, scan_confidence, payload_enc)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id.to_string(),
                record.created_at.timestamp_millis(),
                record.risk.as_str(),
                record.stage.map(|s| s.as_str()),
                record.confidence,
                record.tabular_confidence,
                record.scan_confidence,
                enc,
            ],
        )?;
        Ok(())
    }

    /// Read record by id (decrypt payload)
    pub fn get(&self, id: &str) -> Result<Option<PredictionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT payload_enc FROM predictions WHERE id = ?1")?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            let enc: String = row.get(0)?;
            return Ok(Some(self.open_payload(&enc)?));
        }
        Ok(None)
    }

    /// Newest first, narrowed by `filter`; at most `limit` records.
    pub fn list(&self, filter: &PredictionFilter, limit: usize) -> Result<Vec<PredictionRecord>> {
        let mut sql = String::from("SELECT payload_enc FROM predictions WHERE 1 = 1");
        let mut args: Vec<Value> = Vec::new();
        if let Some(risk) = filter.risk {
            sql.push_str(" AND risk = ?");
            args.push(Value::Text(risk.as_str().to_string()));
        }
        if let Some(stage) = filter.stage {
            sql.push_str(" AND stage = ?");
            args.push(Value::Text(stage.as_str().to_string()));
        }
        if let Some(since) = filter.since {
            sql.push_str(" AND ts >= ?");
            args.push(Value::Integer(since.timestamp_millis()));
        }
        if let Some(until) = filter.until {
            sql.push_str(" AND ts < ?");
            args.push(Value::Integer(until.timestamp_millis()));
        }
        sql.push_str(" ORDER BY ts DESC LIMIT ?");
        args.push(Value::Integer(limit as i64));

        let payloads = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args), |row| row.get::<_, String>(0))?;
            let out = rows.collect::<std::result::Result<Vec<String>, _>>()?;
            out
        };
        payloads.iter().map(|enc| self.open_payload(enc)).collect()
    }

    /// Tabular vs scan outcome for the most recent records that carry both.
    pub fn compare(&self, limit: usize) -> Result<Vec<ModelComparison>> {
        let payloads = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare(
                "SELECT payload_enc FROM predictions WHERE scan_confidence IS NOT NULL ORDER BY ts DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit as i64], |row| row.get::<_, String>(0))?;
            let out = rows.collect::<std::result::Result<Vec<String>, _>>()?;
            out
        };
        let mut out = Vec::with_capacity(payloads.len());
        for enc in &payloads {
            let record = self.open_payload(enc)?;
            let (Some(scan_risk), Some(scan_confidence)) = (record.scan_risk, record.scan_confidence) else {
                continue;
            };
            out.push(ModelComparison {
                id: record.id,
                created_at: record.created_at,
                patient_name: record.patient.name,
                tabular_risk: record.tabular_risk,
                tabular_confidence: record.tabular_confidence,
                scan_risk,
                scan_confidence,
                final_risk: record.risk,
                final_stage: record.stage,
            });
        }
        Ok(out)
    }

    pub fn risk_distribution(&self) -> Result<RiskDistribution> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT risk, COUNT(*) FROM predictions GROUP BY risk")?;
        let mut rows = stmt.query([])?;
        let mut dist = RiskDistribution::default();
        while let Some(row) = rows.next()? {
            let risk: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            match RiskLevel::parse(&risk) {
                Some(RiskLevel::Low) => dist.low = count as u64,
                Some(RiskLevel::Medium) => dist.medium = count as u64,
                Some(RiskLevel::High) => dist.high = count as u64,
                None => tracing::warn!(risk = %risk, "unknown risk tier in store"),
            }
        }
        Ok(dist)
    }

    /// Retention: delete records older than given timestamp (ms)
    pub fn prune_before(&self, ts: i64) -> Result<u64> {
        let n = self
            .conn()?
            .execute("DELETE FROM predictions WHERE ts < ?1", params![ts])?;
        Ok(n as u64)
    }

    fn open_payload(&self, enc: &str) -> Result<PredictionRecord> {
        let plain = decrypt(&self.key, enc)?;
        Ok(serde_json::from_slice(&plain)?)
    }
}
