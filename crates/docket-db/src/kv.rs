//! # Key-Value Document Store
//!
//! [`DocumentGateway`] over Redis, the managed key-value backend.
//!
//! ## Key Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  docket:record:{id}          JSON record (canonical or older shapes)   │
//! │  docket:type:{record_type}   SET of record ids                         │
//! │  docket:number:{number}      id of the record holding the number       │
//! │  docket:retired              SET of numbers given up on a type change  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Number Claims
//! A document number is claimed with `SET key id NX` before the record is
//! written. Of two saves that minted the same number only one claim wins;
//! the other gets `DbError::UniqueViolation`. A claim held by the same id
//! (re-save) is accepted.
//!
//! Claims are never deleted once the record is written. When a record
//! takes a new number the old claim stays with it and the number joins the
//! retired set. A fresh claim whose record write fails is released again,
//! but only while it still names the same record.

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{debug, info, warn};

use docket_core::{DocumentRecord, IssuedNumber};

use crate::adapter::{record_from_str, record_to_string};
use crate::error::{DbError, DbResult, NUMBER_FIELD};
use crate::gateway::DocumentGateway;

const DEFAULT_NAMESPACE: &str = "docket";

/// Deletes a claim only if it is still held by `ARGV[1]`.
const RELEASE_CLAIM: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

#[derive(Clone)]
pub struct KvDocumentStore {
    manager: ConnectionManager,
    namespace: String,
}

impl KvDocumentStore {
    /// Connects with automatic reconnection.
    pub async fn connect(url: &str) -> DbResult<Self> {
        info!("Connecting to Redis");
        let client = Client::open(url).map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        info!("Connected to Redis");

        Ok(KvDocumentStore {
            manager,
            namespace: DEFAULT_NAMESPACE.to_string(),
        })
    }

    /// Uses a different key prefix (tests, multiple consoles on one Redis).
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    fn record_key(&self, id: &str) -> String {
        format!("{}:record:{}", self.namespace, id)
    }

    fn type_key(&self, record_type: &str) -> String {
        format!("{}:type:{}", self.namespace, record_type)
    }

    fn number_key(&self, number: &str) -> String {
        format!("{}:number:{}", self.namespace, number)
    }

    fn retired_key(&self) -> String {
        format!("{}:retired", self.namespace)
    }

    /// Claims `number` for `id`. Fails if another record holds it.
    ///
    /// Returns `true` when the claim was created by this call, `false` when
    /// `id` already held it.
    async fn claim_number(&self, number: &str, id: &str) -> DbResult<bool> {
        let mut conn = self.manager.clone();
        let key = self.number_key(number);

        let claimed: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(id)
            .arg("NX")
            .query_async(&mut conn)
            .await?;
        if claimed.is_some() {
            return Ok(true);
        }

        let holder: Option<String> = redis::cmd("GET").arg(&key).query_async(&mut conn).await?;
        match holder {
            Some(holder) if holder == id => Ok(false),
            _ => {
                warn!(number = %number, id = %id, "Document number already claimed");
                Err(DbError::duplicate(NUMBER_FIELD, number))
            }
        }
    }

    /// Undoes a claim made for a record that was never written.
    async fn release_claim(&self, number: &str, id: &str) -> DbResult<bool> {
        let mut conn = self.manager.clone();
        let released: i64 = redis::Script::new(RELEASE_CLAIM)
            .key(self.number_key(number))
            .arg(id)
            .invoke_async(&mut conn)
            .await?;
        Ok(released == 1)
    }
}

#[async_trait]
impl DocumentGateway for KvDocumentStore {
    async fn save(&self, record: &DocumentRecord) -> DbResult<DocumentRecord> {
        let previous = self.get_by_id(&record.id).await?;
        let previous_number = previous.as_ref().and_then(|p| p.document_number.clone());

        let fresh_claim = match &record.document_number {
            Some(number) if previous_number.as_ref() != Some(number) => self
                .claim_number(number, &record.id)
                .await?
                .then(|| number.clone()),
            _ => None,
        };

        let now = Utc::now();
        let mut stored = record.clone();
        stored.created_at = previous.as_ref().and_then(|p| p.created_at).or(Some(now));
        stored.updated_at = Some(now);
        if let Some(previous) = &previous {
            stored.created_by = previous.created_by.clone();
        }

        let json = record_to_string(&stored)?;
        let mut conn = self.manager.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("SET")
            .arg(self.record_key(&stored.id))
            .arg(json)
            .ignore()
            .cmd("SADD")
            .arg(self.type_key(&stored.record_type))
            .arg(&stored.id)
            .ignore();
        if let Some(old) = previous_number.filter(|old| Some(old) != stored.document_number.as_ref()) {
            pipe.cmd("SADD").arg(self.retired_key()).arg(old).ignore();
        }
        if let Some(number) = &stored.document_number {
            pipe.cmd("SREM").arg(self.retired_key()).arg(number).ignore();
        }

        let written: redis::RedisResult<()> = pipe.query_async(&mut conn).await;
        if let Err(e) = written {
            if let Some(number) = &fresh_claim {
                match self.release_claim(number, &stored.id).await {
                    Ok(_) => debug!(number = %number, "Released claim of unwritten record"),
                    Err(release) => {
                        warn!(number = %number, error = %release, "Could not release number claim")
                    }
                }
            }
            return Err(e.into());
        }

        debug!(id = %stored.id, number = ?stored.document_number, "Stored document");
        Ok(stored)
    }

    async fn get_by_id(&self, id: &str) -> DbResult<Option<DocumentRecord>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(self.record_key(id))
            .query_async(&mut conn)
            .await?;

        raw.as_deref().map(record_from_str).transpose()
    }

    async fn list_by_type(&self, record_type: &str) -> DbResult<Vec<DocumentRecord>> {
        let mut conn = self.manager.clone();
        let ids: Vec<String> = redis::cmd("SMEMBERS")
            .arg(self.type_key(record_type))
            .query_async(&mut conn)
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| self.record_key(id)).collect();
        let raws: Vec<Option<String>> = redis::cmd("MGET").arg(&keys).query_async(&mut conn).await?;

        let mut records = Vec::with_capacity(raws.len());
        for (id, raw) in ids.iter().zip(raws) {
            let Some(raw) = raw else {
                debug!(id = %id, "Id listed without a record");
                continue;
            };
            match record_from_str(&raw) {
                Ok(record) => records.push(record),
                Err(e) => warn!(id = %id, error = %e, "Skipping unreadable record"),
            }
        }
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        debug!(record_type = %record_type, count = records.len(), "Listed records");
        Ok(records)
    }

    async fn retired_numbers(&self) -> DbResult<Vec<IssuedNumber>> {
        let mut conn = self.manager.clone();
        let numbers: Vec<String> = redis::cmd("SMEMBERS")
            .arg(self.retired_key())
            .query_async(&mut conn)
            .await?;

        let mut retired: Vec<IssuedNumber> = numbers
            .iter()
            .filter_map(|number| IssuedNumber::parse(number))
            .collect();
        retired.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(retired)
    }

    async fn health_check(&self) -> DbResult<()> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
