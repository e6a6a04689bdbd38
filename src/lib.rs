//! A key-pair JWT client for Snowflake's SQL statement REST API.
//!
//! The crate does two things: it mints short-lived RS256 bearer tokens
//! identifying a service user to Snowflake, and it drives the
//! `/api/v2/statements` endpoint, reshaping multi-partition tabular results
//! into ordered sequences of name→value row records.
//!
//! Example usage:
//!
//! ```rust,no_run
//! use snowflake_statement_client::{ExecutionContext, SnowflakeClient, SnowflakeError};
//! use snowflake_statement_client::rsa::pkcs8::DecodePrivateKey;
//! use snowflake_statement_client::rsa::RsaPrivateKey;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SnowflakeError> {
//!     let pem = std::fs::read_to_string("rsa_key.p8").expect("failed to read key file");
//!     let client = SnowflakeClient {
//!         private_key: RsaPrivateKey::from_pkcs8_pem(&pem).expect("failed to parse key"),
//!         account: "ACCOUNT".into(),
//!         region: "us-east-1".into(),
//!         user: "USER".into(),
//!         key_fingerprint: None,
//!     };
//!     // Warehouse and role are chosen per call site, not baked into the client
//!     let context = ExecutionContext {
//!         warehouse: "ENGINEERING_WH".into(),
//!         role: "DATA_ANALYST".into(),
//!     };
//!
//!     // Submit and gather every partition into one ordered row sequence
//!     let rows = client
//!         .prepare("SELECT order_id, status FROM core.orders", &context)
//!         .collect()
//!         .await?;
//!     for row in &rows {
//!         println!("{}: {}", row["ORDER_ID"], row["STATUS"]);
//!     }
//!
//!     // Or drive partition retrieval yourself
//!     let result = client.prepare("SELECT 1", &context).query().await?;
//!     println!(
//!         "handle {} has {} partitions",
//!         result.statement_handle(),
//!         result.num_partitions()
//!     );
//!     let first = result.partition(0).await?;
//!     assert_eq!(first.len(), result.first_partition().len());
//!     Ok(())
//! }
//! ```
use rsa::RsaPrivateKey;

mod errors;
mod jwt;
mod rows;
mod statement;

pub use errors::{SnowflakeError, SnowflakeResult};
pub use jwt::{create_token, key_fingerprint};
pub use rows::{ColumnDescriptor, Row};
pub use rsa;
pub use statement::{QueryResponse, Statement};

/// Connection configuration: who is calling, and where.
///
/// There is no process-wide state; construct one of these from wherever you
/// load configuration and clone it freely.
#[derive(Debug, Clone)]
pub struct SnowflakeClient {
    /// The RSA private key registered for `user`
    pub private_key: RsaPrivateKey,
    /// Account identifier, without the region suffix
    pub account: String,
    /// Data-center region, e.g. `us-east-1`; part of the API hostname
    pub region: String,
    pub user: String,
    /// Fingerprint of the registered public key (`SHA256:...`); computed
    /// from `private_key` when `None`
    pub key_fingerprint: Option<String>,
}

/// The warehouse/role pair a statement runs under.
///
/// Different call sites commonly execute conceptually identical queries
/// under different warehouses and roles, so this is a per-statement
/// parameter rather than part of [`SnowflakeClient`].
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub warehouse: String,
    pub role: String,
}

impl SnowflakeClient {
    pub fn prepare(&self, sql: &str, context: &ExecutionContext) -> Statement {
        Statement::new(sql, self, context)
    }
}
