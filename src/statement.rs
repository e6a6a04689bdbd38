use futures::{StreamExt, TryStream, TryStreamExt};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::rows::{decode_rows, ColumnDescriptor, Row};
use crate::{jwt, ExecutionContext, SnowflakeClient};

/// A SQL statement bound to a client and an execution context
/// (created by [`SnowflakeClient::prepare`])
#[derive(Debug, Clone)]
pub struct Statement {
    host: String,
    wire: WireStatement,
    request_id: uuid::Uuid,
    config: SnowflakeClient,
}

impl Statement {
    /// Create a new statement from a SQL string, a client, and a
    /// warehouse/role pair.
    ///
    /// Usually you will want to use [`SnowflakeClient::prepare`] instead of
    /// this method but the difference is merely ergonomic.
    pub fn new(sql: &str, config: &SnowflakeClient, context: &ExecutionContext) -> Statement {
        Statement {
            host: format!(
                "https://{}.{}.snowflakecomputing.com",
                config.account.to_ascii_lowercase(),
                config.region.to_ascii_lowercase(),
            ),
            wire: WireStatement {
                statement: sql.to_owned(),
                warehouse: context.warehouse.to_ascii_uppercase(),
                role: context.role.to_ascii_uppercase(),
            },
            request_id: uuid::Uuid::new_v4(),
            config: config.to_owned(),
        }
    }

    // A fresh client per request: the bearer token is minted here, so every
    // POST and GET carries its own short-lived token.
    pub(crate) fn client(&self) -> SnowflakeResult<reqwest::Client> {
        use reqwest::header::*;
        let token = jwt::create_token(
            &self.config.private_key,
            &self.config.account,
            &self.config.user,
            self.config.key_fingerprint.as_deref(),
        )?;

        let mut headers = HeaderMap::with_capacity(5);
        headers.append(CONTENT_TYPE, "application/json".parse()?);
        headers.append(ACCEPT, "application/json".parse()?);
        headers.append(
            "X-Snowflake-Authorization-Token-Type",
            "KEYPAIR_JWT".parse()?,
        );
        headers.append(AUTHORIZATION, format!("Bearer {}", token).parse()?);
        headers.append(
            USER_AGENT,
            concat!(env!("CARGO_PKG_NAME"), '/', env!("CARGO_PKG_VERSION")).parse()?,
        );

        Ok(reqwest::Client::builder().default_headers(headers).build()?)
    }

    /// Submit the statement for execution.
    ///
    /// The first partition of the result set arrives inline and is decoded
    /// immediately; further partitions are fetched through the returned
    /// [`QueryResponse`].
    pub async fn query(&self) -> SnowflakeResult<QueryResponse> {
        log::debug!(
            "Submitting statement: {}",
            serde_json::to_string(&self.wire)?
        );
        let response = self
            .client()?
            .post(format!(
                "{}/api/v2/statements?requestId={}",
                self.host, self.request_id
            ))
            .json(&self.wire)
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await?;
            log::error!("Statement submission failed: {}: {}", status, body);
            return Err(SnowflakeError::StatementQueryFailed { status, body });
        }
        let wire: WireQueryResponse = response.json().await?;
        let rows = decode_rows(&wire.result_set_meta_data.row_type, wire.data)?;
        Ok(QueryResponse {
            statement_handle: wire.statement_handle,
            columns: wire.result_set_meta_data.row_type,
            partition_count: wire.result_set_meta_data.partition_info.len(),
            rows,
            statement: self.clone(),
        })
    }

    /// Execute the statement and return every row across all partitions,
    /// in result-set order.
    ///
    /// This is the primary entry point. Partitions past the first are
    /// fetched sequentially in ascending index order; any failure along the
    /// way discards the rows gathered so far and propagates.
    pub async fn collect(&self) -> SnowflakeResult<Vec<Row>> {
        self.query().await?.collect_rows().await
    }
}

/// The result of a submitted statement
///
/// The first partition is included immediately; additional partitions incur
/// one GET each, addressed by the statement handle.
#[derive(Debug)]
pub struct QueryResponse {
    statement_handle: String,
    columns: Vec<ColumnDescriptor>,
    partition_count: usize,
    rows: Vec<Row>,
    statement: Statement,
}

impl QueryResponse {
    /// The opaque handle the warehouse assigned to this result set
    pub fn statement_handle(&self) -> &str {
        &self.statement_handle
    }

    /// Column metadata for the result set, in positional order
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Get the number of partitions in the result set
    pub fn num_partitions(&self) -> usize {
        self.partition_count
    }

    /// The rows of partition 0, which arrived inline with the submission
    pub fn first_partition(&self) -> &[Row] {
        &self.rows
    }

    /// Get the rows of a single partition.
    ///
    /// Index 0 returns the inline rows without IO; any other index incurs
    /// one authenticated GET. Requesting an index at or past
    /// [`QueryResponse::num_partitions`] is an error.
    pub async fn partition(&self, index: usize) -> SnowflakeResult<Vec<Row>> {
        if index >= self.partition_count {
            return Err(SnowflakeError::PartitionOutOfRange {
                index,
                count: self.partition_count,
            });
        }
        if index == 0 {
            return Ok(self.rows.clone());
        }
        let response = self
            .statement
            .client()?
            .get(format!(
                "{}/api/v2/statements/{}",
                self.statement.host, self.statement_handle
            ))
            .query(&[("partition", index)])
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await?;
            log::error!("Partition {} fetch failed: {}: {}", index, status, body);
            return Err(SnowflakeError::PartitionQueryFailed {
                index,
                status,
                body,
            });
        }
        let wire: WirePartitionResponse = response.json().await?;
        decode_rows(&self.columns, wire.data)
    }

    /// Concatenate every partition into a single ordered row sequence:
    /// partition 0 first, then partitions 1..N-1 fetched one at a time in
    /// ascending order.
    pub async fn collect_rows(&self) -> SnowflakeResult<Vec<Row>> {
        let mut rows = self.rows.clone();
        for index in 1..self.partition_count {
            rows.extend(self.partition(index).await?);
        }
        Ok(rows)
    }

    /// Stream over all partitions in the response.
    ///
    /// Partition order is preserved, and one partition is buffered so a
    /// fetch can be in flight while the previous partition is processed.
    pub fn partitions(&self) -> impl TryStream<Ok = Vec<Row>, Error = SnowflakeError> + '_ {
        futures::stream::iter((0..self.partition_count).map(|index| self.partition(index)))
            .buffered(1)
    }

    /// Stream over all rows in the response, across partition boundaries.
    ///
    /// Like [`QueryResponse::partitions`], this buffers one partition.
    pub fn rows(&self) -> impl TryStream<Ok = Row, Error = SnowflakeError> + '_ {
        self.partitions()
            .map_ok(|rows| futures::stream::iter(rows).map(Ok))
            .try_flatten()
    }
}

//
// Wire types
//

#[derive(Serialize, Debug, Clone)]
struct WireStatement {
    statement: String,
    warehouse: String,
    role: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct WireQueryResponse {
    statement_handle: String,
    result_set_meta_data: WireResultSetMetaData,
    data: Vec<Vec<Value>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct WireResultSetMetaData {
    row_type: Vec<ColumnDescriptor>,
    // The partition info mostly doesn't matter, only the number of partitions
    partition_info: Vec<WirePartitionInfo>,
}

#[derive(Deserialize, Debug)]
struct WirePartitionInfo {
    //pub row_count: usize,
    //pub uncompressed_size: usize,
}

#[derive(Deserialize, Debug)]
struct WirePartitionResponse {
    data: Vec<Vec<Value>>,
}
