//! Failover [`ChainClient`] over alloy HTTP providers.
//!
//! One provider is built per configured endpoint and one of them is active at
//! a time. Any failed call, whether the node errored or answered with data
//! that does not convert, moves the active endpoint to the next URL, so a
//! retry of the same call lands on a different node.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use alloy::network::Ethereum;
use alloy::primitives::{Address as WireAddress, B256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::client::RpcClient;
use alloy::rpc::types::{BlockNumberOrTag, BlockTransactionsKind, Filter, Log as WireLog};
use alloy::transports::http::{Client, Http};
use alloy::transports::{RpcError, TransportError};
use async_trait::async_trait;

use stakescan_types::{Address, Timestamp, H256};

use crate::client::{BlockHeader, ChainClient, Log};
use crate::ChainError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type HttpProvider = RootProvider<Http<Client>, Ethereum>;

struct Endpoint {
    url: String,
    provider: HttpProvider,
}

pub struct JsonRpcClient {
    endpoints: Vec<Endpoint>,
    active: AtomicUsize,
}

impl JsonRpcClient {
    pub fn new(endpoints: Vec<String>, timeout: Duration) -> Result<Self, ChainError> {
        if endpoints.is_empty() {
            return Err(ChainError::NoEndpoints);
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Setup(e.to_string()))?;

        let endpoints = endpoints
            .into_iter()
            .map(|url| {
                let parsed = url
                    .parse::<reqwest::Url>()
                    .map_err(|e| ChainError::Setup(format!("bad endpoint {url}: {e}")))?;
                let client = RpcClient::new(Http::with_client(http.clone(), parsed), false);
                let provider = ProviderBuilder::new().on_client(client);
                Ok(Endpoint { url, provider })
            })
            .collect::<Result<Vec<_>, ChainError>>()?;

        Ok(Self {
            endpoints,
            active: AtomicUsize::new(0),
        })
    }

    /// The endpoint the next call will use.
    pub fn active_endpoint(&self) -> &str {
        &self.endpoints[self.active.load(Ordering::Relaxed) % self.endpoints.len()].url
    }

    fn current(&self) -> (usize, &Endpoint) {
        let index = self.active.load(Ordering::Relaxed) % self.endpoints.len();
        (index, &self.endpoints[index])
    }

    /// Rotate away from `index` when the call made against it failed.
    fn settle<T>(
        &self,
        index: usize,
        method: &str,
        result: Result<T, ChainError>,
    ) -> Result<T, ChainError> {
        if let Err(err) = &result {
            tracing::debug!(endpoint = %self.endpoints[index].url, method, error = %err, "RPC call failed");
            self.rotate(index);
        }
        result
    }

    fn rotate(&self, failed: usize) {
        if self.endpoints.len() < 2 {
            return;
        }
        let next = (failed + 1) % self.endpoints.len();
        // Concurrent failures on the same endpoint rotate only once.
        if self
            .active
            .compare_exchange(failed, next, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            tracing::warn!(
                from = %self.endpoints[failed].url,
                to = %self.endpoints[next].url,
                "failing over to next RPC endpoint"
            );
        }
    }
}

#[async_trait]
impl ChainClient for JsonRpcClient {
    async fn head_height(&self) -> Result<u64, ChainError> {
        let (index, endpoint) = self.current();
        let result = endpoint
            .provider
            .get_block_number()
            .await
            .map_err(|e| wire_error(&endpoint.url, e));
        self.settle(index, "eth_blockNumber", result)
    }

    async fn block(&self, height: u64) -> Result<BlockHeader, ChainError> {
        let (index, endpoint) = self.current();
        let result = match endpoint
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(height), BlockTransactionsKind::Hashes)
            .await
        {
            Ok(Some(block)) => convert_header(
                height,
                block.header.number,
                block.header.hash,
                block.header.timestamp,
            ),
            Ok(None) => Err(ChainError::BlockNotFound(height)),
            Err(e) => Err(wire_error(&endpoint.url, e)),
        };
        self.settle(index, "eth_getBlockByNumber", result)
    }

    async fn logs(
        &self,
        from: u64,
        to: u64,
        addresses: &[Address],
    ) -> Result<Vec<Log>, ChainError> {
        if from > to {
            return Ok(Vec::new());
        }
        let filter = Filter::new()
            .address(
                addresses
                    .iter()
                    .map(|a| WireAddress::from(*a.as_bytes()))
                    .collect::<Vec<_>>(),
            )
            .from_block(from)
            .to_block(to);

        let (index, endpoint) = self.current();
        let result = match endpoint.provider.get_logs(&filter).await {
            Ok(logs) => convert_logs(logs),
            Err(e) => Err(wire_error(&endpoint.url, e)),
        };
        self.settle(index, "eth_getLogs", result)
    }
}

fn wire_error(endpoint: &str, err: TransportError) -> ChainError {
    match err {
        RpcError::ErrorResp(payload) => ChainError::Rpc {
            code: payload.code,
            message: payload.message.to_string(),
        },
        RpcError::NullResp => ChainError::InvalidResponse("null result".into()),
        RpcError::DeserError { err, .. } => ChainError::InvalidResponse(err.to_string()),
        other => ChainError::Transport {
            endpoint: endpoint.to_string(),
            message: other.to_string(),
        },
    }
}

fn convert_header(
    height: u64,
    number: u64,
    hash: B256,
    timestamp: u64,
) -> Result<BlockHeader, ChainError> {
    if number != height {
        return Err(ChainError::InvalidResponse(format!(
            "asked for block {height}, got {number}"
        )));
    }
    Ok(BlockHeader {
        height,
        hash: H256::new(hash.0),
        timestamp: Timestamp::new(timestamp),
    })
}

fn convert_logs(logs: Vec<WireLog>) -> Result<Vec<Log>, ChainError> {
    let mut out = Vec::with_capacity(logs.len());
    for log in logs {
        if log.removed {
            tracing::debug!(tx = ?log.transaction_hash, "skipping removed log");
            continue;
        }
        out.push(convert_log(log)?);
    }
    Ok(out)
}

fn required<T>(field: Option<T>, name: &str) -> Result<T, ChainError> {
    field.ok_or_else(|| ChainError::InvalidResponse(format!("log is missing {name}")))
}

fn convert_log(log: WireLog) -> Result<Log, ChainError> {
    Ok(Log {
        address: Address::new(log.inner.address.0 .0),
        topics: log.topics().iter().map(|t| H256::new(t.0)).collect(),
        data: log.data().data.to_vec(),
        block_height: required(log.block_number, "blockNumber")?,
        tx_hash: H256::new(required(log.transaction_hash, "transactionHash")?.0),
        tx_index: required(log.transaction_index, "transactionIndex")?,
        log_index: required(log.log_index, "logIndex")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire_log(block_number: serde_json::Value, removed: bool) -> WireLog {
        serde_json::from_value(json!({
            "address": "0x00000000000000000000000000000000000000aa",
            "topics": [format!("0x{}", "11".repeat(32))],
            "data": "0x0102",
            "blockHash": format!("0x{}", "44".repeat(32)),
            "blockNumber": block_number,
            "transactionHash": format!("0x{}", "22".repeat(32)),
            "transactionIndex": "0x3",
            "logIndex": "0x7",
            "removed": removed
        }))
        .unwrap()
    }

    #[test]
    fn converts_wire_log() {
        let log = convert_log(wire_log(json!("0x64"), false)).unwrap();
        assert_eq!(log.address.as_bytes()[19], 0xaa);
        assert_eq!(log.topics, vec![H256::new([0x11; 32])]);
        assert_eq!(log.data, vec![1, 2]);
        assert_eq!(log.block_height, 100);
        assert_eq!(log.tx_hash, H256::new([0x22; 32]));
        assert_eq!(log.tx_index, 3);
        assert_eq!(log.log_index, 7);
    }

    #[test]
    fn pending_log_is_rejected() {
        assert!(matches!(
            convert_log(wire_log(serde_json::Value::Null, false)),
            Err(ChainError::InvalidResponse(_))
        ));
    }

    #[test]
    fn removed_logs_are_dropped() {
        let logs = convert_logs(vec![
            wire_log(json!("0x1"), true),
            wire_log(json!("0x2"), false),
        ])
        .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].block_height, 2);
    }

    #[test]
    fn block_height_mismatch_is_rejected() {
        assert!(convert_header(1, 2, B256::ZERO, 16).is_err());
        let header = convert_header(2, 2, B256::repeat_byte(0xab), 16).unwrap();
        assert_eq!(header.hash, H256::new([0xab; 32]));
        assert_eq!(header.timestamp.as_secs(), 16);
    }

    #[test]
    fn empty_endpoint_list_is_rejected() {
        assert!(matches!(
            JsonRpcClient::new(Vec::new(), DEFAULT_REQUEST_TIMEOUT),
            Err(ChainError::NoEndpoints)
        ));
    }

    #[test]
    fn unparseable_endpoint_is_a_setup_error() {
        assert!(matches!(
            JsonRpcClient::new(vec!["not a url".into()], DEFAULT_REQUEST_TIMEOUT),
            Err(ChainError::Setup(_))
        ));
    }
}
