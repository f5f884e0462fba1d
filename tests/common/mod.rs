//! Common Test Utilities
//!
//! Scripted collaborators for the service and consumer tests. None of them
//! need a live node or broker.

#![allow(dead_code)]

use async_trait::async_trait;
use bitcoind_adapter::errors::{BrokerError, BrokerResult, PublishError, RpcError, RpcResult};
use bitcoind_adapter::message::{BrokerChannel, Delivery, EventPublisher};
use bitcoind_adapter::types::BitcoinEvent;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Unix timestamp used for broker deliveries
pub const RECEIVED_AT: u64 = 1_700_000_000;

/// `NodeRpc` double answering from a per-call script
///
/// Each call pops the next scripted reply and checks the command matches.
/// Every call is recorded with its params.
#[derive(Default)]
pub struct ScriptedNode {
    script: Mutex<VecDeque<(String, RpcResult<Value>)>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl ScriptedNode {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a successful `result` for `command`
    pub fn ok(&self, command: &str, result: Value) -> &Self {
        self.push(command, Ok(result))
    }

    /// Queue a node error reply for `command`
    pub fn node_error(&self, command: &str, code: i64, message: &str) -> &Self {
        self.push(
            command,
            Err(RpcError::Node {
                command: command.to_string(),
                code: Some(code),
                message: message.to_string(),
            }),
        )
    }

    pub fn push(&self, command: &str, reply: RpcResult<Value>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .push_back((command.to_string(), reply));
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|(command, _)| command).collect()
    }

    /// Params of the first call to `command`
    pub fn params_of(&self, command: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .find(|(c, _)| c == command)
            .map(|(_, params)| params)
            .unwrap_or_else(|| panic!("'{}' was never called", command))
    }
}

#[async_trait]
impl bitcoind_adapter::rpc::NodeRpc for ScriptedNode {
    async fn call(&self, command: &str, params: Vec<Value>) -> RpcResult<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), params));

        let (expected, reply) = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unscripted call to '{}'", command));
        assert_eq!(expected, command, "calls arrived out of order");
        reply
    }
}

/// What happened on a mock broker channel, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    Prefetch(u16),
    Consume { queue: String, consumer_tag: String },
    Delivered(u64),
    Ack(u64),
    Reject(u64),
}

/// In-memory `BrokerChannel` that hands out queued deliveries
///
/// Panics if a delivery is requested while another one is still
/// unacknowledged, which is what a prefetch of one guarantees.
pub struct MockBroker {
    deliveries: VecDeque<BrokerResult<Delivery>>,
    log: Arc<Mutex<Vec<BrokerEvent>>>,
    outstanding: Option<u64>,
    /// Keep the consumer open once deliveries run out
    hold_open: bool,
}

impl MockBroker {
    pub fn new(deliveries: Vec<Delivery>) -> Self {
        Self {
            deliveries: deliveries.into_iter().map(Ok).collect(),
            log: Arc::new(Mutex::new(Vec::new())),
            outstanding: None,
            hold_open: false,
        }
    }

    pub fn with_failure(mut self, error: BrokerError) -> Self {
        self.deliveries.push_back(Err(error));
        self
    }

    pub fn held_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Shared handle on the event log, usable after the broker is moved
    pub fn log(&self) -> Arc<Mutex<Vec<BrokerEvent>>> {
        Arc::clone(&self.log)
    }

    fn record(&self, event: BrokerEvent) {
        self.log.lock().unwrap().push(event);
    }
}

#[async_trait]
impl BrokerChannel for MockBroker {
    async fn set_prefetch(&mut self, count: u16) -> BrokerResult<()> {
        self.record(BrokerEvent::Prefetch(count));
        Ok(())
    }

    async fn consume(&mut self, queue: &str, consumer_tag: &str) -> BrokerResult<()> {
        self.record(BrokerEvent::Consume {
            queue: queue.to_string(),
            consumer_tag: consumer_tag.to_string(),
        });
        Ok(())
    }

    async fn next_delivery(&mut self) -> Option<BrokerResult<Delivery>> {
        assert_eq!(
            self.outstanding, None,
            "next delivery requested before the previous one was settled"
        );
        match self.deliveries.pop_front() {
            Some(Ok(delivery)) => {
                self.outstanding = Some(delivery.delivery_tag);
                self.record(BrokerEvent::Delivered(delivery.delivery_tag));
                Some(Ok(delivery))
            }
            Some(Err(e)) => Some(Err(e)),
            None if self.hold_open => std::future::pending().await,
            None => None,
        }
    }

    async fn ack(&mut self, delivery_tag: u64) -> BrokerResult<()> {
        assert_eq!(self.outstanding.take(), Some(delivery_tag));
        self.record(BrokerEvent::Ack(delivery_tag));
        Ok(())
    }

    async fn reject(&mut self, delivery_tag: u64) -> BrokerResult<()> {
        assert_eq!(self.outstanding.take(), Some(delivery_tag));
        self.record(BrokerEvent::Reject(delivery_tag));
        Ok(())
    }
}

/// Publisher that records events, optionally failing every publish
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<(BitcoinEvent, String)>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            published: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn published(&self) -> Vec<(BitcoinEvent, String)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: BitcoinEvent, channel: &str) -> Result<(), PublishError> {
        if self.fail {
            return Err(PublishError::NoSubscribers(channel.to_string()));
        }
        self.published
            .lock()
            .unwrap()
            .push((event, channel.to_string()));
        Ok(())
    }
}

/// Delivery with the standard timestamp property set
pub fn delivery(tag: u64, routing_key: &str, body: &[u8]) -> Delivery {
    Delivery {
        delivery_tag: tag,
        routing_key: routing_key.to_string(),
        body: body.to_vec(),
        timestamp: Some(RECEIVED_AT),
    }
}

/// 32-byte hex id built from a repeated byte
pub fn hex_id(byte: u8) -> String {
    hex::encode([byte; 32])
}
