//! Ordered Message Dispatcher
//!
//! Turns raw inbound buffers into typed messages and hands them to listeners in
//! the order the buffers arrived. Cache references are resolved first; a
//! reference that needs a network fetch holds back every later message until
//! it resolves.

use crate::cache::{HttpPayloadFetcher, MissPolicy, PayloadCache};
use crate::config::DeltaTreeConfig;
use crate::error::{ApiError, CacheError, DispatchError};
use crate::protocol::{BincodeCodec, ForwardMsg, ForwardMsgMetadata, MessageCodec, MsgBody, MsgKind};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};

pub mod queue;

pub use queue::{MessageQueue, SlotIndex};

/// Callback receiving each emitted message.
pub type Listener = Box<dyn FnMut(&ForwardMsg) + Send>;

type PendingFetch = BoxFuture<'static, (String, Result<Vec<u8>, CacheError>)>;

/// A queued reference waiting on a fetch, with the metadata it will carry.
type Waiter = (SlotIndex, ForwardMsgMetadata);

pub struct MessageDispatcher {
    codec: Arc<dyn MessageCodec>,
    cache: PayloadCache,
    miss_policy: MissPolicy,
    queue: MessageQueue<ForwardMsg>,
    in_flight: FuturesUnordered<PendingFetch>,
    /// References per hash being fetched; one fetch serves them all.
    waiting: HashMap<String, Vec<Waiter>>,
    armed: bool,
    backlog: VecDeque<Vec<u8>>,
    listeners: HashMap<MsgKind, Vec<Listener>>,
    wildcard: Vec<Listener>,
    max_cache_age: u64,
}

impl MessageDispatcher {
    pub fn new(codec: Arc<dyn MessageCodec>, miss_policy: MissPolicy) -> Self {
        Self {
            codec,
            cache: PayloadCache::new(),
            miss_policy,
            queue: MessageQueue::new(),
            in_flight: FuturesUnordered::new(),
            waiting: HashMap::new(),
            armed: false,
            backlog: VecDeque::new(),
            listeners: HashMap::new(),
            wildcard: Vec::new(),
            max_cache_age: crate::config::DEFAULT_MAX_CACHE_AGE,
        }
    }

    /// Bincode codec, fetching misses over HTTP when an endpoint is configured.
    pub fn from_config(config: &DeltaTreeConfig) -> Result<Self, ApiError> {
        let miss_policy = match HttpPayloadFetcher::from_config(&config.client)? {
            Some(fetcher) => {
                info!(endpoint = fetcher.endpoint(), "Fetching cache misses over HTTP");
                MissPolicy::Fetch(Arc::new(fetcher))
            }
            None => MissPolicy::Fatal,
        };
        let mut dispatcher = Self::new(Arc::new(BincodeCodec), miss_policy);
        dispatcher.max_cache_age = config.client.default_max_cache_age;
        Ok(dispatcher)
    }

    /// Register a listener for one message kind.
    pub fn on<F>(&mut self, kind: MsgKind, listener: F)
    where
        F: FnMut(&ForwardMsg) + Send + 'static,
    {
        self.listeners.entry(kind).or_default().push(Box::new(listener));
    }

    /// Register a listener for every message.
    pub fn on_any<F>(&mut self, listener: F)
    where
        F: FnMut(&ForwardMsg) + Send + 'static,
    {
        self.wildcard.push(Box::new(listener));
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn cache(&self) -> &PayloadCache {
        &self.cache
    }

    /// Age threshold taken from the latest run start.
    pub fn max_cache_age(&self) -> u64 {
        self.max_cache_age
    }

    /// Messages received but not yet emitted.
    pub fn pending(&self) -> usize {
        self.backlog.len() + self.queue.len()
    }

    /// Accept one inbound buffer.
    ///
    /// Before [`arm`](Self::arm) the buffer is only held. Afterwards it is
    /// decoded and either emitted, queued behind earlier messages, or parked
    /// on a fetch that [`settle`](Self::settle) completes.
    pub fn receive(&mut self, bytes: Vec<u8>) -> Result<(), DispatchError> {
        if !self.armed {
            debug!(bytes = bytes.len(), "Buffering message until armed");
            self.backlog.push_back(bytes);
            return Ok(());
        }
        self.process(bytes)
    }

    /// Start processing, replaying buffered messages in arrival order.
    ///
    /// Every buffered message is attempted; the first failure is returned.
    pub fn arm(&mut self) -> Result<(), DispatchError> {
        if self.armed {
            return Ok(());
        }
        self.armed = true;
        info!(backlog = self.backlog.len(), "Dispatcher armed");

        let mut first_error = None;
        while let Some(bytes) = self.backlog.pop_front() {
            if let Err(e) = self.process(bytes) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Drive outstanding fetches to completion, emitting as the head resolves.
    ///
    /// Every fetch is driven; the first failure is returned.
    pub async fn settle(&mut self) -> Result<(), DispatchError> {
        let mut first_error = None;
        while let Some((hash, outcome)) = self.in_flight.next().await {
            let waiters = self.waiting.remove(&hash).unwrap_or_default();
            let result = outcome
                .map_err(DispatchError::from)
                .and_then(|raw| self.decode_fetched(&raw));
            match result {
                Ok(msg) => {
                    for (index, metadata) in waiters {
                        let mut resolved = msg.clone();
                        resolved.metadata = metadata;
                        self.queue.fill(index, resolved);
                    }
                }
                Err(e) => {
                    warn!(
                        hash = %hash,
                        waiting = waiters.len(),
                        "Dropping unresolved messages: {}",
                        e
                    );
                    for (index, _) in waiters {
                        self.queue.discard(index);
                    }
                    first_error.get_or_insert(e);
                }
            }
            self.drain();
        }
        first_error.map_or(Ok(()), Err)
    }

    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    fn process(&mut self, bytes: Vec<u8>) -> Result<(), DispatchError> {
        let msg = self.codec.decode(&bytes)?;
        self.cache.maybe_cache_message(&msg, &bytes);

        let index = self.queue.reserve();
        let reference = match &msg.body {
            MsgBody::RefHash(hash) => Some(hash.clone()),
            _ => None,
        };
        let outcome = match reference {
            Some(hash) => self.resolve_reference(index, &hash, msg.metadata),
            None => {
                self.queue.fill(index, msg);
                Ok(())
            }
        };
        if outcome.is_err() {
            self.queue.discard(index);
        }
        self.drain();
        outcome
    }

    fn resolve_reference(
        &mut self,
        index: SlotIndex,
        hash: &str,
        metadata: ForwardMsgMetadata,
    ) -> Result<(), DispatchError> {
        if let Some(raw) = self.cache.resolve(hash) {
            let mut msg = self.codec.decode(&raw)?;
            msg.metadata = metadata;
            self.queue.fill(index, msg);
            return Ok(());
        }

        if let Some(waiters) = self.waiting.get_mut(hash) {
            trace!(hash, "Joining fetch already in flight");
            waiters.push((index, metadata));
            return Ok(());
        }

        debug!(hash, "Cache miss for referenced message");
        let fetch = self.miss_policy.recover(hash)?;
        let key = hash.to_string();
        self.waiting.insert(key.clone(), vec![(index, metadata)]);
        self.in_flight.push(async move { (key, fetch.await) }.boxed());
        Ok(())
    }

    fn decode_fetched(&mut self, raw: &[u8]) -> Result<ForwardMsg, DispatchError> {
        let msg = self.codec.decode(raw)?;
        self.cache.maybe_cache_message(&msg, raw);
        Ok(msg)
    }

    fn drain(&mut self) {
        for msg in self.queue.drain_ready() {
            self.emit(&msg);
        }
    }

    fn emit(&mut self, msg: &ForwardMsg) {
        if let MsgBody::NewSession(session) = &msg.body {
            self.max_cache_age = session.max_cache_age;
        }

        if let Some(listeners) = self.listeners.get_mut(&msg.kind()) {
            for listener in listeners.iter_mut() {
                listener(msg);
            }
        }
        for listener in self.wildcard.iter_mut() {
            listener(msg);
        }

        if let MsgBody::ScriptFinished(status) = &msg.body {
            if status.is_success() {
                self.cache.advance_generation(self.max_cache_age);
            }
        }
    }
}
