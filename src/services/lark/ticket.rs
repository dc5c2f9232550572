//! jsapi ticket cache with single-flight refresh.
//!
//! Invariants:
//! - A cached ticket is served only while `now_ms < expires_at_ms`.
//! - At most one refresh (auth exchange + ticket fetch) runs at a time; callers
//!   arriving during a refresh await the same future and share its outcome.
//! - A failed refresh never touches the cached slot and never serves the stale
//!   ticket; the next caller starts a new refresh.
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::services::lark::{
    client::{LarkTransport, UpstreamRequest, is_success},
    clock::Clock,
    error::{LarkError, LarkResult},
    paths,
    token::TokenProvider,
};

/// Tickets are discarded this long before the upstream deadline.
pub const EXPIRY_SAFETY_MARGIN_MS: i64 = 60_000;

#[derive(Clone, PartialEq, Eq)]
pub struct Ticket {
    pub value: String,
    pub expires_at_ms: i64,
}

impl Ticket {
    pub fn is_fresh_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at_ms
    }

    /// Leading characters only, for logs.
    pub fn redacted(&self) -> String {
        let head: String = self.value.chars().take(10).collect();
        format!("{head}...")
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket")
            .field("value", &self.redacted())
            .field("expires_at_ms", &self.expires_at_ms)
            .finish()
    }
}

/// `issued_at + expire_in * 1000 - 60s`
pub fn expires_at(issued_at_ms: i64, expire_in_secs: i64) -> i64 {
    issued_at_ms
        .saturating_add(expire_in_secs.saturating_mul(1000))
        .saturating_sub(EXPIRY_SAFETY_MARGIN_MS)
}

type RefreshFuture = Shared<BoxFuture<'static, LarkResult<Ticket>>>;

#[derive(Default)]
struct Slot {
    ticket: Option<Ticket>,
    in_flight: Option<RefreshFuture>,
}

/// The process-wide ticket slot, owned explicitly so it can be injected and
/// inspected.
#[derive(Default)]
pub struct TicketCache {
    slot: Mutex<Slot>,
}

impl fmt::Debug for TicketCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.lock();
        f.debug_struct("TicketCache")
            .field("ticket", &slot.ticket)
            .field("refreshing", &slot.in_flight.is_some())
            .finish()
    }
}

impl TicketCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cached ticket, fresh or not.
    pub fn snapshot(&self) -> Option<Ticket> {
        self.lock().ticket.clone()
    }

    /// Drop the cached ticket. A refresh already in flight is not cancelled.
    pub fn invalidate(&self) {
        self.lock().ticket = None;
    }

    /// Seed or overwrite the slot.
    pub fn store(&self, ticket: Ticket) {
        self.lock().ticket = Some(ticket);
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    // The guarded data is plain values, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone)]
pub struct TicketService {
    tokens: Arc<TokenProvider>,
    transport: Arc<dyn LarkTransport>,
    clock: Arc<dyn Clock>,
    cache: Arc<TicketCache>,
}

impl fmt::Debug for TicketService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketService")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl TicketService {
    pub fn new(
        tokens: Arc<TokenProvider>,
        transport: Arc<dyn LarkTransport>,
        clock: Arc<dyn Clock>,
        cache: Arc<TicketCache>,
    ) -> Self {
        Self {
            tokens,
            transport,
            clock,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<TicketCache> {
        &self.cache
    }

    /// Return a fresh ticket, refreshing it (single-flight) when missing or expired.
    pub async fn get_ticket(&self) -> LarkResult<Ticket> {
        self.ticket(false).await
    }

    /// Refresh even if the cached ticket is still fresh. Joins a refresh that is
    /// already running instead of starting a second one.
    pub async fn force_refresh(&self) -> LarkResult<Ticket> {
        self.ticket(true).await
    }

    async fn ticket(&self, force: bool) -> LarkResult<Ticket> {
        let refresh = {
            let mut slot = self.cache.lock();
            let now_ms = self.clock.now_ms();

            if !force
                && let Some(ticket) = slot.ticket.as_ref().filter(|t| t.is_fresh_at(now_ms))
            {
                return Ok(ticket.clone());
            }

            if let Some(refresh) = slot.in_flight.clone() {
                debug!("joining in-flight jsapi ticket refresh");
                refresh
            } else {
                let refresh = self.clone().refresh().boxed().shared();
                slot.in_flight = Some(refresh.clone());
                refresh
            }
        };

        refresh.await
    }

    async fn refresh(self) -> LarkResult<Ticket> {
        let issued_at_ms = self.clock.now_ms();
        let outcome = self.fetch_ticket(issued_at_ms).await;

        let mut slot = self.cache.lock();
        if let Ok(ticket) = &outcome {
            slot.ticket = Some(ticket.clone());
        }
        slot.in_flight = None;

        outcome
    }

    async fn fetch_ticket(&self, issued_at_ms: i64) -> LarkResult<Ticket> {
        let bearer = self.tokens.get_access_token().await?;

        let request = UpstreamRequest::post(paths::JSAPI_TICKET).bearer(bearer.secret());
        let payload = self.transport.send(request).await.map_err(|e| {
            warn!(error = %e, "jsapi ticket request failed");
            LarkError::UpstreamTicket {
                payload: e.into_payload(),
            }
        })?;

        let Some((value, expire_in)) = parse_ticket(&payload) else {
            warn!(%payload, "jsapi ticket rejected by upstream");
            return Err(LarkError::UpstreamTicket { payload });
        };

        let ticket = Ticket {
            value,
            expires_at_ms: expires_at(issued_at_ms, expire_in),
        };

        // Expiry is anchored before the network calls, freshness is judged after.
        let received_at_ms = self.clock.now_ms();
        if !ticket.is_fresh_at(received_at_ms) {
            warn!(
                expire_in,
                expires_at_ms = ticket.expires_at_ms,
                received_at_ms,
                "jsapi ticket was stale on arrival"
            );
            return Err(LarkError::UpstreamTicket { payload });
        }

        info!(ticket = %ticket.redacted(), expires_at_ms = ticket.expires_at_ms, "refreshed jsapi ticket");
        Ok(ticket)
    }
}

fn parse_ticket(payload: &Value) -> Option<(String, i64)> {
    if !is_success(payload) {
        return None;
    }
    let data = payload.get("data")?;
    let ticket = data
        .get("ticket")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())?;
    let expire_in = data.get("expire_in").and_then(Value::as_i64)?;
    Some((ticket.to_string(), expire_in))
}
