//! Order lifecycle coordination — the two-phase place/cancel protocol.
//!
//! Placing an order is two sequential commitments against independent
//! systems: first the settlement ledger locks funds and creates the order
//! account, then the matcher registers the order against the book. The
//! phases cannot be made atomic, so the coordinator makes the failure
//! matrix explicit:
//!
//! * validation failure — nothing happened anywhere
//! * ledger rejection — the chain was never mutated, safe to retry freely
//! * matcher failure *after* ledger confirmation — an **orphaned
//!   settlement**: funds are locked on chain for an order the matcher does
//!   not know about. The store is left untouched and the caller gets
//!   [`SdkError::OrphanedSettlement`] carrying the order id and settlement
//!   signature. Recovery is explicit via [`OrderCoordinator::retry_registration`]
//!   or a compensating on-chain cancel; the coordinator never retries the
//!   matcher call on its own, since the first request may have landed.
//!
//! The ledger-then-matcher sequence runs on its own task, so a caller that
//! drops the returned future cannot abort a settlement that is already in
//! flight.

use crate::domain::market::Market;
use crate::domain::order::{FillInfo, Order, PlaceOrderRequest};
use crate::error::SdkError;
use crate::http::Matcher;
use crate::ledger::Ledger;
use crate::shared::{MarketId, OrderId, Side, WalletStr};
use crate::store::TradingStore;

use async_lock::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Coordinator tunables.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long to wait for matcher registration after the ledger confirms.
    /// On expiry the attempt is treated as an orphaned settlement.
    pub matcher_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            matcher_timeout: Duration::from_secs(10),
        }
    }
}

/// A user's intent to place an order. The market defaults to the session's
/// selected market.
#[derive(Debug, Clone)]
pub struct PlaceIntent {
    pub market_id: Option<MarketId>,
    pub side: Side,
    pub price: u64,
    pub size: u64,
}

/// A successfully placed order plus any immediate fills.
#[derive(Debug, Clone)]
pub struct Placed {
    pub order: Order,
    pub fills: Vec<FillInfo>,
}

#[derive(Debug, Clone)]
enum OrphanAction {
    /// The place-order registration that never reached the matcher.
    Place(PlaceOrderRequest),
    /// An on-chain cancel the matcher has not acknowledged.
    Cancel,
}

/// Record of a ledger-confirmed action awaiting matcher registration.
#[derive(Debug, Clone)]
pub struct OrphanedSettlement {
    pub order_id: OrderId,
    pub settlement_signature: String,
    action: OrphanAction,
}

impl OrphanedSettlement {
    /// Whether this orphan is an unacknowledged cancel (as opposed to an
    /// unregistered placement).
    pub fn is_cancel(&self) -> bool {
        matches!(self.action, OrphanAction::Cancel)
    }
}

struct Inner {
    store: Arc<TradingStore>,
    ledger: Arc<dyn Ledger>,
    matcher: Arc<dyn Matcher>,
    wallet: Option<WalletStr>,
    config: CoordinatorConfig,
    orphans: Mutex<HashMap<OrderId, OrphanedSettlement>>,
}

/// The two-phase order lifecycle coordinator.
#[derive(Clone)]
pub struct OrderCoordinator {
    inner: Arc<Inner>,
}

impl OrderCoordinator {
    pub fn new(
        store: Arc<TradingStore>,
        ledger: Arc<dyn Ledger>,
        matcher: Arc<dyn Matcher>,
        wallet: Option<WalletStr>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                ledger,
                matcher,
                wallet,
                config,
                orphans: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Place an order: escrow on chain, then register with the matcher.
    ///
    /// Validation happens up front with no side effects. After validation
    /// the two-phase sequence runs to completion on its own task even if
    /// this future is dropped.
    pub async fn place(&self, intent: PlaceIntent) -> Result<Placed, SdkError> {
        let wallet = self
            .inner
            .wallet
            .clone()
            .ok_or_else(|| SdkError::Validation("wallet not connected".into()))?;
        let market = self.resolve_market(intent.market_id.as_ref()).await?;

        if intent.size == 0 || !market.validate_order_size(intent.size) {
            return Err(SdkError::Validation(format!(
                "size {} below market minimum {}",
                intent.size, market.min_order_size
            )));
        }
        if intent.price == 0 || !market.validate_price(intent.price) {
            return Err(SdkError::Validation(format!(
                "price {} not aligned to tick size {}",
                intent.price, market.tick_size
            )));
        }

        let order_id = OrderId::generate();
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(run_place(
            inner,
            wallet,
            market,
            order_id,
            intent.side,
            intent.price,
            intent.size,
        ));
        handle
            .await
            .map_err(|e| SdkError::Other(format!("place task failed: {}", e)))?
    }

    /// Cancel a resting order: release escrow on chain, then deregister
    /// with the matcher.
    ///
    /// If matcher deregistration fails the order is left resting in the
    /// store and the attempt is recorded as an orphaned settlement.
    pub async fn cancel(&self, order_id: OrderId) -> Result<Order, SdkError> {
        let order = self
            .inner
            .store
            .order(order_id)
            .await
            .ok_or_else(|| SdkError::Validation(format!("unknown order {}", order_id)))?;
        if !order.is_open() {
            return Err(SdkError::Validation(format!(
                "order {} is not open",
                order_id
            )));
        }
        let market = self.resolve_market(Some(&order.market_id)).await?;

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(run_cancel(inner, market, order_id));
        handle
            .await
            .map_err(|e| SdkError::Other(format!("cancel task failed: {}", e)))?
    }

    /// Retry matcher registration for an orphaned settlement. The on-chain
    /// side is already done; only the matcher call is repeated, with the
    /// identical request, so the matcher can deduplicate by order id.
    ///
    /// Returns the placement result for place orphans, `None` for cancel
    /// orphans. On another failure the orphan stays recorded and the error
    /// is raised again.
    pub async fn retry_registration(&self, order_id: OrderId) -> Result<Option<Placed>, SdkError> {
        let orphan = self
            .inner
            .orphans
            .lock()
            .await
            .get(&order_id)
            .cloned()
            .ok_or_else(|| {
                SdkError::Validation(format!("no orphaned settlement for order {}", order_id))
            })?;

        match orphan.action {
            OrphanAction::Place(ref request) => {
                let result = tokio::time::timeout(
                    self.inner.config.matcher_timeout,
                    self.inner.matcher.place_order(request),
                )
                .await;
                match result {
                    Ok(Ok(resp)) => {
                        self.inner.orphans.lock().await.remove(&order_id);
                        self.inner.store.upsert_order(resp.order.clone()).await;
                        Ok(Some(Placed {
                            order: resp.order,
                            fills: resp.trades,
                        }))
                    }
                    Ok(Err(e)) => {
                        tracing::error!(order = %order_id, "registration retry failed: {}", e);
                        Err(SdkError::OrphanedSettlement {
                            order_id,
                            settlement_signature: orphan.settlement_signature,
                        })
                    }
                    Err(_) => {
                        tracing::error!(order = %order_id, "registration retry timed out");
                        Err(SdkError::OrphanedSettlement {
                            order_id,
                            settlement_signature: orphan.settlement_signature,
                        })
                    }
                }
            }
            OrphanAction::Cancel => {
                let result = tokio::time::timeout(
                    self.inner.config.matcher_timeout,
                    self.inner.matcher.cancel_order(order_id),
                )
                .await;
                match result {
                    Ok(Ok(order)) => {
                        self.inner.orphans.lock().await.remove(&order_id);
                        self.inner.store.upsert_order(order).await;
                        Ok(None)
                    }
                    Ok(Err(e)) => {
                        tracing::error!(order = %order_id, "cancel retry failed: {}", e);
                        Err(SdkError::OrphanedSettlement {
                            order_id,
                            settlement_signature: orphan.settlement_signature,
                        })
                    }
                    Err(_) => {
                        tracing::error!(order = %order_id, "cancel retry timed out");
                        Err(SdkError::OrphanedSettlement {
                            order_id,
                            settlement_signature: orphan.settlement_signature,
                        })
                    }
                }
            }
        }
    }

    /// Currently recorded orphaned settlements.
    pub async fn orphans(&self) -> Vec<OrphanedSettlement> {
        self.inner.orphans.lock().await.values().cloned().collect()
    }

    async fn resolve_market(&self, market_id: Option<&MarketId>) -> Result<Market, SdkError> {
        let market = self
            .inner
            .store
            .market()
            .await
            .ok_or_else(|| SdkError::Validation("no market selected".into()))?;
        if let Some(id) = market_id {
            if *id != market.id {
                return Err(SdkError::Validation(format!(
                    "market {} is not the session market",
                    id
                )));
            }
        }
        if !market.is_active {
            return Err(SdkError::Validation(format!(
                "market {} is not active",
                market.id
            )));
        }
        Ok(market)
    }
}

async fn run_place(
    inner: Arc<Inner>,
    wallet: WalletStr,
    market: Market,
    order_id: OrderId,
    side: Side,
    price: u64,
    size: u64,
) -> Result<Placed, SdkError> {
    // Phase 1: on-chain escrow. A rejection here is clean — nothing to undo.
    let signature = inner
        .ledger
        .submit_place(&market, order_id, side, price, size)
        .await?;

    // Phase 2: matcher registration, bounded by the configured timeout.
    let request = PlaceOrderRequest {
        market_id: market.id.clone(),
        side,
        price,
        size,
        wallet,
        settlement_signature: signature.clone(),
        order_id,
    };

    let result = tokio::time::timeout(
        inner.config.matcher_timeout,
        inner.matcher.place_order(&request),
    )
    .await;

    match result {
        Ok(Ok(resp)) => {
            inner.store.upsert_order(resp.order.clone()).await;
            Ok(Placed {
                order: resp.order,
                fills: resp.trades,
            })
        }
        Ok(Err(e)) => {
            tracing::error!(
                order = %order_id,
                signature = %signature,
                "matcher registration failed after settlement: {}",
                e
            );
            record_orphan(&inner, order_id, signature, OrphanAction::Place(request)).await
        }
        Err(_) => {
            tracing::error!(
                order = %order_id,
                signature = %signature,
                "matcher registration timed out after settlement"
            );
            record_orphan(&inner, order_id, signature, OrphanAction::Place(request)).await
        }
    }
}

async fn run_cancel(
    inner: Arc<Inner>,
    market: Market,
    order_id: OrderId,
) -> Result<Order, SdkError> {
    let signature = inner.ledger.submit_cancel(&market, order_id).await?;

    let result = tokio::time::timeout(
        inner.config.matcher_timeout,
        inner.matcher.cancel_order(order_id),
    )
    .await;

    match result {
        Ok(Ok(order)) => {
            inner.store.upsert_order(order.clone()).await;
            Ok(order)
        }
        Ok(Err(e)) => {
            tracing::error!(
                order = %order_id,
                signature = %signature,
                "matcher cancel failed after settlement: {}",
                e
            );
            record_orphan(&inner, order_id, signature, OrphanAction::Cancel).await
        }
        Err(_) => {
            tracing::error!(
                order = %order_id,
                signature = %signature,
                "matcher cancel timed out after settlement"
            );
            record_orphan(&inner, order_id, signature, OrphanAction::Cancel).await
        }
    }
}

/// Record an orphan and raise the corresponding error. The store is never
/// mutated here: state the matcher has not confirmed stays out of it.
async fn record_orphan<T>(
    inner: &Inner,
    order_id: OrderId,
    signature: String,
    action: OrphanAction,
) -> Result<T, SdkError> {
    inner.orphans.lock().await.insert(
        order_id,
        OrphanedSettlement {
            order_id,
            settlement_signature: signature.clone(),
            action,
        },
    );
    Err(SdkError::OrphanedSettlement {
        order_id,
        settlement_signature: signature,
    })
}
