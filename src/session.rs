//! `TradingSession` — the primary entry point.
//!
//! Owns the store, the HTTP client, the lifecycle coordinator, and the
//! stream plumbing. `start` seeds the store from REST snapshots, then
//! connects the stream and hands the client to a dispatcher task; the
//! session keeps a [`WsController`] for subscription changes and shutdown.

use crate::domain::market::Market;
use crate::error::SdkError;
use crate::http::MatcherHttp;
use crate::ledger::{Ledger, VaultBalance};
use crate::lifecycle::{CoordinatorConfig, OrderCoordinator};
use crate::network::{DEFAULT_API_URL, DEFAULT_WS_URL};
use crate::shared::{MarketId, WalletStr};
use crate::store::{TradingStore, DEFAULT_TRADE_CAP};
use crate::ws::{spawn_dispatcher, WsClient, WsConfig, WsController};

use std::sync::Arc;
use tokio::task::JoinHandle;

struct Connection {
    controller: WsController,
    dispatcher: JoinHandle<()>,
}

/// A live trading session against one matcher and one settlement program.
pub struct TradingSession {
    store: Arc<TradingStore>,
    http: Arc<MatcherHttp>,
    ledger: Arc<dyn Ledger>,
    coordinator: OrderCoordinator,
    wallet: Option<WalletStr>,
    ws_config: WsConfig,
    conn: tokio::sync::Mutex<Option<Connection>>,
}

impl TradingSession {
    pub fn builder() -> TradingSessionBuilder {
        TradingSessionBuilder::default()
    }

    /// Start the session for one market: seed the store from REST
    /// snapshots, then connect the stream and subscribe.
    ///
    /// Calling `start` again switches markets, tearing down the previous
    /// stream first.
    pub async fn start(&self, market_id: &MarketId) -> Result<(), SdkError> {
        self.shutdown().await;

        let market = self.http.get_market(market_id).await?;
        self.store.set_market(market).await;

        let book = self.http.get_orderbook(market_id, None).await?;
        self.store.set_book_snapshot(&book).await;

        let trades = self.http.get_trades(market_id, None).await?;
        self.store.set_trades(trades).await;

        if let Some(wallet) = &self.wallet {
            let orders = self.http.get_user_orders(wallet, Some(market_id)).await?;
            self.store.set_open_orders(orders).await;
        }

        let mut client = WsClient::new(self.ws_config.clone());
        client.connect();
        let controller = client.controller()?;
        client.subscribe(market_id.clone())?;
        self.store.set_subscribed(market_id.clone(), true).await;

        let dispatcher = spawn_dispatcher(client, Arc::clone(&self.store));
        *self.conn.lock().await = Some(Connection {
            controller,
            dispatcher,
        });

        Ok(())
    }

    /// Subscribe to an additional market's stream.
    pub async fn subscribe(&self, market_id: MarketId) -> Result<(), SdkError> {
        let conn = self.conn.lock().await;
        let conn = conn.as_ref().ok_or(crate::error::WsError::NotConnected)?;
        conn.controller.subscribe(market_id.clone())?;
        self.store.set_subscribed(market_id, true).await;
        Ok(())
    }

    /// Unsubscribe from a market's stream.
    pub async fn unsubscribe(&self, market_id: MarketId) -> Result<(), SdkError> {
        let conn = self.conn.lock().await;
        let conn = conn.as_ref().ok_or(crate::error::WsError::NotConnected)?;
        conn.controller.unsubscribe(market_id.clone())?;
        self.store.set_subscribed(market_id, false).await;
        Ok(())
    }

    /// Close the stream and stop the dispatcher. Store contents survive.
    pub async fn shutdown(&self) {
        if let Some(conn) = self.conn.lock().await.take() {
            conn.controller.disconnect().await;
            // The dispatcher owns the client and only exits on a terminal
            // Offline event, so stop it directly after the graceful close.
            conn.dispatcher.abort();
            self.store.set_connected(false).await;
        }
    }

    // ── Vault operations ─────────────────────────────────────────────────

    /// Deposit into the current market's vault.
    pub async fn deposit(&self, amount: u64, is_base: bool) -> Result<String, SdkError> {
        let market = self.current_market().await?;
        Ok(self.ledger.submit_deposit(&market, amount, is_base).await?)
    }

    /// Withdraw unlocked balance from the current market's vault.
    pub async fn withdraw(&self, amount: u64, is_base: bool) -> Result<String, SdkError> {
        let market = self.current_market().await?;
        Ok(self.ledger.submit_withdraw(&market, amount, is_base).await?)
    }

    /// Vault balances for the current market, `None` if no vault exists.
    pub async fn vault_balance(&self) -> Result<Option<VaultBalance>, SdkError> {
        let market = self.current_market().await?;
        Ok(self.ledger.vault_balance(&market).await?)
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn store(&self) -> &Arc<TradingStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &OrderCoordinator {
        &self.coordinator
    }

    pub fn http(&self) -> &MatcherHttp {
        &self.http
    }

    async fn current_market(&self) -> Result<Market, SdkError> {
        self.store
            .market()
            .await
            .ok_or_else(|| SdkError::Validation("no market selected".into()))
    }
}

/// Builder for [`TradingSession`].
pub struct TradingSessionBuilder {
    base_url: String,
    ws_url: String,
    wallet: Option<WalletStr>,
    ledger: Option<Arc<dyn Ledger>>,
    trade_cap: usize,
    coordinator_config: CoordinatorConfig,
    ws_config: Option<WsConfig>,
}

impl Default for TradingSessionBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            wallet: None,
            ledger: None,
            trade_cap: DEFAULT_TRADE_CAP,
            coordinator_config: CoordinatorConfig::default(),
            ws_config: None,
        }
    }
}

impl TradingSessionBuilder {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn ws_url(mut self, url: &str) -> Self {
        self.ws_url = url.to_string();
        self
    }

    pub fn wallet(mut self, wallet: WalletStr) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn ledger(mut self, ledger: Arc<dyn Ledger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Bound on the in-memory trade tape.
    pub fn trade_cap(mut self, cap: usize) -> Self {
        self.trade_cap = cap;
        self
    }

    pub fn matcher_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.coordinator_config.matcher_timeout = timeout;
        self
    }

    /// Full stream configuration; overrides `ws_url`.
    pub fn ws_config(mut self, config: WsConfig) -> Self {
        self.ws_config = Some(config);
        self
    }

    pub fn build(self) -> Result<TradingSession, SdkError> {
        let ledger = self
            .ledger
            .ok_or_else(|| SdkError::Validation("ledger is required".into()))?;
        let store = Arc::new(TradingStore::with_trade_cap(self.trade_cap));
        let http = Arc::new(MatcherHttp::new(&self.base_url)?);

        let coordinator = OrderCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&ledger),
            http.clone(),
            self.wallet.clone(),
            self.coordinator_config,
        );

        let ws_config = self.ws_config.unwrap_or_else(|| WsConfig {
            url: self.ws_url,
            ..WsConfig::default()
        });

        Ok(TradingSession {
            store,
            http,
            ledger,
            coordinator,
            wallet: self.wallet,
            ws_config,
            conn: tokio::sync::Mutex::new(None),
        })
    }
}
