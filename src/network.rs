//! Network URL constants for the dcex SDK.

/// Default matcher REST API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// Default matcher WebSocket URL.
pub const DEFAULT_WS_URL: &str = "ws://localhost:3001/ws";

/// Default Solana RPC URL.
pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";
