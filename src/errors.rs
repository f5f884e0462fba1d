use thiserror::Error;

/// Node error code reported when the wallet cannot cover the requested outputs
pub const RPC_WALLET_INSUFFICIENT_FUNDS: i64 = -4;

/// Node error code reported for a transaction id the wallet does not know
pub const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;

/// Application-wide error type - single point of truth
#[derive(Error, Debug)]
pub enum AppError {
    /// Bitcoin RPC operations
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// Payment service operations
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Message broker operations
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    /// Configuration issues
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation/parsing
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// RPC error types
#[derive(Error, Debug)]
pub enum RpcError {
    /// Transport could not reach the node or the node refused the request
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Node answered with a non-success HTTP status and no JSON-RPC body
    #[error("HTTP {status} from node for '{command}'")]
    Http { command: String, status: u16 },

    /// Node reported an error for the command
    #[error("Bitcoind '{command}' error{}: {message}", code_suffix(.code))]
    Node {
        command: String,
        code: Option<i64>,
        message: String,
    },

    /// Failed to deserialise RPC response data
    #[error("Deserialisation failed: {0}")]
    DeserialisationFailed(String),

    /// RPC returned unexpected or malformed response data
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(" ({})", c)).unwrap_or_default()
}

impl RpcError {
    /// Node error code, when the node supplied one
    pub fn code(&self) -> Option<i64> {
        match self {
            RpcError::Node { code, .. } => *code,
            _ => None,
        }
    }

    pub fn is_insufficient_funds(&self) -> bool {
        self.code() == Some(RPC_WALLET_INSUFFICIENT_FUNDS)
    }

    pub fn is_unrecognised_tx_id(&self) -> bool {
        self.code() == Some(RPC_INVALID_ADDRESS_OR_KEY)
    }
}

/// Stable error taxonomy surfaced to payment service callers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Wallet is temporarily unable to serve the request (insufficient funds)
    #[error("Bitcoind '{command}' unavailable: {message}")]
    Unavailable { command: String, message: String },

    /// Terminal failure of the current operation
    #[error("{message}")]
    Failed {
        command: Option<String>,
        code: Option<i64>,
        message: String,
    },

    /// Amount or configuration rules out the operation before any RPC call
    #[error("Ineligible: {0}")]
    Ineligible(String),

    /// Node response could not be reshaped into a domain value
    #[error("Invalid node data: {0}")]
    InvalidData(String),
}

impl PaymentError {
    pub fn failed(message: impl Into<String>) -> Self {
        PaymentError::Failed {
            command: None,
            code: None,
            message: message.into(),
        }
    }

    /// Node error code carried by a `Failed` error
    pub fn code(&self) -> Option<i64> {
        match self {
            PaymentError::Failed { code, .. } => *code,
            _ => None,
        }
    }
}

/// Money parsing and conversion errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("Unknown currency in amount '{0}'")]
    UnknownCurrency(String),

    #[error("Invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("Amount '{0}' is more precise than the milli-satoshi unit")]
    TooPrecise(String),

    #[error("Amount overflow")]
    Overflow,
}

/// Failures while turning a broker delivery into a domain event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("Message body is empty")]
    EmptyBody,

    #[error("Message has no timestamp property")]
    MissingTimestamp,

    #[error("Message timestamp {0} is out of range")]
    InvalidTimestamp(u64),

    #[error("Invalid message data: {0}")]
    InvalidData(String),
}

/// Failures while placing a domain event on the internal event channel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("No subscribers on channel '{0}'")]
    NoSubscribers(String),

    #[error("Unknown channel '{0}'")]
    UnknownChannel(String),
}

/// Anything that makes a single delivery unprocessable
///
/// These are deterministic for a given message, so the delivery is rejected
/// without requeue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlingError {
    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Broker client errors
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Broker connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Broker channel error: {0}")]
    Channel(String),

    #[error("Consumer is not started")]
    NotConsuming,
}

impl From<lapin::Error> for BrokerError {
    fn from(err: lapin::Error) -> Self {
        BrokerError::Channel(err.to_string())
    }
}

/// Application-wide result type - single point of truth
pub type AppResult<T> = Result<T, AppError>;

/// Result type for RPC operations
pub type RpcResult<T> = Result<T, RpcError>;

/// Result type for payment service operations
pub type PaymentResult<T> = Result<T, PaymentError>;

/// Result type for broker operations
pub type BrokerResult<T> = Result<T, BrokerError>;

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::DeserialisationFailed(err.to_string())
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        RpcError::ConnectionFailed(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<CurrencyError> for AppError {
    fn from(err: CurrencyError) -> Self {
        AppError::InvalidData(err.to_string())
    }
}

impl From<CurrencyError> for PaymentError {
    fn from(err: CurrencyError) -> Self {
        PaymentError::InvalidData(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidData(format!("JSON error: {}", err))
    }
}
