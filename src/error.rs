use std::fmt;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug)]
pub enum Error {
    ManifestNotResolved,
    NotInitialized,
    WalletNotConnected,
    WalletAlreadyConnected,
    InvalidAmount(f64),
    Protocol(String),
    HttpStatus { status: u16, reason: String },
    Stream(String),
    Url(url::ParseError),
    Reqwest(reqwest::Error),
    SerdeJsonError(serde_json::Error),
    Io(std::io::Error),
    Anyhow(anyhow::Error),
    InternalError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ManifestNotResolved => write!(
                f,
                "dApp manifest url is not configured, enable test mode or set the dapp config"
            ),
            Error::NotInitialized => write!(f, "sdk is not initialized"),
            Error::WalletNotConnected => write!(f, "wallet is not connected"),
            Error::WalletAlreadyConnected => write!(f, "wallet is already connected"),
            Error::InvalidAmount(amount) => write!(f, "invalid ton amount: {amount}"),
            Error::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Error::HttpStatus { status, reason } => {
                write!(f, "http error {status}: {reason}")
            }
            Error::Stream(msg) => write!(f, "SSE request error: {msg}"),
            Error::Url(e) => write!(f, "invalid url: {e}"),
            Error::Reqwest(e) => write!(f, "request failed: {e}"),
            Error::SerdeJsonError(e) => write!(f, "json error: {e}"),
            Error::Io(e) => write!(f, "io error: {e}"),
            Error::Anyhow(e) => write!(f, "{e}"),
            Error::InternalError(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::InternalError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::InternalError(e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Url(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Reqwest(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerdeJsonError(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Anyhow(e)
    }
}
