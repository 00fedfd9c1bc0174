use derive_more::From;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, From)]
pub enum Error {
    // -- Input
    InvalidDomain(String),
    CliUsage(String),

    // -- Config
    Config(String),

    #[from]
    InvalidRegex(regex::Error),

    // -- Fetch
    MalformedRequest(String),
    HttpStatus(u16),
    FetchExhausted {
        attempts: usize,
        last: Box<Error>,
    },

    // -- Parse
    MalformedResponse(String),

    // -- Externals
    #[from]
    File(std::io::Error),

    #[from]
    Reqwest(reqwest::Error),

    #[from]
    Json(serde_json::Error),

    #[from]
    Csv(csv::Error),

    #[from]
    TimeFormat(time::error::Format),

    #[from]
    Tracing(tracing::subscriber::SetGlobalDefaultError),
}

impl Error {
    /// Errors worth another attempt when talking to the CDX endpoint.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Reqwest(_) | Error::HttpStatus(_))
    }
}

// region:    --- Error Boilerplate

impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        match self {
            Error::InvalidDomain(input) => write!(fmt, "invalid domain: {input:?}"),
            Error::InvalidRegex(err) => write!(fmt, "invalid filter pattern: {err}"),
            Error::Config(reason) => write!(fmt, "invalid configuration: {reason}"),
            Error::MalformedRequest(reason) => write!(fmt, "malformed request: {reason}"),
            Error::HttpStatus(status) => write!(fmt, "unexpected HTTP status {status}"),
            Error::FetchExhausted { attempts, last } => {
                write!(fmt, "fetch failed after {attempts} attempt(s): {last}")
            }
            Error::MalformedResponse(reason) => write!(fmt, "malformed CDX response: {reason}"),
            Error::Reqwest(err) => write!(fmt, "{err}"),
            Error::File(err) => write!(fmt, "{err}"),
            _ => write!(fmt, "{self:?}"),
        }
    }
}

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
