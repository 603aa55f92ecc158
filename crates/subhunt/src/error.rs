use derive_more::From;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, From)]
pub enum Error {
    // -- Run aborting
    CliUsage(String),
    InvalidDomain(String),
    MissingDependency(Vec<String>),
    Interrupted,

    // -- Absorbed into a source result
    SourceTimeout { partial: String },
    ToolExit { program: String, code: Option<i32> },
    InvalidHttpResponse(String),
    TransientStatus(u16),

    // -- Externals
    #[from]
    SystemTime(std::time::SystemTimeError),

    #[from]
    Io(std::io::Error),

    #[from]
    Fmt(std::fmt::Error),

    #[from]
    Reqwest(reqwest::Error),

    #[from]
    SerdeJson(serde_json::Error),

    #[from]
    TimeFormat(time::error::Format),

    #[from]
    TracingGlobal(tracing::subscriber::SetGlobalDefaultError),
}

impl Error {
    /// Errors worth another attempt against an HTTP source.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::TransientStatus(_) => true,
            Error::Reqwest(err) => err.is_connect() || err.is_timeout(),
            _ => false,
        }
    }
}

// region:    --- Error Boilerplate

impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        match self {
            Error::InvalidDomain(input) => write!(fmt, "Invalid domain format: {input:?}"),
            Error::MissingDependency(programs) => {
                write!(fmt, "Missing dependencies: {}", programs.join(" "))
            }
            Error::SourceTimeout { partial } => {
                write!(fmt, "Budget exceeded ({} bytes captured)", partial.len())
            }
            Error::ToolExit {
                program,
                code: Some(code),
            } => write!(fmt, "{program} exited with status {code}"),
            Error::ToolExit {
                program,
                code: None,
            } => write!(fmt, "{program} terminated by signal"),
            Error::InvalidHttpResponse(detail) => write!(fmt, "Invalid HTTP response: {detail}"),
            Error::TransientStatus(code) => write!(fmt, "Server kept answering {code}"),
            Error::Reqwest(err) => write!(fmt, "{err}"),
            _ => write!(fmt, "{self:?}"),
        }
    }
}

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
