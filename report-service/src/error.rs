use time::Date;

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("invalid range: end {end} precedes start {start}")]
    InvalidRange { start: Date, end: Date },
    #[error("start and end dates must be supplied together")]
    IncompleteRange,
    #[error("range of {days} days exceeds the {max} days one sheet can hold")]
    RangeTooLong { days: usize, max: usize },
    #[error("report template missing: {0}")]
    TemplateMissing(String),
    #[error("no feeders found for the requested selection")]
    NoFeedersFound,
    #[error("{kind} '{name}' not found")]
    LookupNotFound { kind: &'static str, name: String },
    #[error(transparent)]
    Store(#[from] anyhow::Error),
    #[error("render error: {0}")]
    Render(#[from] rust_xlsxwriter::XlsxError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("delivery failed: {0}")]
    Delivery(anyhow::Error),
}

impl ReportError {
    /// Conditions the caller should surface as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReportError::NoFeedersFound | ReportError::LookupNotFound { .. })
    }

    /// Conditions caused by the request parameters themselves.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            ReportError::InvalidRange { .. }
                | ReportError::IncompleteRange
                | ReportError::RangeTooLong { .. }
        )
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
