use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Invalid boolean '{value}'. Expected true/false, yes/no, on/off, or 1/0.")]
    InvalidBoolean { value: String },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Value must be <= {max}.")]
    ValueTooLarge { max: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Missing --urls (set it on the command line or in the config file).")]
    MissingUrlFile,
    #[error("The work item list is empty.")]
    EmptyWorkItems,
    #[error("Work item line {line} is invalid: {reason}")]
    InvalidWorkItem { line: usize, reason: String },
    #[error("Work item '{input}' has no URL.")]
    WorkItemMissingUrl { input: String },
    #[error("Work item '{input}' has more than one URL.")]
    WorkItemExtraUrl { input: String },
    #[error("Flag '{flag}' is missing its value.")]
    WorkItemDanglingFlag { flag: String },
    #[error("Unknown work item flag '{flag}'.")]
    WorkItemUnknownFlag { flag: String },
    #[error("Unsupported HTTP verb '{verb}'.")]
    UnsupportedVerb { verb: String },
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported URL scheme '{scheme}'. Use http or https.")]
    UnsupportedScheme { scheme: String },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
