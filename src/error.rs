pub type ConvertResult<T> = Result<T, ConvertError>;

#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("not an animated PNG ({0} frame(s) declared)")]
    NotAnimated(u32),

    #[error("resource exhausted: {0}")]
    Resource(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConvertError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

impl From<png::DecodingError> for ConvertError {
    fn from(err: png::DecodingError) -> Self {
        match err {
            png::DecodingError::IoError(e) => Self::Io(e),
            png::DecodingError::LimitsExceeded => {
                Self::Resource("png decoder limits exceeded".to_string())
            }
            other => Self::Malformed(other.to_string()),
        }
    }
}

impl From<webp_animation::Error> for ConvertError {
    fn from(err: webp_animation::Error) -> Self {
        Self::Encode(format!("{err:?}"))
    }
}
