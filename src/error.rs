use alloc::string::String;

/// Coarse outcome of a load, as reported to callers that only care about the
/// category of failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    BadFile,
    OutOfMemory,
}

/// Errors from probing, allocating, and decoding a PNG.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("bad file: {0}")]
    BadFile(String),

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// The decode library hit an unrecoverable error mid-stream. Its state is
    /// unspecified afterwards, so the whole load is abandoned.
    #[error("fatal decode error: {0}")]
    Fatal(String),

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },
}

impl LoadError {
    /// Map this error onto the three-way [`Status`].
    pub fn status(&self) -> Status {
        match self {
            Self::BadFile(_) | Self::Fatal(_) | Self::DimensionsTooLarge { .. } => {
                Status::BadFile
            }
            Self::OutOfMemory(_) | Self::LimitExceeded(_) => Status::OutOfMemory,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

impl<T> From<&Result<T, LoadError>> for Status {
    fn from(r: &Result<T, LoadError>) -> Self {
        match r {
            Ok(_) => Status::Ok,
            Err(e) => e.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_of_results() {
        assert_eq!(Status::from(&Ok::<u8, LoadError>(1)), Status::Ok);
        assert_eq!(
            Status::from(&Err::<(), _>(LoadError::Fatal("row".into()))),
            Status::BadFile
        );
        assert_eq!(
            Status::from(&Err::<(), _>(LoadError::LimitExceeded("mem".into()))),
            Status::OutOfMemory
        );
        assert_eq!(
            Status::from(&Err::<(), _>(LoadError::DimensionsTooLarge {
                width: u32::MAX,
                height: 2
            })),
            Status::BadFile
        );
    }
}
