//! The crate's top-level error type, aggregating every module's
//! narrower error into one `Result` applications can match on.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::bytestream::StreamError;
use crate::class::ClassError;
use crate::codec::CodecError;
use crate::container::ContainerError;

/// The error type returned by every fallible, application-facing
/// operation in this crate.
#[derive(Debug)]
pub enum HxError {
    /// A byte-stream read or write overran its buffer.
    Stream(StreamError),
    /// A class failed to parse or validate.
    Class(ClassError),
    /// An audio format conversion failed.
    Codec(CodecError),
    /// A container-level read or write failed.
    Container(ContainerError),
}

impl Display for HxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Stream(e) => write!(f, "{e}"),
            Self::Class(e) => write!(f, "{e}"),
            Self::Codec(e) => write!(f, "{e}"),
            Self::Container(e) => write!(f, "{e}"),
        }
    }
}

impl Error for HxError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Stream(e) => Some(e),
            Self::Class(e) => Some(e),
            Self::Codec(e) => Some(e),
            Self::Container(e) => Some(e),
        }
    }
}

impl From<StreamError> for HxError {
    fn from(e: StreamError) -> Self {
        Self::Stream(e)
    }
}

impl From<ClassError> for HxError {
    fn from(e: ClassError) -> Self {
        Self::Class(e)
    }
}

impl From<CodecError> for HxError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

impl From<ContainerError> for HxError {
    fn from(e: ContainerError) -> Self {
        Self::Container(e)
    }
}

#[cfg(test)]
mod test {
    use super::HxError;
    use crate::codec::CodecError;

    #[test]
    fn wraps_and_displays_inner_error() {
        let inner = CodecError::invalid_wave_header("missing RIFF tag");
        let err: HxError = inner.into();
        assert!(format!("{err}").contains("missing RIFF tag"));
    }
}
