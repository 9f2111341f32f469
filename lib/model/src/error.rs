use oxiri::IriParseError;
use oxrdf::BlankNodeIdParseError;
use oxsdatatypes::{ParseDecimalError, TooLargeForDecimalError};
use std::fmt::{Debug, Display, Formatter};
use std::num::{ParseFloatError, ParseIntError, TryFromIntError};
use std::str::ParseBoolError;
use thiserror::Error;

/// A light-weight result, mainly used for evaluating expressions against a solution.
pub type ThinResult<T> = Result<T, ThinError>;

/// A thin error type that indicates an *expected* failure without any reason.
///
/// Evaluating an expression embedded in a generate query can fail in many ways. For example,
/// because a variable is not bound or because the input value had a different data type. These
/// errors are part of the evaluation: the affected binding is simply left out. As all of these
/// "expected" errors are treated equally, we do not need to store a reason.
#[derive(Clone, Copy, Debug, Default, Error, PartialEq, Eq)]
pub struct ThinError {}

impl ThinError {
    /// Creates a result with a [ThinError].
    pub fn expected<T>() -> ThinResult<T> {
        Err(ThinError::default())
    }
}

impl Display for ThinError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("An expected error occurred.")
    }
}

macro_rules! implement_from {
    ($t:ty) => {
        impl From<$t> for ThinError {
            fn from(_: $t) -> Self {
                ThinError::default()
            }
        }
    };
}

implement_from!(TooLargeForDecimalError);
implement_from!(ParseBoolError);
implement_from!(ParseIntError);
implement_from!(ParseFloatError);
implement_from!(ParseDecimalError);
implement_from!(BlankNodeIdParseError);
implement_from!(IriParseError);
implement_from!(TryFromIntError);
