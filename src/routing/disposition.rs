//! What to do after a failed attempt.

use crate::work::domain::ResponseErrorKind;

/// Next step after an attempt failed and its retries are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Try the next provider in the precomputed fallback chain.
    AdvanceFallback,
    /// The whole capability class is gone; compute a fresh plan.
    Reroute,
}

impl FailureDisposition {
    /// Classifies a failure kind.
    #[must_use]
    pub const fn for_error(kind: ResponseErrorKind) -> Self {
        match kind {
            ResponseErrorKind::CapabilityUnavailable => Self::Reroute,
            _ => Self::AdvanceFallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ResponseErrorKind::CapabilityUnavailable, FailureDisposition::Reroute)]
    #[case(ResponseErrorKind::Timeout, FailureDisposition::AdvanceFallback)]
    #[case(ResponseErrorKind::UnsupportedOperation, FailureDisposition::AdvanceFallback)]
    #[case(ResponseErrorKind::ConnectionRefused, FailureDisposition::AdvanceFallback)]
    fn only_capability_class_failures_reroute(
        #[case] kind: ResponseErrorKind,
        #[case] expected: FailureDisposition,
    ) {
        assert_eq!(FailureDisposition::for_error(kind), expected);
    }
}
