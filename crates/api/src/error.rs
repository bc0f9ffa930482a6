//! hopdist error types.

use std::sync::Arc;

/// A clonable trait-object inner error.
#[derive(Clone, Default)]
pub struct DynInnerError(
    pub Option<Arc<dyn std::error::Error + 'static + Send + Sync>>,
);

impl std::fmt::Debug for DynInnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for DynInnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.as_ref() {
            None => f.write_str("None"),
            Some(s) => s.fmt(f),
        }
    }
}

impl std::error::Error for DynInnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.as_ref().map(|s| {
            let out: &(dyn std::error::Error + 'static) = &**s;
            out
        })
    }
}

impl DynInnerError {
    /// Construct a new DynInnerError from a source error.
    pub fn new<E: std::error::Error + 'static + Send + Sync>(e: E) -> Self {
        Self(Some(Arc::new(e)))
    }
}

/// The core hopdist error type.
///
/// This type is `Clone` so that a single collective failure can be
/// handed to every rank waiting on the same operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HdError {
    /// A participant did not enter a collective operation in time.
    /// The group is unusable afterwards.
    #[error("collective {op} timed out at rank {rank}")]
    CollectiveTimeout {
        /// The collective operation that stalled.
        op: &'static str,

        /// The rank that observed the timeout.
        rank: usize,
    },

    /// Participants entered different collective operations.
    #[error("collective desync: {ctx}")]
    Desync {
        /// Description of the mismatch.
        ctx: Arc<str>,
    },

    /// Generic hopdist internal error.
    #[error("{ctx} (src: {src})")]
    Other {
        /// Any context associated with this error.
        ctx: Arc<str>,

        /// The inner error (if any).
        #[source]
        src: DynInnerError,
    },
}

impl HdError {
    /// Construct an "other" error with an inner source error.
    pub fn other_src<
        C: std::fmt::Display,
        S: std::error::Error + 'static + Send + Sync,
    >(
        ctx: C,
        src: S,
    ) -> Self {
        Self::Other {
            ctx: ctx.to_string().into_boxed_str().into(),
            src: DynInnerError::new(src),
        }
    }

    /// Construct an "other" error.
    pub fn other<C: std::fmt::Display>(ctx: C) -> Self {
        Self::Other {
            ctx: ctx.to_string().into_boxed_str().into(),
            src: DynInnerError::default(),
        }
    }

    /// Construct a desync error.
    pub fn desync<C: std::fmt::Display>(ctx: C) -> Self {
        Self::Desync {
            ctx: ctx.to_string().into_boxed_str().into(),
        }
    }

    /// True if this is a [HdError::CollectiveTimeout].
    pub fn is_collective_timeout(&self) -> bool {
        matches!(self, Self::CollectiveTimeout { .. })
    }
}

impl From<HdError> for std::io::Error {
    fn from(err: HdError) -> Self {
        std::io::Error::other(err)
    }
}

/// The core hopdist result type.
pub type HdResult<T> = Result<T, HdError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            "bla (src: None)",
            HdError::other("bla").to_string().as_str(),
        );
        assert_eq!(
            "foo (src: bar)",
            HdError::other_src("foo", std::io::Error::other("bar"))
                .to_string()
                .as_str(),
        );
        assert_eq!(
            "collective all_reduce_sum timed out at rank 3",
            HdError::CollectiveTimeout {
                op: "all_reduce_sum",
                rank: 3,
            }
            .to_string()
            .as_str(),
        );
        assert_eq!(
            "collective desync: broadcast vs all_reduce_sum",
            HdError::desync("broadcast vs all_reduce_sum")
                .to_string()
                .as_str(),
        );
    }

    #[test]
    fn error_debug() {
        assert_eq!(
            "Other { ctx: \"bla\", src: None }",
            format!("{:?}", HdError::other("bla")).as_str(),
        );
    }

    #[test]
    fn timeout_is_distinguishable() {
        assert!(HdError::CollectiveTimeout {
            op: "broadcast",
            rank: 0
        }
        .is_collective_timeout());
        assert!(!HdError::other("bla").is_collective_timeout());
    }

    #[test]
    fn ensure_hderror_type_is_send_and_sync() {
        fn ensure<T: std::fmt::Display + Send + Sync>(_t: T) {}
        ensure(HdError::other("bla"));
    }
}
