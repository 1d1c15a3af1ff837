//! Three-valued resolution outcome.
//!
//! A resolver that recognizes its question answers with one of the variants
//! here; a resolver that does not recognize the question returns `None`
//! instead, which is not an error and lets the dispatcher try the next
//! resolver in line.

use super::{Repo, RepoKind};

/// The outcome of one resolver step.
///
/// `DoesNotExist` is a value, never an error: the resolver recognized the
/// question and proved the referent absent. It halts recursion but resolves
/// the pipeline successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// The resolver affirmatively confirmed existence with a verifying side
    /// effect (a 200 probe, an `ls-remote` that resolved the ref, ...).
    Exists(Repo),
    /// The resolver parsed the question into a descriptor but did not (or
    /// could not cheaply) confirm existence.
    MaybeExists(Repo),
    /// The resolver proved the referent absent. `kind` names the descriptor
    /// variant that was being sought.
    DoesNotExist { kind: RepoKind, message: String },
}

impl Answer {
    /// The descriptor this answer carries, if any.
    #[must_use]
    pub fn repo(&self) -> Option<&Repo> {
        match self {
            Answer::Exists(repo) | Answer::MaybeExists(repo) => Some(repo),
            Answer::DoesNotExist { .. } => None,
        }
    }

    #[must_use]
    pub fn is_does_not_exist(&self) -> bool {
        matches!(self, Answer::DoesNotExist { .. })
    }

    /// The certainty label used in output. The `certainity` spelling in the
    /// canonical JSON is intentional and stable; see [`super::serialize`].
    #[must_use]
    pub const fn certainty(&self) -> &'static str {
        match self {
            Answer::Exists(_) => "Exists",
            Answer::MaybeExists(_) => "MaybeExists",
            Answer::DoesNotExist { .. } => "DoesNotExist",
        }
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Answer::Exists(repo) | Answer::MaybeExists(repo) => {
                write!(f, "{}({repo})", self.certainty())
            }
            Answer::DoesNotExist { kind, message } => {
                write!(f, "DoesNotExist({}, {message})", kind.name())
            }
        }
    }
}
