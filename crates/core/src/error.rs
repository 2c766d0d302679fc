/// Where a predicate registration came from.
///
/// Duplicate names are only rejected within a single source batch; a module
/// and an inline block may register the same name and the later one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationSource {
    /// Built-in predicate table.
    Builtin,
    /// `predicate(...)` calls made directly on a schema block.
    Inline,
    /// A [`PredicateModule`](crate::predicate::PredicateModule) bundle.
    Module,
}

impl std::fmt::Display for RegistrationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin => f.write_str("builtin"),
            Self::Inline => f.write_str("inline"),
            Self::Module => f.write_str("module"),
        }
    }
}

/// Configuration defects raised while building or running a schema.
///
/// Invalid user input is never reported through this type; it ends up as
/// messages in a [`ValidationResult`](crate::result::ValidationResult).
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("+{name}+ is not a valid predicate name")]
    UnknownPredicate { name: String },

    #[error("Predicate {name} registered twice in the same {origin} batch")]
    DuplicateRegistration {
        name: String,
        origin: RegistrationSource,
    },

    #[error("No message found for predicate {predicate} (locale: {locale})")]
    MissingMessage { predicate: String, locale: String },

    #[error("Invalid arguments for predicate {predicate}: {reason}")]
    InvalidArguments { predicate: String, reason: String },
}
