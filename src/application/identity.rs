/// Source of the identity stamped on records as `last_modified_by`.
pub trait IdentitySource: Send + Sync {
    /// `None` when no actor is authenticated; stored as null.
    fn current_actor(&self) -> Option<String>;
}

/// Identity fixed at construction time, e.g. the operator running a CLI command.
#[derive(Debug, Clone, Default)]
pub struct FixedIdentity {
    actor: Option<String>,
}

impl FixedIdentity {
    pub fn new(actor: Option<String>) -> Self {
        let actor = actor.and_then(|value| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });
        Self { actor }
    }

    pub fn anonymous() -> Self {
        Self { actor: None }
    }
}

impl IdentitySource for FixedIdentity {
    fn current_actor(&self) -> Option<String> {
        self.actor.clone()
    }
}
