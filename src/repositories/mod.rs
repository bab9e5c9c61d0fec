pub mod labels;
pub mod sites;

pub use labels::{LabelRepository, LabelRepositoryTrait};
pub use sites::{SiteRepository, SiteRepositoryTrait};

/// Whether an error from a repository call is a Postgres unique-constraint
/// violation. Callers translate these into conflict responses: duplicate
/// site URLs and label-creation races both surface this way.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.code().as_deref() == Some("23505"))
}
