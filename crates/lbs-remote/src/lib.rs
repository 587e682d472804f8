mod executor;
mod fetch;
mod metadata;

pub use executor::BuildExecutor;
pub use executor::BuildHandle;
pub use executor::BuildResult;
pub use executor::ExecutorError;
pub use executor::JobSpec;
pub use fetch::FetchError;
pub use fetch::HttpLocaleSource;
pub use fetch::LocaleSource;
pub use metadata::Forest;
pub use metadata::MetadataService;
pub use metadata::Push;
pub use metadata::Repository;

/// Placeholder revision used when a repository has no resolvable
/// changeset on the `default` line.
pub const NULL_REVISION: &str = "000000000000";
