use thiserror::Error;

use crate::evaluator::UnresolvedListError;
use crate::validation::ConfigurationError;

/// Why a rule run aborted. No findings are produced on either.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    UnresolvedList(#[from] UnresolvedListError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
