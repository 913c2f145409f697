use ap2_mandate::WorkflowError;
use std::fmt;

use crate::{Page, SessionAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// `action` is not available on page `from`. The session is unchanged.
    IllegalTransition { from: Page, action: SessionAction },
    /// Selection attempted with nothing shortlisted.
    EmptyShortlist,
    UnknownProduct { product_id: String },
    /// The mandate workflow aborted. The session stays in checkout.
    Workflow(WorkflowError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::IllegalTransition { from, action } => {
                write!(f, "ILLEGAL_TRANSITION: cannot {action} from {from}")
            }
            SessionError::EmptyShortlist => write!(f, "EMPTY_SHORTLIST: nothing to select"),
            SessionError::UnknownProduct { product_id } => {
                write!(f, "UNKNOWN_PRODUCT: {product_id} is not in the shortlist")
            }
            SessionError::Workflow(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Workflow(e) => Some(e),
            _ => None,
        }
    }
}

impl From<WorkflowError> for SessionError {
    fn from(e: WorkflowError) -> Self {
        SessionError::Workflow(e)
    }
}
