//! Error taxonomy for orchestrated edits.
//!
//! Reconciliation itself has no failure mode; these cover the flows around it.

/// A user-side precondition that aborts a flow before any generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("No active editor")]
    NoActiveEditor,

    #[error("No code selected")]
    NoSelection,

    #[error("No valid range to edit")]
    NoRange,
}

#[derive(Debug, thiserror::Error)]
pub enum SpliceError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// Network, quota or malformed-response failures from the generation service.
    #[error(transparent)]
    Generation(#[from] anyhow::Error),

    /// The service answered but no code block could be pulled out of it.
    #[error("No code block found in the response. Please try again.")]
    Extraction,
}

impl SpliceError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, SpliceError::Precondition(_))
    }

    /// Readable text for the user-visible message surface.
    pub fn user_message(&self) -> String {
        match self {
            SpliceError::Generation(err) => {
                let text = err.to_string();
                if text.trim().is_empty() {
                    format!("Failed to generate code: {:?}", err)
                } else {
                    text
                }
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_messages_are_distinct() {
        let messages = [
            SpliceError::from(PreconditionError::NoActiveEditor).user_message(),
            SpliceError::from(PreconditionError::NoSelection).user_message(),
            SpliceError::from(PreconditionError::NoRange).user_message(),
        ];
        assert_eq!(messages[0], "No active editor");
        assert_eq!(messages[1], "No code selected");
        assert_ne!(messages[1], messages[2]);
    }

    #[test]
    fn test_generation_error_keeps_source_text() {
        let err = SpliceError::from(anyhow::anyhow!("Rate limited"));
        assert!(!err.is_precondition());
        assert_eq!(err.user_message(), "Rate limited");
    }
}
