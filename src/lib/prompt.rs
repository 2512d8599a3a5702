//! Interactive yes/no confirmation.

use dialoguer::Confirm as DialoguerConfirm;

use crate::lib::errors::PromptError;

/// Asks the operator a yes/no question.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> Result<bool, PromptError>;
}

impl<T: Confirm + ?Sized> Confirm for &T {
    fn confirm(&self, prompt: &str) -> Result<bool, PromptError> {
        (**self).confirm(prompt)
    }
}

/// Terminal prompt; the default answer is "no".
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool, PromptError> {
        DialoguerConfirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|err| PromptError {
                message: err.to_string(),
            })
    }
}
