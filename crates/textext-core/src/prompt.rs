//! The interactive input collaborator.

/// Values the user edits when no text was given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptValues {
    pub text: String,
    pub preamble_file: String,
    pub scale_factor: f64,
}

/// Asks the user for markup.
///
/// Implementations block until the user answers. `None` means the user
/// cancelled, and the session stops without running any tool.
pub trait TextPrompt {
    fn ask(&mut self, initial: PromptValues) -> Option<PromptValues>;
}

/// Prompt that always cancels, for non-interactive use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl TextPrompt for NoPrompt {
    fn ask(&mut self, _initial: PromptValues) -> Option<PromptValues> {
        None
    }
}

impl<F> TextPrompt for F
where
    F: FnMut(PromptValues) -> Option<PromptValues>,
{
    fn ask(&mut self, initial: PromptValues) -> Option<PromptValues> {
        self(initial)
    }
}
