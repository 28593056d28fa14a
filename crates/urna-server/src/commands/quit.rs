use super::CommandOutput;
use crate::engine::TerminationReason;

/// `quit`: no output; the session ends after `+OK`.
pub(super) fn process() -> CommandOutput {
    CommandOutput::terminate(TerminationReason::Quit)
}
