//! Emulator configuration.

use crate::{error::EmulatorError, logging::LogLevel, state::StackLayout};

/// Whether the loop checks the stack pointer after every instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StackPolicy {
    /// SP arithmetic is never checked.
    #[default]
    Unchecked,
    /// SP must stay within `[stack_base, stack_end]` or the step fails with
    /// [`EmulatorError::StackOverflow`](crate::EmulatorError::StackOverflow).
    Checked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorConfig {
    /// Capacity of the emulated stack in 64-bit words.
    pub stack_words: usize,
    /// Emulated address of stack slot 0.
    pub stack_base: u64,
    pub stack_policy: StackPolicy,
    /// Optional instruction budget; `None` runs until return.
    pub max_instructions: Option<u64>,
    pub log_level: LogLevel,
}

impl EmulatorConfig {
    pub const DEFAULT_STACK_WORDS: usize = 1024;
    pub const DEFAULT_STACK_BASE: u64 = 0x8000_0000;

    /// Validate `stack_base` and `stack_words` into a [`StackLayout`].
    pub fn stack_layout(&self) -> Result<StackLayout, EmulatorError> {
        StackLayout::new(self.stack_base, self.stack_words)
    }
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            stack_words: Self::DEFAULT_STACK_WORDS,
            stack_base: Self::DEFAULT_STACK_BASE,
            stack_policy: StackPolicy::Unchecked,
            max_instructions: None,
            log_level: LogLevel::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MAX_STACK_WORDS;

    #[test]
    fn test_default_layout() {
        let layout = EmulatorConfig::default().stack_layout().unwrap();
        assert_eq!(layout, StackLayout::default());
        assert_eq!(layout.end(), 0x8000_0000 + 1024 * 8);
    }

    #[test]
    fn test_stack_past_top_of_address_space_rejected() {
        let config = EmulatorConfig {
            stack_base: u64::MAX - 7,
            stack_words: 2,
            ..EmulatorConfig::default()
        };
        assert_eq!(
            config.stack_layout(),
            Err(EmulatorError::InvalidStackLayout {
                base: u64::MAX - 7,
                words: 2,
                limit: MAX_STACK_WORDS,
            })
        );

        // the initial SP of a single word would sit one past u64::MAX
        let config = EmulatorConfig {
            stack_base: u64::MAX - 7,
            stack_words: 1,
            ..EmulatorConfig::default()
        };
        assert!(config.stack_layout().is_err());
    }

    #[test]
    fn test_oversized_stack_rejected() {
        let config = EmulatorConfig {
            stack_words: MAX_STACK_WORDS + 1,
            ..EmulatorConfig::default()
        };
        assert!(matches!(
            config.stack_layout(),
            Err(EmulatorError::InvalidStackLayout { .. })
        ));

        let config = EmulatorConfig {
            stack_words: usize::MAX,
            stack_base: 0,
            ..EmulatorConfig::default()
        };
        assert!(config.stack_layout().is_err());

        let config = EmulatorConfig {
            stack_words: MAX_STACK_WORDS,
            ..EmulatorConfig::default()
        };
        assert!(config.stack_layout().is_ok());
    }
}
