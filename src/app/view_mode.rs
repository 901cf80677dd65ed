//! View mode enum for application state
//!
//! Only one mode is active at a time. The mode decides how keyboard input
//! is handled and which dialog is drawn over the main screen.

/// The current view/input mode of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Main screen: selection, core selector and bindings (default mode)
    #[default]
    Main,

    /// Process list for choosing a target
    ProcessPicker,

    /// Typing a filter for the process list
    FilterInput,

    /// Waiting for the key combination of a new binding
    CaptureKey,

    /// Choosing the core count of a new binding
    ChooseCores,

    /// Help overlay showing keyboard shortcuts
    Help,
}

impl ViewMode {
    /// True if registered hotkeys fire from terminal input in this mode.
    ///
    /// Text entry and key capture take every key for themselves.
    #[inline]
    pub fn accepts_hotkeys(&self) -> bool {
        matches!(self, ViewMode::Main | ViewMode::ProcessPicker)
    }

    /// True while the process list is on screen
    #[inline]
    pub fn shows_picker(&self) -> bool {
        matches!(self, ViewMode::ProcessPicker | ViewMode::FilterInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_swallow_hotkeys() {
        assert!(ViewMode::Main.accepts_hotkeys());
        assert!(ViewMode::ProcessPicker.accepts_hotkeys());
        assert!(!ViewMode::FilterInput.accepts_hotkeys());
        assert!(!ViewMode::CaptureKey.accepts_hotkeys());
        assert!(!ViewMode::ChooseCores.accepts_hotkeys());
    }
}
