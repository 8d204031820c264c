//! Keystroke injection using the Windows SendInput API
//!
//! Text goes in as Unicode key events, so no clipboard is involved and any
//! character the field accepts can be typed.

use crate::error::{AutomationError, Result};
use std::time::Duration;

#[cfg(target_os = "windows")]
use std::thread;
#[cfg(target_os = "windows")]
use tracing::debug;

#[cfg(target_os = "windows")]
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
    KEYEVENTF_UNICODE, VIRTUAL_KEY, VK_A, VK_CONTROL, VK_MENU, VK_RETURN, VK_SHIFT,
};

/// Delay between keystrokes in milliseconds
const KEYSTROKE_DELAY_MS: u64 = 5;

/// Sends keyboard input to whatever element has focus
pub struct InputInjector {
    #[cfg_attr(not(target_os = "windows"), allow(dead_code))]
    keystroke_delay: Duration,
}

impl InputInjector {
    /// Injector with the default pause between characters
    pub fn new() -> Self {
        Self {
            keystroke_delay: Duration::from_millis(KEYSTROKE_DELAY_MS),
        }
    }

    #[cfg(target_os = "windows")]
    fn key_event(vk: VIRTUAL_KEY, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: vk,
                    wScan: scan,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    #[cfg(target_os = "windows")]
    fn send(&self, inputs: &[INPUT], what: &str) -> Result<()> {
        let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            return Err(AutomationError::InputInjectionFailed(format!(
                "SendInput accepted {} of {} events for {}",
                sent,
                inputs.len(),
                what
            )));
        }
        Ok(())
    }

    /// Release Ctrl, Alt and Shift so they cannot combine with typed keys
    #[cfg(target_os = "windows")]
    pub fn release_modifiers(&self) -> Result<()> {
        debug!("Releasing modifier keys (Ctrl, Alt, Shift)");

        let inputs: Vec<INPUT> = [VK_CONTROL, VK_MENU, VK_SHIFT]
            .into_iter()
            .map(|vk| Self::key_event(vk, 0, KEYEVENTF_KEYUP))
            .collect();
        self.send(&inputs, "modifier release")?;

        thread::sleep(Duration::from_millis(30));
        Ok(())
    }

    /// Type `text` as Unicode keystrokes into the focused control
    #[cfg(target_os = "windows")]
    pub fn type_string(&self, text: &str) -> Result<()> {
        self.release_modifiers()?;
        debug!("Typing {} characters", text.chars().count());

        // UTF-16 units, so characters outside the BMP go in as surrogate pairs
        for unit in text.encode_utf16() {
            let inputs = [
                Self::key_event(VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE),
                Self::key_event(VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP),
            ];
            self.send(&inputs, "character")?;
            thread::sleep(self.keystroke_delay);
        }

        Ok(())
    }

    /// Ctrl+A, selecting the current field content so typing replaces it
    #[cfg(target_os = "windows")]
    pub fn select_all(&self) -> Result<()> {
        debug!("Selecting existing field content");

        let inputs = [
            Self::key_event(VK_CONTROL, 0, KEYBD_EVENT_FLAGS(0)),
            Self::key_event(VK_A, 0, KEYBD_EVENT_FLAGS(0)),
            Self::key_event(VK_A, 0, KEYEVENTF_KEYUP),
            Self::key_event(VK_CONTROL, 0, KEYEVENTF_KEYUP),
        ];
        self.send(&inputs, "Ctrl+A")?;

        thread::sleep(Duration::from_millis(100));
        Ok(())
    }

    /// Press and release Enter
    #[cfg(target_os = "windows")]
    pub fn press_enter(&self) -> Result<()> {
        self.release_modifiers()?;
        debug!("Pressing Enter key");

        let inputs = [
            Self::key_event(VK_RETURN, 0, KEYBD_EVENT_FLAGS(0)),
            Self::key_event(VK_RETURN, 0, KEYEVENTF_KEYUP),
        ];
        self.send(&inputs, "Enter")
    }

    // Non-Windows stub implementations
    #[cfg(not(target_os = "windows"))]
    pub fn release_modifiers(&self) -> Result<()> {
        Ok(())
    }

    #[cfg(not(target_os = "windows"))]
    pub fn type_string(&self, _text: &str) -> Result<()> {
        Err(AutomationError::InputInjectionFailed(
            "Input injection is only supported on Windows".to_string(),
        ))
    }

    #[cfg(not(target_os = "windows"))]
    pub fn select_all(&self) -> Result<()> {
        Err(AutomationError::InputInjectionFailed(
            "Input injection is only supported on Windows".to_string(),
        ))
    }

    #[cfg(not(target_os = "windows"))]
    pub fn press_enter(&self) -> Result<()> {
        Err(AutomationError::InputInjectionFailed(
            "Input injection is only supported on Windows".to_string(),
        ))
    }
}

impl Default for InputInjector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injector_creation() {
        let injector = InputInjector::new();
        assert_eq!(injector.keystroke_delay, Duration::from_millis(5));
        assert_eq!(InputInjector::default().keystroke_delay, injector.keystroke_delay);
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_typing_fails_off_windows() {
        let injector = InputInjector::new();
        assert!(injector.release_modifiers().is_ok());
        assert!(matches!(
            injector.type_string("a"),
            Err(AutomationError::InputInjectionFailed(_))
        ));
    }
}
