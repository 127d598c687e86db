//! Default-selection policy for the active channel.

use crate::model::Mode;

const PREFERENCE: [Mode; 3] = [Mode::Sms, Mode::Ivr, Mode::MobileWeb];

/// Picks the channel the editor should show when the active one goes
/// away: the first remaining mode in preference order.
pub fn default_active_mode(modes: &[Mode]) -> Option<Mode> {
    PREFERENCE.iter().copied().find(|m| modes.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_sms_then_ivr() {
        assert_eq!(
            default_active_mode(&[Mode::MobileWeb, Mode::Ivr]),
            Some(Mode::Ivr)
        );
        assert_eq!(default_active_mode(&[Mode::MobileWeb]), Some(Mode::MobileWeb));
        assert_eq!(default_active_mode(&[]), None);
    }
}
