use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone)]
pub enum AppAction {
    Quit,
    MoveUp,
    MoveDown,
    MoveToTop,
    MoveToBottom,
    AddPost,
    RefreshNow,
    StartLiveUpdates,
    OpenInBrowser,
    ShowHelp,
    HideHelp,
    // URL input actions
    UrlInputChar(char),
    UrlInputBackspace,
    UrlInputConfirm,
    UrlInputCancel,
}

pub fn handle_key_event(
    key: KeyEvent,
    url_input_active: bool,
    show_help: bool,
) -> Option<AppAction> {
    // If help is showing, any key closes it
    if show_help {
        return Some(AppAction::HideHelp);
    }

    // URL input mode
    if url_input_active {
        return match key.code {
            KeyCode::Enter => Some(AppAction::UrlInputConfirm),
            KeyCode::Esc => Some(AppAction::UrlInputCancel),
            KeyCode::Backspace => Some(AppAction::UrlInputBackspace),
            KeyCode::Char(c) => Some(AppAction::UrlInputChar(c)),
            _ => None,
        };
    }

    // Normal mode
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => Some(AppAction::Quit),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppAction::Quit),

        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(AppAction::MoveDown),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(AppAction::MoveUp),
        (KeyCode::Char('<'), _) | (KeyCode::Home, _) => Some(AppAction::MoveToTop),
        (KeyCode::Char('>'), _) | (KeyCode::End, _) => Some(AppAction::MoveToBottom),

        (KeyCode::Char('a'), _) => Some(AppAction::AddPost),
        (KeyCode::Char('r'), _) => Some(AppAction::RefreshNow),
        (KeyCode::Char('l'), _) => Some(AppAction::StartLiveUpdates),
        (KeyCode::Char('o'), _) => Some(AppAction::OpenInBrowser),

        (KeyCode::Char('?'), _) => Some(AppAction::ShowHelp),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn url_input_captures_letters() {
        let action = handle_key_event(press(KeyCode::Char('q')), true, false);
        assert!(matches!(action, Some(AppAction::UrlInputChar('q'))));

        let action = handle_key_event(press(KeyCode::Enter), true, false);
        assert!(matches!(action, Some(AppAction::UrlInputConfirm)));
    }

    #[test]
    fn normal_mode_bindings() {
        assert!(matches!(
            handle_key_event(press(KeyCode::Char('a')), false, false),
            Some(AppAction::AddPost)
        ));
        assert!(matches!(
            handle_key_event(press(KeyCode::Char('l')), false, false),
            Some(AppAction::StartLiveUpdates)
        ));
        assert!(matches!(
            handle_key_event(press(KeyCode::Char('q')), false, false),
            Some(AppAction::Quit)
        ));
    }

    #[test]
    fn help_swallows_any_key() {
        let action = handle_key_event(press(KeyCode::Char('q')), false, true);
        assert!(matches!(action, Some(AppAction::HideHelp)));
    }
}
