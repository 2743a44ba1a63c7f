use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::App;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => app.insert_text(&text),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::Generated(result) => app.on_generated(result),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any state
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.should_quit = true;
        }
        KeyCode::Enter => {
            // Shift/Alt+Enter breaks the line, plain Enter sends
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                app.insert_newline();
            } else {
                app.submit();
            }
        }
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.page_up(),
        KeyCode::PageDown => app.page_down(),
        KeyCode::Char(c) => {
            // AltGr is reported as Ctrl+Alt on Windows
            let ctrl_alt = KeyModifiers::CONTROL | KeyModifiers::ALT;
            if !key.modifiers.intersects(ctrl_alt) || key.modifiers.contains(ctrl_alt) {
                app.insert_char(c);
            }
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_body = app
        .body_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_body {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Controller;
    use crate::error::MISSING_API_KEY_MESSAGE;
    use tokio::sync::mpsc;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, modifiers))
    }

    fn app_without_key() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(Controller::new(None), "m".to_string(), tx)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            handle_event(app, key(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    #[test]
    fn test_modified_enter_inserts_line_break() {
        let mut app = app_without_key();
        type_str(&mut app, "a");
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::SHIFT));
        type_str(&mut app, "b");
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::ALT));
        type_str(&mut app, "c");

        assert_eq!(app.prompt(), "a\nb\nc");
        assert_eq!(app.controller.state().error, None);
    }

    #[test]
    fn test_plain_enter_submits() {
        let mut app = app_without_key();
        type_str(&mut app, "hello");
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE));

        // No key configured, so the submission ends in the configuration error
        assert_eq!(app.controller.state().error.as_deref(), Some(MISSING_API_KEY_MESSAGE));
        assert!(!app.controller.is_busy());
    }

    #[test]
    fn test_enter_on_blank_prompt_does_nothing() {
        let mut app = app_without_key();
        handle_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(app.controller.state().error, None);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_without_key();
        handle_event(&mut app, key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
        assert_eq!(app.prompt(), "");

        let mut app = app_without_key();
        handle_event(&mut app, key(KeyCode::Esc, KeyModifiers::NONE));
        assert!(app.should_quit);
    }

    #[test]
    fn test_stray_generated_event_is_dropped() {
        let mut app = app_without_key();
        handle_event(&mut app, AppEvent::Generated(Ok("late".to_string())));
        assert_eq!(app.controller.state().response, None);
    }

    #[test]
    fn test_paste_keeps_line_breaks_without_submitting() {
        let mut app = app_without_key();
        type_str(&mut app, ">");
        handle_event(&mut app, AppEvent::Paste("a\r\nb\rc".to_string()));

        assert_eq!(app.prompt(), ">a\nb\nc");
        assert_eq!(app.cursor, 6);
        assert!(!app.controller.is_busy());
        assert_eq!(app.controller.state().error, None);
    }

    #[test]
    fn test_altgr_characters_are_typed() {
        let mut app = app_without_key();
        let altgr = KeyModifiers::CONTROL | KeyModifiers::ALT;
        handle_event(&mut app, key(KeyCode::Char('@'), altgr));
        handle_event(&mut app, key(KeyCode::Char('x'), KeyModifiers::CONTROL));
        handle_event(&mut app, key(KeyCode::Char('y'), KeyModifiers::ALT));

        assert_eq!(app.prompt(), "@");
        assert!(!app.should_quit);
    }

    #[test]
    fn test_resize_keeps_prompt_and_scroll() {
        let mut app = app_without_key();
        type_str(&mut app, "hi");
        handle_event(&mut app, AppEvent::Resize);
        assert_eq!(app.prompt(), "hi");
        assert_eq!(app.response_scroll, 0);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_point_in_rect() {
        let rect = Rect::new(2, 2, 4, 4);
        assert!(point_in_rect(2, 2, rect));
        assert!(point_in_rect(5, 5, rect));
        assert!(!point_in_rect(6, 2, rect));
        assert!(!point_in_rect(1, 3, rect));
    }
}
