use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthChar;
use crate::app::App;
use crate::session::Display;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const PLACEHOLDER: &str = "e.g. Write a poem about the cosmos...";
// Inner rows of the prompt box before it starts scrolling
const MAX_INPUT_ROWS: u16 = 4;

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

fn display_width(chars: &[char]) -> usize {
    chars.iter().map(|&c| char_width(c)).sum()
}

/// Chars of `line` after the first `skip`, cut to fit in `width` columns.
fn visible_part(line: &str, skip: usize, width: usize) -> String {
    let mut used = 0;
    line.chars()
        .skip(skip)
        .take_while(|&c| {
            used += char_width(c);
            used <= width
        })
        .collect()
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let input_rows = (app.prompt().split('\n').count() as u16).clamp(1, MAX_INPUT_ROWS);

    // Main layout: header, body, input, footer
    let [header_area, body_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(input_rows + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_body(app, frame, body_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Gemini Prompt ", Style::default().fg(Color::Magenta).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let subtitle = Line::from(Span::styled(
        " Ask a question, write an instruction, and let the AI answer.",
        Style::default().fg(Color::Gray),
    ));

    frame.render_widget(Paragraph::new(vec![title, subtitle]), area);
}

fn render_body(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store body area for mouse hit-testing and scroll calculations
    app.body_area = Some(area);
    app.body_height = area.height.saturating_sub(2);
    app.body_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    match app.controller.state().display() {
        Display::Welcome => {
            let inner_height = area.height.saturating_sub(2);
            let mut lines: Vec<Line> = Vec::new();
            for _ in 0..inner_height.saturating_sub(2) / 2 {
                lines.push(Line::default());
            }
            lines.push(Line::from(Span::styled(
                "Welcome",
                Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                "The result of your prompt will appear here.",
                Style::default().fg(Color::DarkGray),
            )));

            let welcome = Paragraph::new(lines)
                .block(block)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(welcome, area);
        }
        Display::Loading => {
            let inner_height = area.height.saturating_sub(2);
            let spinner = SPINNER[app.animation_frame as usize % SPINNER.len()];
            let dots = ".".repeat((app.animation_frame as usize / 4) % 3 + 1);

            let mut lines: Vec<Line> = Vec::new();
            for _ in 0..inner_height.saturating_sub(1) / 2 {
                lines.push(Line::default());
            }
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", spinner), Style::default().fg(Color::Magenta)),
                Span::styled(
                    format!("Generating{:<3}", dots),
                    Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
                ),
            ]));

            let loading = Paragraph::new(lines)
                .block(block)
                .alignment(Alignment::Center);
            frame.render_widget(loading, area);
        }
        Display::Error(message) => {
            let error_block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(Span::styled(
                    " An error occurred ",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ));

            let error = Paragraph::new(Text::raw(message))
                .style(Style::default().fg(Color::LightRed))
                .block(error_block)
                .wrap(Wrap { trim: false });
            frame.render_widget(error, area);
        }
        Display::Response(text) => {
            let response = response_paragraph(text)
                .block(block.title(" Response "))
                .scroll((app.response_scroll, 0));
            frame.render_widget(response, area);
        }
    }
}

/// Response body without its frame. Scroll limits are measured on this same
/// paragraph so they match what is drawn.
pub fn response_paragraph(text: &str) -> Paragraph<'_> {
    // Raw text: whitespace and line breaks kept, no markup
    Paragraph::new(Text::raw(text)).wrap(Wrap { trim: false })
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let enabled = app.input_enabled();
    let border_color = if enabled { Color::Magenta } else { Color::DarkGray };

    let send_hint = if app.can_submit() {
        Span::styled(" Enter to send ", Style::default().fg(Color::Green))
    } else {
        Span::styled(" Enter to send ", Style::default().fg(Color::DarkGray))
    };
    let title = if enabled {
        " Prompt "
    } else {
        " Prompt (waiting for response) "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title)
        .title_bottom(Line::from(send_hint).right_aligned());

    let inner_rows = area.height.saturating_sub(2) as usize;
    let inner_width = area.width.saturating_sub(2) as usize;
    let (cursor_row, cursor_col) = app.cursor_row_col();

    // Keep the cursor line and column visible
    let row_offset = if inner_rows == 0 {
        0
    } else {
        (cursor_row + 1).saturating_sub(inner_rows)
    };

    // Columns are display cells, so wide characters count twice
    let before_cursor: Vec<char> = app
        .prompt()
        .split('\n')
        .nth(cursor_row)
        .unwrap_or("")
        .chars()
        .take(cursor_col)
        .collect();
    let mut col_offset = 0;
    if inner_width > 0 {
        while col_offset < before_cursor.len()
            && display_width(&before_cursor[col_offset..]) >= inner_width
        {
            col_offset += 1;
        }
    }
    let cursor_x = display_width(&before_cursor[col_offset..]);

    let input = if app.prompt().is_empty() {
        Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        let text_color = if enabled { Color::White } else { Color::DarkGray };
        let lines: Vec<Line> = app
            .prompt()
            .split('\n')
            .skip(row_offset)
            .take(inner_rows)
            .map(|line| Line::from(visible_part(line, col_offset, inner_width)))
            .collect();
        Paragraph::new(lines).style(Style::default().fg(text_color))
    };

    frame.render_widget(input.block(input_block), area);

    if enabled && inner_rows > 0 && inner_width > 0 {
        frame.set_cursor_position((
            area.x + 1 + cursor_x as u16,
            area.y + 1 + (cursor_row - row_offset) as u16,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().fg(Color::Magenta);
    let text_style = Style::default().fg(Color::DarkGray);

    let footer = Line::from(vec![
        Span::styled(" Enter", key_style),
        Span::styled(" send  ", text_style),
        Span::styled("Shift/Alt+Enter", key_style),
        Span::styled(" newline  ", text_style),
        Span::styled("↑↓", key_style),
        Span::styled(" scroll  ", text_style),
        Span::styled("Esc", key_style),
        Span::styled(" quit  ", text_style),
        Span::styled(format!("[{}]", app.model), Style::default().fg(Color::Cyan)),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Controller;
    use crate::session::SessionState;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tokio::sync::mpsc;

    fn app_in(state: SessionState) -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(Controller::with_state(state), "gemini-test".to_string(), tx)
    }

    fn draw(app: &mut App) -> String {
        draw_sized(app, 80, 20)
    }

    fn draw_sized(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_welcome_screen() {
        let mut app = app_in(SessionState::new());
        let screen = draw(&mut app);
        assert!(screen.contains("Welcome"));
        assert!(screen.contains(PLACEHOLDER));
        assert!(screen.contains("[gemini-test]"));
    }

    #[test]
    fn test_error_screen() {
        let mut app = app_in(SessionState::new());
        app.controller.update_prompt("hi".to_string());
        // No generator, so this lands on the configuration error
        assert!(app.controller.begin_submit().is_none());

        let screen = draw(&mut app);
        assert!(screen.contains("An error occurred"));
        assert!(screen.contains("The Gemini API key is not configured."));
        assert!(!screen.contains("Welcome"));
    }

    #[test]
    fn test_loading_hides_stale_output() {
        let state = SessionState {
            prompt: "hi".to_string(),
            busy: true,
            error: Some("old error".to_string()),
            response: Some("old answer".to_string()),
        };
        let mut app = app_in(state);
        let screen = draw(&mut app);
        assert!(screen.contains("Generating"));
        assert!(screen.contains("waiting for response"));
        assert!(!screen.contains("old error"));
        assert!(!screen.contains("old answer"));
        assert!(!screen.contains("Welcome"));
    }

    #[test]
    fn test_response_keeps_line_breaks() {
        let state = SessionState::new().succeeded("first line\n  indented **not bold**".to_string());
        let mut app = app_in(state);
        let screen = draw(&mut app);
        let rows: Vec<&str> = screen.lines().collect();
        assert!(rows.iter().any(|r| r.contains("│first line")));
        assert!(rows.iter().any(|r| r.contains("│  indented **not bold**")));
    }

    #[test]
    fn test_multiline_prompt_grows_input() {
        let mut app = app_in(SessionState::new());
        for c in "one\ntwo\nthree".chars() {
            app.insert_char(c);
        }
        let screen = draw(&mut app);
        assert!(screen.contains("│one"));
        assert!(screen.contains("│two"));
        assert!(screen.contains("│three"));
    }

    // 12x10 terminal leaves a body with 10x2 inner cells
    fn scrolled_to_end(text: &str) -> String {
        let mut app = app_in(SessionState::new().succeeded(text.to_string()));
        draw_sized(&mut app, 12, 10);
        assert_eq!((app.body_width, app.body_height), (10, 2));
        app.scroll_down(100);
        draw_sized(&mut app, 12, 10)
    }

    #[test]
    fn test_scroll_reaches_end_of_word_wrapped_response() {
        let screen = scrolled_to_end("aaaaaa bbbbbb cccccc dddddd");
        assert!(screen.contains("dddddd"));
        assert!(!screen.contains("aaaaaa"));
    }

    #[test]
    fn test_scroll_reaches_end_of_wide_char_response() {
        let screen = scrolled_to_end("一二三四五六七八九十ABCDE");
        assert!(screen.contains("ABCDE"));
    }

    #[test]
    fn test_cursor_accounts_for_wide_chars() {
        let mut app = app_in(SessionState::new());
        for c in "一二x".chars() {
            app.insert_char(c);
        }
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        // Input box spans rows 16..19, text starts one cell inside the border
        let cursor = terminal.get_cursor_position().unwrap();
        assert_eq!((cursor.x, cursor.y), (6, 17));
    }

    #[test]
    fn test_visible_part_stops_at_width() {
        assert_eq!(visible_part("一二三", 0, 5), "一二");
        assert_eq!(visible_part("abcdef", 2, 3), "cde");
    }
}
