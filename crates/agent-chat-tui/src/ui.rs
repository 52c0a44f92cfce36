use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use agent_chat_core::{proxy, Screen, Sender};
use crate::app::{App, LoginField};

/// Split text into alternating runs of whitespace and non-whitespace
fn whitespace_runs(text: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut in_space = None;

    for (i, c) in text.char_indices() {
        let is_space = c.is_whitespace();
        if in_space.is_some_and(|prev| prev != is_space) {
            runs.push(&text[start..i]);
            start = i;
        }
        in_space = Some(is_space);
    }
    if start < text.len() {
        runs.push(&text[start..]);
    }

    runs
}

/// Wrap text to fit within a given width, returning multiple lines
/// Breaks at word boundaries; spacing inside a line is kept as written, and
/// only words wider than the line are split
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for run in whitespace_runs(text) {
        let run_len = run.chars().count();

        if current_len + run_len <= width {
            // Run fits on current line
            current_line.push_str(run);
            current_len += run_len;
        } else if run.starts_with(char::is_whitespace) {
            // Whitespace at a line break is dropped
            if current_len > 0 {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }
        } else {
            // Word doesn't fit, start new line
            if current_len > 0 {
                lines.push(current_line.trim_end().to_string());
            }
            current_line = run.to_string();
            current_len = run_len;

            // Hard-break words longer than the line
            while current_len > width {
                let head: String = current_line.chars().take(width).collect();
                current_line = current_line.chars().skip(width).collect();
                current_len -= width;
                lines.push(head);
            }
        }
    }

    if !current_line.is_empty() || lines.is_empty() {
        lines.push(current_line);
    }

    lines
}

/// Lay out the transcript (and typing indicator) as pre-wrapped lines so the
/// scroll math matches what is drawn.
fn transcript_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.session.transcript().messages() {
        let (label, color) = match msg.sender {
            Sender::User => ("You", Color::Cyan),
            Sender::Agent => ("Agent", Color::Yellow),
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        for paragraph in msg.text.lines() {
            for wrapped in wrap_text_to_width(paragraph, width) {
                lines.push(Line::from(wrapped));
            }
        }
        lines.push(Line::default());
    }

    if app.is_pending() {
        lines.push(Line::from(Span::styled(
            "Agent",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Agent is typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen() {
        Screen::AwaitingCredentials => render_login_screen(app, frame, body_area),
        Screen::AwaitingProxyConfirmation => render_instructions_screen(app, frame, body_area),
        Screen::Active => render_chat_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = if app.is_pending() { " [waiting]" } else { "" };

    let title = Line::from(vec![
        Span::styled(" Intelligent Agent ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(status, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style, hints) = match app.screen() {
        Screen::AwaitingCredentials => (
            " LOGIN ",
            Style::default().bg(Color::Blue).fg(Color::White),
            " Tab: next field | Enter: start chat | Esc: quit",
        ),
        Screen::AwaitingProxyConfirmation => (
            " SETUP ",
            Style::default().bg(Color::Magenta).fg(Color::White),
            " Enter: I've started the proxy | q: quit",
        ),
        Screen::Active if app.is_pending() => (
            " WAIT ",
            Style::default().bg(Color::Yellow).fg(Color::Black),
            " PgUp/PgDn: scroll | Ctrl-C: quit",
        ),
        Screen::Active => (
            " CHAT ",
            Style::default().bg(Color::Green).fg(Color::Black),
            " Enter: send | PgUp/PgDn: scroll | Ctrl-C: quit",
        ),
    };

    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(footer), area);
}

/// Center a fixed-size box inside `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn render_login_screen(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered(area, 60, 16);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Agent Credentials ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [intro_area, fields_area, notice_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(9),
        Constraint::Min(0),
    ])
    .areas(inner);

    let intro = Paragraph::new("Please enter your credentials to start the session.")
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true });
    frame.render_widget(intro, intro_area);

    let field_areas = Layout::vertical([Constraint::Length(3); 3]).split(fields_area);

    for (field, field_area) in LoginField::ALL.iter().zip(field_areas.iter()) {
        let input = app.login.field(*field);
        let focused = app.login.focus == *field;

        let border_color = if focused { Color::Yellow } else { Color::DarkGray };
        let field_block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(format!(" {} ", field.label()));

        // Mask secrets with one asterisk per character
        let display_text = if field.is_secret() {
            "*".repeat(input.char_count())
        } else {
            input.value.clone()
        };

        // Keep the cursor visible when the value is wider than the box
        let inner_width = field_area.width.saturating_sub(2) as usize;
        let scroll_offset = if inner_width > 0 && input.cursor >= inner_width {
            input.cursor - inner_width + 1
        } else {
            0
        };
        let visible: String = display_text.chars().skip(scroll_offset).take(inner_width).collect();

        frame.render_widget(
            Paragraph::new(visible)
                .style(Style::default().fg(Color::Cyan))
                .block(field_block),
            *field_area,
        );

        if focused {
            let cursor_x = (input.cursor - scroll_offset) as u16;
            frame.set_cursor_position((field_area.x + cursor_x + 1, field_area.y + 1));
        }
    }

    if let Some(notice) = app.login.notice {
        let notice = Paragraph::new(notice).style(Style::default().fg(Color::Red).bold());
        frame.render_widget(notice, notice_area);
    }
}

fn render_instructions_screen(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered(area, 90, 24);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Almost Ready! ");

    let command = app
        .session
        .credentials()
        .map(|creds| proxy::proxy_command(creds, &app.config.proxy_url, app.config.proxy_port))
        .unwrap_or_default();
    let [established, listening] = proxy::expected_proxy_output(app.config.proxy_port);

    let heading = |text: &'static str, color: Color| {
        Line::from(Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD)))
    };

    let lines = vec![
        Line::from("We need to start the MCP proxy server on your machine. Follow these steps:"),
        Line::default(),
        heading("Step 1: Open a New Terminal", Color::Blue),
        Line::from("Open a new terminal window, separate from the one running the backend."),
        Line::default(),
        heading("Step 2: Run This Command", Color::Green),
        Line::from(Span::styled(command, Style::default().fg(Color::Green))),
        Line::from("Copy and paste this command into your new terminal. It will start the MCP proxy server."),
        Line::default(),
        heading("Step 3: Confirm Success", Color::Yellow),
        Line::from("You should see messages like:"),
        Line::from(format!("  • \"{}\"", established)),
        Line::from(format!("  • \"{}\"", listening)),
        Line::from(vec![
            Span::styled("Keep this terminal open", Style::default().bold()),
            Span::raw(" - the proxy must remain running."),
        ]),
        Line::default(),
        Line::from(Span::styled(
            "Press Enter once the proxy is running to continue to chat",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::default(),
        Line::from(Span::styled(
            format!(
                "Having trouble? Check that your firewall/antivirus isn't blocking port {}.",
                app.config.proxy_port
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let instructions = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(instructions, popup_area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area height for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    let chat_width = chat_area.width.saturating_sub(2) as usize;

    let lines = transcript_lines(app, chat_width);
    let total_lines = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    app.clamp_scroll(total_lines);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Session {} ", app.session.id()));

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    // Input at the bottom, greyed out while a reply is pending
    let pending = app.is_pending();
    let (input_border_color, input_title) = if pending {
        (Color::DarkGray, " Waiting for agent... ")
    } else {
        (Color::Yellow, " Message (Enter to send) ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(input_title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.input.value.is_empty() {
        Paragraph::new("Type your message...").style(Style::default().fg(Color::DarkGray))
    } else {
        let visible_text: String = app.input.value
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        let color = if pending { Color::DarkGray } else { Color::Cyan };
        Paragraph::new(visible_text).style(Style::default().fg(color))
    };

    frame.render_widget(input.block(input_block), input_area);

    // Show cursor only while input is enabled
    if !pending {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((
            input_area.x + cursor_x + 1,
            input_area.y + 1,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_chat_core::{ChatReply, Config, Credentials};
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::sync::mpsc;

    fn active_app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Config::new(), tx);
        app.session
            .submit_credentials(Credentials::new("gem-key", "alice", "hunter2").unwrap())
            .unwrap();
        app.session.confirm_proxy().unwrap();
        app
    }

    fn draw(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_wrap_text_to_width() {
        assert_eq!(wrap_text_to_width("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text_to_width("", 10), vec![""]);
        assert_eq!(wrap_text_to_width("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text_to_width("keep", 0), vec!["keep"]);
        assert_eq!(wrap_text_to_width("  indented  twice", 40), vec!["  indented  twice"]);
        assert_eq!(wrap_text_to_width("a    b", 3), vec!["a", "b"]);
    }

    #[test]
    fn test_transcript_lines_include_typing_indicator() {
        let mut app = active_app();
        let idle = transcript_lines(&app, 80).len();

        app.session.begin_send("hello").unwrap();
        let pending = transcript_lines(&app, 80);
        // user label + text + blank, then indicator label + indicator
        assert_eq!(pending.len(), idle + 5);
        assert!(pending.last().unwrap().to_string().starts_with("Agent is typing"));

        app.session.complete_send(Ok(ChatReply { answer: Some("hi".into()) }));
        let done = transcript_lines(&app, 80);
        assert!(!done.iter().any(|l| l.to_string().starts_with("Agent is typing")));
    }

    #[test]
    fn test_login_screen_masks_secrets() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Config::new(), tx);
        for c in "sk-secret".chars() {
            app.login.api_key.insert(c);
        }
        for c in "alice".chars() {
            app.login.proxy_user.insert(c);
        }

        let screen = draw(&mut app, 80, 24);
        assert!(screen.contains("Agent Credentials"));
        assert!(screen.contains("alice"));
        assert!(screen.contains("*********"));
        assert!(!screen.contains("sk-secret"));
    }

    #[test]
    fn test_instructions_show_proxy_command() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Config::new(), tx);
        app.session
            .submit_credentials(Credentials::new("gem-key", "alice", "hunter2").unwrap())
            .unwrap();

        let screen = draw(&mut app, 120, 30);
        assert!(screen.contains("Almost Ready!"));
        assert!(screen.contains("mcp-remote"));
        assert!(screen.contains("alice"));
        assert!(screen.contains("hunter2"));
    }

    #[test]
    fn test_chat_screen_shows_welcome_and_placeholder() {
        let mut app = active_app();
        let screen = draw(&mut app, 100, 20);
        assert!(screen.contains("Intelligent Agent"));
        assert!(screen.contains("Agent"));
        assert!(screen.contains("How can I assist you"));
        assert!(screen.contains("Type your message..."));
    }
}
