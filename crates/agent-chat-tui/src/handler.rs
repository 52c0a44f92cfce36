use agent_chat_core::Screen;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply(result) => {
            app.session.complete_send(result);
        }
    }
    app.sync_transcript();
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work on any screen
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.screen() {
        Screen::AwaitingCredentials => handle_login(app, key),
        Screen::AwaitingProxyConfirmation => handle_instructions(app, key),
        Screen::Active => handle_chat(app, key),
    }
}

fn handle_login(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => app.submit_login(),
        KeyCode::Tab | KeyCode::Down => app.login.focus = app.login.focus.next(),
        KeyCode::BackTab | KeyCode::Up => app.login.focus = app.login.focus.prev(),
        KeyCode::Backspace => app.login.focused_mut().backspace(),
        KeyCode::Delete => app.login.focused_mut().delete(),
        KeyCode::Left => app.login.focused_mut().left(),
        KeyCode::Right => app.login.focused_mut().right(),
        KeyCode::Home => app.login.focused_mut().home(),
        KeyCode::End => app.login.focused_mut().end(),
        KeyCode::Char(c) => app.login.focused_mut().insert(c),
        _ => {}
    }
}

fn handle_instructions(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.confirm_proxy(),
        KeyCode::Esc | KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

fn handle_chat(app: &mut App, key: KeyEvent) {
    // Scrolling stays available while a reply is pending
    match key.code {
        KeyCode::PageUp => {
            app.scroll_up();
            return;
        }
        KeyCode::PageDown => {
            app.scroll_down();
            return;
        }
        _ => {}
    }

    // Input is disabled while a request is in flight
    if app.is_pending() {
        return;
    }

    match key.code {
        KeyCode::Enter => app.send_input(),
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Delete => app.input.delete(),
        KeyCode::Left => app.input.left(),
        KeyCode::Right => app.input.right(),
        KeyCode::Home => app.input.home(),
        KeyCode::End => app.input.end(),
        KeyCode::Char(c) => app.input.insert(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_chat_core::{ChatReply, Config, Sender};
    use tokio::sync::mpsc;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c)));
        }
    }

    fn logged_in_app(config: Config) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut app = App::new(config, tx);

        type_text(&mut app, "gem-key");
        handle_event(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "alice");
        handle_event(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "hunter2");
        handle_event(&mut app, key(KeyCode::Enter));
        (app, rx)
    }

    #[test]
    fn test_login_then_confirm_reaches_chat() {
        let (mut app, _rx) = logged_in_app(Config::new());
        assert_eq!(app.screen(), Screen::AwaitingProxyConfirmation);
        assert!(app.session.transcript().is_empty());

        let creds = app.session.credentials().unwrap();
        assert_eq!(creds.api_key(), "gem-key");
        assert_eq!(creds.proxy_user(), "alice");
        assert_eq!(creds.proxy_password(), "hunter2");

        handle_event(&mut app, key(KeyCode::Enter));
        assert_eq!(app.screen(), Screen::Active);
        assert_eq!(app.session.transcript().len(), 1);
        assert_eq!(app.session.transcript().messages()[0].sender, Sender::Agent);
    }

    #[test]
    fn test_escape_quits_login() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(Config::new(), tx);
        handle_event(&mut app, key(KeyCode::Esc));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_anywhere() {
        let (mut app, _rx) = logged_in_app(Config::new());
        handle_event(&mut app, key(KeyCode::Enter));
        handle_event(
            &mut app,
            AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn test_blank_message_not_sent() {
        let (mut app, mut rx) = logged_in_app(Config::new());
        handle_event(&mut app, key(KeyCode::Enter));

        type_text(&mut app, "   ");
        handle_event(&mut app, key(KeyCode::Enter));

        assert_eq!(app.session.transcript().len(), 1);
        assert!(!app.is_pending());
        assert_eq!(app.input.value, "   ");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_round_trip_through_events() {
        // Nothing listens on this port, so the reply is a transport failure
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = Config::new();
        config.backend_url = format!("http://{}/chat", addr);
        let (mut app, mut rx) = logged_in_app(config);
        handle_event(&mut app, key(KeyCode::Enter));

        type_text(&mut app, "hello");
        handle_event(&mut app, key(KeyCode::Enter));
        assert!(app.is_pending());
        assert!(app.input.value.is_empty());
        assert_eq!(app.session.transcript().len(), 2);

        // Typing is ignored while pending
        type_text(&mut app, "x");
        assert!(app.input.value.is_empty());

        let reply = rx.recv().await.unwrap();
        assert!(matches!(reply, AppEvent::Reply(Err(_))));
        handle_event(&mut app, reply);

        assert!(!app.is_pending());
        assert_eq!(app.session.transcript().len(), 3);
        let last = app.session.transcript().last().unwrap();
        assert_eq!(last.sender, Sender::Agent);
        assert!(last.text.starts_with("Sorry, there was an error: "));
    }

    #[test]
    fn test_reply_event_appends_answer() {
        let (mut app, _rx) = logged_in_app(Config::new());
        handle_event(&mut app, key(KeyCode::Enter));
        app.session.begin_send("question").unwrap();
        app.follow_bottom = false;

        handle_event(
            &mut app,
            AppEvent::Reply(Ok(ChatReply { answer: Some("answer".into()) })),
        );
        assert_eq!(app.session.transcript().last().unwrap().text, "answer");
        assert!(app.follow_bottom);
    }
}
