use agent_chat_core::{ChatClient, Config, Credentials, Screen, Session};
use tokio::sync::{mpsc, watch};

use crate::tui::AppEvent;

pub const FILL_ALL_FIELDS: &str = "Please fill in all fields.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    ApiKey,
    ProxyUser,
    ProxyPassword,
}

impl LoginField {
    pub const ALL: [LoginField; 3] = [LoginField::ApiKey, LoginField::ProxyUser, LoginField::ProxyPassword];

    pub fn label(&self) -> &'static str {
        match self {
            LoginField::ApiKey => "Gemini API Key",
            LoginField::ProxyUser => "MCP Username",
            LoginField::ProxyPassword => "MCP Password",
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, LoginField::ApiKey | LoginField::ProxyPassword)
    }

    pub fn next(&self) -> Self {
        match self {
            LoginField::ApiKey => LoginField::ProxyUser,
            LoginField::ProxyUser => LoginField::ProxyPassword,
            LoginField::ProxyPassword => LoginField::ApiKey,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginField::ApiKey => LoginField::ProxyPassword,
            LoginField::ProxyUser => LoginField::ApiKey,
            LoginField::ProxyPassword => LoginField::ProxyUser,
        }
    }
}

/// Editable text with a cursor counted in characters, not bytes
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

impl TextInput {
    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn char_count(&self) -> usize {
        self.value.chars().count()
    }
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub api_key: TextInput,
    pub proxy_user: TextInput,
    pub proxy_password: TextInput,
    pub focus: LoginField,
    pub notice: Option<&'static str>,
}

impl LoginForm {
    pub fn field(&self, field: LoginField) -> &TextInput {
        match field {
            LoginField::ApiKey => &self.api_key,
            LoginField::ProxyUser => &self.proxy_user,
            LoginField::ProxyPassword => &self.proxy_password,
        }
    }

    pub fn focused_mut(&mut self) -> &mut TextInput {
        match self.focus {
            LoginField::ApiKey => &mut self.api_key,
            LoginField::ProxyUser => &mut self.proxy_user,
            LoginField::ProxyPassword => &mut self.proxy_password,
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub session: Session,
    pub config: Config,
    pub client: ChatClient,

    // Login state
    pub login: LoginForm,

    // Chat state
    pub input: TextInput,
    pub chat_scroll: u16,
    pub follow_bottom: bool,
    pub chat_height: u16, // Height of chat area for scroll calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for typing indicator dots

    transcript_rx: watch::Receiver<u64>,
    replies: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(config: Config, replies: mpsc::UnboundedSender<AppEvent>) -> Self {
        let session = Session::new();
        let client = ChatClient::new(&config.backend_url);
        let transcript_rx = session.transcript().subscribe();

        tracing::info!(session = %session.id(), backend = %config.backend_url, "session started");

        Self {
            should_quit: false,
            session,
            config,
            client,

            login: LoginForm::default(),

            input: TextInput::default(),
            chat_scroll: 0,
            follow_bottom: true,
            chat_height: 0,

            animation_frame: 0,

            transcript_rx,
            replies,
        }
    }

    pub fn screen(&self) -> Screen {
        self.session.screen()
    }

    pub fn is_pending(&self) -> bool {
        self.session.is_pending()
    }

    /// Validate the login form and move on to the proxy instructions.
    pub fn submit_login(&mut self) {
        let credentials = Credentials::new(
            self.login.api_key.value.clone(),
            self.login.proxy_user.value.clone(),
            self.login.proxy_password.value.clone(),
        );

        match credentials.and_then(|creds| self.session.submit_credentials(creds)) {
            Ok(_) => self.login.notice = None,
            Err(e) => {
                tracing::debug!(error = %e, "login rejected");
                self.login.notice = Some(FILL_ALL_FIELDS);
            }
        }
    }

    pub fn confirm_proxy(&mut self) {
        if let Err(e) = self.session.confirm_proxy() {
            tracing::warn!(error = %e, "proxy confirmation ignored");
        }
    }

    /// Send the input box contents. The input is cleared only when the send
    /// was accepted; the reply arrives later as [`AppEvent::Reply`].
    pub fn send_input(&mut self) {
        let Some(request) = self.session.begin_send(&self.input.value) else {
            return;
        };
        self.input.clear();

        let client = self.client.clone();
        let replies = self.replies.clone();
        tokio::spawn(async move {
            let result = client.post(&request).await;
            let _ = replies.send(AppEvent::Reply(result));
        });
    }

    /// React to transcript changes: any append or pending change snaps the
    /// view back to the newest message.
    pub fn sync_transcript(&mut self) {
        if self.transcript_rx.has_changed().unwrap_or(false) {
            self.transcript_rx.borrow_and_update();
            self.follow_bottom = true;
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self) {
        self.follow_bottom = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(self.half_page());
    }

    pub fn scroll_down(&mut self) {
        // Render clamps and re-enables follow mode at the bottom
        self.chat_scroll = self.chat_scroll.saturating_add(self.half_page());
    }

    fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }

    /// Clamp the scroll offset for a transcript of `total_lines` lines.
    pub fn clamp_scroll(&mut self, total_lines: u16) {
        let max_scroll = total_lines.saturating_sub(self.chat_height);
        if self.follow_bottom || self.chat_scroll >= max_scroll {
            self.chat_scroll = max_scroll;
            self.follow_bottom = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(Config::new(), tx)
    }

    #[test]
    fn test_text_input_is_utf8_safe() {
        let mut input = TextInput::default();
        for c in "héllo".chars() {
            input.insert(c);
        }
        input.left();
        input.left();
        input.left();
        input.backspace();
        assert_eq!(input.value, "hllo");
        assert_eq!(input.cursor, 1);

        input.end();
        input.insert('!');
        assert_eq!(input.value, "hllo!");
        input.home();
        input.delete();
        assert_eq!(input.value, "llo!");
    }

    #[test]
    fn test_login_field_cycle() {
        let mut field = LoginField::default();
        for _ in 0..3 {
            field = field.next();
        }
        assert_eq!(field, LoginField::ApiKey);
        assert_eq!(LoginField::ApiKey.prev(), LoginField::ProxyPassword);
        assert!(LoginField::ProxyPassword.is_secret());
        assert!(!LoginField::ProxyUser.is_secret());
    }

    #[test]
    fn test_incomplete_login_shows_notice() {
        let mut app = app();
        app.login.api_key.value = "key".into();
        app.login.proxy_user.value = "alice".into();

        app.submit_login();
        assert_eq!(app.login.notice, Some(FILL_ALL_FIELDS));
        assert_eq!(app.screen(), Screen::AwaitingCredentials);
    }

    #[test]
    fn test_clamp_scroll_follows_bottom() {
        let mut app = app();
        app.chat_height = 10;

        app.clamp_scroll(25);
        assert_eq!(app.chat_scroll, 15);

        app.scroll_up();
        assert!(!app.follow_bottom);
        assert_eq!(app.chat_scroll, 10);
        app.clamp_scroll(25);
        assert_eq!(app.chat_scroll, 10);

        app.scroll_down();
        app.clamp_scroll(25);
        assert_eq!(app.chat_scroll, 15);
        assert!(app.follow_bottom);
    }
}
