use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::clipboard::Clipboard;
use crate::config::AppConfig;
use crate::i18n::Translator;
use crate::import::{self, ImportError, ImportSource};
use crate::nomenclature::{self, Field};

/// How long a status message stays on the info line
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// How long a label shows "Copied!" before reverting
pub const COPY_FEEDBACK: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Fields,
    Separator,
    Labels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Input,
    FileBrowser,
    Help,
    Confirm,
}

/// What the input popup is editing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTarget {
    NewField,
    RenameField(usize),
    NewValue(usize),
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedLabel {
    pub text: String,
    pub copied_at: Option<Instant>,
}

impl GeneratedLabel {
    fn new(text: String) -> Self {
        Self {
            text,
            copied_at: None,
        }
    }

    /// Whether the "Copied!" confirmation is still showing
    pub fn is_copied(&self) -> bool {
        self.copied_at
            .map(|t| t.elapsed() < COPY_FEEDBACK)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct BrowserEntry {
    pub name: String,
    pub is_dir: bool,
    pub path: PathBuf,
}

/// Result of a finished import task
#[derive(Debug)]
struct ImportOutcome {
    seq: u64,
    path: PathBuf,
    result: Result<Vec<Field>, ImportError>,
}

pub struct App {
    pub section: Section,
    pub popup: Popup,

    // Field set (top section)
    pub fields: Vec<Field>,
    pub selected_field: usize,

    // Separator (middle section)
    pub separator: String,

    // Generated labels (bottom section)
    pub labels: Vec<GeneratedLabel>,
    pub selected_label: usize,

    // Input popup
    pub input_target: Option<InputTarget>,
    pub input_buffer: String,

    // Field awaiting removal confirmation and its prompt
    pub confirm_field: Option<usize>,
    pub confirm_message: Option<String>,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    // File browser state
    pub browser_path: PathBuf,
    pub browser_entries: Vec<BrowserEntry>,
    pub browser_selected: usize,

    // Import in flight (file name shown on the info line)
    pub import_pending: Option<PathBuf>,
    import_seq: u64,
    import_tx: mpsc::UnboundedSender<ImportOutcome>,
    import_rx: mpsc::UnboundedReceiver<ImportOutcome>,
    import_source: ImportSource,

    notifications: bool,
    translator: Translator,
    clipboard: Box<dyn Clipboard>,
}

impl App {
    pub fn new(config: &AppConfig, translator: Translator, clipboard: Box<dyn Clipboard>) -> Self {
        let (import_tx, import_rx) = mpsc::unbounded_channel();

        Self {
            section: Section::Fields,
            popup: Popup::None,

            fields: Vec::new(),
            selected_field: 0,

            separator: config.separator.clone(),

            labels: Vec::new(),
            selected_label: 0,

            input_target: None,
            input_buffer: String::new(),

            confirm_field: None,
            confirm_message: None,

            status_message: None,
            status_message_time: None,

            browser_path: std::env::current_dir()
                .ok()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("/")),
            browser_entries: Vec::new(),
            browser_selected: 0,

            import_pending: None,
            import_seq: 0,
            import_tx,
            import_rx,
            import_source: config.import_source(),

            notifications: config.notifications,
            translator,
            clipboard,
        }
    }

    /// Translate a UI string
    pub fn tr<'a>(&'a self, key: &'a str) -> &'a str {
        self.translator.translate(key)
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Replace the whole field set; nothing is selected afterwards
    pub fn replace_fields(&mut self, fields: Vec<Field>) {
        self.fields = fields;
        for field in &mut self.fields {
            field.selected = None;
        }
        self.selected_field = 0;
    }

    /// Build the label list from the current fields, selections and separator
    pub fn generate(&mut self) {
        self.labels = nomenclature::generate(&self.fields, &self.separator)
            .into_iter()
            .map(GeneratedLabel::new)
            .collect();
        self.selected_label = 0;
        self.section = Section::Labels;
        tracing::debug!("Generated {} labels", self.labels.len());
        let msg = self.tr("Nomenclature generated").to_string();
        self.set_status(msg);
    }

    /// Copy one label to the clipboard.
    /// A failure only produces a notice; the label list is left as it was.
    pub fn copy_label(&mut self, index: usize) {
        let text = match self.labels.get(index) {
            Some(label) => label.text.clone(),
            None => return,
        };

        match self.clipboard.set_text(&text) {
            Ok(()) => {
                if let Some(label) = self.labels.get_mut(index) {
                    label.copied_at = Some(Instant::now());
                }
            }
            Err(e) => {
                tracing::warn!("Copy failed: {}", e);
                let msg = format!("{}: {}", self.tr("Copy failed"), e);
                self.set_status(msg);
            }
        }
    }

    /// Start importing a file in the background.
    /// A newer import supersedes any that is still running.
    pub fn start_import(&mut self, path: PathBuf) {
        self.import_seq += 1;
        let seq = self.import_seq;
        let source = self.import_source.clone();
        let tx = self.import_tx.clone();

        self.import_pending = Some(path.clone());
        tracing::info!("Import #{} started for {}", seq, path.display());

        tokio::spawn(async move {
            let result = import::import_file(&path, &source).await;
            let _ = tx.send(ImportOutcome { seq, path, result });
        });
    }

    /// Apply finished imports; outcomes of superseded imports are dropped
    fn poll_imports(&mut self) {
        while let Ok(outcome) = self.import_rx.try_recv() {
            if outcome.seq != self.import_seq {
                tracing::debug!("Dropping superseded import #{}", outcome.seq);
                continue;
            }
            self.import_pending = None;
            self.apply_import(&outcome.path, outcome.result);
        }
    }

    fn apply_import(&mut self, path: &std::path::Path, result: Result<Vec<Field>, ImportError>) {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        match result {
            Ok(fields) => {
                let count = fields.len();
                self.drop_field_edits();
                self.replace_fields(fields);
                self.section = Section::Fields;
                let msg = format!("{} {} ({})", self.tr("Fields loaded:"), count, file_name);
                self.set_status(msg);

                if self.notifications {
                    if let Err(e) = notify("nomenclator", &format!("Loaded {} fields from {}", count, file_name)) {
                        tracing::debug!("Notification failed: {}", e);
                    }
                }
            }
            Err(e) => {
                tracing::error!("Error loading fields from {}: {}", path.display(), e);
                let msg = format!("{}: {}", self.tr("Error loading fields"), e);
                self.set_status(msg);
            }
        }
    }

    /// Close popups that hold an index into the field set being replaced
    fn drop_field_edits(&mut self) {
        if self.confirm_field.take().is_some() || self.popup == Popup::Confirm {
            self.confirm_message = None;
            if self.popup == Popup::Confirm {
                self.popup = Popup::None;
            }
        }
        if matches!(
            self.input_target,
            Some(InputTarget::RenameField(_)) | Some(InputTarget::NewValue(_))
        ) {
            self.close_input();
        }
    }

    pub fn tick(&mut self) {
        self.poll_imports();

        // Clear status message after timeout
        if let Some(time) = self.status_message_time {
            if time.elapsed() >= STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        // Revert expired "Copied!" confirmations
        for label in &mut self.labels {
            if label.copied_at.is_some() && !label.is_copied() {
                label.copied_at = None;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle popups first
        if self.popup != Popup::None {
            return self.handle_popup_key(key);
        }

        self.handle_normal_key(key)
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Tab => {
                self.section = match self.section {
                    Section::Fields => Section::Separator,
                    Section::Separator => Section::Labels,
                    Section::Labels => Section::Fields,
                };
            }
            KeyCode::BackTab => {
                self.section = match self.section {
                    Section::Fields => Section::Labels,
                    Section::Separator => Section::Fields,
                    Section::Labels => Section::Separator,
                };
            }

            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),

            KeyCode::Char('g') => self.generate(),
            KeyCode::Char('i') => self.start_file_browser()?,
            KeyCode::Char('?') => self.popup = Popup::Help,

            _ => match self.section {
                Section::Fields => self.handle_fields_key(key),
                Section::Separator => {
                    if matches!(key.code, KeyCode::Enter | KeyCode::Char('e')) {
                        let current = self.separator.clone();
                        self.open_input(InputTarget::Separator, current);
                    }
                }
                Section::Labels => {
                    if matches!(key.code, KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char(' ')) {
                        self.copy_label(self.selected_label);
                    }
                }
            },
        }
        Ok(())
    }

    fn handle_fields_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('a') => self.open_input(InputTarget::NewField, String::new()),
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(field) = self.fields.get(self.selected_field) {
                    let name = field.name.clone();
                    self.open_input(InputTarget::RenameField(self.selected_field), name);
                }
            }
            KeyCode::Char('v') => {
                if !self.fields.is_empty() {
                    self.open_input(InputTarget::NewValue(self.selected_field), String::new());
                }
            }
            KeyCode::Right | KeyCode::Char(']') | KeyCode::Char('l') => {
                if let Some(field) = self.fields.get_mut(self.selected_field) {
                    field.select_next();
                }
            }
            KeyCode::Left | KeyCode::Char('[') | KeyCode::Char('h') => {
                if let Some(field) = self.fields.get_mut(self.selected_field) {
                    field.select_prev();
                }
            }
            KeyCode::Char('x') => {
                if let Some(field) = self.fields.get_mut(self.selected_field) {
                    field.clear_selection();
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(field) = self.fields.get(self.selected_field) {
                    let name = if field.name.is_empty() {
                        self.tr("(unnamed)").to_string()
                    } else {
                        field.name.clone()
                    };
                    let msg = format!("{} '{}'? (y/n)", self.tr("Remove field"), name);
                    self.confirm_field = Some(self.selected_field);
                    self.confirm_message = Some(msg);
                    self.popup = Popup::Confirm;
                }
            }
            _ => {}
        }
    }

    fn move_down(&mut self) {
        match self.section {
            Section::Fields => {
                if !self.fields.is_empty() {
                    self.selected_field = (self.selected_field + 1) % self.fields.len();
                }
            }
            Section::Labels => {
                if !self.labels.is_empty() {
                    self.selected_label = (self.selected_label + 1) % self.labels.len();
                }
            }
            Section::Separator => {}
        }
    }

    fn move_up(&mut self) {
        match self.section {
            Section::Fields => {
                if !self.fields.is_empty() {
                    self.selected_field = self
                        .selected_field
                        .checked_sub(1)
                        .unwrap_or(self.fields.len() - 1);
                }
            }
            Section::Labels => {
                if !self.labels.is_empty() {
                    self.selected_label = self
                        .selected_label
                        .checked_sub(1)
                        .unwrap_or(self.labels.len() - 1);
                }
            }
            Section::Separator => {}
        }
    }

    fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::Input => self.handle_input_key(key),
            Popup::FileBrowser => self.handle_browser_key(key)?,
            Popup::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter | KeyCode::Char('q')) {
                    self.popup = Popup::None;
                }
            }
            Popup::Confirm => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.remove_confirmed_field();
                    self.confirm_message = None;
                    self.popup = Popup::None;
                }
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.confirm_field = None;
                    self.confirm_message = None;
                    self.popup = Popup::None;
                }
                _ => {}
            },
            Popup::None => {}
        }
        Ok(())
    }

    fn remove_confirmed_field(&mut self) {
        if let Some(index) = self.confirm_field.take() {
            if index < self.fields.len() {
                let field = self.fields.remove(index);
                tracing::debug!("Removed field {:?}", field.name);
                if self.selected_field >= self.fields.len() && !self.fields.is_empty() {
                    self.selected_field = self.fields.len() - 1;
                }
                if self.fields.is_empty() {
                    self.selected_field = 0;
                }
                let msg = self.tr("Field removed").to_string();
                self.set_status(msg);
            }
        }
    }

    fn open_input(&mut self, target: InputTarget, initial: String) {
        self.input_target = Some(target);
        self.input_buffer = initial;
        self.popup = Popup::Input;
    }

    fn close_input(&mut self) {
        self.input_target = None;
        self.input_buffer.clear();
        self.popup = Popup::None;
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.close_input(),
            KeyCode::Enter => {
                self.commit_input();
                self.close_input();
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            KeyCode::Char(c)
                if !c.is_control()
                    && !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.input_buffer.push(c)
            }
            _ => {}
        }
    }

    fn commit_input(&mut self) {
        let input = self.input_buffer.clone();
        match self.input_target {
            Some(InputTarget::NewField) => {
                // An unnamed field is allowed; it is skipped when generating
                self.fields.push(Field::new(input.trim()));
                self.selected_field = self.fields.len() - 1;
            }
            Some(InputTarget::RenameField(index)) => {
                if let Some(field) = self.fields.get_mut(index) {
                    field.name = input.trim().to_string();
                }
            }
            Some(InputTarget::NewValue(index)) => {
                let added = self
                    .fields
                    .get_mut(index)
                    .map(|field| field.add_value(&input))
                    .unwrap_or(false);
                if !added {
                    let msg = self.tr("No value entered").to_string();
                    self.set_status(msg);
                }
            }
            Some(InputTarget::Separator) => {
                // Taken verbatim: spaces and the empty string are valid separators
                self.separator = input;
            }
            None => {}
        }
    }

    fn start_file_browser(&mut self) -> Result<()> {
        self.popup = Popup::FileBrowser;
        self.browser_selected = 0;
        self.refresh_browser()
    }

    fn refresh_browser(&mut self) -> Result<()> {
        self.browser_entries.clear();

        // Add parent directory entry if not at root
        if let Some(parent) = self.browser_path.parent() {
            self.browser_entries.push(BrowserEntry {
                name: "..".to_string(),
                is_dir: true,
                path: parent.to_path_buf(),
            });
        }

        let entries = std::fs::read_dir(&self.browser_path)
            .with_context(|| format!("Cannot read {}", self.browser_path.display()))?;

        let mut dirs: Vec<BrowserEntry> = Vec::new();
        let mut files: Vec<BrowserEntry> = Vec::new();

        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            // Skip hidden files
            if name.starts_with('.') {
                continue;
            }

            if path.is_dir() {
                dirs.push(BrowserEntry { name, is_dir: true, path });
            } else if import::is_importable(&path) {
                files.push(BrowserEntry { name, is_dir: false, path });
            }
        }

        dirs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        files.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        self.browser_entries.extend(dirs);
        self.browser_entries.extend(files);

        if self.browser_selected >= self.browser_entries.len() {
            self.browser_selected = 0;
        }
        Ok(())
    }

    fn handle_browser_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.popup = Popup::None;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if !self.browser_entries.is_empty() {
                    self.browser_selected = (self.browser_selected + 1) % self.browser_entries.len();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if !self.browser_entries.is_empty() {
                    self.browser_selected = self
                        .browser_selected
                        .checked_sub(1)
                        .unwrap_or(self.browser_entries.len() - 1);
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(entry) = self.browser_entries.get(self.browser_selected).cloned() {
                    if entry.is_dir {
                        self.browser_path = entry.path;
                        self.browser_selected = 0;
                        self.refresh_browser()?;
                    } else {
                        self.popup = Popup::None;
                        self.start_import(entry.path);
                    }
                }
            }
            KeyCode::Backspace => {
                if let Some(parent) = self.browser_path.parent() {
                    self.browser_path = parent.to_path_buf();
                    self.browser_selected = 0;
                    self.refresh_browser()?;
                }
            }
            KeyCode::Char('~') => {
                if let Some(home) = dirs::home_dir() {
                    self.browser_path = home;
                    self.browser_selected = 0;
                    self.refresh_browser()?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Number of fields that will contribute to a label
    pub fn contributing_fields(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| !f.name.is_empty() && f.selected_value().is_some_and(|v| !v.is_empty()))
            .count()
    }
}

pub fn notify(summary: &str, body: &str) -> Result<()> {
    notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .icon("edit-copy")
        .show()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use std::cell::RefCell;
    use std::io::Write;
    use std::rc::Rc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
    }

    fn local_config() -> AppConfig {
        AppConfig {
            upload_endpoint: None,
            ..AppConfig::default()
        }
    }

    fn test_app() -> (App, Rc<RefCell<Vec<String>>>) {
        let clipboard = MemoryClipboard::default();
        let contents = clipboard.contents.clone();
        let app = App::new(&local_config(), Translator::identity(), Box::new(clipboard));
        (app, contents)
    }

    async fn wait_for_import(app: &mut App) {
        for _ in 0..500 {
            app.tick();
            if app.import_pending.is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("import did not finish");
    }

    fn json_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_build_fields_and_generate_with_keys() {
        let (mut app, _) = test_app();

        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        assert_eq!(app.popup, Popup::Input);
        type_text(&mut app, "Type");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        app.handle_key(key(KeyCode::Char('v'))).unwrap();
        type_text(&mut app, "A");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        type_text(&mut app, "Color");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        app.handle_key(key(KeyCode::Char('v'))).unwrap();
        type_text(&mut app, "Red");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.popup, Popup::None);
        assert_eq!(app.fields.len(), 2);

        app.handle_key(key(KeyCode::Char('g'))).unwrap();
        assert_eq!(app.section, Section::Labels);
        assert_eq!(app.labels.len(), 1);
        assert_eq!(app.labels[0].text, "A-Red");
    }

    #[test]
    fn test_unselected_field_is_skipped() {
        let (mut app, _) = test_app();
        let mut color = Field::with_values("Color", ["Red"]);
        color.clear_selection();
        let mut kind = Field::new("Type");
        kind.add_value("A");
        app.fields = vec![kind, color];

        app.generate();
        assert_eq!(app.labels[0].text, "A");
    }

    #[test]
    fn test_edit_separator() {
        let (mut app, _) = test_app();
        app.fields = vec![Field::new("a"), Field::new("b")];
        app.fields[0].add_value("A");
        app.fields[1].add_value("B");

        app.handle_key(key(KeyCode::Tab)).unwrap();
        assert_eq!(app.section, Section::Separator);
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.input_buffer, "-");
        app.handle_key(key(KeyCode::Backspace)).unwrap();
        type_text(&mut app, "_");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.separator, "_");

        app.generate();
        assert_eq!(app.labels[0].text, "A_B");

        // Empty separator
        app.section = Section::Separator;
        app.handle_key(key(KeyCode::Char('e'))).unwrap();
        app.handle_key(key(KeyCode::Backspace)).unwrap();
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.separator, "");
        app.generate();
        assert_eq!(app.labels[0].text, "AB");
    }

    #[test]
    fn test_escape_cancels_input() {
        let (mut app, _) = test_app();
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        type_text(&mut app, "Size");
        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert!(app.fields.is_empty());
        assert_eq!(app.popup, Popup::None);
    }

    #[test]
    fn test_blank_value_is_rejected() {
        let (mut app, _) = test_app();
        app.fields.push(Field::new("Size"));
        app.handle_key(key(KeyCode::Char('v'))).unwrap();
        type_text(&mut app, "   ");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(app.fields[0].values.is_empty());
        assert_eq!(app.status_message.as_deref(), Some("No value entered"));
    }

    #[test]
    fn test_cycle_selection_with_arrows() {
        let (mut app, _) = test_app();
        app.fields.push(Field::with_values("Size", ["S", "M"]));

        app.handle_key(key(KeyCode::Right)).unwrap();
        assert_eq!(app.fields[0].selected_value(), Some("S"));
        app.handle_key(key(KeyCode::Right)).unwrap();
        assert_eq!(app.fields[0].selected_value(), Some("M"));
        app.handle_key(key(KeyCode::Char('x'))).unwrap();
        assert_eq!(app.fields[0].selected_value(), None);
    }

    #[test]
    fn test_remove_field_with_confirmation() {
        let (mut app, _) = test_app();
        app.fields = vec![Field::new("Type"), Field::new("Color")];
        app.selected_field = 1;

        app.handle_key(key(KeyCode::Char('d'))).unwrap();
        assert_eq!(app.popup, Popup::Confirm);
        app.handle_key(key(KeyCode::Char('n'))).unwrap();
        assert_eq!(app.fields.len(), 2);

        app.handle_key(key(KeyCode::Char('d'))).unwrap();
        app.handle_key(key(KeyCode::Char('y'))).unwrap();
        assert_eq!(app.fields.len(), 1);
        assert_eq!(app.fields[0].name, "Type");
        assert_eq!(app.selected_field, 0);
    }

    #[test]
    fn test_copy_label_and_feedback() {
        let (mut app, contents) = test_app();
        app.fields.push(Field::new("Type"));
        app.fields[0].add_value("A");
        app.generate();

        app.handle_key(key(KeyCode::Char('y'))).unwrap();
        assert_eq!(*contents.borrow(), vec!["A".to_string()]);
        assert!(app.labels[0].is_copied());

        // Feedback reverts once the window has passed
        app.labels[0].copied_at = Some(Instant::now() - COPY_FEEDBACK - Duration::from_millis(1));
        app.tick();
        assert!(!app.labels[0].is_copied());
        assert_eq!(app.labels[0].copied_at, None);
    }

    #[test]
    fn test_clipboard_failure_keeps_labels() {
        let clipboard = MemoryClipboard {
            fail: true,
            ..MemoryClipboard::default()
        };
        let mut app = App::new(&local_config(), Translator::identity(), Box::new(clipboard));
        app.fields.push(Field::new("Type"));
        app.fields[0].add_value("A");
        app.generate();

        app.copy_label(0);
        assert_eq!(app.labels.len(), 1);
        assert_eq!(app.labels[0].text, "A");
        assert!(!app.labels[0].is_copied());
        assert!(app
            .status_message
            .as_deref()
            .is_some_and(|m| m.starts_with("Copy failed")));
    }

    #[tokio::test]
    async fn test_import_replaces_fields() {
        let (mut app, _) = test_app();
        app.fields.push(Field::new("Old"));
        let file = json_file(r#"{"fields":[{"name":"Size","values":["S","M"]}]}"#);

        app.start_import(file.path().to_path_buf());
        assert!(app.import_pending.is_some());
        wait_for_import(&mut app).await;

        assert_eq!(app.fields, vec![Field::with_values("Size", ["S", "M"])]);
        assert_eq!(app.fields[0].selected, None);
    }

    #[tokio::test]
    async fn test_failed_import_keeps_fields() {
        let (mut app, _) = test_app();
        app.fields.push(Field::new("Old"));
        let file = json_file(r#"{"error":"bad file"}"#);

        app.start_import(file.path().to_path_buf());
        wait_for_import(&mut app).await;

        assert_eq!(app.fields, vec![Field::new("Old")]);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Error loading fields: bad file")
        );
    }

    #[tokio::test]
    async fn test_superseded_import_is_ignored() {
        let (mut app, _) = test_app();
        app.import_seq = 2;
        app.import_pending = Some(PathBuf::from("new.csv"));

        app.import_tx
            .send(ImportOutcome {
                seq: 1,
                path: PathBuf::from("old.csv"),
                result: Ok(vec![Field::new("Stale")]),
            })
            .unwrap();
        app.tick();
        assert!(app.fields.is_empty());
        assert!(app.import_pending.is_some());

        app.import_tx
            .send(ImportOutcome {
                seq: 2,
                path: PathBuf::from("new.csv"),
                result: Ok(vec![Field::new("Fresh")]),
            })
            .unwrap();
        app.tick();
        assert_eq!(app.fields, vec![Field::new("Fresh")]);
        assert!(app.import_pending.is_none());
    }

    fn deliver_import(app: &mut App, fields: Vec<Field>) {
        app.import_seq += 1;
        app.import_pending = Some(PathBuf::from("fields.csv"));
        app.import_tx
            .send(ImportOutcome {
                seq: app.import_seq,
                path: PathBuf::from("fields.csv"),
                result: Ok(fields),
            })
            .unwrap();
        app.tick();
    }

    #[test]
    fn test_import_closes_pending_removal() {
        let (mut app, _) = test_app();
        app.fields = vec![Field::new("OldA"), Field::new("OldB")];
        app.selected_field = 1;

        app.handle_key(key(KeyCode::Char('d'))).unwrap();
        assert_eq!(app.popup, Popup::Confirm);

        deliver_import(
            &mut app,
            vec![Field::new("Size"), Field::new("Color"), Field::new("Type")],
        );
        assert_eq!(app.popup, Popup::None);
        assert_eq!(app.confirm_field, None);

        // A late 'y' must not remove anything from the new set
        app.handle_key(key(KeyCode::Char('y'))).unwrap();
        let names: Vec<&str> = app.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Size", "Color", "Type"]);
    }

    #[test]
    fn test_import_closes_field_prompt() {
        let (mut app, _) = test_app();
        app.fields = vec![Field::new("OldA"), Field::new("OldB")];
        app.selected_field = 1;

        app.handle_key(key(KeyCode::Char('v'))).unwrap();
        type_text(&mut app, "X");
        deliver_import(
            &mut app,
            vec![Field::with_values("Size", ["S"]), Field::with_values("Color", ["Red"])],
        );
        assert_eq!(app.popup, Popup::None);
        assert_eq!(app.input_target, None);

        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.fields[1].values, vec!["Red"]);
        assert_eq!(app.fields[1].selected, None);
    }

    #[test]
    fn test_import_keeps_separator_prompt() {
        let (mut app, _) = test_app();
        app.section = Section::Separator;
        app.handle_key(key(KeyCode::Enter)).unwrap();

        deliver_import(&mut app, vec![Field::new("Size")]);
        assert_eq!(app.popup, Popup::Input);
        assert_eq!(app.input_target, Some(InputTarget::Separator));
    }

    #[test]
    fn test_confirm_prompt_outlives_status_timeout() {
        let (mut app, _) = test_app();
        app.fields = vec![Field::new("Type")];
        app.handle_key(key(KeyCode::Char('d'))).unwrap();

        app.status_message = Some("something else".to_string());
        app.status_message_time = Some(Instant::now() - STATUS_TIMEOUT - Duration::from_millis(1));
        app.tick();

        assert_eq!(app.popup, Popup::Confirm);
        assert_eq!(app.confirm_message.as_deref(), Some("Remove field 'Type'? (y/n)"));
    }

    #[test]
    fn test_control_keys_do_not_type() {
        let (mut app, _) = test_app();
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        type_text(&mut app, "Si");
        app.handle_key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL)).unwrap();
        app.handle_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT)).unwrap();
        app.handle_key(KeyEvent::new(KeyCode::Char('Z'), KeyModifiers::SHIFT)).unwrap();
        assert_eq!(app.input_buffer, "SiZ");
    }

    #[test]
    fn test_translated_status() {
        let mut table = std::collections::BTreeMap::new();
        table.insert("Nomenclature generated".to_string(), "Nomenclature générée".to_string());
        let mut app = App::new(
            &local_config(),
            Translator::from_table(table),
            Box::new(MemoryClipboard::default()),
        );
        app.generate();
        assert_eq!(app.status_message.as_deref(), Some("Nomenclature générée"));
        assert_eq!(app.labels[0].text, "");
    }

    #[test]
    fn test_browser_lists_importable_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("fields.csv"), "**A**\n").unwrap();
        std::fs::write(dir.path().join("fields.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let (mut app, _) = test_app();
        app.browser_path = dir.path().to_path_buf();
        app.handle_key(key(KeyCode::Char('i'))).unwrap();
        assert_eq!(app.popup, Popup::FileBrowser);

        let names: Vec<&str> = app.browser_entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["..", "sub", "fields.csv", "fields.json"]);
    }
}
