//! `aichat`: line-oriented terminal chat with a simulated AI assistant.
//!
//! Chats persist to a JSON snapshot between runs. Configuration via CLI
//! flags, environment variables, or config file
//! (`~/.config/aichat/config.toml`).
//!
//! ```bash
//! # Default: persist to the platform data directory
//! cargo run --bin aichat
//!
//! # Nothing written to disk, no network lookups
//! cargo run --bin aichat -- --ephemeral --offline
//!
//! # Verbose logs in a custom file
//! AICHAT_LOG=debug cargo run --bin aichat -- --log-file ./aichat.log
//! ```

use std::io::{self, Write};
use std::path::Path;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use aichat::command::{self, Command, CommandError};
use aichat::config::{CliArgs, ClientConfig};
use aichat::conversation::{SendError, send_message};
use aichat::history::{HistoryPager, LoadOutcome, SimulatedHistory, load_on_scroll};
use aichat::login::{LoginFlow, LoginStep};
use aichat::notify::{Notice, Notifier};
use aichat::services::{
    AnyCountryDirectory, SimulatedAuth, SimulatedResponder, StaticCountryDirectory,
};
use aichat::store::{FileStorage, MemoryStorage, SharedStore, SnapshotStorage, Store};
use aichat_proto::chatroom::Chatroom;
use aichat_proto::message::{Message, Sender};

const NOTICE_BUFFER: usize = 64;

#[tokio::main(flavor = "current_thread")]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Logs go to a file so they never interleave with the prompt.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("aichat starting");

    let storage = open_storage(&config);
    let (notifier, notices) = Notifier::channel(NOTICE_BUFFER);
    let store = Store::load(storage)
        .with_notifier(notifier.clone())
        .into_shared();

    let countries = config.to_country_directory().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "falling back to built-in country list");
        AnyCountryDirectory::Static(StaticCountryDirectory::builtin())
    });

    let mut repl = Repl {
        store,
        notifier: notifier.clone(),
        notices,
        login: LoginFlow::new(config.to_auth(), notifier),
        countries,
        responder: config.to_responder(),
        history: config.to_history_source(),
        pager: parking_lot::Mutex::new(HistoryPager::new(config.history.clone())),
        lines: BufReader::new(tokio::io::stdin()).lines(),
    };

    let result = repl.run().await;
    tracing::info!("aichat exiting");
    result
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown so buffered
/// entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("aichat.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Picks the storage backend: memory when ephemeral, otherwise a file.
fn open_storage(config: &ClientConfig) -> Box<dyn SnapshotStorage> {
    if config.ephemeral {
        tracing::info!("ephemeral session, nothing will be saved");
        return Box::new(MemoryStorage::new());
    }
    match config.storage_path.clone().or_else(FileStorage::default_path) {
        Some(path) => {
            tracing::info!(path = %path.display(), "using file storage");
            Box::new(FileStorage::new(path))
        }
        None => {
            tracing::warn!("no data directory available, chats will not be saved");
            Box::new(MemoryStorage::new())
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

struct Repl<S: SnapshotStorage> {
    store: SharedStore<S>,
    notifier: Notifier,
    notices: mpsc::Receiver<Notice>,
    login: LoginFlow<SimulatedAuth>,
    countries: AnyCountryDirectory,
    responder: SimulatedResponder,
    history: SimulatedHistory,
    pager: parking_lot::Mutex<HistoryPager>,
    lines: Lines<BufReader<Stdin>>,
}

impl<S: SnapshotStorage> Repl<S> {
    async fn run(&mut self) -> io::Result<()> {
        self.greet();
        loop {
            self.drain_notices();
            let Some(line) = self.prompt("> ").await? else {
                break;
            };
            let flow = match command::parse(&line) {
                Ok(cmd) => self.execute(cmd).await?,
                Err(CommandError::Empty) => Flow::Continue,
                Err(e) => {
                    println!("{e}");
                    Flow::Continue
                }
            };
            if matches!(flow, Flow::Quit) {
                break;
            }
        }
        self.drain_notices();
        Ok(())
    }

    fn greet(&self) {
        let state = self.store.lock().state();
        println!("aichat: type a message, or /help for commands.");
        match &state.user {
            Some(user) if user.is_authenticated => {
                println!("Signed in as {}.", user.full_number());
            }
            _ => println!("Not signed in. Use /login to sign in."),
        }
        if !state.chatrooms.is_empty() {
            println!("{} saved chat(s). /rooms to list them.", state.chatrooms.len());
        }
    }

    async fn execute(&mut self, cmd: Command) -> io::Result<Flow> {
        match cmd {
            Command::Login => self.login().await?,
            Command::Logout => {
                self.store.lock().logout();
                self.notifier.info("Signed out");
            }
            Command::New(title) => {
                let room = self.store.lock().create_chatroom(title.as_deref());
                self.notifier.success(format!("Created \"{}\"", room.title));
            }
            Command::Rooms => self.list_rooms(),
            Command::Switch(n) => {
                if let Some(room) = self.nth_listed(n) {
                    self.store.lock().set_active_chatroom(&room.id);
                    self.show_active();
                }
            }
            Command::Delete(n) => self.delete(n),
            Command::Search(query) => {
                self.store.lock().set_search_query(query);
                self.list_rooms();
            }
            Command::Show => self.show_active(),
            Command::Older => self.scroll_to_top().await,
            Command::Theme => {
                let theme = self.store.lock().toggle_theme();
                println!("Theme: {theme}");
            }
            Command::Sidebar => {
                let open = {
                    let mut store = self.store.lock();
                    store.toggle_sidebar();
                    store.state().sidebar_open
                };
                if open {
                    self.list_rooms();
                } else {
                    println!("Chat list hidden.");
                }
            }
            Command::Reset => {
                self.store.lock().reset();
                self.pager.lock().leave();
                self.notifier.info("All chats deleted");
            }
            Command::Help => println!("{}", command::HELP),
            Command::Quit => return Ok(Flow::Quit),
            Command::Image { image, caption } => self.say(&caption, Some(&image)).await,
            Command::Say(text) => self.say(&text, None).await,
        }
        Ok(Flow::Continue)
    }

    async fn say(&mut self, text: &str, image: Option<&str>) {
        println!("(assistant is typing...)");
        match send_message(&self.store, &self.responder, &self.notifier, text, image).await {
            Ok(exchange) => {
                if let Some(reply) = exchange.reply {
                    print_message(&reply);
                }
            }
            Err(SendError::Empty) => println!("Nothing to send."),
        }
    }

    async fn login(&mut self) -> io::Result<()> {
        if let Some(user) = self.store.lock().state().user.as_ref()
            && user.is_authenticated
        {
            println!("Already signed in as {}.", user.full_number());
            return Ok(());
        }

        self.login.start(&self.countries).await;
        self.drain_notices();
        let sample: Vec<String> = self
            .login
            .countries()
            .iter()
            .take(5)
            .map(|c| format!("{} {}", c.dial_code, c.name))
            .collect();
        if !sample.is_empty() {
            println!(
                "{} countries available, e.g. {}",
                self.login.countries().len(),
                sample.join(", ")
            );
        }

        loop {
            self.drain_notices();
            match self.login.step().clone() {
                LoginStep::EnterPhone => {
                    let Some(code) = self.prompt("Country code (e.g. +1, empty to cancel): ").await?
                    else {
                        return Ok(());
                    };
                    if code.trim().is_empty() {
                        return Ok(());
                    }
                    let Some(phone) = self.prompt("Phone number: ").await? else {
                        return Ok(());
                    };
                    println!("Sending code...");
                    if let Err(e) = self.login.submit_phone(&phone, &code).await {
                        println!("{e}");
                    }
                }
                LoginStep::OtpSent { .. } => {
                    let Some(input) = self
                        .prompt("6-digit code (/resend, /back, empty to cancel): ")
                        .await?
                    else {
                        return Ok(());
                    };
                    let result = match input.trim() {
                        "" => return Ok(()),
                        "/back" => {
                            self.login.back();
                            Ok(())
                        }
                        "/resend" => self.login.resend().await,
                        code => {
                            println!("Verifying...");
                            self.login.submit_otp(&self.store, code).await.map(|_| ())
                        }
                    };
                    if let Err(e) = result {
                        println!("{e}");
                    }
                }
                LoginStep::Verified(user) => {
                    self.drain_notices();
                    println!("Signed in as {}.", user.full_number());
                    return Ok(());
                }
            }
        }
    }

    fn list_rooms(&self) {
        let state = self.store.lock().state();
        let rooms = state.filtered_chatrooms();
        if !state.search_query.is_empty() {
            println!("Chats matching \"{}\":", state.search_query);
        }
        if rooms.is_empty() {
            println!("(no chats)");
            return;
        }
        for (i, room) in rooms.iter().enumerate() {
            let marker = if state.active_chatroom_id == Some(room.id) {
                '*'
            } else {
                ' '
            };
            let preview = room.preview().unwrap_or_default();
            println!("{marker}{:>3}. {}  {preview}", i + 1, room.title);
        }
    }

    fn nth_listed(&self, n: usize) -> Option<Chatroom> {
        let state = self.store.lock().state();
        let room = state.filtered_chatrooms().get(n - 1).map(|c| (*c).clone());
        if room.is_none() {
            println!("No chat number {n}. /rooms to list them.");
        }
        room
    }

    fn delete(&self, n: Option<usize>) {
        let target = match n {
            Some(n) => self.nth_listed(n),
            None => self.store.lock().state().active_chatroom().cloned(),
        };
        let Some(room) = target else {
            if n.is_none() {
                println!("No chat is open.");
            }
            return;
        };
        self.store.lock().delete_chatroom(&room.id);
        self.notifier.success(format!("Deleted \"{}\"", room.title));
    }

    /// Re-attaches the pager when the open chat changed, or when it had no
    /// history to offer and has since gained messages.
    fn sync_pager(&self, room: &Chatroom) {
        let mut pager = self.pager.lock();
        let stale_view = pager.chatroom_id() != Some(room.id)
            || (pager.pages_loaded() == 0 && !pager.has_more() && !room.messages.is_empty());
        if stale_view {
            pager.enter(room);
        }
    }

    fn show_active(&self) {
        let state = self.store.lock().state();
        let Some(room) = state.active_chatroom() else {
            println!("No chat is open. Type a message to start one.");
            return;
        };
        self.sync_pager(room);
        println!("== {} ==", room.title);
        let pager = self.pager.lock();
        if pager.has_more() {
            println!("(/older for earlier messages)");
        }
        for message in pager.visible_messages(&room.messages) {
            print_message(message);
        }
    }

    /// `/older` scrolls the transcript to its top edge.
    async fn scroll_to_top(&self) {
        let state = self.store.lock().state();
        let Some(room) = state.active_chatroom() else {
            println!("No chat is open.");
            return;
        };
        self.sync_pager(room);
        println!("Loading older messages...");
        match load_on_scroll(&self.pager, &self.history, 0).await {
            None => println!("No more history."),
            Some(LoadOutcome::Stale) => {}
            Some(LoadOutcome::Loaded { added } | LoadOutcome::Exhausted { added }) => {
                let pager = self.pager.lock();
                for message in pager.older_messages().iter().take(added) {
                    print_message(message);
                }
                if !pager.has_more() {
                    println!("(beginning of conversation)");
                }
            }
        }
    }

    async fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        print!("{label}");
        io::stdout().flush()?;
        self.lines.next_line().await
    }

    fn drain_notices(&mut self) {
        while let Ok(notice) = self.notices.try_recv() {
            println!("[{}] {}", notice.level, notice.text);
        }
    }
}

fn print_message(message: &Message) {
    let time = message
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%H:%M");
    let who = match message.sender {
        Sender::User => "you",
        Sender::Ai => "ai",
    };
    match &message.image {
        Some(image) if message.content.is_empty() => println!("[{time}] {who}: [image {image}]"),
        Some(image) => println!("[{time}] {who}: [image {image}] {}", message.content),
        None => println!("[{time}] {who}: {}", message.content),
    }
}
