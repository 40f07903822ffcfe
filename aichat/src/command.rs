//! Parsing of REPL input lines.
//!
//! Lines starting with `/` are commands; anything else is a message for the
//! active chatroom. Chatroom numbers are 1-based, as listed by `/rooms`.

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start phone login.
    Login,
    /// Sign out, keeping chats.
    Logout,
    /// Create a chatroom, optionally titled.
    New(Option<String>),
    /// List chatrooms matching the current search.
    Rooms,
    /// Select the n-th listed chatroom.
    Switch(usize),
    /// Delete the n-th listed chatroom, or the active one.
    Delete(Option<usize>),
    /// Set the search filter; empty clears it.
    Search(String),
    /// Load a page of older messages.
    Older,
    /// Show the active chatroom.
    Show,
    /// Toggle light/dark.
    Theme,
    /// Toggle the sidebar.
    Sidebar,
    /// Wipe all state.
    Reset,
    /// Print help.
    Help,
    /// Exit.
    Quit,
    /// Send an image reference with an optional caption.
    Image {
        /// Image reference (path or URL).
        image: String,
        /// Accompanying text.
        caption: String,
    },
    /// Send text to the active chatroom.
    Say(String),
}

/// Errors returned by [`parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The line was blank.
    #[error("nothing to do")]
    Empty,
    /// Unrecognized `/command`.
    #[error("unknown command '/{0}' (try /help)")]
    Unknown(String),
    /// A required argument is missing.
    #[error("/{0} needs {1}")]
    MissingArgument(&'static str, &'static str),
    /// A chatroom number is not a positive integer.
    #[error("'{0}' is not a chatroom number")]
    InvalidIndex(String),
}

/// Help text listing every command.
pub const HELP: &str = "\
/login              sign in with your phone number
/logout             sign out (chats are kept)
/new [title]        start a new chat
/rooms              list chats (filtered by /search)
/switch <n>         open chat number n
/delete [n]         delete chat n, or the open chat
/search [query]     filter the chat list; no query clears it
/show               print the open chat
/older              load older messages
/image <ref> [text] send an image with an optional caption
/theme              toggle light/dark
/sidebar            toggle the chat list
/reset              delete everything
/help               show this help
/quit               exit
anything else       send a message";

/// Parses one input line.
///
/// # Errors
///
/// Returns [`CommandError`] for blank input, unknown commands, and missing or
/// malformed arguments.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(CommandError::Empty);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Say(line.to_string()));
    };

    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(n, a)| (n, a.trim()));

    match name {
        "login" => Ok(Command::Login),
        "logout" => Ok(Command::Logout),
        "new" => Ok(Command::New(non_empty(arg))),
        "rooms" | "ls" => Ok(Command::Rooms),
        "switch" => {
            if arg.is_empty() {
                return Err(CommandError::MissingArgument("switch", "a chatroom number"));
            }
            index(arg).map(Command::Switch)
        }
        "delete" => {
            if arg.is_empty() {
                Ok(Command::Delete(None))
            } else {
                index(arg).map(|n| Command::Delete(Some(n)))
            }
        }
        "search" => Ok(Command::Search(arg.to_string())),
        "show" => Ok(Command::Show),
        "older" => Ok(Command::Older),
        "image" => {
            let (image, caption) = arg
                .split_once(char::is_whitespace)
                .map_or((arg, ""), |(i, c)| (i, c.trim()));
            if image.is_empty() {
                return Err(CommandError::MissingArgument("image", "an image reference"));
            }
            Ok(Command::Image {
                image: image.to_string(),
                caption: caption.to_string(),
            })
        }
        "theme" => Ok(Command::Theme),
        "sidebar" => Ok(Command::Sidebar),
        "reset" => Ok(Command::Reset),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn non_empty(arg: &str) -> Option<String> {
    (!arg.is_empty()).then(|| arg.to_string())
}

fn index(arg: &str) -> Result<usize, CommandError> {
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::InvalidIndex(arg.to_string())),
    }
}
