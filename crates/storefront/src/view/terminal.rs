//! Plain-text front end: lists drawn to a writer, actions typed as commands.

use std::io::Write;
use std::sync::Mutex;

use chrono::Utc;
use shopcart_core::{CartItem, DomainError, DomainResult, InventoryItem, ItemId};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::{
    ActionHandler, CartView, CommandTarget, IdHandler, ListenerSet, UiAction, UiEventPort, lock,
};

pub const HELP: &str = "commands: dec <id> | inc <id> | add <id> | del <id> | checkout | help | quit";

/// One parsed input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Action(UiAction),
    Help,
    Quit,
}

/// Parse a command line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> DomainResult<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    if words.next().is_some() {
        return Err(DomainError::validation(format!("too many arguments: {line:?}")));
    }

    let id = || -> DomainResult<ItemId> {
        arg.ok_or_else(|| DomainError::validation(format!("{verb} needs an item id")))?
            .parse()
    };
    let no_arg = |command: Command| -> DomainResult<Command> {
        match arg {
            Some(extra) => Err(DomainError::validation(format!("{verb} takes no argument, got {extra:?}"))),
            None => Ok(command),
        }
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "dec" | "-" => Command::Action(UiAction::Decrement(id()?)),
        "inc" | "+" => Command::Action(UiAction::Increment(id()?)),
        "add" => Command::Action(UiAction::AddToCart(id()?)),
        "del" | "rm" => Command::Action(UiAction::DeleteFromCart(id()?)),
        "checkout" => no_arg(Command::Action(UiAction::Checkout))?,
        "help" | "?" => no_arg(Command::Help)?,
        "quit" | "q" | "exit" => no_arg(Command::Quit)?,
        other => return Err(DomainError::validation(format!("unknown command {other:?}"))),
    };
    Ok(Some(command))
}

/// Feed command lines from `reader` into `target` until `quit`, EOF or a read
/// error, then close the target. A read error is returned after closing.
pub async fn read_commands<R, T>(reader: R, target: &T) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    T: CommandTarget + ?Sized,
{
    let result = feed_lines(reader, target).await;
    match &result {
        Ok(()) => tracing::info!("command input closed"),
        Err(e) => tracing::warn!(error = %e, "command input failed"),
    }
    target.close();
    result
}

async fn feed_lines<R, T>(reader: R, target: &T) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    T: CommandTarget + ?Sized,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Action(action))) => {
                tracing::debug!(%action, "user action");
                target.dispatch(action);
            }
            Ok(Some(Command::Help)) => target.reject(HELP),
            Ok(Some(Command::Quit)) => break,
            Err(e) => target.reject(&format!("{e}; {HELP}")),
        }
    }
    Ok(())
}

/// Text renderer over any writer (usually stdout).
pub struct TerminalView<W> {
    out: Mutex<W>,
    listeners: Mutex<ListenerSet>,
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            listeners: Mutex::new(ListenerSet::default()),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self, text: &str) {
        let mut out = lock(&self.out);
        if let Err(e) = out.write_all(text.as_bytes()) {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }
}

impl<W> TerminalView<W> {
    /// Run the listeners for `action`. Returns how many ran.
    pub fn emit(&self, action: UiAction) -> usize {
        lock(&self.listeners).emit(action)
    }
}

impl<W: Write + Send> CartView for TerminalView<W> {
    fn render_inventory(&self, items: &[InventoryItem]) {
        let mut text = String::from("Inventory\n");
        if items.is_empty() {
            text.push_str("  (empty)\n");
        }
        for item in items {
            text.push_str(&format!("  [{:>3}] {:<20} - {:>4} +   (add {})\n", item.id, item.content, item.amount, item.id));
        }
        self.write(&text);
    }

    fn render_cart(&self, items: &[CartItem]) {
        let mut text = String::from("Shopping Cart\n");
        if items.is_empty() {
            text.push_str("  (empty)\n");
        }
        for item in items {
            text.push_str(&format!("  [{:>3}] {} x {}\n", item.id, item.content, item.amount));
        }
        self.write(&text);
    }

    fn notify_error(&self, message: &str) {
        self.write(&format!("[{}] ! {message}\n", Utc::now().format("%H:%M:%S")));
        self.flush();
    }

    fn flush(&self) {
        let mut out = lock(&self.out);
        let result = match out.write_all(b"\n") {
            Ok(()) => out.flush(),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to flush terminal");
        }
    }
}

impl<W> UiEventPort for TerminalView<W> {
    fn on_decrement(&self, handler: IdHandler) {
        self.listeners.on_decrement(handler);
    }

    fn on_increment(&self, handler: IdHandler) {
        self.listeners.on_increment(handler);
    }

    fn on_add_to_cart(&self, handler: IdHandler) {
        self.listeners.on_add_to_cart(handler);
    }

    fn on_delete_from_cart(&self, handler: IdHandler) {
        self.listeners.on_delete_from_cart(handler);
    }

    fn on_checkout(&self, handler: ActionHandler) {
        self.listeners.on_checkout(handler);
    }
}

impl<W: Write + Send> CommandTarget for TerminalView<W> {
    fn dispatch(&self, action: UiAction) {
        if self.emit(action) == 0 {
            tracing::debug!(%action, "no listener attached");
        }
    }

    fn reject(&self, message: &str) {
        self.write(&format!("{message}\n"));
        self.flush();
    }

    fn close(&self) {
        lock(&self.listeners).clear();
    }
}
