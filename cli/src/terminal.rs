//! Terminal-backed capabilities: in-memory widgets and a stderr UI.

use std::io::{self, BufRead, Write};

use slotedit_engine::slotedit_types::{SlotSpec, SlotView, ToastLevel, ViewMode};
use slotedit_engine::{ChangeNotifier, DiscardTarget, Disposable, Ui, Widget, WidgetFactory};

/// A slot buffer with no interactive editing; it only holds text.
pub(crate) struct BufferWidget {
    value: String,
}

impl Widget for BufferWidget {
    fn value(&self) -> String {
        self.value.clone()
    }

    fn set_value(&mut self, value: &str) {
        value.clone_into(&mut self.value);
    }

    fn on_change(&mut self, _notifier: ChangeNotifier) -> Box<dyn Disposable> {
        Box::new(NoSubscription)
    }

    fn dispose(self: Box<Self>) {}
}

struct NoSubscription;

impl Disposable for NoSubscription {
    fn dispose(self: Box<Self>) {}
}

pub(crate) struct BufferWidgets;

impl WidgetFactory for BufferWidgets {
    fn create(&self, slot: &SlotSpec, initial: &str) -> Box<dyn Widget> {
        tracing::debug!(slot = %slot.id(), "Opening buffer");
        Box::new(BufferWidget {
            value: initial.to_string(),
        })
    }
}

/// Notices go to stderr so stdout stays clean for `export`.
pub(crate) struct TerminalUi;

impl Ui for TerminalUi {
    fn toast(&self, message: &str, level: ToastLevel) {
        eprintln!("[{}] {message}", level.as_str());
    }

    fn disable_save_controls(&self, busy_label: &str) {
        eprintln!("{busy_label}");
    }

    fn restore_save_controls(&self) {}

    fn render_slots(&self, _slots: &[SlotView]) {}

    fn refresh_toggles(&self, _slots: &[SlotView]) {}

    fn rebuild_activation_ui(&self, mode: ViewMode, _slots: &[SlotView]) {
        tracing::debug!(?mode, "Activation layout");
    }

    fn arm_inline_confirmation(&self, target: &DiscardTarget) {
        tracing::debug!(%target, "Discard armed");
    }

    fn show_no_changes(&self, target: &DiscardTarget) {
        match target {
            DiscardTarget::All => eprintln!("Nothing to discard."),
            DiscardTarget::Slot(id) => eprintln!("Nothing to discard in {id}."),
        }
    }
}

/// Ask a yes/no question on stderr; anything but `y`/`yes` is no.
pub(crate) fn confirm(question: &str) -> io::Result<bool> {
    let mut stderr = io::stderr();
    write!(stderr, "{question} [y/N] ")?;
    stderr.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// One line per slot for `status`.
pub(crate) fn format_slot_line(view: &SlotView, content: &str) -> String {
    let state = match (view.active, view.dirty) {
        (true, true) => "open, modified",
        (true, false) => "open",
        (false, true) => "modified",
        (false, false) => "-",
    };
    format!(
        "{:<16} {:<24} {:<16} {} chars",
        view.id.as_str(),
        view.label,
        state,
        content.chars().count()
    )
}
