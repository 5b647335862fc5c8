use indicatif::{ProgressBar, ProgressStyle};
use plexsync_core::SyncProgress;
use std::cell::RefCell;
use std::io::IsTerminal;

/// One progress bar per library section.
///
/// Falls back to log lines when stdout is not a terminal (cron, docker).
pub struct SectionProgress {
    bar: RefCell<Option<ProgressBar>>,
    interactive: bool,
}

impl SectionProgress {
    pub fn new(enabled: bool) -> Self {
        let interactive = enabled && is_interactive();
        if !interactive {
            tracing::debug!(operation = "ui_init", mode = "non_interactive", "Progress bars disabled");
        }
        Self { bar: RefCell::new(None), interactive }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
    }
}

impl SyncProgress for SectionProgress {
    fn section_started(&self, title: &str, total: usize) {
        if !self.interactive {
            tracing::info!(operation = "section", section = %title, items = total, "{}", title);
            return;
        }
        let bar = ProgressBar::new(total as u64);
        bar.set_style(Self::bar_style());
        bar.set_message(title.to_string());
        *self.bar.borrow_mut() = Some(bar);
    }

    fn item_processed(&self) {
        if let Some(bar) = self.bar.borrow().as_ref() {
            bar.inc(1);
        }
    }

    fn section_finished(&self) {
        if let Some(bar) = self.bar.borrow_mut().take() {
            bar.finish_and_clear();
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal()
}
