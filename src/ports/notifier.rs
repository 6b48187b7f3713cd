//! Console [`NotifierPort`] using the crate's colored-println macro family
//! and the [`crate::ui::UI`] spinner for the one long-running step per
//! strategy (the fetch+score pass between `on_strategy_start` and
//! `on_strategy_result`).

use super::{NotifierPort, RetryKind};
use crate::ui::UI;
use crate::{blog, blog_error, blog_warning};
use indicatif::ProgressBar;
use std::cell::RefCell;
use std::time::Duration;

pub struct ConsoleNotifier {
    spinner: RefCell<Option<ProgressBar>>,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        ConsoleNotifier {
            spinner: RefCell::new(None),
        }
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifierPort for ConsoleNotifier {
    fn on_strategy_start(&self, description: &str, index: usize, total: usize) {
        let pb = UI::spinner("Stratégie", &format!("[{}/{}] {}", index + 1, total, description));
        *self.spinner.borrow_mut() = Some(pb);
    }

    fn on_strategy_result(&self, description: &str, new_accepted: usize, total_received: usize) {
        let message = format!("{description}: {new_accepted} accepté(s) sur {total_received} reçu(s)");
        match self.spinner.borrow_mut().take() {
            Some(pb) => UI::finish_with_message(pb, "Résultat", &message),
            None => blog!("Résultat", "{}", message),
        }
    }

    fn on_retry(&self, kind: RetryKind, wait_seconds: u64, attempt: u32, max: u32) {
        let label = match kind {
            RetryKind::RateLimit => "limite de débit",
            RetryKind::Transient => "erreur transitoire",
        };
        blog_warning!(
            "Nouvel essai",
            "{} — attente {}s (tentative {}/{})",
            label,
            wait_seconds,
            attempt,
            max
        );
    }

    fn on_success(&self, elapsed: Duration, added: usize) {
        blog!(
            "Terminé",
            "{} nouvel(aux) article(s) en {:.1}s",
            added,
            elapsed.as_secs_f64()
        );
    }

    fn on_failure(&self, message: &str) {
        blog_error!("Échec", "{}", message);
    }

    fn on_empty_export(&self, merge: bool, search: &str) {
        blog_warning!(
            "Export vide",
            "aucun article à exporter pour « {} » (fusion={})",
            search,
            merge
        );
    }
}
