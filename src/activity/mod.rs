pub mod transaction;

use crate::fl;
use transaction::{TransactionInfo, TransactionSummary};

/// The store backing the activity list. Transaction aggregation and refreshing live behind it.
pub trait TransactionsActivityStore {
    type Details;

    fn transaction_summaries(&self) -> &[TransactionSummary];

    fn update(&mut self);

    fn transaction_details_store(&self, tx_info: &TransactionInfo) -> Self::Details;
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EmptyState {
    pub title: String,
    pub description: String,
}

impl EmptyState {
    pub fn localized() -> Self {
        Self {
            title: fl!("activity-page-empty-title"),
            description: fl!("activity-page-empty-description"),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ActivityRow<'a> {
    pub index: usize,
    pub summary: &'a TransactionSummary,
}

impl ActivityRow<'_> {
    pub fn id(&self) -> &str {
        self.summary.id()
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ActivityContent<'a> {
    Empty(EmptyState),
    Rows(Vec<ActivityRow<'a>>),
}

/// What the detail sheet is shown with: the requested details store and the pass-through
/// network store.
#[derive(Debug)]
pub struct TransactionDetailsSheet<'a, D, N> {
    pub details: &'a D,
    pub network_store: &'a N,
}

/// Toolkit-independent model of the transactions activity list.
///
/// The hosting UI calls [`on_appear`](Self::on_appear) and
/// [`on_disappear`](Self::on_disappear) as the view is activated and deactivated, renders
/// [`content`](Self::content) and forwards row presses to [`select`](Self::select).
pub struct TransactionsActivityView<S: TransactionsActivityStore, N> {
    store: S,
    network_store: N,
    transaction_details: Option<S::Details>,
    active: bool,
}

impl<S: TransactionsActivityStore, N> TransactionsActivityView<S, N> {
    pub fn new(store: S, network_store: N) -> Self {
        Self {
            store,
            network_store,
            transaction_details: None,
            active: false,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn network_store(&self) -> &N {
        &self.network_store
    }

    /// Refreshes the store once per activation.
    pub fn on_appear(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        log::debug!("activity view appeared, refreshing transactions");
        self.store.update();
    }

    pub fn on_disappear(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn content(&self) -> ActivityContent<'_> {
        let summaries = self.store.transaction_summaries();
        if summaries.is_empty() {
            return ActivityContent::Empty(EmptyState::localized());
        }
        ActivityContent::Rows(
            summaries
                .iter()
                .enumerate()
                .map(|(index, summary)| ActivityRow { index, summary })
                .collect(),
        )
    }

    /// Opens the details sheet for the summary with `summary_id`, replacing any open sheet.
    /// Unknown ids leave the view untouched.
    pub fn select(&mut self, summary_id: &str) -> bool {
        let Some(summary) = self
            .store
            .transaction_summaries()
            .iter()
            .find(|summary| summary.id() == summary_id)
        else {
            log::warn!("no transaction summary with id {summary_id}");
            return false;
        };
        self.transaction_details = Some(self.store.transaction_details_store(&summary.tx_info));
        true
    }

    pub fn is_presenting_details(&self) -> bool {
        self.transaction_details.is_some()
    }

    pub fn set_presenting_details(&mut self, presented: bool) {
        if !presented {
            self.dismiss_details();
        }
    }

    pub fn dismiss_details(&mut self) {
        self.transaction_details = None;
    }

    pub fn details_sheet(&self) -> Option<TransactionDetailsSheet<'_, S::Details, N>> {
        self.transaction_details
            .as_ref()
            .map(|details| TransactionDetailsSheet {
                details,
                network_store: &self.network_store,
            })
    }
}
