use crate::sink::{SplashOutput, SplashRunner};

/// Action label used for the pre-install verification pass.
pub const ACTION_VERIFY: &str = "verify";

/// Callback contract consumed from the package-transaction engine: one call per
/// per-item progress tick, plus a separate pre-install verification callback.
pub trait TransactionObserver {
    fn item_progress(
        &mut self,
        package: &str,
        action: &str,
        current: u64,
        total: u64,
        index: u64,
        count: u64,
    );

    fn verify_item(&mut self, package: &str, index: u64, count: u64);
}

/// Converts the fine-grained per-item callback stream into a bounded-rate
/// stream of splash updates: a new message only when the item changes, a new
/// progress call only when the transaction-wide percentage changes.
#[derive(Debug)]
pub struct TransactionDisplay<R> {
    splash: SplashOutput<R>,
    last_item: Option<(String, u64)>,
    last_percent: Option<u64>,
}

impl<R: SplashRunner> TransactionDisplay<R> {
    pub fn new(splash: SplashOutput<R>) -> Self {
        Self {
            splash,
            last_item: None,
            last_percent: None,
        }
    }

    pub fn splash_mut(&mut self) -> &mut SplashOutput<R> {
        &mut self.splash
    }

    pub fn into_splash(self) -> SplashOutput<R> {
        self.splash
    }

    pub fn event(
        &mut self,
        package: &str,
        action: &str,
        _current: u64,
        _total: u64,
        index: u64,
        count: u64,
    ) {
        // Percent tracks position within the whole transaction, not progress
        // within the current item.
        let percent = transaction_percent(index, count);

        let changed_item = self
            .last_item
            .as_ref()
            .map(|(last_package, last_index)| last_package != package || *last_index != index)
            .unwrap_or(true);
        if changed_item {
            self.splash
                .message(&format_event(package, action, index, count));
            self.last_item = Some((package.to_string(), index));
        }

        if self.last_percent != Some(percent) {
            self.splash.progress(percent);
            self.last_percent = Some(percent);
        }
    }

    pub fn verify(&mut self, package: &str, index: u64, count: u64) {
        self.event(package, ACTION_VERIFY, 0, 0, index, count);
    }
}

impl<R: SplashRunner> TransactionObserver for TransactionDisplay<R> {
    fn item_progress(
        &mut self,
        package: &str,
        action: &str,
        current: u64,
        total: u64,
        index: u64,
        count: u64,
    ) {
        self.event(package, action, current, total, index, count);
    }

    fn verify_item(&mut self, package: &str, index: u64, count: u64) {
        self.verify(package, index, count);
    }
}

pub(crate) fn format_event(package: &str, action: &str, index: u64, count: u64) -> String {
    format!("[{index}/{count}] {action}: {package}")
}

pub(crate) fn transaction_percent(index: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    index.saturating_mul(100) / count
}
