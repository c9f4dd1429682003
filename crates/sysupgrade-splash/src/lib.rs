mod display;
mod sink;

pub use display::{TransactionDisplay, TransactionObserver, ACTION_VERIFY};
pub use sink::{ProcessRunner, SplashOutput, SplashRequest, SplashRunner, PLYMOUTH};

#[cfg(test)]
mod tests;
