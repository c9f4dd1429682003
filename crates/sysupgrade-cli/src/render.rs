use anstyle::{AnsiColor, Effects, Style};
use indicatif::{ProgressBar, ProgressStyle};
use sysupgrade_splash::{TransactionObserver, ACTION_VERIFY};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputStyle {
    Plain,
    Rich,
}

pub fn current_output_style() -> OutputStyle {
    if std::env::var_os("NO_COLOR").is_some() {
        return OutputStyle::Plain;
    }
    match std::env::var("TERM") {
        Ok(term) if term != "dumb" => OutputStyle::Rich,
        _ => OutputStyle::Plain,
    }
}

pub fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => format!("{status}: {message}"),
        OutputStyle::Rich => format!("{}: {message}", colorize(status_style(), status)),
    }
}

pub fn print_status(style: OutputStyle, status: &str, message: &str) {
    println!("{}", render_status_line(style, status, message));
}

fn status_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

/// Terminal-side transaction observer, so progress stays visible when the
/// boot splash is not running. Throttled like the splash display: one update
/// per transaction item.
pub struct ConsoleProgress {
    style: OutputStyle,
    progress_bar: Option<ProgressBar>,
    last_item: Option<(String, u64)>,
}

impl ConsoleProgress {
    pub fn new(style: OutputStyle) -> Self {
        Self {
            style,
            progress_bar: None,
            last_item: None,
        }
    }

    pub fn finish(mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }

    fn update(&mut self, package: &str, action: &str, index: u64, count: u64) {
        let changed_item = self
            .last_item
            .as_ref()
            .map(|(last_package, last_index)| last_package != package || *last_index != index)
            .unwrap_or(true);
        if !changed_item {
            return;
        }
        self.last_item = Some((package.to_string(), index));

        let label = format!("[{index}/{count}] {action}: {package}");
        match self.style {
            OutputStyle::Plain => println!("{label}"),
            OutputStyle::Rich => {
                let progress_bar = self.progress_bar.get_or_insert_with(|| {
                    let progress_bar = ProgressBar::new(count.max(1));
                    if let Ok(style) = ProgressStyle::with_template(
                        "{msg:<40} [{bar:20.cyan/blue}] {pos:>4}/{len:4}",
                    ) {
                        progress_bar.set_style(style.progress_chars("=>-"));
                    }
                    progress_bar
                });
                progress_bar.set_length(count.max(1));
                progress_bar.set_position(index.min(count.max(1)));
                progress_bar.set_message(label);
            }
        }
    }
}

impl TransactionObserver for ConsoleProgress {
    fn item_progress(
        &mut self,
        package: &str,
        action: &str,
        _current: u64,
        _total: u64,
        index: u64,
        count: u64,
    ) {
        self.update(package, action, index, count);
    }

    fn verify_item(&mut self, package: &str, index: u64, count: u64) {
        self.update(package, ACTION_VERIFY, index, count);
    }
}
