use crate::pipeline::IngestReport;
use crate::record::RecordKind;
use crate::ui::progress_message::ProgressMessage;
use crate::ui::theme;
use crate::ui::Icons;
use indicatif::{HumanDuration, ProgressBar};
use owo_colors::OwoColorize;
use std::thread;
use std::time::Duration;

pub struct ProgressManager {
    records: ProgressBar,
    handle: thread::JoinHandle<()>,
}

impl ProgressManager {
    pub fn new(total_records: usize) -> (Self, crossbeam::channel::Sender<ProgressMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressMessage>();

        let records = if console::Term::stdout().is_term() {
            ProgressBar::new(total_records as u64).with_message("Ingesting records")
        } else {
            ProgressBar::hidden()
        };

        let records_clone = records.clone();

        let handle = thread::spawn(move || {
            let mut menus = 0usize;
            let mut discoveries = 0usize;
            let mut dropped = 0usize;
            for msg in rx {
                match msg {
                    ProgressMessage::Committed(RecordKind::Menu) => menus += 1,
                    ProgressMessage::Committed(RecordKind::Discovery) => discoveries += 1,
                    ProgressMessage::Dropped { line, kind } => {
                        dropped += 1;
                        records_clone.set_message(format!("Dropped line {} ({:?})", line, kind));
                    }
                    ProgressMessage::Exit => break,
                }
                records_clone.inc(1);
                if dropped == 0 {
                    records_clone.set_message(format!("{} menus, {} discoveries", menus, discoveries));
                }
            }
        });

        (
            Self {
                records,
                handle,
            },
            tx,
        )
    }

    /// Stop the display and print the run totals.
    /// The caller must have sent `Exit` or dropped every sender first.
    pub fn finish_with_summary(self, duration: Duration, report: &IngestReport) {
        self.handle.join().ok();
        self.records.finish_and_clear();
        println!();
        println!(
            "{} {}",
            Icons::CHECK.style(theme().success.clone()),
            format!("Complete in {}", HumanDuration(duration)).style(theme().success.clone())
        );
        println!(
            "  {} {}  {} {}  {} {}",
            Icons::MENU.style(theme().info.clone()),
            report.menu_records,
            Icons::LINK.style(theme().info.clone()),
            report.links,
            Icons::CROSS.style(theme().info.clone()),
            report.failures.len()
        );
    }
}
