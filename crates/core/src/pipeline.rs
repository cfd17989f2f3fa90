//! One push run: detect → publish → notify.
//!
//! Resources are handled strictly one after another in config order. Each
//! changed resource is pushed before its source diff is read. The
//! first failing external call aborts the run; nothing already pushed is
//! rolled back and no notification is sent.

use tracing::{info, instrument};

use crate::changes::{ChangeDetector, ChangeSource};
use crate::errors::CoreError;
use crate::models::PushSummary;
use crate::notify::{summary_fields, SummaryNotifier};
use crate::publish::{Publisher, ResourcePusher};
use crate::tx_config::TxConfig;

/// Wires the three collaborators together for a single run.
pub struct PushPipeline<'a, S: ?Sized, P, N> {
    source: &'a S,
    pusher: &'a P,
    notifier: Option<&'a N>,
    base: String,
    title: String,
    dry_run: bool,
}

impl<'a, S, P, N> PushPipeline<'a, S, P, N>
where
    S: ChangeSource + ?Sized,
    P: ResourcePusher,
    N: SummaryNotifier,
{
    pub fn new(source: &'a S, pusher: &'a P, base: impl Into<String>) -> Self {
        Self {
            source,
            pusher,
            notifier: None,
            base: base.into(),
            title: String::new(),
            dry_run: false,
        }
    }

    /// Send a summary titled `title` at the end of the run. `None` disables
    /// notification.
    pub fn with_notifier(mut self, notifier: Option<&'a N>, title: impl Into<String>) -> Self {
        self.notifier = notifier;
        self.title = title.into();
        self
    }

    /// Skip pushing and notifying; detection and diffing still run.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[instrument(skip(self, config), fields(base = %self.base))]
    pub async fn run(&self, config: &TxConfig) -> Result<PushSummary, CoreError> {
        let names: Vec<&str> = config.resources().iter().map(|r| r.key.as_str()).collect();
        info!(?names, "resource names");

        let detector = ChangeDetector::new(self.source, self.base.as_str())?;
        let publisher = Publisher::new(self.pusher, self.dry_run);

        let mut summary = PushSummary::default();
        for entry in config.resources() {
            let mut report = detector.decide(entry);
            if !publisher.push(entry, &report).await? {
                summary.skipped.push(entry.key.clone());
                continue;
            }
            // Diff is read only after a successful push.
            detector.attach_diff(self.source, &mut report)?;
            summary.pushed.push(publisher.record(entry, &report));
        }

        info!(
            pushed = summary.pushed.len(),
            skipped = summary.skipped.len(),
            "push pass complete"
        );

        if let Some(notifier) = self.notifier {
            if self.dry_run {
                info!("dry run, not sending notification");
            } else {
                notifier
                    .send(&self.title, &summary_fields(&summary.pushed))
                    .await?;
                summary.notified = true;
            }
        }

        Ok(summary)
    }
}
