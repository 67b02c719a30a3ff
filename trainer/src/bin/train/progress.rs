use std::error::Error;
use std::io;

use indicatif::{ProgressBar, ProgressStyle};
use trainer::{EvaluationMetrics, GameMetrics, MetricsSink, UpdateStatus};

/// Progress bar over the training games, fed by the metrics of each game.
pub struct ProgressSink {
    bar: ProgressBar,
    rejected: usize,
}

impl ProgressSink {
    pub fn new(games: usize) -> Result<Self, Box<dyn Error>> {
        let bar = ProgressBar::new(games as u64);
        bar.set_style(ProgressStyle::default_bar().template(
            "{spinner:.cyan} {pos}/{len} [{wide_bar:.cyan/blue}] {eta_precise} | {msg}",
        )?);
        Ok(Self { bar, rejected: 0 })
    }

    /// Handle to the bar that stays usable after the sink is handed away.
    pub fn bar(&self) -> ProgressBar {
        self.bar.clone()
    }
}

impl MetricsSink for ProgressSink {
    fn record(&mut self, metrics: &GameMetrics) -> io::Result<()> {
        if metrics.update == UpdateStatus::Rejected {
            self.rejected += 1;
        }
        let loss = metrics
            .loss_after
            .or(metrics.loss_before)
            .map_or_else(|| "-".to_string(), |l| format!("{:.5}", l));
        self.bar.set_message(format!(
            "v{} loss: {} drift: {:.1}cp rejected: {}",
            metrics.params_version, loss, metrics.eval_drift, self.rejected
        ));
        self.bar.inc(1);
        Ok(())
    }

    fn record_evaluation(&mut self, metrics: &EvaluationMetrics) -> io::Result<()> {
        if let Some(score) = &metrics.baseline {
            self.bar.println(format!(
                "v{} vs material-only baseline: {}, {:.0} plies per game",
                metrics.params_version,
                score,
                score.average_plies()
            ));
        }
        if let Some(review) = &metrics.analysis {
            self.bar.println(format!(
                "v{} review: acl {:.1}, {} blunders, {} mistakes, {} inaccuracies",
                metrics.params_version,
                review.acl,
                review.blunders,
                review.mistakes,
                review.inaccuracies
            ));
        }
        Ok(())
    }
}
