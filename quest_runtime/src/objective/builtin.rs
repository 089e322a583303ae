//! Leaf objective kinds shipped with the runtime.

use std::time::Duration;

use quest_graph::WaitSettings;

use super::{Objective, ObjectiveContext};

/// Launch marker. Completes as soon as it runs.
#[derive(Debug, Default)]
pub struct EntryObjective;

impl Objective for EntryObjective {
    fn execute(&mut self, ctx: &mut ObjectiveContext<'_>) {
        ctx.complete();
    }

    fn is_cosmetic(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "Launch"
    }
}

/// Waits for the host to complete or fail it through the subsystem.
#[derive(Debug, Default)]
pub struct ExternalObjective;

impl Objective for ExternalObjective {
    fn execute(&mut self, _ctx: &mut ObjectiveContext<'_>) {}

    fn name(&self) -> &str {
        "External"
    }
}

/// Completes after a fixed amount of host time.
#[derive(Debug)]
pub struct WaitObjective {
    settings: WaitSettings,
    elapsed_secs: f32,
    since_report_secs: f32,
    report_interval_secs: Option<f32>,
    running: bool,
    ui_hidden: bool,
}

impl WaitObjective {
    pub fn new(settings: WaitSettings) -> Self {
        Self {
            settings,
            elapsed_secs: 0.0,
            since_report_secs: 0.0,
            report_interval_secs: None,
            running: false,
            ui_hidden: false,
        }
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed_secs
    }

    pub fn remaining_secs(&self) -> f32 {
        (self.settings.duration_secs - self.elapsed_secs).max(0.0)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn restore_ui(&mut self, ctx: &mut ObjectiveContext<'_>) {
        if self.ui_hidden {
            self.ui_hidden = false;
            ctx.set_ui_visible(true);
        }
    }
}

impl Objective for WaitObjective {
    fn execute(&mut self, ctx: &mut ObjectiveContext<'_>) {
        self.elapsed_secs = 0.0;
        self.since_report_secs = 0.0;

        if self.settings.duration_secs <= 0.0 {
            self.running = false;
            ctx.complete();
            return;
        }

        let wants_tracker = ctx
            .node()
            .is_some_and(|n| n.settings.generate_progress_tracker);
        self.report_interval_secs = self.settings.progress_interval_secs.or_else(|| {
            wants_tracker.then(|| ctx.config().default_wait_progress_interval_secs)
        });

        if !self.settings.keep_ui_displayed {
            self.ui_hidden = true;
            ctx.set_ui_visible(false);
        }
        self.running = true;
    }

    fn tick(&mut self, dt: Duration, ctx: &mut ObjectiveContext<'_>) {
        if !self.running {
            return;
        }
        let step = dt.as_secs_f32();
        self.elapsed_secs += step;
        self.since_report_secs += step;

        if self.elapsed_secs >= self.settings.duration_secs {
            self.running = false;
            self.restore_ui(ctx);
            if self.report_interval_secs.is_some() {
                ctx.report_progress(self.settings.duration_secs, self.settings.duration_secs);
            }
            ctx.complete();
            return;
        }

        if let Some(interval) = self.report_interval_secs {
            if self.since_report_secs >= interval {
                self.since_report_secs = 0.0;
                ctx.report_progress(self.elapsed_secs, self.settings.duration_secs);
            }
        }
    }

    fn cleanup(&mut self, ctx: &mut ObjectiveContext<'_>) {
        self.running = false;
        self.restore_ui(ctx);
    }

    fn progress(&self) -> Option<f32> {
        if self.settings.duration_secs <= 0.0 {
            return None;
        }
        Some((self.elapsed_secs / self.settings.duration_secs).clamp(0.0, 1.0))
    }

    fn name(&self) -> &str {
        "Wait"
    }

    fn description(&self) -> &str {
        "Waits for a set amount of time"
    }

    fn category(&self) -> &str {
        "Timing"
    }
}
