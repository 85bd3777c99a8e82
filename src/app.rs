use crate::classify::{Bottleneck, classify};
use crate::format::{LineRenderer, Verdict, render_tabs};
use crate::offender::{Offender, find_offender, find_offender_degraded};
use crate::system::delta::apply_deltas;
use crate::system::provider::{CounterProvider, ProviderError};
use crate::system::sample::{TickHistory, build_sample};

#[derive(Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The verdict line for this tick.
    Rendered(String),
    /// Collection failed; nothing was read, history is untouched, and
    /// the caller should retry after a short sleep.
    Abandoned,
}

/// Owns the whole sampling-to-verdict pipeline for one provider: the
/// two-generation history, the column-width state, and the degraded-mode
/// decision made once at startup.
pub struct Monitor<P: CounterProvider> {
    provider: P,
    history: TickHistory,
    renderer: LineRenderer,
    tabs: bool,
    degraded: bool,
}

impl<P: CounterProvider> Monitor<P> {
    pub fn new(provider: P, tabs: bool) -> Self {
        let degraded = !provider.pid_instances_supported();
        Monitor {
            provider,
            history: TickHistory::new(),
            renderer: LineRenderer::new(),
            tabs,
            degraded,
        }
    }

    /// True when the provider cannot label instances with PIDs and the
    /// offender search falls back to name keying.
    pub fn degraded(&self) -> bool {
        self.degraded
    }

    /// Collects once without rendering, so the first real tick has a
    /// previous generation of raw counters to delta against.
    pub fn prime(&mut self) -> Result<(), ProviderError> {
        self.provider.collect_tick()?;
        if let Ok(sample) = build_sample(&self.provider) {
            self.history.advance(sample);
        }
        Ok(())
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.provider.collect_tick().is_err() {
            return TickOutcome::Abandoned;
        }
        let mut sample = match build_sample(&self.provider) {
            Ok(sample) => sample,
            Err(_) => return TickOutcome::Abandoned,
        };

        if !self.degraded {
            apply_deltas(&self.provider, self.history.previous(), &mut sample.processes);
        }

        let cause = classify(
            sample.cpu_pct,
            sample.disk_busy_pct,
            sample.net_sent,
            sample.net_recv,
        );
        let offender = if self.degraded {
            find_offender_degraded(cause, &self.provider)
        } else {
            find_offender(cause, &sample.processes)
        };

        if let Some(o) = offender.as_ref() {
            tracing::debug!(
                cause = cause.label(),
                name = %o.name,
                pid = ?o.pid,
                value = display_value(o, cause, self.provider.core_count()),
                "offender"
            );
        }

        let verdict = Verdict {
            disk_pct: sample.disk_busy_pct,
            recv: sample.net_recv,
            sent: sample.net_sent,
            cpu_pct: sample.cpu_pct,
            ram_pct: sample.ram_pct,
            cause,
            offender,
        };
        let line = if self.tabs {
            render_tabs(&verdict)
        } else {
            self.renderer.render_adaptive(&verdict)
        };

        self.history.advance(sample);
        TickOutcome::Rendered(line)
    }
}

/// Per-process CPU deltas span 0..100·cores; normalize for display only.
fn display_value(offender: &Offender, cause: Bottleneck, cores: usize) -> f64 {
    match cause {
        Bottleneck::Cpu => offender.value / cores.max(1) as f64,
        _ => offender.value,
    }
}
