use super::extract::subtree_throughput;
use super::props::is_enabled;
use super::*;
use serde::Serialize;

/// Plan totals before and after a master scale, across `load_generators`
/// injecting machines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub active_groups: usize,
    pub total_groups: usize,
    pub original_users: i64,
    pub scaled_users: i64,
    /// `None` when the plan has no enabled throughput timer.
    pub original_tps: Option<f64>,
    pub scaled_tps: Option<f64>,
}

fn scale_factor(percent: f64) -> Result<f64> {
    if !percent.is_finite() || percent <= 0.0 {
        return Err(Error::Validation(
            "Scale percentage must be greater than 0".into(),
        ));
    }
    Ok(percent / 100.0)
}

fn scaled_count(users: i64, factor: f64) -> i64 {
    ((users as f64 * factor).round() as i64).max(1)
}

impl Session {
    /// Throughput of every enabled throughput timer in the plan, in TPS.
    pub fn plan_throughput(&self) -> Option<f64> {
        let total: f64 = self
            .dom
            .throughput_timers(self.dom.root)
            .into_iter()
            .filter(|timer| is_enabled(&self.dom, *timer))
            .filter_map(|timer| self.dom.timer_tps(timer))
            .sum();
        (total > 0.0).then_some(total)
    }

    pub fn performance_summary(
        &self,
        percent: f64,
        load_generators: u32,
    ) -> Result<PerformanceSummary> {
        let factor = scale_factor(percent)?;
        if load_generators == 0 {
            return Err(Error::Validation(
                "Load generator count must be at least 1".into(),
            ));
        }
        let generators = i64::from(load_generators);
        let active: Vec<&ThreadGroupRecord> = self
            .thread_groups
            .as_slice()
            .iter()
            .filter(|group| group.enabled)
            .collect();
        let original_users = active.iter().map(|group| group.users).sum();
        let scaled_users = active
            .iter()
            .map(|group| (group.users as f64 * factor).round() as i64)
            .sum::<i64>()
            * generators;
        let original_tps = self.plan_throughput();
        Ok(PerformanceSummary {
            active_groups: active.len(),
            total_groups: self.thread_groups.len(),
            original_users,
            scaled_users,
            original_tps,
            scaled_tps: original_tps.map(|tps| tps * factor * f64::from(load_generators)),
        })
    }

    /// Sets every enabled thread group to `percent` of its load-time user
    /// count, and every throughput timer below it to `percent` of its
    /// load-time rate. Repeating a call gives the same plan. Returns the
    /// number of scaled groups.
    pub fn apply_master_scale(&mut self, percent: f64) -> Result<usize> {
        let factor = scale_factor(percent)?;
        let targets: Vec<(usize, NodeId, i64)> = self
            .thread_groups
            .as_slice()
            .iter()
            .enumerate()
            .filter(|(_, group)| group.enabled)
            .map(|(index, group)| (index, group.node, scaled_count(group.original_users, factor)))
            .collect();

        for (index, node, users) in &targets {
            self.write_user_count(*node, *users)?;
            self.thread_groups.get_mut(*index)?.users = *users;
            if let Some(container) = self.dom.companion(*node) {
                self.scale_throughput_timers(container, factor)?;
            }
        }
        self.refresh_thread_group_throughput();
        let scaled = targets.len();
        self.trace
            .edit_line(|| format!("master scale {percent}% applied to {scaled} thread groups"));
        Ok(scaled)
    }

    fn scale_throughput_timers(&mut self, container: NodeId, factor: f64) -> Result<()> {
        for timer in self.dom.throughput_timers(container) {
            let dom = &self.dom;
            let baseline = *self
                .throughput_baselines
                .entry(timer)
                .or_insert_with(|| dom.timer_tps(timer).unwrap_or(0.0));
            if baseline > 0.0 {
                self.dom.set_timer_tps(timer, baseline * factor)?;
            }
        }
        Ok(())
    }

    /// Current throughput of one thread group from its enabled timers.
    pub fn thread_group_throughput(&self, index: usize) -> Result<f64> {
        let node = self.thread_groups.get(index)?.node;
        Ok(subtree_throughput(&self.dom, node))
    }

    pub(crate) fn refresh_thread_group_throughput(&mut self) {
        let dom = &self.dom;
        for group in self.thread_groups.iter_mut() {
            group.throughput = subtree_throughput(dom, group.node);
        }
    }
}
