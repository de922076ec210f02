//! Per-thread-group Little's law sizing and throughput distribution.

use super::extract::read_timer;
use super::props::{DOUBLE_PROP, INT_PROP, LONG_PROP, format_number};
use super::records::TimerKind;
use super::*;
use crate::calculator::{self, Estimate};
use serde::Serialize;

const TIMER_PERIOD_SECS: &str = "3600";
const TIMER_DURATION_SECS: &str = "3600";
const TIMER_RANDOM_SEED: &str = "0";
const TIMER_EXACT_LIMIT: &str = "10000";

/// Form values for one thread group. Times are seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkloadInputs {
    pub target_tps: f64,
    pub response_time: f64,
    pub think_time: f64,
    pub pacing: f64,
    /// Overrides the group's current user count when set.
    pub users: Option<u64>,
}

impl WorkloadInputs {
    fn check_target(&self) -> Result<()> {
        check_tps(self.target_tps)
    }

    fn check_times(&self) -> Result<()> {
        let times = [self.response_time, self.think_time, self.pacing];
        if times.iter().any(|time| !time.is_finite() || *time < 0.0) {
            return Err(Error::Validation(
                "Response time, think time, and pacing cannot be negative".into(),
            ));
        }
        Ok(())
    }
}

fn check_tps(tps: f64) -> Result<()> {
    if !tps.is_finite() || tps <= 0.0 {
        return Err(Error::Validation("Target TPS must be greater than 0".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ThroughputAction {
    /// An existing throughput timer below the group was rewritten.
    Updated,
    /// The group had none, so a precise throughput timer was added.
    Added,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AppliedWorkload {
    pub users: u64,
    pub tps: f64,
    pub action: ThroughputAction,
}

struct ThroughputTarget {
    name: String,
    container: NodeId,
    timer: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThroughputScalingRow {
    pub index: usize,
    pub name: String,
    pub current_users: i64,
    /// The group's share of the plan throughput, by user count.
    pub current_tps: f64,
    pub scaled_users: i64,
    pub scaled_tps: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThroughputScalingPlan {
    pub current_total_tps: f64,
    pub target_total_tps: f64,
    pub factor: f64,
    pub total_users: i64,
    pub rows: Vec<ThroughputScalingRow>,
}

impl Session {
    fn group_users(&self, index: usize, inputs: &WorkloadInputs) -> Result<f64> {
        let users = match inputs.users {
            Some(users) => users as f64,
            None => self.thread_groups.get(index)?.users as f64,
        };
        if users < 1.0 {
            return Err(Error::Validation("Current users must be at least 1".into()));
        }
        Ok(users)
    }

    /// Users needed for the target throughput. `value` is rounded up.
    pub fn calculate_users(&self, index: usize, inputs: &WorkloadInputs) -> Result<Estimate> {
        self.thread_groups.check(index)?;
        inputs.check_target()?;
        inputs.check_times()?;
        let mut estimate = calculator::virtual_users(
            inputs.target_tps,
            inputs.response_time,
            inputs.think_time,
            inputs.pacing,
        );
        estimate.value = estimate.value.ceil();
        Ok(estimate)
    }

    pub fn calculate_throughput(&self, index: usize, inputs: &WorkloadInputs) -> Result<Estimate> {
        let users = self.group_users(index, inputs)?;
        inputs.check_times()?;
        calculator::throughput(users, inputs.response_time, inputs.think_time, inputs.pacing)
    }

    pub fn calculate_pacing(&self, index: usize, inputs: &WorkloadInputs) -> Result<Estimate> {
        let users = self.group_users(index, inputs)?;
        inputs.check_target()?;
        if [inputs.response_time, inputs.think_time]
            .iter()
            .any(|time| !time.is_finite() || *time < 0.0)
        {
            return Err(Error::Validation(
                "Response time and think time cannot be negative".into(),
            ));
        }
        calculator::pacing(users, inputs.target_tps, inputs.response_time, inputs.think_time)
    }

    /// Writes a user count. Load-time baselines are left alone.
    pub fn apply_users(&mut self, index: usize, users: u64) -> Result<()> {
        if users < 1 {
            return Err(Error::Validation("Users must be at least 1".into()));
        }
        let users = i64::try_from(users)
            .map_err(|_| Error::Validation("User count is too large".into()))?;
        let node = self.thread_groups.get(index)?.node;
        self.write_user_count(node, users)?;
        let record = self.thread_groups.get_mut(index)?;
        record.users = users;
        let name = record.name.clone();
        self.trace
            .edit_line(|| format!("thread group '{name}' users={users}"));
        Ok(())
    }

    pub fn apply_throughput(&mut self, index: usize, tps: f64) -> Result<ThroughputAction> {
        check_tps(tps)?;
        let target = self.throughput_target(index)?;
        self.write_group_throughput(target, tps)
    }

    /// Sizes the group for `inputs` and writes both the user count and the
    /// throughput. Nothing is written unless both writes can be made.
    pub fn apply_calculated_values(
        &mut self,
        index: usize,
        inputs: &WorkloadInputs,
    ) -> Result<AppliedWorkload> {
        let users = self.calculate_users(index, inputs)?.value.max(1.0) as u64;
        let target = self.throughput_target(index)?;
        self.apply_users(index, users)?;
        let action = self.write_group_throughput(target, inputs.target_tps)?;
        Ok(AppliedWorkload {
            users,
            tps: inputs.target_tps,
            action,
        })
    }

    // The group's companion and its first throughput timer in document order.
    fn throughput_target(&self, index: usize) -> Result<ThroughputTarget> {
        let group = self.thread_groups.get(index)?;
        let container = self.companion_of(group.node, "thread group")?;
        Ok(ThroughputTarget {
            name: group.name.clone(),
            container,
            timer: self.dom.throughput_timers(container).first().copied(),
        })
    }

    /// Rewrites the target's timer, or adds a precise throughput timer when
    /// the group has none.
    fn write_group_throughput(
        &mut self,
        target: ThroughputTarget,
        tps: f64,
    ) -> Result<ThroughputAction> {
        let ThroughputTarget {
            name,
            container,
            timer,
        } = target;
        let action = match timer {
            Some(timer) => {
                self.dom.set_timer_tps(timer, tps)?;
                if let Some(position) = self.timers.position(|record| record.node == timer) {
                    let record = self.timers.get_mut(position)?;
                    *record = read_timer(&self.dom, timer, record.kind);
                }
                ThroughputAction::Updated
            }
            None => {
                let timer = self.create_throughput_timer(&name, tps)?;
                self.dom.append_pair(container, timer)?;
                self.throughput_baselines.insert(timer, tps);
                self.insert_timer_record(read_timer(&self.dom, timer, TimerKind::PreciseThroughput));
                ThroughputAction::Added
            }
        };
        self.refresh_thread_group_throughput();
        self.trace
            .edit_line(|| format!("thread group '{name}' throughput {tps} TPS ({action:?})"));
        Ok(action)
    }

    fn create_throughput_timer(&mut self, group_name: &str, tps: f64) -> Result<NodeId> {
        let kind = TimerKind::PreciseThroughput;
        let name = format!("TPS Controller - {group_name}");
        let timer = self.dom.create_detached_element(
            kind.tag_name(),
            &[
                ("guiclass", kind.gui_class()),
                ("testclass", kind.tag_name()),
                ("testname", name.as_str()),
                ("enabled", "true"),
            ],
        );
        self.dom
            .append_prop(timer, DOUBLE_PROP, "throughput", &format_number(tps))?;
        self.dom
            .append_prop(timer, INT_PROP, "throughputPeriod", TIMER_PERIOD_SECS)?;
        self.dom
            .append_prop(timer, LONG_PROP, "duration", TIMER_DURATION_SECS)?;
        self.dom
            .append_prop(timer, LONG_PROP, "randomSeed", TIMER_RANDOM_SEED)?;
        self.dom
            .append_prop(timer, INT_PROP, "exactLimit", TIMER_EXACT_LIMIT)?;
        Ok(timer)
    }

    fn current_plan_throughput(&self) -> Result<f64> {
        self.plan_throughput().ok_or_else(|| {
            Error::Validation("Current TPS is 0. Cannot calculate scaling factor.".into())
        })
    }

    fn total_users(&self) -> i64 {
        self.thread_groups
            .as_slice()
            .iter()
            .map(|group| group.users)
            .sum()
    }

    // The group's share of `total_tps`, proportional to its user count.
    fn throughput_share(users: i64, total_users: i64, total_tps: f64) -> f64 {
        if total_users <= 0 {
            return 0.0;
        }
        total_tps * users as f64 / total_users as f64
    }

    /// How every thread group would change if the plan were scaled to
    /// `target_tps` in total. Nothing is written.
    pub fn preview_total_throughput_scaling(
        &self,
        target_tps: f64,
    ) -> Result<ThroughputScalingPlan> {
        check_tps(target_tps)?;
        let current_total_tps = self.current_plan_throughput()?;
        let factor = target_tps / current_total_tps;
        let total_users = self.total_users();
        let rows = self
            .thread_groups
            .as_slice()
            .iter()
            .enumerate()
            .map(|(index, group)| {
                let current_tps =
                    Self::throughput_share(group.users, total_users, current_total_tps);
                ThroughputScalingRow {
                    index,
                    name: group.name.clone(),
                    current_users: group.users,
                    current_tps,
                    scaled_users: ((group.users as f64 * factor).ceil() as i64).max(1),
                    scaled_tps: current_tps * factor,
                }
            })
            .collect();
        Ok(ThroughputScalingPlan {
            current_total_tps,
            target_total_tps: target_tps,
            factor,
            total_users,
            rows,
        })
    }

    /// Applies [`Session::preview_total_throughput_scaling`]: every group gets
    /// its scaled user count and throughput. Every group is checked before
    /// the first write.
    pub fn apply_total_throughput_scaling(
        &mut self,
        target_tps: f64,
    ) -> Result<ThroughputScalingPlan> {
        let plan = self.preview_total_throughput_scaling(target_tps)?;
        let writes = plan
            .rows
            .iter()
            .map(|row| {
                let node = self.thread_groups.get(row.index)?.node;
                let target = if row.scaled_tps > 0.0 {
                    Some(self.throughput_target(row.index)?)
                } else {
                    None
                };
                Ok((row, node, target))
            })
            .collect::<Result<Vec<_>>>()?;

        for (row, node, target) in writes {
            self.write_user_count(node, row.scaled_users)?;
            self.thread_groups.get_mut(row.index)?.users = row.scaled_users;
            if let Some(target) = target {
                self.write_group_throughput(target, row.scaled_tps)?;
            }
        }
        let (count, factor) = (plan.rows.len(), plan.factor);
        self.trace.edit_line(|| {
            format!("scaled {count} thread groups by {factor:.2} to {target_tps} TPS")
        });
        Ok(plan)
    }

    /// Rescales one group's users so its share of the plan throughput
    /// becomes `target_tps`. Returns the new user count.
    pub fn scale_thread_group_to_throughput(&mut self, index: usize, target_tps: f64) -> Result<i64> {
        check_tps(target_tps)?;
        let users = self.thread_groups.get(index)?.users;
        let total_tps = self.current_plan_throughput()?;
        let current_tps = Self::throughput_share(users, self.total_users(), total_tps);
        if current_tps <= 0.0 {
            return Err(Error::Validation(
                "Current TPS is 0. Cannot calculate scaling factor.".into(),
            ));
        }
        let scaled = ((users as f64 * target_tps / current_tps).ceil() as i64).max(1);
        let node = self.thread_groups.get(index)?.node;
        self.write_user_count(node, scaled)?;
        let record = self.thread_groups.get_mut(index)?;
        record.users = scaled;
        let name = record.name.clone();
        self.trace
            .edit_line(|| format!("thread group '{name}' rescaled to {scaled} users"));
        Ok(scaled)
    }
}
