use super::extract::read_timer;
use super::props::{STRING_PROP, format_number, is_enabled};
use super::records::{TimerKind, TimerParams};
use super::thread_groups::bool_text;
use super::*;

pub(super) const DELAY_PROP: &str = "ConstantTimer.delay";
pub(super) const RANGE_PROP: &str = "RandomTimer.range";

/// Where [`Session::add_timer`] puts the new timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTarget {
    /// The sampler loaded at this original index.
    Sampler(usize),
    /// Every sampler inside the thread group.
    AllSamplers,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTimer {
    pub kind: TimerKind,
    pub name: String,
    pub delay_ms: i64,
    /// Uniform timers only.
    pub random_range_ms: Option<f64>,
    /// Gaussian timers only.
    pub deviation_ms: Option<f64>,
}

/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerUpdate {
    pub name: Option<String>,
    pub delay_ms: Option<f64>,
    pub range_ms: Option<f64>,
    pub throughput: Option<f64>,
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|value| value.is_finite()).unwrap_or(0.0)
}

impl Session {
    fn create_delay_timer(
        &mut self,
        kind: TimerKind,
        name: &str,
        delay: &str,
        range: Option<&str>,
    ) -> Result<NodeId> {
        let timer = self.dom.create_detached_element(
            kind.tag_name(),
            &[
                ("guiclass", kind.gui_class()),
                ("testclass", kind.tag_name()),
                ("testname", name),
                ("enabled", "true"),
            ],
        );
        self.dom.append_prop(timer, STRING_PROP, DELAY_PROP, delay)?;
        if let Some(range) = range {
            self.dom.append_prop(timer, STRING_PROP, RANGE_PROP, range)?;
        }
        Ok(timer)
    }

    // Appends the timer into the sampler's companion and records it in
    // document order.
    fn attach_timer(&mut self, sampler: NodeId, timer: NodeId, kind: TimerKind) -> Result<()> {
        let container = self.companion_of(sampler, "sampler")?;
        self.dom.append_pair(container, timer)?;
        let record = read_timer(&self.dom, timer, kind);
        let name = record.name.clone();
        self.insert_timer_record(record);
        self.trace.edit_line(|| format!("added timer '{name}'"));
        Ok(())
    }

    /// Adds one delay timer to each targeted sampler of the thread group and
    /// returns how many were added.
    pub fn add_timer(
        &mut self,
        thread_group_index: usize,
        target: TimerTarget,
        timer: NewTimer,
    ) -> Result<usize> {
        let name = timer.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Timer name is required".into()));
        }
        if timer.delay_ms < 0 {
            return Err(Error::Validation("Delay cannot be negative".into()));
        }
        let range = match timer.kind {
            TimerKind::Constant => None,
            TimerKind::UniformRandom => Some(finite_or_zero(timer.random_range_ms)),
            TimerKind::GaussianRandom => Some(finite_or_zero(timer.deviation_ms)),
            TimerKind::PreciseThroughput => {
                return Err(Error::Validation(
                    "Throughput timers are added through the workload calculator".into(),
                ));
            }
        };

        let group = self.thread_groups.get(thread_group_index)?.node;
        let group_container = self.companion_of(group, "thread group")?;
        let targets: Vec<NodeId> = match target {
            TimerTarget::Sampler(original_index) => {
                let sampler = self
                    .samplers
                    .as_slice()
                    .iter()
                    .find(|sampler| sampler.original_index == original_index)
                    .filter(|sampler| self.dom.is_descendant_of(sampler.node, group_container))
                    .ok_or_else(|| {
                        Error::NotFound("Selected sampler not found in this thread group".into())
                    })?;
                vec![sampler.node]
            }
            TimerTarget::AllSamplers => self
                .samplers
                .as_slice()
                .iter()
                .filter(|sampler| self.dom.is_descendant_of(sampler.node, group_container))
                .map(|sampler| sampler.node)
                .collect(),
        };
        if targets.is_empty() {
            return Err(Error::Validation(
                "No samplers found in selected thread group".into(),
            ));
        }

        let delay = timer.delay_ms.to_string();
        let range = range.map(format_number);
        let mut added = 0;
        for sampler in targets {
            if self.dom.companion(sampler).is_none() {
                continue;
            }
            let node = self.create_delay_timer(timer.kind, name, &delay, range.as_deref())?;
            self.attach_timer(sampler, node, timer.kind)?;
            added += 1;
        }
        Ok(added)
    }

    /// Gives every sampler that has no timer of the chosen kind a
    /// `Think Time - <sampler>` timer. The kind is uniform random when
    /// `random_delay_ms` is positive, constant otherwise.
    pub fn bulk_add_think_time(&mut self, delay_ms: i64, random_delay_ms: i64) -> Result<usize> {
        if self.samplers.as_slice().is_empty() {
            return Err(Error::Validation("No samplers found".into()));
        }
        if delay_ms < 0 {
            return Err(Error::Validation("Invalid delay value".into()));
        }
        if random_delay_ms < 0 {
            return Err(Error::Validation("Invalid random delay value".into()));
        }
        let kind = if random_delay_ms > 0 {
            TimerKind::UniformRandom
        } else {
            TimerKind::Constant
        };
        let range = matches!(kind, TimerKind::UniformRandom).then(|| random_delay_ms.to_string());
        let delay = delay_ms.to_string();

        let candidates: Vec<(NodeId, String)> = self
            .samplers
            .as_slice()
            .iter()
            .filter_map(|sampler| {
                let container = self.dom.companion(sampler.node)?;
                let has_kind = self
                    .dom
                    .first_element_by_tag(container, kind.tag_name())
                    .is_some();
                (!has_kind).then(|| (sampler.node, sampler.name.clone()))
            })
            .collect();

        let mut added = 0;
        for (sampler, sampler_name) in candidates {
            let name = format!("Think Time - {sampler_name}");
            let node = self.create_delay_timer(kind, &name, &delay, range.as_deref())?;
            self.attach_timer(sampler, node, kind)?;
            added += 1;
        }
        Ok(added)
    }

    pub fn update_timer(&mut self, index: usize, update: TimerUpdate) -> Result<()> {
        let record = self.timers.get(index)?;
        let node = record.node;
        let kind = record.kind;

        let name = match &update.name {
            Some(name) if name.trim().is_empty() => {
                return Err(Error::Validation("Timer name is required".into()));
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        for value in [update.delay_ms, update.range_ms].into_iter().flatten() {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Validation("Delay cannot be negative".into()));
            }
        }
        if let Some(tps) = update.throughput {
            if !tps.is_finite() || tps <= 0.0 {
                return Err(Error::Validation("Throughput must be greater than 0".into()));
            }
        }
        if kind.is_throughput() {
            if update.delay_ms.is_some() || update.range_ms.is_some() {
                return Err(Error::Validation("Throughput timers have no delay".into()));
            }
        } else if update.throughput.is_some() {
            return Err(Error::Validation("Delay timers have no throughput".into()));
        }
        if kind == TimerKind::Constant && update.range_ms.is_some() {
            return Err(Error::Validation("Constant timers have no random range".into()));
        }

        if let Some(name) = &name {
            self.dom.set_attr(node, "testname", name)?;
        }
        for (prop, value) in [(DELAY_PROP, update.delay_ms), (RANGE_PROP, update.range_ms)] {
            if let Some(value) = value {
                self.dom
                    .upsert_prop(node, &[STRING_PROP], STRING_PROP, prop, &format_number(value))?;
            }
        }
        if let Some(tps) = update.throughput {
            self.dom.set_timer_tps(node, tps)?;
        }

        let refreshed = read_timer(&self.dom, node, kind);
        let label = refreshed.name.clone();
        *self.timers.get_mut(index)? = refreshed;
        if update.throughput.is_some() {
            self.refresh_thread_group_throughput();
        }
        self.trace.edit_line(|| format!("updated timer '{label}'"));
        Ok(())
    }

    /// Flips the enabled flag and returns the new value.
    pub fn toggle_timer(&mut self, index: usize) -> Result<bool> {
        let record = self.timers.get(index)?;
        let node = record.node;
        let enabled = !is_enabled(&self.dom, node);
        self.dom.set_attr(node, "enabled", bool_text(enabled))?;
        let record = self.timers.get_mut(index)?;
        record.enabled = enabled;
        let (name, throughput) = (record.name.clone(), record.kind.is_throughput());
        if throughput {
            self.refresh_thread_group_throughput();
        }
        self.trace
            .edit_line(|| format!("timer '{name}' enabled={enabled}"));
        Ok(enabled)
    }

    pub fn delete_timer(&mut self, index: usize) -> Result<TimerRecord> {
        let node = self.timers.get(index)?.node;
        self.dom.remove_with_companion(node)?;
        let record = self.timers.remove(index)?;
        self.prune_detached();
        if let TimerParams::Throughput { .. } = record.params {
            self.refresh_thread_group_throughput();
        }
        let name = record.name.clone();
        self.trace.edit_line(|| format!("deleted timer '{name}'"));
        Ok(record)
    }
}
