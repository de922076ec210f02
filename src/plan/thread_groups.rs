use super::extract::{
    COUNT_ALIASES, DURATION_ALIASES, LOOPS_PROP, MAIN_CONTROLLER, RAMP_ALIASES,
};
use super::props::{INT_PROP, STRING_PROP, is_enabled};
use super::*;

/// Values entered for one thread group. All four are written together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadGroupEdit {
    pub users: i64,
    pub ramp_time: i64,
    /// `-1` runs forever.
    pub loops: i64,
    pub duration: i64,
}

impl ThreadGroupEdit {
    fn validate(&self) -> Result<()> {
        if self.users < 1 {
            return Err(Error::Validation("Users must be at least 1".into()));
        }
        if self.ramp_time < 0 {
            return Err(Error::Validation("Ramp-Up cannot be negative".into()));
        }
        if self.loops < -1 {
            return Err(Error::Validation(
                "Loop Count must be -1 (infinite) or greater".into(),
            ));
        }
        if self.duration < 0 {
            return Err(Error::Validation("Duration cannot be negative".into()));
        }
        Ok(())
    }
}

impl Session {
    /// Writes the edit into the element and the record. Load-time baselines
    /// are left alone.
    pub fn apply_thread_group_edit(&mut self, index: usize, edit: ThreadGroupEdit) -> Result<()> {
        edit.validate()?;
        let node = self.thread_groups.get(index)?.node;

        self.write_user_count(node, edit.users)?;
        self.dom
            .upsert_aliased_prop(node, &RAMP_ALIASES, &edit.ramp_time.to_string())?;
        self.dom
            .upsert_aliased_prop(node, &DURATION_ALIASES, &edit.duration.to_string())?;
        let loops_written = self.write_loops(node, edit.loops)?;

        let record = self.thread_groups.get_mut(index)?;
        record.users = edit.users;
        record.ramp_time = edit.ramp_time;
        record.duration = edit.duration;
        if loops_written {
            record.loops = edit.loops;
        }
        let name = record.name.clone();
        self.trace.edit_line(|| {
            format!(
                "thread group '{name}': users={} ramp={} loops={} duration={}",
                edit.users, edit.ramp_time, edit.loops, edit.duration
            )
        });
        Ok(())
    }

    pub(crate) fn write_user_count(&mut self, node: NodeId, users: i64) -> Result<()> {
        self.dom
            .upsert_aliased_prop(node, &COUNT_ALIASES, &users.to_string())
    }

    // Returns false when the group has no loop controller to write into.
    fn write_loops(&mut self, node: NodeId, loops: i64) -> Result<bool> {
        let Some(controller) = self.dom.query_selector_from(node, MAIN_CONTROLLER)? else {
            return Ok(false);
        };
        self.dom.upsert_prop(
            controller,
            &[INT_PROP, STRING_PROP],
            INT_PROP,
            LOOPS_PROP,
            &loops.to_string(),
        )?;
        Ok(true)
    }

    pub fn set_thread_group_enabled(&mut self, index: usize, enabled: bool) -> Result<()> {
        let node = self.thread_groups.get(index)?.node;
        self.dom.set_attr(node, "enabled", bool_text(enabled))?;
        let record = self.thread_groups.get_mut(index)?;
        record.enabled = enabled;
        let name = record.name.clone();
        self.trace
            .edit_line(|| format!("thread group '{name}' enabled={enabled}"));
        Ok(())
    }

    /// Flips the enabled flag and returns the new value.
    pub fn toggle_thread_group(&mut self, index: usize) -> Result<bool> {
        let enabled = !is_enabled(&self.dom, self.thread_groups.get(index)?.node);
        self.set_thread_group_enabled(index, enabled)?;
        Ok(enabled)
    }

    /// Removes the group with everything below it. Records of samplers, timers
    /// and configs inside the group go with it.
    pub fn delete_thread_group(&mut self, index: usize) -> Result<ThreadGroupRecord> {
        let node = self.thread_groups.get(index)?.node;
        self.dom.remove_with_companion(node)?;
        let record = self.thread_groups.remove(index)?;
        self.prune_detached();
        let name = record.name.clone();
        self.trace
            .edit_line(|| format!("deleted thread group '{name}'"));
        Ok(record)
    }

    /// Samplers nested anywhere below the group.
    pub fn samplers_in_thread_group(&self, index: usize) -> Result<Vec<&SamplerRecord>> {
        let node = self.thread_groups.get(index)?.node;
        let Some(companion) = self.dom.companion(node) else {
            return Ok(Vec::new());
        };
        Ok(self
            .samplers
            .as_slice()
            .iter()
            .filter(|sampler| self.dom.is_descendant_of(sampler.node, companion))
            .collect())
    }
}

pub(crate) fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
