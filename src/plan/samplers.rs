use super::props::is_enabled;
use super::thread_groups::bool_text;
use super::*;
use fancy_regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

/// New name for the sampler loaded at `original_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerRename {
    pub original_index: usize,
    pub name: String,
}

/// Outcome of [`Session::rename_all_samplers`]. Valid renames are applied even
/// when others are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameReport {
    pub renamed: usize,
    pub unchanged: usize,
    /// Original indices whose proposed name was blank.
    pub rejected: Vec<usize>,
}

impl RenameReport {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

fn fold(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

impl Session {
    fn sampler_position(&self, original_index: usize) -> Result<usize> {
        self.samplers
            .position(|sampler| sampler.original_index == original_index)
            .ok_or_else(|| Error::NotFound("Sampler not found".into()))
    }

    pub fn sampler(&self, original_index: usize) -> Result<&SamplerRecord> {
        let position = self.sampler_position(original_index)?;
        self.samplers.get(position)
    }

    /// Samplers whose name or URL contains `term`, ignoring case and Unicode
    /// compatibility forms. A blank term matches everything.
    pub fn filter_samplers(&self, term: &str) -> Vec<&SamplerRecord> {
        let term = fold(term.trim());
        self.samplers
            .as_slice()
            .iter()
            .filter(|sampler| {
                term.is_empty()
                    || fold(&sampler.name).contains(&term)
                    || fold(&sampler.url).contains(&term)
            })
            .collect()
    }

    pub fn filter_samplers_matching(&self, pattern: &str) -> Result<Vec<&SamplerRecord>> {
        let regex = Regex::new(pattern)
            .map_err(|err| Error::Validation(format!("Invalid filter pattern: {err}")))?;
        let matches = |text: &str| regex.is_match(text).unwrap_or(false);
        Ok(self
            .samplers
            .as_slice()
            .iter()
            .filter(|sampler| matches(&sampler.name) || matches(&sampler.url))
            .collect())
    }

    /// Returns whether the name actually changed.
    pub fn rename_sampler(&mut self, original_index: usize, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Sampler name cannot be empty".into()));
        }
        let position = self.sampler_position(original_index)?;
        self.write_sampler_name(position, name)
    }

    fn write_sampler_name(&mut self, position: usize, name: &str) -> Result<bool> {
        let record = self.samplers.get(position)?;
        if record.name == name {
            return Ok(false);
        }
        let node = record.node;
        let old = record.name.clone();
        self.dom.set_attr(node, "testname", name)?;
        self.samplers.get_mut(position)?.name = name.to_string();

        let dom = &self.dom;
        for timer in self.timers.iter_mut() {
            let owner = dom
                .parent(timer.node)
                .and_then(|container| dom.companion_owner(container));
            if owner == Some(node) {
                timer.sampler = Some(name.to_string());
            }
        }
        self.trace
            .edit_line(|| format!("renamed sampler '{old}' to '{name}'"));
        Ok(true)
    }

    /// Applies every non-blank rename. Blank names are reported in
    /// `rejected`; unknown indices fail the whole call before anything is
    /// written.
    pub fn rename_all_samplers(&mut self, renames: &[SamplerRename]) -> Result<RenameReport> {
        let positions = renames
            .iter()
            .map(|rename| self.sampler_position(rename.original_index))
            .collect::<Result<Vec<_>>>()?;

        let mut report = RenameReport::default();
        for (rename, position) in renames.iter().zip(positions) {
            let name = rename.name.trim();
            if name.is_empty() {
                report.rejected.push(rename.original_index);
            } else if self.write_sampler_name(position, name)? {
                report.renamed += 1;
            } else {
                report.unchanged += 1;
            }
        }
        Ok(report)
    }

    pub fn delete_sampler(&mut self, original_index: usize) -> Result<SamplerRecord> {
        let position = self.sampler_position(original_index)?;
        let node = self.samplers.get(position)?.node;
        self.dom.remove_with_companion(node)?;
        let record = self.samplers.remove(position)?;
        self.prune_detached();
        let name = record.name.clone();
        self.trace.edit_line(|| format!("deleted sampler '{name}'"));
        Ok(record)
    }

    /// Deletes every listed sampler and returns how many were removed.
    pub fn bulk_delete_samplers(&mut self, original_indices: &[usize]) -> Result<usize> {
        if original_indices.is_empty() {
            return Err(Error::Validation("No samplers selected".into()));
        }
        let positions = original_indices
            .iter()
            .map(|index| self.sampler_position(*index))
            .collect::<Result<Vec<_>>>()?;

        let nodes = positions
            .iter()
            .map(|position| self.samplers.get(*position).map(|record| record.node))
            .collect::<Result<Vec<_>>>()?;
        for node in nodes {
            if self.dom.is_connected(node) {
                self.dom.remove_with_companion(node)?;
            }
        }
        let removed = self.samplers.remove_many(&positions).len();
        self.prune_detached();
        self.trace
            .edit_line(|| format!("bulk deleted {removed} samplers"));
        Ok(removed)
    }

    pub fn set_sampler_enabled(&mut self, original_index: usize, enabled: bool) -> Result<()> {
        let position = self.sampler_position(original_index)?;
        let node = self.samplers.get(position)?.node;
        if is_enabled(&self.dom, node) == enabled {
            return Ok(());
        }
        self.dom.set_attr(node, "enabled", bool_text(enabled))?;
        let record = self.samplers.get_mut(position)?;
        record.enabled = enabled;
        let name = record.name.clone();
        self.trace
            .edit_line(|| format!("sampler '{name}' enabled={enabled}"));
        Ok(())
    }
}
