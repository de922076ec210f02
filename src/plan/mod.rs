use super::*;
use crate::config::EditorConfig;
use crate::core_impl::{COMPANION_TAG, parse_xml};
use crate::runtime_state::TraceState;
use records::{
    DataSourceRecord, GlobalVariables, SamplerRecord, ThreadGroupRecord, TimerRecord,
    VariableRecord,
};
use std::collections::HashMap;

mod data_sources;
mod extract;
pub(crate) mod props;
pub(crate) mod records;
pub(crate) mod samplers;
pub(crate) mod scaling;
pub(crate) mod thread_groups;
pub(crate) mod timers;
mod variables;
pub(crate) mod workload;

/// Positional record storage. Removing a record shifts the later ones down by
/// one and never leaves a gap, so an index stays valid until a record at or
/// before it is removed.
#[derive(Debug, Clone)]
pub(crate) struct RecordList<T> {
    items: Vec<T>,
    what: &'static str,
}

impl<T> RecordList<T> {
    pub(crate) fn new(what: &'static str, items: Vec<T>) -> Self {
        Self { items, what }
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    fn missing(&self, index: usize) -> Error {
        Error::NotFound(format!("Invalid {} index {index}", self.what))
    }

    pub(crate) fn get(&self, index: usize) -> Result<&T> {
        self.items.get(index).ok_or_else(|| self.missing(index))
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        if index >= self.items.len() {
            return Err(self.missing(index));
        }
        Ok(&mut self.items[index])
    }

    pub(crate) fn check(&self, index: usize) -> Result<()> {
        self.get(index).map(|_| ())
    }

    pub(crate) fn push(&mut self, item: T) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }

    /// Inserts at `index`, clamped to the end, and returns where the item went.
    pub(crate) fn insert(&mut self, index: usize, item: T) -> usize {
        let index = index.min(self.items.len());
        self.items.insert(index, item);
        index
    }

    pub(crate) fn remove(&mut self, index: usize) -> Result<T> {
        self.check(index)?;
        Ok(self.items.remove(index))
    }

    /// Removes every listed position, highest first, so each index refers to
    /// the list as it was before the call. Duplicates are removed once;
    /// out-of-range positions are skipped.
    pub(crate) fn remove_many(&mut self, indices: &[usize]) -> Vec<T> {
        let mut ordered = indices.to_vec();
        ordered.sort_unstable_by(|a, b| b.cmp(a));
        ordered.dedup();
        let len = self.items.len();
        ordered
            .into_iter()
            .filter(|index| *index < len)
            .map(|index| self.items.remove(index))
            .collect()
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&T) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(keep);
        before - self.items.len()
    }

    pub(crate) fn position(&self, pred: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.iter().position(pred)
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }
}

/// One loaded test plan: the XML tree and the records read from it.
///
/// Every edit goes through a `Session` method, which changes the tree and the
/// affected records together. The tree is turned back into text only by
/// [`Session::to_xml_string`].
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) dom: Dom,
    pub(crate) thread_groups: RecordList<ThreadGroupRecord>,
    pub(crate) samplers: RecordList<SamplerRecord>,
    pub(crate) timers: RecordList<TimerRecord>,
    pub(crate) data_sources: RecordList<DataSourceRecord>,
    pub(crate) variables: RecordList<VariableRecord>,
    pub(crate) variables_container: Option<NodeId>,
    pub(crate) global_variables: GlobalVariables,
    // Throughput of each throughput timer (TPS) when it was first seen.
    pub(crate) throughput_baselines: HashMap<NodeId, f64>,
    pub(crate) default_variables_name: String,
    pub(crate) trace: TraceState,
}

impl Session {
    pub fn parse(xml: &str) -> Result<Self> {
        Self::parse_with_config(xml, &EditorConfig::default())
    }

    pub fn parse_with_config(xml: &str, config: &EditorConfig) -> Result<Self> {
        let dom = parse_xml(xml)?;
        let mut trace = TraceState::from_config(&config.trace);
        let extracted = extract::extract_all(&dom, &mut trace)?;
        Ok(Self {
            dom,
            thread_groups: RecordList::new("thread group", extracted.thread_groups),
            samplers: RecordList::new("sampler", extracted.samplers),
            timers: RecordList::new("timer", extracted.timers),
            data_sources: RecordList::new("config", extracted.data_sources),
            variables: RecordList::new("variable", extracted.variables),
            variables_container: extracted.variables_container,
            global_variables: extracted.global_variables,
            throughput_baselines: extracted.throughput_baselines,
            default_variables_name: config.default_variables_name.clone(),
            trace,
        })
    }

    pub fn thread_groups(&self) -> &[ThreadGroupRecord] {
        self.thread_groups.as_slice()
    }

    pub fn samplers(&self) -> &[SamplerRecord] {
        self.samplers.as_slice()
    }

    pub fn timers(&self) -> &[TimerRecord] {
        self.timers.as_slice()
    }

    pub fn data_sources(&self) -> &[DataSourceRecord] {
        self.data_sources.as_slice()
    }

    pub fn variables(&self) -> &[VariableRecord] {
        self.variables.as_slice()
    }

    pub fn global_variables(&self) -> &GlobalVariables {
        &self.global_variables
    }

    /// The whole document, with an XML declaration.
    pub fn to_xml_string(&self) -> String {
        self.dom.to_xml_string()
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace.enabled = enabled;
    }

    pub fn set_trace_parse(&mut self, enabled: bool) {
        self.trace.parse = enabled;
    }

    pub fn set_trace_edits(&mut self, enabled: bool) {
        self.trace.edits = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        self.trace.set_log_limit(max_entries)
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace.take_logs()
    }

    /// Drops the records whose element left the document together with a
    /// removed ancestor.
    pub(crate) fn prune_detached(&mut self) {
        let dom = &self.dom;
        let mut dropped = 0;
        dropped += self.thread_groups.retain(|r| dom.is_connected(r.node));
        dropped += self.samplers.retain(|r| dom.is_connected(r.node));
        dropped += self.timers.retain(|r| dom.is_connected(r.node));
        dropped += self.data_sources.retain(|r| dom.is_connected(r.node));
        if self
            .variables_container
            .is_some_and(|container| !dom.is_connected(container))
        {
            self.variables_container = None;
        }
        dropped += self.variables.retain(|r| dom.is_connected(r.node));
        self.throughput_baselines
            .retain(|node, _| dom.is_connected(*node));
        if dropped > 0 {
            self.trace
                .edit_line(|| format!("dropped {dropped} records below a removed element"));
        }
    }

    // Position in `list` that keeps it in document order once `node` is added.
    fn document_slot<T>(
        &self,
        list: &RecordList<T>,
        node: NodeId,
        node_of: impl Fn(&T) -> NodeId,
    ) -> usize {
        let path = self.dom.tree_path(node);
        list.as_slice()
            .partition_point(|record| self.dom.tree_path(node_of(record)) < path)
    }

    pub(crate) fn insert_timer_record(&mut self, record: TimerRecord) -> usize {
        let slot = self.document_slot(&self.timers, record.node, |timer| timer.node);
        self.timers.insert(slot, record)
    }

    pub(crate) fn insert_data_source_record(&mut self, record: DataSourceRecord) -> usize {
        let slot = self.document_slot(&self.data_sources, record.node, |source| source.node);
        self.data_sources.insert(slot, record)
    }

    pub(crate) fn companion_of(&self, node: NodeId, what: &str) -> Result<NodeId> {
        self.dom
            .companion(node)
            .ok_or_else(|| Error::Structure(format!("{what} has no {COMPANION_TAG}")))
    }
}
