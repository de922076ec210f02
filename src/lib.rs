//! Client-side editing of JMeter test plans (`.jmx`).
//!
//! A plan is parsed once into a single owned XML tree plus record lists
//! (thread groups, samplers, timers, data-source configs, variables) that
//! point into that tree. Every edit mutates the tree and the matching record
//! together; the tree is only turned back into text on export.

mod calculator;
mod config;
mod core_impl;
mod editor;
mod plan;
mod runtime_state;
mod selector;


pub use calculator::{
    Estimate, concurrent_users, iteration_time, pacing, required_users, think_time_per_page,
    throughput, throughput_from_count, virtual_users,
};
pub use config::EditorConfig;
pub use editor::{Export, PlanEditor};
pub use plan::records::{
    Allocation, DataSourceConfig, DataSourceKind, DataSourceOptions, DataSourceRecord,
    GlobalVariables, SamplerRecord, ThreadGroupKind, ThreadGroupRecord, TimerKind, TimerParams,
    TimerRecord, VariableRecord,
};
pub use plan::samplers::{RenameReport, SamplerRename};
pub use plan::scaling::PerformanceSummary;
pub use plan::thread_groups::ThreadGroupEdit;
pub use plan::timers::{NewTimer, TimerTarget, TimerUpdate};
pub use plan::workload::{
    AppliedWorkload, ThroughputAction, ThroughputScalingPlan, ThroughputScalingRow,
    WorkloadInputs,
};
pub use plan::Session;
pub use runtime_state::TraceConfig;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("xml parse error: {0}")]
    XmlParse(String),
    #[error("input is {size} bytes, larger than the {limit} byte limit")]
    InputTooLarge { size: u64, limit: u64 },
    #[error("no test plan loaded")]
    NoPlanLoaded,
    #[error("{0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid plan structure: {0}")]
    Structure(String),
    #[error("unsupported selector: {0}")]
    Selector(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

// Stays valid for the whole session, including after the node is detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    node_type: NodeType,
}

#[derive(Debug, Clone)]
struct Element {
    tag_name: String,
    // Document order is kept so re-serialized files diff cleanly.
    attrs: Vec<(String, String)>,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
}
