//! Records mirrored from plan elements. Each keeps the id of the element it
//! was read from; the id is not serialized.

use super::*;
use serde::Serialize;

// Records compare by the public fields; the element id only means something
// inside the session that read it.
macro_rules! eq_without_node {
    ($record:ty { $($field:ident),+ $(,)? }) => {
        impl PartialEq for $record {
            fn eq(&self, other: &Self) -> bool {
                $(self.$field == other.$field)&&+
            }
        }
    };
}

eq_without_node!(ThreadGroupRecord {
    name,
    kind,
    enabled,
    users,
    ramp_time,
    duration,
    loops,
    throughput,
    original_users,
    original_ramp_time,
    original_duration,
    original_throughput,
});
eq_without_node!(SamplerRecord {
    name,
    enabled,
    method,
    domain,
    path,
    protocol,
    url,
    original_index,
});
eq_without_node!(TimerRecord {
    kind,
    name,
    enabled,
    params,
    sampler,
    thread_group,
});
eq_without_node!(DataSourceRecord { config });
eq_without_node!(VariableRecord { name, value });

impl Eq for SamplerRecord {}
impl Eq for DataSourceRecord {}
impl Eq for VariableRecord {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ThreadGroupKind {
    Standard,
    Concurrency,
    OctoPerf,
}

impl ThreadGroupKind {
    pub(crate) const ALL: [Self; 3] = [Self::Standard, Self::Concurrency, Self::OctoPerf];

    pub fn tag_name(self) -> &'static str {
        match self {
            Self::Standard => "ThreadGroup",
            Self::Concurrency => "com.blazemeter.jmeter.threads.concurrency.ConcurrencyThreadGroup",
            Self::OctoPerf => "com.octoperf.jmeter.OctoPerfThreadGroup",
        }
    }

    pub(crate) fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag_name() == tag)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadGroupRecord {
    pub name: String,
    pub kind: ThreadGroupKind,
    pub enabled: bool,
    pub users: i64,
    pub ramp_time: i64,
    pub duration: i64,
    /// `-1` runs forever.
    pub loops: i64,
    /// Sum over every throughput timer below the group, in transactions per second.
    pub throughput: f64,
    pub original_users: i64,
    pub original_ramp_time: i64,
    pub original_duration: i64,
    pub original_throughput: f64,
    #[serde(skip)]
    pub(crate) node: NodeId,
}

#[derive(Debug, Clone, Serialize)]
pub struct SamplerRecord {
    pub name: String,
    pub enabled: bool,
    pub method: String,
    pub domain: String,
    pub path: String,
    pub protocol: String,
    pub url: String,
    /// Position among the samplers of the file as loaded. Never reused, so it
    /// identifies the sampler across filtering and deletes.
    pub original_index: usize,
    #[serde(skip)]
    pub(crate) node: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TimerKind {
    Constant,
    UniformRandom,
    GaussianRandom,
    PreciseThroughput,
}

impl TimerKind {
    pub(crate) const ALL: [Self; 4] = [
        Self::Constant,
        Self::UniformRandom,
        Self::GaussianRandom,
        Self::PreciseThroughput,
    ];

    pub fn tag_name(self) -> &'static str {
        match self {
            Self::Constant => "ConstantTimer",
            Self::UniformRandom => "UniformRandomTimer",
            Self::GaussianRandom => "GaussianRandomTimer",
            Self::PreciseThroughput => "PreciseThroughputTimer",
        }
    }

    pub(crate) fn gui_class(self) -> &'static str {
        match self {
            Self::Constant => "ConstantTimerGui",
            Self::UniformRandom => "UniformRandomTimerGui",
            Self::GaussianRandom => "GaussianRandomTimerGui",
            Self::PreciseThroughput => "TestBeanGUI",
        }
    }

    pub(crate) fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag_name() == tag)
    }

    pub fn is_throughput(self) -> bool {
        matches!(self, Self::PreciseThroughput)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum TimerParams {
    /// `range_ms` is the random range for uniform timers, the deviation for
    /// gaussian ones and 0 for constant ones.
    Delay { delay_ms: f64, range_ms: f64 },
    Throughput { tps: f64, period_secs: f64 },
}

#[derive(Debug, Clone, Serialize)]
pub struct TimerRecord {
    pub kind: TimerKind,
    pub name: String,
    pub enabled: bool,
    pub params: TimerParams,
    pub sampler: Option<String>,
    pub thread_group: Option<String>,
    #[serde(skip)]
    pub(crate) node: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataSourceKind {
    Standard,
    RandomOrder,
    Extended,
    UniquePerThreadGroup,
}

impl DataSourceKind {
    pub(crate) const ALL: [Self; 4] = [
        Self::Standard,
        Self::RandomOrder,
        Self::Extended,
        Self::UniquePerThreadGroup,
    ];

    pub fn tag_name(self) -> &'static str {
        match self {
            Self::Standard => "CSVDataSet",
            Self::RandomOrder => "com.blazemeter.jmeter.RandomCSVDataSetConfig",
            Self::Extended => "com.di.jmeter.config.ExtendedCsvDataSetConfig",
            Self::UniquePerThreadGroup => "dukhi.a.jmeter.config.UniqueCSVDataSet",
        }
    }

    pub(crate) fn gui_class(self) -> &'static str {
        match self {
            Self::Standard | Self::UniquePerThreadGroup => "TestBeanGUI",
            Self::RandomOrder => "com.blazemeter.jmeter.RandomCSVDataSetConfigGui",
            Self::Extended => "com.di.jmeter.config.gui.ExtendedCsvDataSetConfigGui",
        }
    }

    pub(crate) fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag_name() == tag)
    }
}

/// Row allocation of the extended data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Allocation {
    Off,
    Auto,
    /// `count` rows per thread; required.
    Manual { count: Option<u32> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DataSourceOptions {
    Standard {
        quoted_data: bool,
        recycle: bool,
        stop_thread: bool,
        share_mode: String,
    },
    RandomOrder {
        random_order: bool,
        rewind_on_end: bool,
        independent_list_per_thread: bool,
    },
    Extended {
        quoted_data: bool,
        select_row: String,
        update_value: String,
        out_of_values: String,
        share_mode: String,
        allocation: Allocation,
    },
    UniquePerThreadGroup {
        quoted_data: bool,
        recycle: bool,
        stop_thread: bool,
        share_mode: String,
        thread_group: String,
        block_size: u32,
    },
}

impl DataSourceOptions {
    pub fn kind(&self) -> DataSourceKind {
        match self {
            Self::Standard { .. } => DataSourceKind::Standard,
            Self::RandomOrder { .. } => DataSourceKind::RandomOrder,
            Self::Extended { .. } => DataSourceKind::Extended,
            Self::UniquePerThreadGroup { .. } => DataSourceKind::UniquePerThreadGroup,
        }
    }

    /// Options a new data source of `kind` gets when the caller has no
    /// preference.
    pub fn defaults(kind: DataSourceKind) -> Self {
        match kind {
            DataSourceKind::Standard => Self::Standard {
                quoted_data: false,
                recycle: true,
                stop_thread: false,
                share_mode: "shareMode.all".into(),
            },
            DataSourceKind::RandomOrder => Self::RandomOrder {
                random_order: true,
                rewind_on_end: true,
                independent_list_per_thread: false,
            },
            DataSourceKind::Extended => Self::Extended {
                quoted_data: false,
                select_row: "Sequential".into(),
                update_value: "Each Iteration".into(),
                out_of_values: "Continue Cyclic".into(),
                share_mode: "All threads".into(),
                allocation: Allocation::Off,
            },
            DataSourceKind::UniquePerThreadGroup => Self::UniquePerThreadGroup {
                quoted_data: false,
                recycle: true,
                stop_thread: false,
                share_mode: "shareMode.all".into(),
                thread_group: "Thread Group A".into(),
                block_size: 1,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSourceConfig {
    pub name: String,
    pub filename: String,
    pub file_encoding: String,
    /// Comma separated, as written in the file.
    pub variable_names: String,
    pub delimiter: String,
    pub ignore_first_line: bool,
    pub options: DataSourceOptions,
}

impl DataSourceConfig {
    pub fn new(kind: DataSourceKind, name: &str, filename: &str, variable_names: &str) -> Self {
        let file_encoding = match kind {
            DataSourceKind::RandomOrder | DataSourceKind::Extended => "UTF-8",
            DataSourceKind::Standard | DataSourceKind::UniquePerThreadGroup => "",
        };
        Self {
            name: name.to_string(),
            filename: filename.to_string(),
            file_encoding: file_encoding.to_string(),
            variable_names: variable_names.to_string(),
            delimiter: ",".to_string(),
            ignore_first_line: matches!(kind, DataSourceKind::Extended),
            options: DataSourceOptions::defaults(kind),
        }
    }

    pub fn kind(&self) -> DataSourceKind {
        self.options.kind()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DataSourceRecord {
    pub config: DataSourceConfig,
    #[serde(skip)]
    pub(crate) node: NodeId,
}

impl DataSourceRecord {
    pub fn kind(&self) -> DataSourceKind {
        self.config.kind()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VariableRecord {
    pub name: String,
    pub value: String,
    #[serde(skip)]
    pub(crate) node: NodeId,
}

/// Values of the `rampupSteadyDuration` arguments element, when the plan has one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GlobalVariables {
    pub rampup: Option<String>,
    pub steady_state: Option<String>,
}
