use super::props::{ELEMENT_PROP, INT_PROP, STRING_PROP, is_enabled, parse_float, parse_int};
use super::records::{
    Allocation, DataSourceConfig, DataSourceKind, DataSourceOptions, DataSourceRecord,
    GlobalVariables, SamplerRecord, ThreadGroupKind, ThreadGroupRecord, TimerKind, TimerParams,
    TimerRecord, VariableRecord,
};
use super::*;

pub(super) const COUNT_ALIASES: [&str; 2] = ["ThreadGroup.num_threads", "TargetLevel"];
pub(super) const RAMP_ALIASES: [&str; 2] = ["ThreadGroup.ramp_time", "RampUp"];
pub(super) const DURATION_ALIASES: [&str; 2] = ["ThreadGroup.duration", "Hold"];
pub(super) const MAIN_CONTROLLER: &str = r#"elementProp[name="ThreadGroup.main_controller"]"#;
pub(super) const LOOPS_PROP: &str = "LoopController.loops";

pub(super) const SAMPLER_TAG: &str = "HTTPSamplerProxy";
pub(super) const TEST_PLAN_TAG: &str = "TestPlan";
pub(super) const ARGUMENTS_TAG: &str = "Arguments";
pub(super) const ARGUMENTS_COLLECTION: &str = r#"collectionProp[name="Arguments.arguments"]"#;
pub(super) const ARGUMENT_NAME: &str = "Argument.name";
pub(super) const ARGUMENT_VALUE: &str = "Argument.value";
const GLOBAL_ARGUMENTS_NAME: &str = "rampupSteadyDuration";

const DEFAULT_USERS: i64 = 1;
const DEFAULT_RAMP_TIME: i64 = 1;
const DEFAULT_DURATION: i64 = 0;
const DEFAULT_LOOPS: i64 = 1;
const DEFAULT_THROUGHPUT_PERIOD: f64 = 3600.0;
const UNNAMED_SAMPLER: &str = "Unnamed Request";

pub(super) struct Extracted {
    pub(super) thread_groups: Vec<ThreadGroupRecord>,
    pub(super) samplers: Vec<SamplerRecord>,
    pub(super) timers: Vec<TimerRecord>,
    pub(super) data_sources: Vec<DataSourceRecord>,
    pub(super) variables: Vec<VariableRecord>,
    pub(super) variables_container: Option<NodeId>,
    pub(super) global_variables: GlobalVariables,
    pub(super) throughput_baselines: HashMap<NodeId, f64>,
}

pub(super) fn extract_all(dom: &Dom, trace: &mut TraceState) -> Result<Extracted> {
    let all = dom.descendant_elements(dom.root);

    let mut thread_groups = Vec::new();
    let mut samplers = Vec::new();
    let mut timers = Vec::new();
    let mut data_sources = Vec::new();
    let mut throughput_baselines = HashMap::new();

    for &node in &all {
        let Some(tag) = dom.tag_name(node) else {
            continue;
        };
        if let Some(kind) = ThreadGroupKind::from_tag(tag) {
            trace_shadowed(dom, trace, node, &COUNT_ALIASES);
            trace_shadowed(dom, trace, node, &RAMP_ALIASES);
            trace_shadowed(dom, trace, node, &DURATION_ALIASES);
            thread_groups.push(read_thread_group(dom, node, kind)?);
        } else if tag == SAMPLER_TAG {
            samplers.push(read_sampler(dom, node, samplers.len()));
        } else if let Some(kind) = DataSourceKind::from_tag(tag) {
            data_sources.push(DataSourceRecord {
                config: read_data_source(dom, node, kind),
                node,
            });
        }
        if let Some(kind) = TimerKind::from_tag(tag) {
            timers.push(read_timer(dom, node, kind));
        }
        if props::throughput_units_per_tps(tag).is_some() {
            throughput_baselines.insert(node, dom.timer_tps(node).unwrap_or(0.0));
        }
    }

    let variables_container = find_variables_container(dom);
    let variables = match variables_container {
        Some(container) => read_variables(dom, container)?,
        None => Vec::new(),
    };
    let global_variables = read_global_variables(dom)?;

    trace.parse_line(|| {
        format!(
            "loaded {} thread groups, {} samplers, {} timers, {} data sources, {} variables",
            thread_groups.len(),
            samplers.len(),
            timers.len(),
            data_sources.len(),
            variables.len()
        )
    });
    if variables_container.is_none() {
        trace.parse_line(|| "no user defined variables element".to_string());
    }

    Ok(Extracted {
        thread_groups,
        samplers,
        timers,
        data_sources,
        variables,
        variables_container,
        global_variables,
        throughput_baselines,
    })
}

fn trace_shadowed(dom: &Dom, trace: &mut TraceState, node: NodeId, names: &[&str]) {
    for name in names {
        let count = dom.prop_count(node, &[STRING_PROP, INT_PROP], name);
        if count > 1 {
            let owner = dom.attr(node, "testname").unwrap_or_default();
            trace.parse_line(|| {
                format!("'{owner}' has {count} '{name}' properties; only the first is used")
            });
        }
    }
}

pub(super) fn testname(dom: &Dom, node: NodeId) -> String {
    dom.attr(node, "testname").unwrap_or_default()
}

pub(super) fn read_thread_group(
    dom: &Dom,
    node: NodeId,
    kind: ThreadGroupKind,
) -> Result<ThreadGroupRecord> {
    let users = dom.aliased_int(node, &COUNT_ALIASES).unwrap_or(DEFAULT_USERS);
    let ramp_time = dom.aliased_int(node, &RAMP_ALIASES).unwrap_or(DEFAULT_RAMP_TIME);
    let duration = dom
        .aliased_int(node, &DURATION_ALIASES)
        .unwrap_or(DEFAULT_DURATION);
    let loops = read_loops(dom, node)?.unwrap_or(DEFAULT_LOOPS);
    let throughput = subtree_throughput(dom, node);
    Ok(ThreadGroupRecord {
        name: testname(dom, node),
        kind,
        enabled: is_enabled(dom, node),
        users,
        ramp_time,
        duration,
        loops,
        throughput,
        original_users: users,
        original_ramp_time: ramp_time,
        original_duration: duration,
        original_throughput: throughput,
        node,
    })
}

fn read_loops(dom: &Dom, node: NodeId) -> Result<Option<i64>> {
    let Some(controller) = dom.query_selector_from(node, MAIN_CONTROLLER)? else {
        return Ok(None);
    };
    Ok(dom
        .scalar_prop(controller, LOOPS_PROP)
        .and_then(|text| parse_int(&text)))
}

/// Throughput of the enabled timers below `node`'s companion, in TPS.
pub(super) fn subtree_throughput(dom: &Dom, node: NodeId) -> f64 {
    let Some(companion) = dom.companion(node) else {
        return 0.0;
    };
    dom.throughput_timers(companion)
        .into_iter()
        .filter(|timer| is_enabled(dom, *timer))
        .filter_map(|timer| dom.timer_tps(timer))
        .sum()
}

pub(super) fn sampler_url(protocol: &str, domain: &str, path: &str) -> String {
    if domain.is_empty() {
        path.to_string()
    } else {
        format!("{protocol}://{domain}{path}")
    }
}

fn read_sampler(dom: &Dom, node: NodeId, original_index: usize) -> SamplerRecord {
    let prop = |name: &str| {
        dom.string_prop(node, name)
            .filter(|value| !value.is_empty())
    };
    let domain = prop("HTTPSampler.domain").unwrap_or_default();
    let path = prop("HTTPSampler.path").unwrap_or_default();
    let protocol = prop("HTTPSampler.protocol").unwrap_or_else(|| "http".to_string());
    let method = prop("HTTPSampler.method").unwrap_or_else(|| "GET".to_string());
    let name = dom
        .attr(node, "testname")
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNNAMED_SAMPLER.to_string());
    SamplerRecord {
        name,
        enabled: is_enabled(dom, node),
        url: sampler_url(&protocol, &domain, &path),
        method,
        domain,
        path,
        protocol,
        original_index,
        node,
    }
}

pub(super) fn read_timer(dom: &Dom, node: NodeId, kind: TimerKind) -> TimerRecord {
    let params = if kind.is_throughput() {
        TimerParams::Throughput {
            tps: dom.timer_tps(node).unwrap_or(0.0),
            period_secs: dom
                .scalar_prop(node, "throughputPeriod")
                .and_then(|text| parse_float(&text))
                .unwrap_or(DEFAULT_THROUGHPUT_PERIOD),
        }
    } else {
        let number = |name: &str| {
            dom.string_prop(node, name)
                .and_then(|text| parse_float(&text))
                .unwrap_or(0.0)
        };
        TimerParams::Delay {
            delay_ms: number(timers::DELAY_PROP),
            range_ms: match kind {
                TimerKind::Constant => 0.0,
                _ => number(timers::RANGE_PROP),
            },
        }
    };
    let (sampler, thread_group) = timer_owners(dom, node);
    TimerRecord {
        kind,
        name: testname(dom, node),
        enabled: is_enabled(dom, node),
        params,
        sampler,
        thread_group,
        node,
    }
}

// Names of the sampler the timer is attached to and of the enclosing thread
// group.
fn timer_owners(dom: &Dom, node: NodeId) -> (Option<String>, Option<String>) {
    let sampler = dom
        .parent(node)
        .and_then(|container| dom.companion_owner(container))
        .filter(|owner| dom.has_tag(*owner, SAMPLER_TAG))
        .map(|owner| testname(dom, owner));

    let mut thread_group = None;
    let mut cursor = dom.parent(node);
    while let Some(current) = cursor {
        if let Some(owner) = dom.companion_owner(current) {
            if dom
                .tag_name(owner)
                .is_some_and(|tag| ThreadGroupKind::from_tag(tag).is_some())
            {
                thread_group = Some(testname(dom, owner));
                break;
            }
        }
        cursor = dom.parent(current);
    }
    (sampler, thread_group)
}

pub(super) fn read_data_source(dom: &Dom, node: NodeId, kind: DataSourceKind) -> DataSourceConfig {
    let text = |name: &str| dom.string_prop(node, name).unwrap_or_default();
    let text_or = |name: &str, fallback: String| dom.string_prop(node, name).unwrap_or(fallback);
    let flag = |name: &str, fallback: bool| dom.bool_prop(node, name).unwrap_or(fallback);

    let options = match DataSourceOptions::defaults(kind) {
        DataSourceOptions::Standard {
            quoted_data,
            recycle,
            stop_thread,
            share_mode,
        } => DataSourceOptions::Standard {
            quoted_data: flag("quotedData", quoted_data),
            recycle: flag("recycle", recycle),
            stop_thread: flag("stopThread", stop_thread),
            share_mode: text_or("shareMode", share_mode),
        },
        DataSourceOptions::RandomOrder {
            random_order,
            rewind_on_end,
            independent_list_per_thread,
        } => DataSourceOptions::RandomOrder {
            random_order: flag("randomOrder", random_order),
            rewind_on_end: flag("rewindOnTheEndOfList", rewind_on_end),
            independent_list_per_thread: flag(
                "independentListPerThread",
                independent_list_per_thread,
            ),
        },
        DataSourceOptions::Extended {
            quoted_data,
            select_row,
            update_value,
            out_of_values,
            share_mode,
            ..
        } => {
            let allocation = if flag("autoAllocate", false) {
                Allocation::Auto
            } else if flag("allocate", false) {
                Allocation::Manual {
                    count: dom
                        .scalar_prop(node, "blockSize")
                        .and_then(|text| text.trim().parse::<u32>().ok()),
                }
            } else {
                Allocation::Off
            };
            DataSourceOptions::Extended {
                quoted_data: flag("quotedData", quoted_data),
                select_row: text_or("selectRow", select_row),
                update_value: text_or("updateValue", update_value),
                out_of_values: text_or("ooValue", out_of_values),
                share_mode: text_or("shareMode", share_mode),
                allocation,
            }
        }
        DataSourceOptions::UniquePerThreadGroup {
            quoted_data,
            recycle,
            stop_thread,
            share_mode,
            thread_group,
            block_size,
        } => DataSourceOptions::UniquePerThreadGroup {
            quoted_data: flag("quotedData", quoted_data),
            recycle: flag("recycle", recycle),
            stop_thread: flag("stopThread", stop_thread),
            share_mode: text_or("shareMode", share_mode),
            thread_group: text_or("threadGroup", thread_group),
            block_size: dom
                .scalar_prop(node, "blockSize")
                .and_then(|text| text.trim().parse::<u32>().ok())
                .unwrap_or(block_size),
        },
    };

    DataSourceConfig {
        name: testname(dom, node),
        filename: text("filename"),
        file_encoding: text("fileEncoding"),
        variable_names: text("variableNames"),
        delimiter: text("delimiter"),
        ignore_first_line: dom.bool_prop(node, "ignoreFirstLine").unwrap_or(false),
        options,
    }
}

pub(super) fn find_variables_container(dom: &Dom) -> Option<NodeId> {
    dom.elements_by_tag(dom.root, ARGUMENTS_TAG)
        .into_iter()
        .find(|node| {
            let name = dom.attr(*node, "testname");
            if name.as_deref() == Some(GLOBAL_ARGUMENTS_NAME) {
                return false;
            }
            name.as_deref() == Some(crate::config::DEFAULT_VARIABLES_NAME)
                || dom.attr(*node, "guiclass").as_deref() == Some("ArgumentsPanel")
        })
}

pub(super) fn read_variables(dom: &Dom, container: NodeId) -> Result<Vec<VariableRecord>> {
    let Some(collection) = dom.query_selector_from(container, ARGUMENTS_COLLECTION)? else {
        return Ok(Vec::new());
    };
    Ok(dom
        .child_elements_by_tag(collection, ELEMENT_PROP)
        .into_iter()
        .filter_map(|entry| {
            let name = dom.string_prop(entry, ARGUMENT_NAME)?;
            let value = dom.string_prop(entry, ARGUMENT_VALUE)?;
            Some(VariableRecord {
                name,
                value,
                node: entry,
            })
        })
        .collect())
}

fn read_global_variables(dom: &Dom) -> Result<GlobalVariables> {
    let mut globals = GlobalVariables::default();
    let selector = format!(r#"{ARGUMENTS_TAG}[testname="{GLOBAL_ARGUMENTS_NAME}"] {ELEMENT_PROP}"#);
    for entry in dom.query_selector_all_from(dom.root, &selector)? {
        let strings = dom.elements_by_tag(entry, STRING_PROP);
        let (Some(name), Some(value)) = (strings.first(), strings.get(1)) else {
            continue;
        };
        let value = dom.text_content(*value);
        match dom.text_content(*name).as_str() {
            "rampup" => globals.rampup = Some(value),
            "steadyState" => globals.steady_state = Some(value),
            _ => {}
        }
    }
    Ok(globals)
}
