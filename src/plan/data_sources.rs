use super::extract::{TEST_PLAN_TAG, read_data_source};
use super::props::{BOOL_PROP, INT_PROP, STRING_PROP};
use super::records::{Allocation, DataSourceConfig, DataSourceOptions, ThreadGroupKind};
use super::thread_groups::bool_text;
use super::*;

fn validate(config: &DataSourceConfig) -> Result<()> {
    if config.name.trim().is_empty() {
        return Err(Error::Validation("Name is required".into()));
    }
    if config.filename.trim().is_empty() {
        return Err(Error::Validation("File path is required".into()));
    }
    if config.variable_names.trim().is_empty() {
        return Err(Error::Validation("Variable names are required".into()));
    }
    if let DataSourceOptions::Extended {
        allocation: Allocation::Manual { count },
        ..
    } = &config.options
    {
        if count.is_none_or(|count| count == 0) {
            return Err(Error::Validation(
                "Allocation count is required for manual allocation".into(),
            ));
        }
    }
    Ok(())
}

enum Prop {
    Str(&'static str, String),
    Bool(&'static str, bool),
    Int(&'static str, u32),
}

// Properties in the order each plugin writes them.
fn property_list(config: &DataSourceConfig) -> Vec<Prop> {
    use Prop::{Bool, Int, Str};
    let filename = Str("filename", config.filename.trim().to_string());
    let variables = Str("variableNames", config.variable_names.trim().to_string());
    let encoding = Str("fileEncoding", config.file_encoding.clone());
    let delimiter = Str("delimiter", config.delimiter.clone());
    let ignore_first_line = Bool("ignoreFirstLine", config.ignore_first_line);
    match &config.options {
        DataSourceOptions::Standard {
            quoted_data,
            recycle,
            stop_thread,
            share_mode,
        } => vec![
            delimiter,
            encoding,
            filename,
            ignore_first_line,
            Bool("quotedData", *quoted_data),
            Bool("recycle", *recycle),
            Str("shareMode", share_mode.clone()),
            Bool("stopThread", *stop_thread),
            variables,
        ],
        DataSourceOptions::RandomOrder {
            random_order,
            rewind_on_end,
            independent_list_per_thread,
        } => vec![
            filename,
            encoding,
            delimiter,
            variables,
            Bool("randomOrder", *random_order),
            ignore_first_line,
            Bool("rewindOnTheEndOfList", *rewind_on_end),
            Bool("independentListPerThread", *independent_list_per_thread),
        ],
        DataSourceOptions::Extended {
            quoted_data,
            select_row,
            update_value,
            out_of_values,
            share_mode,
            allocation,
        } => {
            let block_size = match allocation {
                Allocation::Manual { count: Some(count) } => count.to_string(),
                _ => String::new(),
            };
            vec![
                filename,
                encoding,
                variables,
                ignore_first_line,
                delimiter,
                Bool("quotedData", *quoted_data),
                Str("selectRow", select_row.clone()),
                Str("updateValue", update_value.clone()),
                Str("ooValue", out_of_values.clone()),
                Str("shareMode", share_mode.clone()),
                Bool("autoAllocate", matches!(allocation, Allocation::Auto)),
                Bool("allocate", matches!(allocation, Allocation::Manual { .. })),
                Str("blockSize", block_size),
            ]
        }
        DataSourceOptions::UniquePerThreadGroup {
            quoted_data,
            recycle,
            stop_thread,
            share_mode,
            thread_group,
            block_size,
        } => vec![
            Int("blockSize", *block_size),
            delimiter,
            encoding,
            filename,
            ignore_first_line,
            Bool("quotedData", *quoted_data),
            Bool("recycle", *recycle),
            Str("shareMode", share_mode.clone()),
            Bool("stopThread", *stop_thread),
            Str("threadGroup", thread_group.clone()),
            variables,
        ],
    }
}

impl Dom {
    fn write_data_source_props(&mut self, element: NodeId, config: &DataSourceConfig) -> Result<()> {
        for prop in property_list(config) {
            match prop {
                Prop::Str(name, value) => self.append_prop(element, STRING_PROP, name, &value)?,
                Prop::Bool(name, value) => {
                    self.append_prop(element, BOOL_PROP, name, bool_text(value))?
                }
                Prop::Int(name, value) => {
                    self.append_prop(element, INT_PROP, name, &value.to_string())?
                }
            };
        }
        Ok(())
    }
}

fn element_attrs<'a>(config: &'a DataSourceConfig) -> [(&'static str, &'a str); 3] {
    let kind = config.kind();
    [
        ("guiclass", kind.gui_class()),
        ("testclass", kind.tag_name()),
        ("testname", config.name.trim()),
    ]
}

impl Session {
    // The test plan's companion and the element new configs go before.
    fn data_source_slot(&self) -> Result<(NodeId, Option<NodeId>)> {
        let test_plan = self
            .dom
            .first_element_by_tag(self.dom.root, TEST_PLAN_TAG)
            .ok_or_else(|| Error::Structure("No Test Plan found".into()))?;
        let container = self
            .dom
            .companion(test_plan)
            .ok_or_else(|| Error::Structure("Invalid JMX structure".into()))?;
        let first_group = self.dom.child_elements(container).into_iter().find(|child| {
            self.dom
                .tag_name(*child)
                .is_some_and(|tag| ThreadGroupKind::from_tag(tag).is_some())
        });
        Ok((container, first_group))
    }

    /// Adds the config at test plan level, ahead of the first thread group,
    /// and returns its index.
    pub fn add_data_source(&mut self, config: DataSourceConfig) -> Result<usize> {
        validate(&config)?;
        let (container, before) = self.data_source_slot()?;
        let element = self
            .dom
            .create_detached_element(config.kind().tag_name(), &element_attrs(&config));
        self.dom.write_data_source_props(element, &config)?;
        match before {
            Some(reference) => self.dom.insert_pair_before(container, element, reference)?,
            None => self.dom.append_pair(container, element)?,
        };

        let record = DataSourceRecord {
            config: read_data_source(&self.dom, element, config.kind()),
            node: element,
        };
        let name = record.config.name.clone();
        let index = self.insert_data_source_record(record);
        self.trace
            .edit_line(|| format!("added data source '{name}'"));
        Ok(index)
    }

    /// Rewrites the config element in place. The kind may change; the element
    /// keeps its position, companion and enabled flag.
    pub fn update_data_source(&mut self, index: usize, config: DataSourceConfig) -> Result<()> {
        validate(&config)?;
        let node = self.data_sources.get(index)?.node;
        let enabled = self.dom.attr(node, "enabled");

        let element = self
            .dom
            .element_mut(node)
            .ok_or_else(|| Error::Structure("data source is not an element".into()))?;
        element.tag_name = config.kind().tag_name().to_string();
        element.attrs = element_attrs(&config)
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        if let Some(enabled) = enabled {
            self.dom.set_attr(node, "enabled", &enabled)?;
        }
        self.dom.set_text_content(node, "")?;
        self.dom.write_data_source_props(node, &config)?;

        let refreshed = read_data_source(&self.dom, node, config.kind());
        let name = refreshed.name.clone();
        self.data_sources.get_mut(index)?.config = refreshed;
        self.trace
            .edit_line(|| format!("updated data source '{name}'"));
        Ok(())
    }

    pub fn delete_data_source(&mut self, index: usize) -> Result<DataSourceRecord> {
        let node = self.data_sources.get(index)?.node;
        self.dom.remove_with_companion(node)?;
        let record = self.data_sources.remove(index)?;
        let name = record.config.name.clone();
        self.trace
            .edit_line(|| format!("deleted data source '{name}'"));
        Ok(record)
    }
}
