use super::*;

pub(crate) const STRING_PROP: &str = "stringProp";
pub(crate) const INT_PROP: &str = "intProp";
pub(crate) const LONG_PROP: &str = "longProp";
pub(crate) const DOUBLE_PROP: &str = "doubleProp";
pub(crate) const BOOL_PROP: &str = "boolProp";
pub(crate) const ELEMENT_PROP: &str = "elementProp";
pub(crate) const COLLECTION_PROP: &str = "collectionProp";

const SCALAR_PROPS: [&str; 4] = [STRING_PROP, INT_PROP, LONG_PROP, DOUBLE_PROP];

const THROUGHPUT_PROP: &str = "throughput";

/// Throughput-capable timer tags and how many of their units make one
/// transaction per second.
const THROUGHPUT_TIMERS: [(&str, f64); 3] = [
    ("PreciseThroughputTimer", 1.0),
    ("kg.apc.jmeter.timers.VariableThroughputTimer", 1.0),
    ("ConstantThroughputTimer", 60.0),
];

pub(crate) fn throughput_units_per_tps(tag: &str) -> Option<f64> {
    THROUGHPUT_TIMERS
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, units)| *units)
}

pub(crate) fn is_enabled(dom: &Dom, node: NodeId) -> bool {
    dom.attr(node, "enabled").as_deref() != Some("false")
}

/// Integer reading that tolerates a fractional part, as form fields do.
pub(crate) fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(|value| value.trunc() as i64)
    })
}

pub(crate) fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

pub(crate) fn format_number(value: f64) -> String {
    format!("{value}")
}

impl Dom {
    /// First element below `element`, in document order, whose tag is one of
    /// `tags` and whose `name` attribute is `name`.
    pub(crate) fn find_prop(&self, element: NodeId, tags: &[&str], name: &str) -> Option<NodeId> {
        self.descendant_elements(element).into_iter().find(|node| {
            self.tag_name(*node).is_some_and(|tag| tags.contains(&tag))
                && self.attr(*node, "name").as_deref() == Some(name)
        })
    }

    pub(crate) fn prop_count(&self, element: NodeId, tags: &[&str], name: &str) -> usize {
        self.descendant_elements(element)
            .into_iter()
            .filter(|node| {
                self.tag_name(*node).is_some_and(|tag| tags.contains(&tag))
                    && self.attr(*node, "name").as_deref() == Some(name)
            })
            .count()
    }

    pub(crate) fn prop_text(&self, element: NodeId, tags: &[&str], name: &str) -> Option<String> {
        self.find_prop(element, tags, name)
            .map(|prop| self.text_content(prop))
    }

    pub(crate) fn string_prop(&self, element: NodeId, name: &str) -> Option<String> {
        self.prop_text(element, &[STRING_PROP], name)
    }

    pub(crate) fn scalar_prop(&self, element: NodeId, name: &str) -> Option<String> {
        self.prop_text(element, &SCALAR_PROPS, name)
    }

    pub(crate) fn bool_prop(&self, element: NodeId, name: &str) -> Option<bool> {
        self.prop_text(element, &[BOOL_PROP], name)
            .and_then(|text| parse_bool(&text))
    }

    /// Appends `<tag name="name">value</tag>` as the last child of `element`.
    pub(crate) fn append_prop(
        &mut self,
        element: NodeId,
        tag: &str,
        name: &str,
        value: &str,
    ) -> Result<NodeId> {
        let prop = self.create_detached_element(tag, &[("name", name)]);
        self.set_text_content(prop, value)?;
        self.append_child(element, prop)?;
        Ok(prop)
    }

    /// Rewrites the first matching property, or appends a new `create_tag`
    /// property when there is none.
    pub(crate) fn upsert_prop(
        &mut self,
        element: NodeId,
        tags: &[&str],
        create_tag: &str,
        name: &str,
        value: &str,
    ) -> Result<NodeId> {
        if let Some(prop) = self.find_prop(element, tags, name) {
            self.set_text_content(prop, value)?;
            return Ok(prop);
        }
        self.append_prop(element, create_tag, name, value)
    }

    /// Writes `value` into every property named by one of `aliases` that the
    /// element carries. When it carries none, appends a string property named
    /// after the first alias.
    pub(crate) fn upsert_aliased_prop(
        &mut self,
        element: NodeId,
        aliases: &[&str],
        value: &str,
    ) -> Result<()> {
        let mut written = false;
        for alias in aliases {
            if let Some(prop) = self.find_prop(element, &SCALAR_PROPS, alias) {
                self.set_text_content(prop, value)?;
                written = true;
            }
        }
        if !written {
            if let Some(first) = aliases.first() {
                self.append_prop(element, STRING_PROP, first, value)?;
            }
        }
        Ok(())
    }

    /// First alias present, read as an integer.
    pub(crate) fn aliased_int(&self, element: NodeId, aliases: &[&str]) -> Option<i64> {
        aliases
            .iter()
            .find_map(|alias| self.scalar_prop(element, alias))
            .and_then(|text| parse_int(&text))
    }

    // `<doubleProp name="throughput">v</doubleProp>`, or the nested form
    // `<doubleProp><name>throughput</name><value>v</value></doubleProp>`.
    // Returns the node whose text holds the value.
    fn throughput_value_node(&self, timer: NodeId) -> Option<NodeId> {
        self.elements_by_tag(timer, DOUBLE_PROP)
            .into_iter()
            .find_map(|prop| {
                let value_child = self
                    .child_elements_by_tag(prop, "value")
                    .into_iter()
                    .next();
                if self.attr(prop, "name").as_deref() == Some(THROUGHPUT_PROP) {
                    return Some(value_child.unwrap_or(prop));
                }
                let named = self
                    .child_elements_by_tag(prop, "name")
                    .into_iter()
                    .next()
                    .is_some_and(|name| self.text_content(name).trim() == THROUGHPUT_PROP);
                if named { value_child } else { None }
            })
    }

    /// Timer throughput in transactions per second.
    pub(crate) fn timer_tps(&self, timer: NodeId) -> Option<f64> {
        let units = throughput_units_per_tps(self.tag_name(timer)?)?;
        let node = self.throughput_value_node(timer)?;
        parse_float(&self.text_content(node)).map(|value| value / units)
    }

    pub(crate) fn set_timer_tps(&mut self, timer: NodeId, tps: f64) -> Result<()> {
        let units = self
            .tag_name(timer)
            .and_then(throughput_units_per_tps)
            .ok_or_else(|| Error::Structure("element is not a throughput timer".into()))?;
        let value = format_number(tps * units);
        match self.throughput_value_node(timer) {
            Some(node) => self.set_text_content(node, &value),
            None => self
                .append_prop(timer, DOUBLE_PROP, THROUGHPUT_PROP, &value)
                .map(|_| ()),
        }
    }

    /// Throughput timers below `container`, in document order.
    pub(crate) fn throughput_timers(&self, container: NodeId) -> Vec<NodeId> {
        self.descendant_elements(container)
            .into_iter()
            .filter(|node| {
                self.tag_name(*node)
                    .is_some_and(|tag| throughput_units_per_tps(tag).is_some())
            })
            .collect()
    }
}
