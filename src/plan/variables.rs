use super::extract::{ARGUMENT_NAME, ARGUMENT_VALUE, ARGUMENTS_COLLECTION};
use super::props::{COLLECTION_PROP, ELEMENT_PROP, STRING_PROP};
use super::*;

const ARGUMENT_METADATA: &str = "Argument.metadata";

impl Session {
    fn variables_container(&self) -> Result<NodeId> {
        self.variables_container
            .ok_or_else(|| Error::Structure("User Defined Variables element not found".into()))
    }

    pub fn variables_container_name(&self) -> Option<String> {
        self.variables_container
            .and_then(|container| self.dom.attr(container, "testname"))
    }

    /// Appends a variable and returns its index. Names are compared exactly.
    pub fn add_variable(&mut self, name: &str, value: &str) -> Result<usize> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Variable name is required".into()));
        }
        if self
            .variables
            .position(|variable| variable.name == name)
            .is_some()
        {
            return Err(Error::Validation("Variable already exists".into()));
        }
        let container = self.variables_container()?;

        let collection = match self.dom.query_selector_from(container, ARGUMENTS_COLLECTION)? {
            Some(collection) => collection,
            None => {
                let collection = self
                    .dom
                    .create_detached_element(COLLECTION_PROP, &[("name", "Arguments.arguments")]);
                self.dom.append_child(container, collection)?;
                collection
            }
        };
        let entry = self
            .dom
            .create_detached_element(ELEMENT_PROP, &[("name", name), ("elementType", "Argument")]);
        self.dom.append_prop(entry, STRING_PROP, ARGUMENT_NAME, name)?;
        self.dom.append_prop(entry, STRING_PROP, ARGUMENT_VALUE, value)?;
        self.dom.append_prop(entry, STRING_PROP, ARGUMENT_METADATA, "=")?;
        self.dom.append_child(collection, entry)?;

        let index = self.variables.push(VariableRecord {
            name: name.to_string(),
            value: value.to_string(),
            node: entry,
        });
        self.trace.edit_line(|| format!("added variable '{name}'"));
        Ok(index)
    }

    pub fn update_variable(&mut self, index: usize, value: &str) -> Result<()> {
        let node = self.variables.get(index)?.node;
        self.dom
            .upsert_prop(node, &[STRING_PROP], STRING_PROP, ARGUMENT_VALUE, value)?;
        let record = self.variables.get_mut(index)?;
        record.value = value.to_string();
        let name = record.name.clone();
        self.trace
            .edit_line(|| format!("variable '{name}' set to '{value}'"));
        Ok(())
    }

    pub fn delete_variable(&mut self, index: usize) -> Result<VariableRecord> {
        let node = self.variables.get(index)?.node;
        self.dom.remove_node(node)?;
        let record = self.variables.remove(index)?;
        let name = record.name.clone();
        self.trace.edit_line(|| format!("deleted variable '{name}'"));
        Ok(record)
    }

    /// Replaces every occurrence of `find` in variable values and returns how
    /// many variables changed.
    pub fn find_and_replace(&mut self, find: &str, replace: &str) -> Result<usize> {
        if find.is_empty() {
            return Err(Error::Validation("Find text is required".into()));
        }
        let targets: Vec<usize> = self
            .variables
            .as_slice()
            .iter()
            .enumerate()
            .filter(|(_, variable)| variable.value.contains(find))
            .map(|(index, _)| index)
            .collect();
        for index in &targets {
            let value = self.variables.get(*index)?.value.replace(find, replace);
            self.update_variable(*index, &value)?;
        }
        Ok(targets.len())
    }

    /// Variables whose value contains `find`. Empty text matches nothing.
    pub fn preview_find_replace(&self, find: &str) -> Vec<&VariableRecord> {
        if find.is_empty() {
            return Vec::new();
        }
        self.variables
            .as_slice()
            .iter()
            .filter(|variable| variable.value.contains(find))
            .collect()
    }

    /// Renames the variables element. A blank name restores the default one.
    /// Returns the name written.
    pub fn rename_variables_container(&mut self, name: &str) -> Result<String> {
        let container = self.variables_container()?;
        let name = match name.trim() {
            "" => self.default_variables_name.clone(),
            trimmed => trimmed.to_string(),
        };
        self.dom.set_attr(container, "testname", &name)?;
        self.trace
            .edit_line(|| format!("variables element renamed to '{name}'"));
        Ok(name)
    }
}
