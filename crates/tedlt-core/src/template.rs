//! Property template resolution
//!
//! String values may embed `{{ reference }}` placeholders. A reference names
//! either a context variable (see [`InvocationContext`]) or another property
//! of the same merged set. Whitespace inside the markers is ignored.
//!
//! References between properties form their own directed graph. It is sorted
//! topologically (Kahn's algorithm) so every property is expanded after the
//! properties it references; a leftover subgraph means a reference cycle.
//! The result does not depend on which key is looked at first.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::context::InvocationContext;
use crate::value::{PropertyMap, PropertyValue};
use crate::{Error, Result};

/// Longest allowed chain of property-to-property references, counting the
/// property being resolved
pub const MAX_TEMPLATE_DEPTH: usize = 10;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^{}\s]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// References named by the placeholders in `text`, in order of appearance.
pub fn placeholders(text: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|reference| reference.as_str())
        .collect()
}

/// Whether `text` contains at least one placeholder.
pub fn is_template(text: &str) -> bool {
    PLACEHOLDER.is_match(text)
}

/// Resolves every template in a merged property set.
pub struct TemplateEngine<'a> {
    context: &'a InvocationContext,
    max_depth: usize,
}

impl<'a> TemplateEngine<'a> {
    pub fn new(context: &'a InvocationContext) -> Self {
        Self {
            context,
            max_depth: MAX_TEMPLATE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve all properties to placeholder-free values.
    ///
    /// # Errors
    ///
    /// - `CyclicTemplateReference` if properties reference each other in a loop
    /// - `TemplateRecursionLimit` if a reference chain is longer than the limit
    /// - `UnresolvedReference` if a placeholder names nothing known
    pub fn resolve(&self, properties: &PropertyMap) -> Result<PropertyMap> {
        let graph = self.reference_graph(properties);
        let order = topological_order(&graph)?;

        let mut resolved = PropertyMap::new();
        let mut heights: BTreeMap<&str, usize> = BTreeMap::new();

        for key in order {
            let height = 1 + graph[key]
                .iter()
                .filter_map(|dep| heights.get(dep))
                .max()
                .copied()
                .unwrap_or(0);
            if height > self.max_depth {
                return Err(Error::TemplateRecursionLimit {
                    property: key.to_string(),
                    limit: self.max_depth,
                });
            }
            heights.insert(key, height);

            let raw = &properties[key];
            let value = self.render(key, raw, &resolved)?;
            if &value != raw {
                tracing::debug!(property = key, value = %value, "Resolved template");
            }
            resolved.insert(key.to_string(), value);
        }

        Ok(resolved)
    }

    /// Expand the placeholders of one value against already-resolved
    /// properties. `owner` names the property being rendered, for errors.
    ///
    /// A value that is exactly one placeholder takes the referenced value
    /// with its type; placeholders inside longer text are stringified.
    /// List elements are rendered one by one, and an element that resolves
    /// to a list is spliced into the surrounding list.
    pub fn render(
        &self,
        owner: &str,
        raw: &PropertyValue,
        resolved: &PropertyMap,
    ) -> Result<PropertyValue> {
        match raw {
            PropertyValue::String(text) => self.render_text(owner, text, resolved),
            PropertyValue::List(items) => {
                let mut rendered = Vec::with_capacity(items.len());
                for item in items {
                    match self.render(owner, item, resolved)? {
                        PropertyValue::List(nested) if !matches!(item, PropertyValue::List(_)) => {
                            rendered.extend(nested);
                        }
                        value => rendered.push(value),
                    }
                }
                Ok(PropertyValue::List(rendered))
            }
            scalar => Ok(scalar.clone()),
        }
    }

    fn render_text(
        &self,
        owner: &str,
        text: &str,
        resolved: &PropertyMap,
    ) -> Result<PropertyValue> {
        let mut output = String::with_capacity(text.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(text) {
            let (Some(whole), Some(reference)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = self.lookup(owner, reference.as_str(), resolved)?;

            if whole.start() == 0 && whole.end() == text.len() {
                return Ok(value);
            }

            output.push_str(&text[last..whole.start()]);
            output.push_str(&value.to_string());
            last = whole.end();
        }

        if last == 0 {
            return Ok(PropertyValue::from(text));
        }
        output.push_str(&text[last..]);
        Ok(PropertyValue::String(output))
    }

    fn lookup(
        &self,
        owner: &str,
        reference: &str,
        resolved: &PropertyMap,
    ) -> Result<PropertyValue> {
        if let Some(value) = self.context.lookup(reference) {
            return Ok(PropertyValue::String(value));
        }
        resolved
            .get(reference)
            .cloned()
            .ok_or_else(|| Error::UnresolvedReference {
                reference: reference.to_string(),
                property: owner.to_string(),
            })
    }

    /// Edges from each property to the properties its placeholders name.
    /// Context variables and unknown names are not part of the graph.
    fn reference_graph<'p>(
        &self,
        properties: &'p PropertyMap,
    ) -> BTreeMap<&'p str, BTreeSet<&'p str>> {
        properties
            .iter()
            .map(|(key, value)| {
                let deps = value
                    .strings()
                    .into_iter()
                    .flat_map(placeholders)
                    .filter(|name| !self.context.provides(name))
                    .filter_map(|name| properties.get_key_value(name).map(|(k, _)| k.as_str()))
                    .collect();
                (key.as_str(), deps)
            })
            .collect()
    }
}

/// Dependency-first ordering of the reference graph.
fn topological_order<'p>(
    graph: &BTreeMap<&'p str, BTreeSet<&'p str>>,
) -> Result<Vec<&'p str>> {
    let mut in_degree: BTreeMap<&str, usize> =
        graph.iter().map(|(key, deps)| (*key, deps.len())).collect();

    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, deps) in graph {
        for dep in deps {
            dependents.entry(*dep).or_default().push(*key);
        }
    }

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(key, _)| *key)
        .collect();
    let mut order = Vec::with_capacity(graph.len());

    while let Some(current) = ready.pop_first() {
        order.push(current);
        for dependent in dependents.get(current).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    if order.len() == graph.len() {
        return Ok(order);
    }

    let done: BTreeSet<&str> = order.into_iter().collect();
    Err(Error::CyclicTemplateReference {
        cycle: find_cycle(graph, &done),
    })
}

/// Walk unresolved nodes until one repeats. Every node left over by Kahn's
/// algorithm still has an unresolved dependency, so the walk always closes.
fn find_cycle(graph: &BTreeMap<&str, BTreeSet<&str>>, done: &BTreeSet<&str>) -> Vec<String> {
    let mut path: Vec<&str> = Vec::new();
    let mut current = graph.keys().find(|key| !done.contains(*key)).copied();

    while let Some(node) = current {
        if let Some(start) = path.iter().position(|seen| *seen == node) {
            let mut cycle: Vec<String> = path[start..].iter().map(|s| s.to_string()).collect();
            cycle.push(node.to_string());
            return cycle;
        }
        path.push(node);
        current = graph[node].iter().find(|dep| !done.contains(*dep)).copied();
    }

    path.into_iter().map(str::to_string).collect()
}
