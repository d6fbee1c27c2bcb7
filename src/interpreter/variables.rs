//! Variables and variable environments
//!
//! A `VariableEnvironment` maps each declared variable to its value history.
//! One global environment holds contract storage for the whole run; every call
//! activation gets its own local environment for parameters and locals.

use std::collections::HashMap;
use std::fmt;

use super::values::Value;
use crate::ast::{NodeId, Parameter, TypeName, VariableDeclaration};

/// A declared storage variable, parameter or local
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    declaration: NodeId,
    name: String,
    type_name: TypeName,
}

impl Variable {
    pub fn new(declaration: NodeId, name: &str, type_name: TypeName) -> Self {
        Self {
            declaration,
            name: name.to_string(),
            type_name,
        }
    }

    pub fn from_declaration(declaration: &VariableDeclaration) -> Self {
        Self::new(declaration.id, &declaration.name, declaration.type_name.clone())
    }

    pub fn from_parameter(parameter: &Parameter) -> Self {
        Self::new(parameter.id, &parameter.name, parameter.type_name.clone())
    }

    pub fn declaration(&self) -> NodeId {
        self.declaration
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }
}

/// Value history of one variable at one scope depth
#[derive(Debug, Clone, PartialEq)]
pub struct VariableValues {
    variable: Variable,
    scope_depth: usize,
    values: Vec<Value>,
}

impl VariableValues {
    pub fn new(variable: Variable, scope_depth: usize) -> Self {
        Self {
            variable,
            scope_depth,
            values: Vec::new(),
        }
    }

    /// Record a new value; the last one added is the current value
    pub fn add_value(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn current(&self) -> Option<&Value> {
        self.values.last()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn is_initialized(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn scope_depth(&self) -> usize {
        self.scope_depth
    }
}

/// Read access to variables, as consumed by the expression evaluator
pub trait Environment {
    /// Resolve a variable, preferring the declaration id when the reference
    /// carries one
    fn lookup(&self, name: &str, declaration: Option<NodeId>) -> Option<&VariableValues>;
}

/// Mapping from variables to their values for one scope
#[derive(Debug, Clone, Default)]
pub struct VariableEnvironment {
    global: bool,
    variables: HashMap<NodeId, VariableValues>,
    names: HashMap<String, NodeId>,
}

impl VariableEnvironment {
    /// Contract storage environment
    pub fn global() -> Self {
        Self {
            global: true,
            ..Self::default()
        }
    }

    /// Environment of one call activation
    pub fn local() -> Self {
        Self::default()
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    /// Add a variable with its values, replacing an earlier entry for the same
    /// declaration
    pub fn add_variable_values(&mut self, values: VariableValues) {
        let declaration = values.variable().declaration();
        self.names
            .insert(values.variable().name().to_string(), declaration);
        self.variables.insert(declaration, values);
    }

    pub fn get(&self, variable: &Variable) -> Option<&VariableValues> {
        self.variables.get(&variable.declaration())
    }

    pub fn get_by_name(&self, name: &str) -> Option<&VariableValues> {
        self.names
            .get(name)
            .and_then(|declaration| self.variables.get(declaration))
    }

    /// Append a value to a variable's history; returns false if the variable
    /// is not part of this environment
    pub fn assign(&mut self, variable: &Variable, value: Value) -> bool {
        match self.variables.get_mut(&variable.declaration()) {
            Some(values) => {
                values.add_value(value);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Entries ordered by declaration id
    pub fn entries(&self) -> Vec<&VariableValues> {
        let mut entries: Vec<&VariableValues> = self.variables.values().collect();
        entries.sort_by_key(|values| values.variable().declaration());
        entries
    }
}

impl Environment for VariableEnvironment {
    fn lookup(&self, name: &str, declaration: Option<NodeId>) -> Option<&VariableValues> {
        match declaration {
            Some(id) => self.variables.get(&id),
            None => self.get_by_name(name),
        }
    }
}

impl fmt::Display for VariableEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.global { "Storage" } else { "Locals" };
        if self.variables.is_empty() {
            return write!(f, "{}: {{}}", label);
        }

        writeln!(f, "{}: {{", label)?;
        for values in self.entries() {
            match values.current() {
                Some(value) => writeln!(f, "  {}: {}", values.variable().name(), value)?,
                None => writeln!(f, "  {}: <uninitialized>", values.variable().name())?,
            }
        }
        write!(f, "}}")
    }
}

/// A call's locals layered over contract storage; locals shadow storage
#[derive(Debug, Clone, Copy)]
pub struct LayeredEnvironment<'e> {
    local: &'e VariableEnvironment,
    global: &'e VariableEnvironment,
}

impl<'e> LayeredEnvironment<'e> {
    pub fn new(local: &'e VariableEnvironment, global: &'e VariableEnvironment) -> Self {
        Self { local, global }
    }
}

impl Environment for LayeredEnvironment<'_> {
    fn lookup(&self, name: &str, declaration: Option<NodeId>) -> Option<&VariableValues> {
        self.local
            .lookup(name, declaration)
            .or_else(|| self.global.lookup(name, declaration))
    }
}
