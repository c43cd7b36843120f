//! The metadata graph: every function, type, constant and skeleton
//! instantiation of one compilation run, built once and passed by reference.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::DfsPostOrder;

use super::{Instantiation, Side, UserConstant, UserFunction, UserType};
use crate::error::GenError;
use crate::naming::{is_identifier, is_reserved};

/// A user function reached through a call, under the name the caller used.
#[derive(Clone, Debug)]
pub struct Callee<'a> {
    pub name: String,
    pub function: &'a UserFunction,
}

#[derive(Clone, Debug, Default)]
pub struct MetadataGraph {
    functions: Vec<UserFunction>,
    function_index: HashMap<String, usize>,
    types: Vec<UserType>,
    type_index: HashMap<String, usize>,
    constants: Vec<UserConstant>,
    instantiations: Vec<Instantiation>,
}

impl MetadataGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function, replacing any earlier one with the same unique name.
    pub fn add_function(&mut self, function: UserFunction) {
        match self.function_index.get(&function.unique_name) {
            Some(&slot) => self.functions[slot] = function,
            None => {
                self.function_index
                    .insert(function.unique_name.clone(), self.functions.len());
                self.functions.push(function);
            }
        }
    }

    pub fn add_type(&mut self, ty: UserType) {
        match self.type_index.get(&ty.name) {
            Some(&slot) => self.types[slot] = ty,
            None => {
                self.type_index.insert(ty.name.clone(), self.types.len());
                self.types.push(ty);
            }
        }
    }

    pub fn add_constant(&mut self, constant: UserConstant) {
        self.constants.push(constant);
    }

    pub fn add_instantiation(&mut self, inst: Instantiation) {
        self.instantiations.push(inst);
    }

    pub fn function(&self, unique_name: &str) -> Option<&UserFunction> {
        self.function_index
            .get(unique_name)
            .map(|&slot| &self.functions[slot])
    }

    pub fn user_type(&self, name: &str) -> Option<&UserType> {
        self.type_index.get(name).map(|&slot| &self.types[slot])
    }

    pub fn functions(&self) -> &[UserFunction] {
        &self.functions
    }

    pub fn types(&self) -> &[UserType] {
        &self.types
    }

    /// Constants in discovery order.
    pub fn constants(&self) -> &[UserConstant] {
        &self.constants
    }

    pub fn instantiations(&self) -> &[Instantiation] {
        &self.instantiations
    }

    /// Resolve an instantiation to its function, with elementwise sides
    /// assigned: the first `Varity` parameters are vertical, the rest
    /// horizontal.
    pub fn bind(&self, inst: &Instantiation) -> Result<UserFunction, GenError> {
        let mut function = self
            .function(&inst.function)
            .cloned()
            .ok_or_else(|| GenError::UnknownFunction(inst.function.clone()))?;

        if inst.skeleton.is_paired() {
            let shape = inst.shape();
            if function.elementwise.len() != shape.arity() {
                return Err(GenError::ShapeMismatch {
                    skeleton: inst.skeleton,
                    function: function.unique_name.clone(),
                    varity: shape.varity,
                    harity: shape.harity,
                    expected: shape.arity(),
                    found: function.elementwise.len(),
                });
            }
            for (pos, param) in function.elementwise.iter_mut().enumerate() {
                param.side = if pos < shape.varity {
                    Side::Vertical
                } else {
                    Side::Horizontal
                };
            }
        }

        Ok(function)
    }

    /// The user function a call names, by unique name first, then by plain
    /// name.
    pub fn resolve_call(&self, callee: &str) -> Option<&UserFunction> {
        self.function(callee)
            .or_else(|| self.functions.iter().find(|f| f.name == callee))
    }

    /// The user functions `function` calls, directly or through other user
    /// functions, callees first. Each is paired with the name its caller
    /// used, which is the name the kernel must define.
    pub fn callees(&self, function: &UserFunction) -> Result<Vec<Callee<'_>>, GenError> {
        let mut path = vec![function.unique_name.clone()];
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        self.visit_calls(function, &mut path, &mut seen, &mut out)?;
        Ok(out)
    }

    fn visit_calls<'a>(
        &'a self,
        caller: &UserFunction,
        path: &mut Vec<String>,
        seen: &mut BTreeSet<String>,
        out: &mut Vec<Callee<'a>>,
    ) -> Result<(), GenError> {
        for call in &caller.calls {
            let Some(callee) = self.resolve_call(call) else {
                continue;
            };
            if path.contains(&callee.unique_name) {
                return Err(GenError::RecursiveCall(callee.unique_name.clone()));
            }
            if !seen.insert(call.clone()) {
                continue;
            }
            path.push(callee.unique_name.clone());
            self.visit_calls(callee, path, seen, out)?;
            path.pop();
            out.push(Callee {
                name: call.clone(),
                function: callee,
            });
        }
        Ok(())
    }

    /// The user types `function` and its callees need, dependencies first.
    ///
    /// Includes the transitive closure of the referenced types. Independent
    /// types keep the order they are referenced in, the function's own
    /// references before its callees'.
    pub fn types_for(&self, function: &UserFunction) -> Result<Vec<&UserType>, GenError> {
        let graph = self.type_graph()?;
        let callees = self.callees(function)?;

        let owners = std::iter::once(function).chain(callees.iter().map(|c| c.function));
        let mut roots = Vec::new();
        for owner in owners {
            for name in &owner.referenced_types {
                let slot = self
                    .type_index
                    .get(name)
                    .ok_or_else(|| GenError::UnknownUserType {
                        owner: owner.unique_name.clone(),
                        name: name.clone(),
                    })?;
                roots.push(NodeIndex::new(*slot));
            }
        }

        let mut ordered = Vec::new();
        let Some(&first) = roots.first() else {
            return Ok(ordered);
        };
        let mut dfs = DfsPostOrder::new(&graph, first);
        for root in roots {
            if dfs.discovered.contains(root.index()) {
                continue;
            }
            dfs.move_to(root);
            while let Some(node) = dfs.next(&graph) {
                ordered.push(&self.types[graph[node]]);
            }
        }
        Ok(ordered)
    }

    /// Edges point from a type to the types it depends on.
    fn type_graph(&self) -> Result<DiGraph<usize, ()>, GenError> {
        let mut graph = DiGraph::with_capacity(self.types.len(), 0);
        for slot in 0..self.types.len() {
            graph.add_node(slot);
        }
        for (slot, ty) in self.types.iter().enumerate() {
            // Neighbors come back newest first and the DFS stack reverses
            // them again, so declared order is visit order.
            for dep in &ty.depends_on {
                let target = self
                    .type_index
                    .get(dep)
                    .ok_or_else(|| GenError::UnknownUserType {
                        owner: ty.name.clone(),
                        name: dep.clone(),
                    })?;
                graph.add_edge(NodeIndex::new(slot), NodeIndex::new(*target), ());
            }
        }
        toposort(&graph, None)
            .map_err(|cycle| GenError::TypeCycle(self.types[graph[cycle.node_id()]].name.clone()))?;
        Ok(graph)
    }

    /// Check the whole graph, collecting every problem found.
    ///
    /// `allowed_calls` names the external functions user functions may call;
    /// calls to other user functions of the graph are always allowed.
    pub fn validate(&self, allowed_calls: &BTreeSet<String>) -> Vec<GenError> {
        let mut errors = Vec::new();

        if let Err(e) = self.type_graph() {
            errors.push(e);
        }

        for constant in &self.constants {
            if !is_identifier(&constant.name) {
                errors.push(GenError::InvalidIdentifier {
                    what: "constant",
                    name: constant.name.clone(),
                });
            }
        }

        for function in &self.functions {
            if !is_identifier(&function.unique_name) {
                errors.push(GenError::InvalidIdentifier {
                    what: "function",
                    name: function.unique_name.clone(),
                });
            }
            let mut declared = BTreeSet::new();
            for param in function.param_names() {
                if !declared.insert(param) {
                    errors.push(GenError::DuplicateParam {
                        function: function.unique_name.clone(),
                        param: param.to_string(),
                    });
                } else if !is_identifier(param) {
                    errors.push(GenError::InvalidIdentifier {
                        what: "parameter",
                        name: param.to_string(),
                    });
                } else if is_reserved(param) {
                    errors.push(GenError::ReservedName {
                        function: function.unique_name.clone(),
                        param: param.to_string(),
                    });
                }
            }
            for name in &function.referenced_types {
                if !self.type_index.contains_key(name) {
                    errors.push(GenError::UnknownUserType {
                        owner: function.unique_name.clone(),
                        name: name.clone(),
                    });
                }
            }
            for callee in &function.calls {
                if self.resolve_call(callee).is_none() && !allowed_calls.contains(callee) {
                    errors.push(GenError::DisallowedCall {
                        function: function.unique_name.clone(),
                        callee: callee.clone(),
                    });
                }
            }
        }

        for inst in &self.instantiations {
            match self.bind(inst) {
                Ok(function) => {
                    if let Err(e) = self.callees(&function) {
                        errors.push(e);
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        errors
    }
}
