use inkwell::values::BasicValueEnum;

use crate::{
    compiler::compiler::Compiler,
    errors::errors::{Error, ErrorImpl},
};

use super::{
    ast::{AggregateNode, AssignableNode, MultiAssignableNode, Node, NodeType},
    expressions::lower_value,
};

/// Ordered list of nodes, lowered left to right.
#[derive(Debug, Default)]
pub struct NodeList {
    nodes: Vec<Box<dyn Node>>,
}

impl NodeList {
    pub fn new() -> Self {
        NodeList { nodes: vec![] }
    }

    pub fn push(&mut self, node: Box<dyn Node>) {
        self.nodes.push(node);
    }

    /// Lowers every node in order, keeping the nodes that produce no value as `None`.
    pub fn lower_each<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Vec<Option<BasicValueEnum<'ctx>>>, Error> {
        let mut values = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.iter() {
            values.push(node.lower(compiler)?);
        }
        Ok(values)
    }
}

impl From<Vec<Box<dyn Node>>> for NodeList {
    fn from(nodes: Vec<Box<dyn Node>>) -> Self {
        NodeList { nodes }
    }
}

impl AggregateNode for NodeList {
    /// Every node must produce a value.
    fn lower_values<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
    ) -> Result<Vec<BasicValueEnum<'ctx>>, Error> {
        let mut values = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.iter() {
            values.push(lower_value(node.as_ref(), compiler)?);
        }
        Ok(values)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// List of independent assignment targets, `(a, b, c) = ...`.
///
/// Takes exactly one value per target.
#[derive(Debug, Default)]
pub struct AssignableListNode {
    targets: Vec<Box<dyn AssignableNode>>,
}

impl AssignableListNode {
    pub fn new() -> Self {
        AssignableListNode { targets: vec![] }
    }

    pub fn push(&mut self, target: Box<dyn AssignableNode>) {
        self.targets.push(target);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl From<Vec<Box<dyn AssignableNode>>> for AssignableListNode {
    fn from(targets: Vec<Box<dyn AssignableNode>>) -> Self {
        AssignableListNode { targets }
    }
}

impl MultiAssignableNode for AssignableListNode {
    fn multi_assign<'ctx>(
        &self,
        compiler: &mut Compiler<'ctx>,
        values: Vec<BasicValueEnum<'ctx>>,
    ) -> Result<(), Error> {
        if values.len() != self.targets.len() {
            return Err(Error::new(
                ErrorImpl::ArityMismatch {
                    expected: self.targets.len(),
                    received: values.len(),
                },
                NodeType::AssignableList,
            ));
        }

        for (target, value) in self.targets.iter().zip(values) {
            target.assign(compiler, value)?;
        }

        Ok(())
    }
}
