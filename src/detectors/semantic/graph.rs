//! Abstract semantic graphs: a block's operations and their control/data
//! dependencies, reduced to a small labeled graph.
//!
//! The builder encodes the equivalence rules that make Type-4 detection
//! work: guards and negated early-return ifs collapse to the same shape,
//! `for` loops and `forEach` calls both become loop nodes, and the
//! collection-transform idioms become collection operations instead of
//! generic calls.

use ahash::AHashMap;

use crate::core::similarity::{bag_jaccard, lcs_similarity};
use crate::lang::structure::{ControlFlowKind, SyntacticEvent};

/// Semantic operation classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticNodeKind {
    Assignment,
    FunctionCall,
    ReturnValue,
    Conditional,
    Loop,
    GuardExit,
    ErrorHandling,
    CollectionOperation,
    OptionalUnwrap,
    ParameterInput,
    LiteralValue,
}

/// Edge classes: sequential control flow and name-based data flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticEdgeKind {
    ControlFlow,
    DataFlow,
}

/// One node; ids are assigned in document order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticNode {
    pub id: usize,
    pub kind: SemanticNodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticEdge {
    pub from: usize,
    pub to: usize,
    pub kind: SemanticEdgeKind,
}

/// The graph for one block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AbstractSemanticGraph {
    pub nodes: Vec<SemanticNode>,
    pub edges: Vec<SemanticEdge>,
}

const COLLECTION_OPERATIONS: &[&str] = &[
    "map",
    "flatMap",
    "compactMap",
    "filter",
    "reduce",
    "sorted",
    "sort",
    "contains",
    "first",
    "last",
    "prefix",
    "suffix",
    "dropFirst",
    "dropLast",
];

// Explicit arena: nodes grow with a monotonically increasing id, no hidden
// counter state.
struct GraphBuilder {
    nodes: Vec<SemanticNode>,
    edges: Vec<SemanticEdge>,
    defined_variable_nodes: AHashMap<String, usize>,
}

impl GraphBuilder {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            defined_variable_nodes: AHashMap::new(),
        }
    }

    fn add_node(&mut self, kind: SemanticNodeKind) -> usize {
        let id = self.nodes.len();
        self.nodes.push(SemanticNode { id, kind });
        id
    }

    fn add_edge(&mut self, from: usize, to: usize, kind: SemanticEdgeKind) {
        self.edges.push(SemanticEdge { from, to, kind });
    }

    fn consume(&mut self, event: &SyntacticEvent) {
        match event {
            SyntacticEvent::ControlFlow {
                kind,
                has_optional_binding,
                negated_condition,
                body_exits,
            } => self.consume_control_flow(*kind, *has_optional_binding, *negated_condition, *body_exits),

            SyntacticEvent::Call { callee } => {
                if callee == "forEach" {
                    self.add_node(SemanticNodeKind::Loop);
                } else if COLLECTION_OPERATIONS.contains(&callee.as_str()) {
                    self.add_node(SemanticNodeKind::CollectionOperation);
                } else {
                    self.add_node(SemanticNodeKind::FunctionCall);
                }
            }

            SyntacticEvent::Binding {
                name,
                literal_initializer,
            } => {
                let assignment_id = self.add_node(SemanticNodeKind::Assignment);
                self.defined_variable_nodes.insert(name.clone(), assignment_id);

                if *literal_initializer {
                    let literal_id = self.add_node(SemanticNodeKind::LiteralValue);
                    self.add_edge(literal_id, assignment_id, SemanticEdgeKind::DataFlow);
                }
            }

            SyntacticEvent::Reference { name } => {
                if let Some(&source_id) = self.defined_variable_nodes.get(name) {
                    let current_id = self.nodes.len().saturating_sub(1);

                    if current_id != source_id {
                        self.add_edge(source_id, current_id, SemanticEdgeKind::DataFlow);
                    }
                }
            }

            SyntacticEvent::Parameter { .. } => {
                self.add_node(SemanticNodeKind::ParameterInput);
            }

            SyntacticEvent::TypeAnnotation { .. } => {}

            SyntacticEvent::Literal { part_of_binding } => {
                if !part_of_binding {
                    self.add_node(SemanticNodeKind::LiteralValue);
                }
            }
        }
    }

    fn consume_control_flow(
        &mut self,
        kind: ControlFlowKind,
        has_optional_binding: bool,
        negated_condition: bool,
        body_exits: bool,
    ) {
        match kind {
            ControlFlowKind::Guard => {
                let conditional_id = self.add_node(SemanticNodeKind::Conditional);

                if body_exits {
                    let exit_id = self.add_node(SemanticNodeKind::GuardExit);
                    self.add_edge(conditional_id, exit_id, SemanticEdgeKind::ControlFlow);
                }

                if has_optional_binding {
                    let unwrap_id = self.add_node(SemanticNodeKind::OptionalUnwrap);
                    self.add_edge(conditional_id, unwrap_id, SemanticEdgeKind::ControlFlow);
                }
            }

            ControlFlowKind::If => {
                // an optional-binding `if` is an unwrap, not a plain branch
                if has_optional_binding {
                    self.add_node(SemanticNodeKind::OptionalUnwrap);
                    return;
                }

                let conditional_id = self.add_node(SemanticNodeKind::Conditional);

                // negated early-return `if` is guard-equivalent
                if negated_condition && body_exits {
                    let exit_id = self.add_node(SemanticNodeKind::GuardExit);
                    self.add_edge(conditional_id, exit_id, SemanticEdgeKind::ControlFlow);
                }
            }

            ControlFlowKind::Switch => {
                self.add_node(SemanticNodeKind::Conditional);
            }

            ControlFlowKind::ForLoop | ControlFlowKind::WhileLoop | ControlFlowKind::RepeatLoop => {
                self.add_node(SemanticNodeKind::Loop);
            }

            ControlFlowKind::DoCatch | ControlFlowKind::Throw => {
                self.add_node(SemanticNodeKind::ErrorHandling);
            }

            ControlFlowKind::Return => {
                self.add_node(SemanticNodeKind::ReturnValue);
            }

            ControlFlowKind::Break | ControlFlowKind::Continue => {}
        }
    }

    // Chain consecutive nodes with control-flow edges, skipping any edge the
    // build already produced.
    fn finish(mut self) -> AbstractSemanticGraph {
        if self.nodes.len() > 1 {
            let mut sequence_edges = Vec::new();

            for index in 0..self.nodes.len() - 1 {
                let candidate = SemanticEdge {
                    from: self.nodes[index].id,
                    to: self.nodes[index + 1].id,
                    kind: SemanticEdgeKind::ControlFlow,
                };

                let already_present = self.edges.iter().any(|existing| *existing == candidate);

                if !already_present {
                    sequence_edges.push(candidate);
                }
            }

            self.edges.extend(sequence_edges);
        }

        AbstractSemanticGraph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

/// Build the abstract semantic graph for a block's event stream.
pub fn build_graph(events: &[SyntacticEvent]) -> AbstractSemanticGraph {
    let mut builder = GraphBuilder::new();

    for event in events {
        builder.consume(event);
    }

    builder.finish()
}

/// Weighted graph similarity: node-kind bags dominate, edge-kind sequences
/// refine. Two empty graphs are identical; one empty graph matches nothing.
pub fn graph_similarity(graph_a: &AbstractSemanticGraph, graph_b: &AbstractSemanticGraph) -> f64 {
    if graph_a.nodes.is_empty() && graph_b.nodes.is_empty() {
        return 1.0;
    }

    if graph_a.nodes.is_empty() || graph_b.nodes.is_empty() {
        return 0.0;
    }

    let kinds_a: Vec<SemanticNodeKind> = graph_a.nodes.iter().map(|node| node.kind).collect();
    let kinds_b: Vec<SemanticNodeKind> = graph_b.nodes.iter().map(|node| node.kind).collect();
    let node_similarity = bag_jaccard(&kinds_a, &kinds_b);

    let edge_kinds_a: Vec<SemanticEdgeKind> = graph_a.edges.iter().map(|edge| edge.kind).collect();
    let edge_kinds_b: Vec<SemanticEdgeKind> = graph_b.edges.iter().map(|edge| edge.kind).collect();
    let edge_similarity = lcs_similarity(&edge_kinds_a, &edge_kinds_b);

    0.6 * node_similarity + 0.4 * edge_similarity
}
