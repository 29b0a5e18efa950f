//! Behavior signatures: lightweight fingerprints of a block's control flow,
//! data flow, calls, and types.

use std::collections::BTreeSet;

use crate::core::similarity::{bag_jaccard, lcs_similarity, set_jaccard};
use crate::lang::structure::{ControlFlowKind, SyntacticEvent};

/// How a name participates in a block's data flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataFlowPattern {
    DefineAndUse,
    DefineOnly,
    ParameterUse,
    UseOnly,
}

/// The extracted fingerprint of one block.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorSignature {
    pub control_flow_shape: Vec<ControlFlowKind>,
    pub data_flow_patterns: Vec<DataFlowPattern>,
    pub called_functions: BTreeSet<String>,
    pub type_signatures: BTreeSet<String>,
}

/// Fold a block's event stream into a [`BehaviorSignature`].
pub fn extract_signature(events: &[SyntacticEvent]) -> BehaviorSignature {
    let mut control_flow_shape = Vec::new();
    let mut called_functions = BTreeSet::new();
    let mut defined_variables = BTreeSet::new();
    let mut used_variables = BTreeSet::new();
    let mut parameter_names = BTreeSet::new();
    let mut type_signatures = BTreeSet::new();

    for event in events {
        match event {
            SyntacticEvent::ControlFlow { kind, .. } => control_flow_shape.push(*kind),
            SyntacticEvent::Call { callee } => {
                called_functions.insert(callee.clone());
            }
            SyntacticEvent::Binding { name, .. } => {
                defined_variables.insert(name.clone());
            }
            SyntacticEvent::Reference { name } => {
                used_variables.insert(name.clone());
            }
            SyntacticEvent::Parameter { name, type_name } => {
                parameter_names.insert(name.clone());

                if let Some(type_name) = type_name {
                    type_signatures.insert(type_name.clone());
                }
            }
            SyntacticEvent::TypeAnnotation { name } => {
                type_signatures.insert(name.clone());
            }
            SyntacticEvent::Literal { .. } => {}
        }
    }

    let data_flow_patterns =
        compute_data_flow_patterns(&defined_variables, &used_variables, &parameter_names);

    BehaviorSignature {
        control_flow_shape,
        data_flow_patterns,
        called_functions,
        type_signatures,
    }
}

fn compute_data_flow_patterns(
    defined: &BTreeSet<String>,
    used: &BTreeSet<String>,
    parameters: &BTreeSet<String>,
) -> Vec<DataFlowPattern> {
    let mut patterns = Vec::new();

    for variable in defined {
        if used.contains(variable) {
            patterns.push(DataFlowPattern::DefineAndUse);
        } else {
            patterns.push(DataFlowPattern::DefineOnly);
        }
    }

    for variable in used {
        if defined.contains(variable) {
            continue;
        }

        if parameters.contains(variable) {
            patterns.push(DataFlowPattern::ParameterUse);
        } else {
            patterns.push(DataFlowPattern::UseOnly);
        }
    }

    patterns.sort();
    patterns
}

/// Weighted behavior-signature similarity.
///
/// Control-flow LCS dominates, then data-flow bags, then the called-function
/// and type sets.
pub fn signature_similarity(signature_a: &BehaviorSignature, signature_b: &BehaviorSignature) -> f64 {
    let control_flow = lcs_similarity(
        &signature_a.control_flow_shape,
        &signature_b.control_flow_shape,
    );
    let data_flow = bag_jaccard(
        &signature_a.data_flow_patterns,
        &signature_b.data_flow_patterns,
    );
    let called = set_jaccard(&signature_a.called_functions, &signature_b.called_functions);
    let types = set_jaccard(&signature_a.type_signatures, &signature_b.type_signatures);

    0.4 * control_flow + 0.3 * data_flow + 0.2 * called + 0.1 * types
}
