// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Value binding and dependency ordering.
//!
//! Binding runs two deterministic passes over the registered functions —
//! indexing every output by value id, then linking every argument and hook
//! to its producer with a runtime type check. Ordering is a depth-first
//! post-order traversal driven by an explicit frame stack, so cycle
//! diagnostics can replay the exact traversal state and stack depth stays
//! bounded regardless of graph shape.

use std::collections::HashMap;

use tracing::{Level, event};

use crate::error::{CyclePath, CycleStep, Error, ReferenceKind};
use crate::program::{Binding, FunctionDesc, HookRef, ResultRef};
use crate::slot::TypeInfo;

/// Links every argument and hook to the output producing its value id.
///
/// Derived state from a previous resolution (bindings and recorded hook
/// lists) is discarded first, so repeated calls are deterministic.
pub(crate) fn bind<Cx>(functions: &mut [FunctionDesc<Cx>]) -> Result<(), Error> {
    for function in functions.iter_mut() {
        for argument in &mut function.arguments {
            argument.binding = None;
        }
        for output in &mut function.outputs {
            output.hooks.clear();
        }
        for hook in &mut function.hooks {
            hook.binding = None;
        }
    }

    let producers = index_outputs(functions)?;
    link_consumers(functions, &producers)
}

/// Indexes every output by value id, rejecting duplicates.
fn index_outputs<Cx>(functions: &[FunctionDesc<Cx>]) -> Result<HashMap<String, ResultRef>, Error> {
    let mut producers: HashMap<String, ResultRef> = HashMap::new();
    for (function_index, function) in functions.iter().enumerate() {
        for (output_index, output) in function.outputs.iter().enumerate() {
            if let Some(existing) = producers.get(&output.value_id) {
                return Err(Error::ValueAlreadyExists {
                    tag1: function.tag.clone(),
                    tag2: functions[existing.function].tag.clone(),
                    value_id: output.value_id.clone(),
                });
            }
            producers.insert(
                output.value_id.clone(),
                ResultRef {
                    function: function_index,
                    output: output_index,
                },
            );
        }
    }
    Ok(producers)
}

fn link_consumers<Cx>(
    functions: &mut [FunctionDesc<Cx>],
    producers: &HashMap<String, ResultRef>,
) -> Result<(), Error> {
    let mut bound = 0_usize;
    for function_index in 0..functions.len() {
        for argument_index in 0..functions[function_index].arguments.len() {
            let argument = &functions[function_index].arguments[argument_index];
            let Some(&producer) = producers.get(&argument.value_id) else {
                if argument.optional {
                    continue;
                }
                return Err(Error::ValueNotFound {
                    tag: functions[function_index].tag.clone(),
                    value_id: argument.value_id.clone(),
                });
            };
            let by_alias = classify(
                functions,
                argument.target.value_type(),
                producer,
                function_index,
                &argument.value_id,
            )?;
            functions[function_index].arguments[argument_index].binding =
                Some(Binding { producer, by_alias });
            bound += 1;
        }

        for hook_index in 0..functions[function_index].hooks.len() {
            let hook = &functions[function_index].hooks[hook_index];
            let Some(&producer) = producers.get(&hook.value_id) else {
                return Err(Error::ValueNotFound {
                    tag: functions[function_index].tag.clone(),
                    value_id: hook.value_id.clone(),
                });
            };
            let by_alias = classify(
                functions,
                hook.target.value_type(),
                producer,
                function_index,
                &hook.value_id,
            )?;
            functions[function_index].hooks[hook_index].binding =
                Some(Binding { producer, by_alias });
            functions[producer.function].outputs[producer.output]
                .hooks
                .push(HookRef {
                    function: function_index,
                    hook: hook_index,
                });
            bound += 1;
        }
    }
    event!(Level::TRACE, bound, "values bound");
    Ok(())
}

/// Decides copy vs. address semantics for a resolved link, or rejects it.
fn classify<Cx>(
    functions: &[FunctionDesc<Cx>],
    consumer: TypeInfo,
    producer: ResultRef,
    consumer_index: usize,
    value_id: &str,
) -> Result<bool, Error> {
    let source = &functions[producer.function].outputs[producer.output].source;
    if consumer.id == source.value_type().id {
        return Ok(false);
    }
    if consumer.id == source.alias_type() {
        return Ok(true);
    }
    Err(Error::ValueTypeMismatch {
        tag1: functions[consumer_index].tag.clone(),
        tag2: functions[producer.function].tag.clone(),
        value_id: value_id.to_string(),
        in_value_type: consumer.name,
        out_value_type: source.value_type().name,
    })
}

/// One dependency edge: the function at `dependency` must run first.
struct Edge {
    dependency: usize,
    kind: ReferenceKind,
    value_id: String,
}

/// A traversal frame: a function and a cursor over its outgoing edges.
struct Frame {
    function: usize,
    edges: Vec<Edge>,
    next: usize,
}

/// Computes an execution order via iterative depth-first post-order.
///
/// Roots are visited in registration order and edges in declaration order,
/// which keeps the order stable for unconstrained functions. A dependency
/// found on the active stack is a cycle; the returned path replays every
/// frame of the traversal down to the repeated function.
pub(crate) fn sort<Cx>(functions: &[FunctionDesc<Cx>]) -> Result<Vec<usize>, Error> {
    let count = functions.len();
    let mut order = Vec::with_capacity(count);
    let mut visited = vec![false; count];
    let mut on_stack = vec![false; count];
    let mut stack: Vec<Frame> = Vec::new();

    for root in 0..count {
        if visited[root] {
            continue;
        }
        on_stack[root] = true;
        stack.push(Frame {
            function: root,
            edges: edges_of(functions, root),
            next: 0,
        });

        while let Some(frame) = stack.last_mut() {
            if frame.next >= frame.edges.len() {
                visited[frame.function] = true;
                on_stack[frame.function] = false;
                order.push(frame.function);
                stack.pop();
                continue;
            }
            let edge_index = frame.next;
            frame.next += 1;
            let dependency = frame.edges[edge_index].dependency;
            if visited[dependency] {
                continue;
            }
            if on_stack[dependency] {
                return Err(Error::CircularDependencies {
                    path: cycle_path(&stack, functions, dependency),
                });
            }
            on_stack[dependency] = true;
            stack.push(Frame {
                function: dependency,
                edges: edges_of(functions, dependency),
                next: 0,
            });
        }
    }

    event!(Level::TRACE, ?order, "functions ordered");
    Ok(order)
}

/// Enumerates the outgoing edges of `index`: bound arguments first, then
/// hooks recorded on its own outputs, both in declaration order.
fn edges_of<Cx>(functions: &[FunctionDesc<Cx>], index: usize) -> Vec<Edge> {
    let function = &functions[index];
    let mut edges = Vec::new();
    for argument in &function.arguments {
        if let Some(binding) = &argument.binding {
            edges.push(Edge {
                dependency: binding.producer.function,
                kind: ReferenceKind::Argument,
                value_id: argument.value_id.clone(),
            });
        }
    }
    for output in &function.outputs {
        for hook_ref in &output.hooks {
            edges.push(Edge {
                dependency: hook_ref.function,
                kind: ReferenceKind::Hook,
                value_id: output.value_id.clone(),
            });
        }
    }
    edges
}

/// Renders the active traversal stack, ending at the repeated function.
///
/// Every frame on the stack has advanced past the edge it is currently
/// exploring, so `next - 1` is the reference that led to the frame above —
/// or, for the top frame, to the repeated function itself.
fn cycle_path<Cx>(stack: &[Frame], functions: &[FunctionDesc<Cx>], repeated: usize) -> CyclePath {
    let mut steps = Vec::with_capacity(stack.len() + 1);
    for frame in stack {
        let edge = &frame.edges[frame.next - 1];
        steps.push(CycleStep::new(
            functions[frame.function].tag.clone(),
            edge.kind,
            edge.value_id.clone(),
        ));
    }
    steps.push(CycleStep::terminal(functions[repeated].tag.clone()));
    CyclePath::new(steps)
}
