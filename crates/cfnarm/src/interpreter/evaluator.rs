//! Evaluation of property trees and intrinsic functions.
//!
//! Evaluation is structure preserving: lists and maps keep their shape and
//! only function leaves are replaced by their resolved value. Results are
//! memoized per function node and per referenced entity; the resolution
//! stack detects reference cycles.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::arm;
use crate::interpreter::catalog::{AttributeRule, AttributeTable};
use crate::interpreter::error::compute_suggestions;
use crate::interpreter::memo::{MemoEntry, MemoKey};
use crate::interpreter::stack::{EntityKey, EvalStack};
use crate::interpreter::{EvalError, ResolutionContext};
use crate::template::{
    Function, FunctionKind, MappingEntry, Node, ParameterSpec, RefScope, Resource,
};
use crate::types::{Location, Value};

/// Pseudo parameters every template may reference, and the ARM expression
/// each one becomes.
const PSEUDO_PARAMETERS: &[(&str, &str)] = &[
    ("AWS::Region", "resourceGroup().location"),
    ("AWS::StackName", "deployment().name"),
    ("AWS::AccountId", "subscription().subscriptionId"),
    ("OS::stack_name", "deployment().name"),
    ("OS::project_id", "subscription().subscriptionId"),
];

/// Evaluate a node, replacing every function call by its resolved value.
///
/// # Errors
///
/// Returns an error if:
/// - A reference names an undeclared parameter or resource
/// - An attribute is not exposed by the resource's type
/// - A mapping lookup misses
/// - A `Fn::Join` part or `Fn::Base64` operand has no textual form
/// - A parameter has neither a value nor a default
/// - A reference chain re-enters an entity being resolved
pub(crate) fn eval_node(
    node: &Node,
    ctx: &ResolutionContext<'_>,
    stack: &mut EvalStack,
) -> Result<Value, EvalError> {
    match node {
        Node::Null => Ok(Value::Null),
        Node::Bool(b) => Ok(Value::Bool(*b)),
        Node::Number(n) => Ok(Value::Number(n.clone())),
        Node::String(s) => Ok(Value::String(s.clone())),
        Node::List(items) => items
            .iter()
            .map(|item| eval_node(item, ctx, stack))
            .collect::<Result<_, _>>()
            .map(Value::List),
        Node::Map(map) => map
            .iter()
            .map(|(key, value)| Ok((key.clone(), eval_node(value, ctx, stack)?)))
            .collect::<Result<_, _>>()
            .map(Value::Map),
        Node::Function(function) => eval_function(function, ctx, stack),
    }
}

fn eval_function(
    function: &Function,
    ctx: &ResolutionContext<'_>,
    stack: &mut EvalStack,
) -> Result<Value, EvalError> {
    let key = MemoKey::Node(function.location.clone());
    if let Some(value) = replay_cached(ctx, &key, stack)? {
        return Ok(value);
    }

    let mark = stack.mark();
    let location = &function.location;
    let value = match &function.kind {
        FunctionKind::Ref { name, scope } => resolve_ref(name, *scope, location, ctx, stack)?,
        FunctionKind::GetAttr {
            resource,
            attribute,
        } => resolve_attribute(resource, attribute, location, ctx, stack)?,
        FunctionKind::FindInMap {
            map,
            top_key,
            second_key,
        } => find_in_map(map, top_key, second_key, location, ctx, stack)?,
        FunctionKind::Join { delimiter, parts } => join(delimiter, parts, location, ctx, stack)?,
        FunctionKind::Base64 { inner } => encode_base64(inner, location, ctx, stack)?,
    };

    ctx.remember(
        key,
        MemoEntry {
            value: value.clone(),
            touched: stack.touched_since(mark),
        },
    );
    Ok(value)
}

/// Return a memoized value if present, after checking that the entities it
/// was built from are not being resolved right now.
fn replay_cached(
    ctx: &ResolutionContext<'_>,
    key: &MemoKey,
    stack: &mut EvalStack,
) -> Result<Option<Value>, EvalError> {
    let Some(entry) = ctx.cached(key) else {
        return Ok(None);
    };
    stack.replay(&entry.touched)?;
    log::trace!("memo hit for {key:?}");
    Ok(Some(entry.value))
}

/// Resolve a named entity once, with the entity on the stack.
fn resolve_entity(
    ctx: &ResolutionContext<'_>,
    stack: &mut EvalStack,
    key: MemoKey,
    entity: EntityKey,
    resolve: impl FnOnce(&mut EvalStack) -> Result<Value, EvalError>,
) -> Result<Value, EvalError> {
    if let Some(value) = replay_cached(ctx, &key, stack)? {
        return Ok(value);
    }
    ctx.count_lookup();

    let mark = stack.mark();
    stack.push(entity)?;
    let result = resolve(stack);
    stack.pop();
    let value = result?;

    ctx.remember(
        key,
        MemoEntry {
            value: value.clone(),
            touched: stack.touched_since(mark),
        },
    );
    Ok(value)
}

/// Resolve `Ref`.
///
/// Resolution order:
/// 1. Parameters (declared parameters shadow everything else)
/// 2. Pseudo parameters
/// 3. Resources, through the type's reference rule
///
/// A parameter-scoped reference stops after step 2; a resource-scoped one
/// only performs step 3.
fn resolve_ref(
    name: &str,
    scope: RefScope,
    location: &Location,
    ctx: &ResolutionContext<'_>,
    stack: &mut EvalStack,
) -> Result<Value, EvalError> {
    let template = ctx.template();

    let parameters = scope != RefScope::Resource;
    let resources = scope != RefScope::Parameter;

    if let Some(spec) = template.parameter(name).filter(|_| parameters) {
        return resolve_entity(
            ctx,
            stack,
            MemoKey::Parameter(name.to_string()),
            EntityKey::Parameter(name.to_string()),
            |_| parameter_value(spec, ctx),
        );
    }

    let pseudo = PSEUDO_PARAMETERS.iter().find(|(pseudo, _)| *pseudo == name);
    if let Some((_, expr)) = pseudo.filter(|_| parameters) {
        return Ok(Value::expr(*expr));
    }

    if let Some(resource) = template.resource(name).filter(|_| resources) {
        let rule = ctx
            .catalog()
            .attribute_table(&resource.resource_type)
            .map_or(AttributeRule::LogicalName, AttributeTable::reference);
        return resolve_entity(
            ctx,
            stack,
            MemoKey::Reference(name.to_string()),
            EntityKey::Resource(name.to_string()),
            |stack| apply_rule(rule, resource, ctx, stack),
        );
    }

    let mut available: Vec<String> = Vec::new();
    if parameters {
        available.extend(template.parameters().map(|spec| spec.name.clone()));
    }
    if resources {
        available.extend(template.resources().map(|resource| resource.name.clone()));
    }
    if parameters {
        available.extend(PSEUDO_PARAMETERS.iter().map(|(pseudo, _)| (*pseudo).to_string()));
    }
    Err(EvalError::UnresolvedReference {
        name: name.to_string(),
        location: location.clone(),
        suggestions: compute_suggestions(name, &available),
    })
}

/// The value a parameter reference takes in this run.
fn parameter_value(spec: &ParameterSpec, ctx: &ResolutionContext<'_>) -> Result<Value, EvalError> {
    let options = ctx.options();
    if let Some(value) = options.parameter_override(&spec.name) {
        return Ok(Value::from_json(value));
    }
    if options.passthrough_parameters() {
        return Ok(Value::expr(arm::parameters(&spec.name)));
    }
    spec.default
        .as_ref()
        .map(Value::from_json)
        .ok_or_else(|| EvalError::MissingParameterValue {
            name: spec.name.clone(),
        })
}

/// Resolve `Fn::GetAtt`.
fn resolve_attribute(
    resource_name: &str,
    attribute: &str,
    location: &Location,
    ctx: &ResolutionContext<'_>,
    stack: &mut EvalStack,
) -> Result<Value, EvalError> {
    let template = ctx.template();
    let Some(resource) = template.resource(resource_name) else {
        let available: Vec<&str> = template.resources().map(|r| r.name.as_str()).collect();
        return Err(EvalError::UnresolvedReference {
            name: resource_name.to_string(),
            location: location.clone(),
            suggestions: compute_suggestions(resource_name, &available),
        });
    };

    let table = ctx.catalog().attribute_table(&resource.resource_type);
    let Some(rule) = table.and_then(|t| t.get(attribute)) else {
        return Err(EvalError::UnknownAttribute {
            resource: resource_name.to_string(),
            resource_type: resource.resource_type.clone(),
            attribute: attribute.to_string(),
            location: location.clone(),
            available: table.map(AttributeTable::names).unwrap_or_default(),
        });
    };

    resolve_entity(
        ctx,
        stack,
        MemoKey::Attribute {
            resource: resource_name.to_string(),
            attribute: attribute.to_string(),
        },
        EntityKey::Resource(resource_name.to_string()),
        |stack| apply_rule(rule, resource, ctx, stack),
    )
}

fn apply_rule(
    rule: AttributeRule,
    resource: &Resource,
    ctx: &ResolutionContext<'_>,
    stack: &mut EvalStack,
) -> Result<Value, EvalError> {
    match rule {
        AttributeRule::LogicalName => Ok(Value::String(resource.name.clone())),
        AttributeRule::Literal(text) => Ok(Value::from(text)),
        AttributeRule::Property(key) => resource
            .property(key)
            .map_or(Ok(Value::Null), |node| eval_node(node, ctx, stack)),
        AttributeRule::Expression(build) => Ok(Value::expr(build(&resource.name))),
        AttributeRule::Resolve(build) => Ok(Value::expr(build(resource, ctx))),
    }
}

/// Resolve `Fn::FindInMap`. Both keys are evaluated before the lookup and
/// must resolve to literals.
fn find_in_map(
    map: &str,
    top_key: &Node,
    second_key: &Node,
    location: &Location,
    ctx: &ResolutionContext<'_>,
    stack: &mut EvalStack,
) -> Result<Value, EvalError> {
    let top = eval_node(top_key, ctx, stack)?;
    let second = eval_node(second_key, ctx, stack)?;
    let missing = || EvalError::MissingMappingKey {
        map: map.to_string(),
        keys: vec![top.to_string(), second.to_string()],
        location: location.clone(),
    };
    let (Some(top_text), Some(second_text)) = (top.to_text(), second.to_text()) else {
        return Err(missing());
    };

    stack.push(EntityKey::Mapping(map.to_string()))?;
    let found = ctx
        .template()
        .mapping(map)
        .and_then(|mapping| mapping.get(&top_text))
        .and_then(|entry| match entry {
            MappingEntry::Table(table) => table.get(&second_text),
            MappingEntry::Scalar(_) => None,
        })
        .map(Value::from_json);
    stack.pop();

    found.ok_or_else(missing)
}

/// Resolve `Fn::Join`.
///
/// When every part is a literal the result is a literal; otherwise the
/// result is an ARM `concat(...)` expression in which adjacent literal text
/// is merged into one quoted operand.
fn join(
    delimiter: &str,
    parts: &[Node],
    location: &Location,
    ctx: &ResolutionContext<'_>,
    stack: &mut EvalStack,
) -> Result<Value, EvalError> {
    let mut operands: Vec<String> = Vec::new();
    let mut literal = String::new();
    let mut has_expr = false;

    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            literal.push_str(delimiter);
        }
        match eval_node(part, ctx, stack)? {
            Value::Expr(body) => {
                has_expr = true;
                if !literal.is_empty() {
                    operands.push(arm::quote(&literal));
                    literal.clear();
                }
                operands.push(body);
            }
            value => match value.to_text() {
                Some(text) => literal.push_str(&text),
                None => {
                    return Err(EvalError::InvalidJoinOperand {
                        location: location.clone(),
                        index,
                        found: value.kind(),
                    });
                }
            },
        }
    }

    if !has_expr {
        return Ok(Value::String(literal));
    }
    if !literal.is_empty() {
        operands.push(arm::quote(&literal));
    }
    match operands.as_slice() {
        [only] => Ok(Value::expr(only.clone())),
        _ => Ok(Value::expr(arm::concat(&operands))),
    }
}

/// Resolve `Fn::Base64` with the standard alphabet.
fn encode_base64(
    inner: &Node,
    location: &Location,
    ctx: &ResolutionContext<'_>,
    stack: &mut EvalStack,
) -> Result<Value, EvalError> {
    match eval_node(inner, ctx, stack)? {
        Value::String(s) => Ok(Value::String(STANDARD.encode(s))),
        Value::Expr(body) => Ok(Value::expr(arm::base64(&body))),
        other => Err(EvalError::InvalidBase64Operand {
            location: location.clone(),
            found: other.kind(),
        }),
    }
}
