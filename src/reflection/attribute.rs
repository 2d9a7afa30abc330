use crate::compiler::{CompilerContext, Value, compile};
use crate::error::{ReflectionError, Result};
use crate::parser::ast::{Attribute, AttributeGroup};
use bitflags::bitflags;
use indexmap::IndexMap;
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

bitflags! {
    /// `Attribute::TARGET_*` values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttributeTarget: u32 {
        const CLASS = 1;
        const FUNCTION = 2;
        const METHOD = 4;
        const PROPERTY = 8;
        const CLASS_CONSTANT = 16;
        const PARAMETER = 32;
        const ALL = 63;
    }
}

/// `Attribute::IS_REPEATABLE`.
pub const IS_REPEATABLE: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgumentKey {
    Position(usize),
    Name(String),
}

impl fmt::Display for ArgumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentKey::Position(i) => write!(f, "{i}"),
            ArgumentKey::Name(name) => f.write_str(name),
        }
    }
}

pub struct ReflectionAttribute {
    node: Attribute,
    target: AttributeTarget,
    is_repeated: bool,
    context: CompilerContext,
    arguments: OnceCell<Result<IndexMap<ArgumentKey, Value>>>,
}

impl fmt::Debug for ReflectionAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionAttribute")
            .field("name", &self.node.name.resolved)
            .field("target", &self.target)
            .field("is_repeated", &self.is_repeated)
            .finish()
    }
}

impl ReflectionAttribute {
    pub fn get_name(&self) -> &str {
        &self.node.name.resolved
    }

    pub fn get_target(&self) -> AttributeTarget {
        self.target
    }

    /// Whether the same attribute appears more than once on its owner.
    pub fn is_repeated(&self) -> bool {
        self.is_repeated
    }

    /// Arguments keyed by position, or by name for named arguments.
    /// Compiled on first access.
    pub fn get_arguments(&self) -> Result<IndexMap<ArgumentKey, Value>> {
        self.arguments
            .get_or_init(|| {
                let mut arguments = IndexMap::new();
                for (position, arg) in self.node.args.iter().enumerate() {
                    let value = compile(&arg.value, &self.context)?.value;
                    let key = match &arg.name {
                        Some(name) => ArgumentKey::Name(name.name.clone()),
                        None => ArgumentKey::Position(position),
                    };
                    arguments.insert(key, value);
                }
                Ok(arguments)
            })
            .clone()
    }

    pub fn new_instance(&self) -> Result<()> {
        Err(ReflectionError::NotImplemented(
            "instantiating an attribute requires executing code",
        ))
    }

    pub fn get_start_line(&self) -> Option<usize> {
        self.context
            .source()
            .map(|source| source.lines(self.node.span).0)
    }
}

/// Builds the attribute reflections declared by `groups` on one owner.
pub(crate) fn from_groups(
    groups: &[AttributeGroup],
    target: AttributeTarget,
    context: &CompilerContext,
) -> Vec<Rc<ReflectionAttribute>> {
    let all: Vec<&Attribute> = groups.iter().flat_map(|g| &g.attributes).collect();
    all.iter()
        .map(|attribute| {
            let lower = attribute.name.lowercase_resolved();
            let count = all
                .iter()
                .filter(|other| other.name.lowercase_resolved() == lower)
                .count();
            Rc::new(ReflectionAttribute {
                node: (*attribute).clone(),
                target,
                is_repeated: count > 1,
                context: context.clone(),
                arguments: OnceCell::new(),
            })
        })
        .collect()
}

pub(crate) fn by_name(
    attributes: &[Rc<ReflectionAttribute>],
    name: &str,
) -> Vec<Rc<ReflectionAttribute>> {
    let name = name.trim_start_matches('\\');
    attributes
        .iter()
        .filter(|attribute| attribute.get_name().eq_ignore_ascii_case(name))
        .cloned()
        .collect()
}

/// Attributes whose class is `class_name` or extends / implements it.
/// Attribute classes that cannot be located only match by name.
pub(crate) fn by_instance(
    attributes: &[Rc<ReflectionAttribute>],
    class_name: &str,
) -> Result<Vec<Rc<ReflectionAttribute>>> {
    let class_name = class_name.trim_start_matches('\\');
    let mut matching = Vec::new();
    for attribute in attributes {
        let matches = attribute.get_name().eq_ignore_ascii_case(class_name)
            || match attribute
                .context
                .reflector()
                .try_reflect_class(attribute.get_name())?
            {
                Some(class) => class.is_subclass_of(class_name)?,
                None => false,
            };
        if matches {
            matching.push(attribute.clone());
        }
    }
    Ok(matching)
}
