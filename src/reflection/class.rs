//! Reflection of classes, interfaces, traits and enums.
//!
//! Every merged view (methods, properties, constants, interfaces) is built on
//! first access from the immediate declarations plus the views of the parent
//! class, used traits and implemented interfaces, then kept for the lifetime
//! of the object.

use super::attribute::{self, AttributeTarget, ReflectionAttribute};
use super::class_constant::ReflectionClassConstant;
use super::enum_case::ReflectionEnumCase;
use super::enum_synthesis::{self, SyntheticMembers};
use super::function::ReflectionFunctionAbstract;
use super::method::{MethodOrigin, ReflectionMethod};
use super::modifiers::{ClassModifiers, MemberModifiers};
use super::property::{PropertyOrigin, ReflectionProperty};
use super::trait_adaptations::{TraitAdaptations, method_hash};
use super::types::{ReflectionNamedType, ReflectionType};
use super::{ClassHandle, doc_is_deprecated, guarded_memo};
use crate::compiler::{CompilerContext, Value};
use crate::error::{ReflectionError, Result};
use crate::locator::LocatedSource;
use crate::parser::ast::{ClassLikeDecl, ClassLikeKind, ClassMember, Modifier, Name};
use crate::reflector::Reflector;
use indexmap::IndexMap;
use std::cell::OnceCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Table<T> = Rc<IndexMap<String, Rc<T>>>;

/// PHP versions from 8.0 on make every class with `__toString()`
/// implement `Stringable`.
const STRINGABLE_SINCE: u32 = 80000;

pub struct ReflectionClass {
    this: Weak<ReflectionClass>,
    reflector: Reflector,
    source: Rc<LocatedSource>,
    decl: Rc<ClassLikeDecl>,
    parent: OnceCell<Result<Option<Rc<ReflectionClass>>>>,
    traits: OnceCell<Result<Vec<Rc<ReflectionClass>>>>,
    trait_tables: OnceCell<Result<Rc<TraitAdaptations>>>,
    immediate_interfaces: OnceCell<Result<Table<ReflectionClass>>>,
    interfaces: OnceCell<Result<Table<ReflectionClass>>>,
    immediate_methods: OnceCell<Table<ReflectionMethod>>,
    methods: OnceCell<Result<Table<ReflectionMethod>>>,
    immediate_properties: OnceCell<Table<ReflectionProperty>>,
    properties: OnceCell<Result<Table<ReflectionProperty>>>,
    immediate_constants: OnceCell<Table<ReflectionClassConstant>>,
    constants: OnceCell<Result<Table<ReflectionClassConstant>>>,
    cases: OnceCell<Table<ReflectionEnumCase>>,
    attributes: OnceCell<Vec<Rc<ReflectionAttribute>>>,
}

impl fmt::Debug for ReflectionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionClass")
            .field("name", &self.decl.fqn)
            .field("kind", &self.decl.kind)
            .field("file", &self.source.file_name())
            .finish()
    }
}

impl ReflectionClass {
    pub(crate) fn new(
        reflector: &Reflector,
        source: Rc<LocatedSource>,
        decl: Rc<ClassLikeDecl>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| ReflectionClass {
            this: this.clone(),
            reflector: reflector.clone(),
            source,
            decl,
            parent: OnceCell::new(),
            traits: OnceCell::new(),
            trait_tables: OnceCell::new(),
            immediate_interfaces: OnceCell::new(),
            interfaces: OnceCell::new(),
            immediate_methods: OnceCell::new(),
            methods: OnceCell::new(),
            immediate_properties: OnceCell::new(),
            properties: OnceCell::new(),
            immediate_constants: OnceCell::new(),
            constants: OnceCell::new(),
            cases: OnceCell::new(),
            attributes: OnceCell::new(),
        })
    }

    fn handle(&self) -> ClassHandle {
        ClassHandle::new(self.decl.fqn.clone(), self.this.clone())
    }

    fn context(&self) -> CompilerContext {
        CompilerContext::new(self.reflector.clone())
            .with_source(self.source.clone())
            .with_namespace(self.decl.namespace.clone())
            .with_class(self.handle())
    }

    // Identity

    pub fn get_name(&self) -> &str {
        &self.decl.fqn
    }

    pub fn get_short_name(&self) -> &str {
        &self.decl.name.name
    }

    pub fn get_namespace_name(&self) -> &str {
        self.decl.namespace.as_deref().unwrap_or_default()
    }

    pub fn in_namespace(&self) -> bool {
        self.decl.namespace.is_some()
    }

    pub fn get_kind(&self) -> ClassLikeKind {
        self.decl.kind
    }

    pub fn is_interface(&self) -> bool {
        self.decl.kind == ClassLikeKind::Interface
    }

    pub fn is_trait(&self) -> bool {
        self.decl.kind == ClassLikeKind::Trait
    }

    pub fn is_enum(&self) -> bool {
        self.decl.kind == ClassLikeKind::Enum
    }

    pub fn is_backed_enum(&self) -> bool {
        self.is_enum() && self.decl.backing_type.is_some()
    }

    pub fn get_backing_type(&self) -> Option<ReflectionNamedType> {
        let node = self.decl.backing_type.as_ref().filter(|_| self.is_enum())?;
        ReflectionType::create_from_node(&self.reflector, Some(&self.handle()), node, false)
            .as_named()
            .cloned()
    }

    fn backing_type_name(&self) -> Option<String> {
        self.get_backing_type().map(|ty| ty.get_name().to_string())
    }

    pub fn is_internal(&self) -> bool {
        self.source.is_internal()
    }

    pub fn is_user_defined(&self) -> bool {
        !self.source.is_internal()
    }

    pub fn get_extension_name(&self) -> Option<&str> {
        self.source.extension_name()
    }

    pub fn get_file_name(&self) -> Option<&str> {
        self.source.file_name()
    }

    pub fn get_located_source(&self) -> &Rc<LocatedSource> {
        &self.source
    }

    pub fn get_start_line(&self) -> usize {
        self.source.lines(self.decl.span).0
    }

    pub fn get_end_line(&self) -> usize {
        self.source.lines(self.decl.span).1
    }

    pub fn get_start_column(&self) -> usize {
        self.source.columns(self.decl.span).0
    }

    pub fn get_end_column(&self) -> usize {
        self.source.columns(self.decl.span).1
    }

    pub fn get_doc_comment(&self) -> Option<&str> {
        self.decl.doc_comment.as_ref().map(|doc| doc.text.as_str())
    }

    pub fn is_deprecated(&self) -> bool {
        doc_is_deprecated(self.get_doc_comment())
    }

    // Modifiers

    /// `abstract` written on the class is explicit; a class-like declaring
    /// any abstract method is implicitly abstract.
    pub fn get_modifiers(&self) -> ClassModifiers {
        let mut modifiers = ClassModifiers::empty();
        if self.decl.modifiers.contains(&Modifier::Abstract) {
            modifiers |= ClassModifiers::EXPLICIT_ABSTRACT;
        } else if self
            .immediate_method_table()
            .values()
            .any(|method| method.is_abstract())
        {
            modifiers |= ClassModifiers::IMPLICIT_ABSTRACT;
        }
        if self.decl.modifiers.contains(&Modifier::Final) || self.is_enum() {
            modifiers |= ClassModifiers::FINAL;
        }
        if self.decl.modifiers.contains(&Modifier::Readonly) {
            modifiers |= ClassModifiers::READONLY;
        }
        modifiers
    }

    pub fn is_abstract(&self) -> bool {
        self.get_modifiers()
            .intersects(ClassModifiers::EXPLICIT_ABSTRACT | ClassModifiers::IMPLICIT_ABSTRACT)
    }

    pub fn is_final(&self) -> bool {
        self.get_modifiers().contains(ClassModifiers::FINAL)
    }

    pub fn is_readonly(&self) -> bool {
        self.get_modifiers().contains(ClassModifiers::READONLY)
    }

    // Parent class

    pub fn get_parent_class_name(&self) -> Option<&str> {
        match self.decl.kind {
            ClassLikeKind::Class => self.decl.extends.first().map(|name| name.resolved.as_str()),
            _ => None,
        }
    }

    /// The parent class. An unresolvable parent name reads as no parent; a
    /// name that resolves to an interface or trait is an error, as is an
    /// inheritance cycle anywhere up the chain.
    pub fn get_parent_class(&self) -> Result<Option<Rc<ReflectionClass>>> {
        if self.is_interface() || self.is_trait() {
            return Err(ReflectionError::InvalidStructure(format!(
                "{} \"{}\" cannot have a parent class",
                if self.is_interface() { "interface" } else { "trait" },
                self.get_name()
            )));
        }
        self.parent_class_or_none()
    }

    /// Like [`get_parent_class`](Self::get_parent_class), treating
    /// interfaces and traits as having no parent.
    pub(crate) fn parent_class_or_none(&self) -> Result<Option<Rc<ReflectionClass>>> {
        guarded_memo(&self.reflector, &self.parent, "parent", self.get_name(), || {
            let Some(name) = self.get_parent_class_name() else {
                return Ok(None);
            };
            let Some(parent) = self.reflector.try_reflect_class(name)? else {
                tracing::warn!(class = %self.get_name(), parent = name, "parent class could not be located");
                return Ok(None);
            };
            if parent.is_interface() || parent.is_trait() {
                return Err(ReflectionError::not_a_class(parent.get_name()));
            }
            // Resolving the whole chain here surfaces cycles on first access.
            parent.parent_class_or_none()?;
            Ok(Some(parent))
        })
    }

    /// This class followed by its ancestors, nearest first.
    pub fn get_inheritance_chain(&self) -> Result<Vec<Rc<ReflectionClass>>> {
        let mut chain: Vec<Rc<ReflectionClass>> = self.this.upgrade().into_iter().collect();
        let mut current = self.parent_class_or_none()?;
        while let Some(class) = current {
            current = class.parent_class_or_none()?;
            chain.push(class);
        }
        Ok(chain)
    }

    pub fn get_parent_class_names(&self) -> Result<Vec<String>> {
        Ok(self
            .get_inheritance_chain()?
            .iter()
            .skip(1)
            .map(|class| class.get_name().to_string())
            .collect())
    }

    /// Whether this class extends or implements `name`, directly or not.
    pub fn is_subclass_of(&self, name: &str) -> Result<bool> {
        let name = name.trim_start_matches('\\');
        if self.get_name().eq_ignore_ascii_case(name) {
            return Ok(false);
        }
        let lower = name.to_ascii_lowercase();
        Ok(self
            .get_parent_class_names()?
            .iter()
            .any(|parent| parent.eq_ignore_ascii_case(name))
            || self.interface_table()?.contains_key(&lower))
    }

    /// Fails when `name` resolves to something other than an interface.
    pub fn implements_interface(&self, name: &str) -> Result<bool> {
        let name = name.trim_start_matches('\\');
        if let Some(interface) = self.reflector.try_reflect_class(name)?
            && !interface.is_interface()
        {
            return Err(ReflectionError::not_an_interface(interface.get_name()));
        }
        if self.is_interface() && self.get_name().eq_ignore_ascii_case(name) {
            return Ok(true);
        }
        Ok(self
            .interface_table()?
            .contains_key(&name.to_ascii_lowercase()))
    }

    // Interfaces

    fn immediate_interface_table(&self) -> Result<Table<ReflectionClass>> {
        if let Some(table) = self.immediate_interfaces.get() {
            return table.clone();
        }
        let result = self.compute_immediate_interfaces().map(Rc::new);
        self.immediate_interfaces.get_or_init(|| result).clone()
    }

    fn compute_immediate_interfaces(&self) -> Result<IndexMap<String, Rc<ReflectionClass>>> {
        let declared: &[Name] = match self.decl.kind {
            ClassLikeKind::Interface => &self.decl.extends,
            ClassLikeKind::Trait => &[],
            ClassLikeKind::Class | ClassLikeKind::Enum => &self.decl.implements,
        };
        let mut names: Vec<String> = declared.iter().map(|name| name.resolved.clone()).collect();
        if self.is_enum() {
            names.push("UnitEnum".to_string());
            if self.is_backed_enum() {
                names.push("BackedEnum".to_string());
            }
        }
        if self.adds_stringable(&names) {
            names.push("Stringable".to_string());
        }

        let mut table = IndexMap::new();
        for name in names {
            let Some(interface) = self.reflector.try_reflect_class(&name)? else {
                tracing::warn!(class = %self.get_name(), interface = %name, "interface could not be located");
                continue;
            };
            if !interface.is_interface() {
                return Err(ReflectionError::not_an_interface(interface.get_name()));
            }
            table
                .entry(interface.get_name().to_ascii_lowercase())
                .or_insert(interface);
        }
        Ok(table)
    }

    /// Classes, interfaces and enums declaring `__toString()` implement
    /// `Stringable` implicitly from PHP 8.0 on.
    fn adds_stringable(&self, declared: &[String]) -> bool {
        self.reflector.config().php_version_id >= STRINGABLE_SINCE
            && !self.is_trait()
            && !self.get_name().eq_ignore_ascii_case("Stringable")
            && !declared
                .iter()
                .any(|name| name.trim_start_matches('\\').eq_ignore_ascii_case("Stringable"))
            && self.immediate_method_table().contains_key("__tostring")
    }

    /// Interfaces of the parent chain first, then each interface this
    /// class-like names followed by the interfaces it extends. The first
    /// occurrence of a name keeps its position.
    fn interface_table(&self) -> Result<Table<ReflectionClass>> {
        guarded_memo(&self.reflector, &self.interfaces, "interfaces", self.get_name(), || {
            let mut table = IndexMap::new();
            if let Some(parent) = self.parent_class_or_none()? {
                for (key, interface) in parent.interface_table()?.iter() {
                    table.entry(key.clone()).or_insert_with(|| interface.clone());
                }
            }
            for (key, interface) in self.immediate_interface_table()?.iter() {
                table.entry(key.clone()).or_insert_with(|| interface.clone());
                for (inherited_key, inherited) in interface.interface_table()?.iter() {
                    table
                        .entry(inherited_key.clone())
                        .or_insert_with(|| inherited.clone());
                }
            }
            Ok(Rc::new(table))
        })
    }

    pub fn get_interfaces(&self) -> Result<Vec<Rc<ReflectionClass>>> {
        Ok(self.interface_table()?.values().cloned().collect())
    }

    pub fn get_interface_names(&self) -> Result<Vec<String>> {
        Ok(self
            .interface_table()?
            .values()
            .map(|interface| interface.get_name().to_string())
            .collect())
    }

    /// Interfaces named by this declaration only, including the implicit
    /// enum and `Stringable` ones.
    pub fn get_immediate_interfaces(&self) -> Result<Vec<Rc<ReflectionClass>>> {
        Ok(self.immediate_interface_table()?.values().cloned().collect())
    }

    // Traits

    pub fn get_trait_names(&self) -> Vec<String> {
        self.decl
            .members
            .iter()
            .filter_map(|member| match member {
                ClassMember::TraitUse(trait_use) => Some(&trait_use.traits),
                _ => None,
            })
            .flatten()
            .map(|name| name.resolved.clone())
            .collect()
    }

    /// Used traits that could be located, in `use` order.
    pub fn get_traits(&self) -> Result<Vec<Rc<ReflectionClass>>> {
        guarded_memo(&self.reflector, &self.traits, "traits", self.get_name(), || {
            let mut traits: Vec<Rc<ReflectionClass>> = Vec::new();
            for name in self.get_trait_names() {
                let Some(used) = self.reflector.try_reflect_class(&name)? else {
                    tracing::warn!(class = %self.get_name(), used = %name, "trait could not be located");
                    continue;
                };
                if !used.is_trait() {
                    return Err(ReflectionError::not_a_trait(used.get_name()));
                }
                if !traits.iter().any(|t| t.get_name().eq_ignore_ascii_case(used.get_name())) {
                    traits.push(used);
                }
            }
            Ok(traits)
        })
    }

    fn trait_adaptations(&self) -> Result<Rc<TraitAdaptations>> {
        if let Some(tables) = self.trait_tables.get() {
            return tables.clone();
        }
        let result = self.get_traits().and_then(|traits| {
            TraitAdaptations::build(&self.decl, |trait_use, method| {
                for name in &trait_use.traits {
                    if let Some(used) = traits
                        .iter()
                        .find(|t| t.get_name().eq_ignore_ascii_case(&name.resolved))
                        && used.has_method(method)?
                    {
                        return Ok(Some(used.get_name().to_string()));
                    }
                }
                Ok(None)
            })
            .map(Rc::new)
        });
        self.trait_tables.get_or_init(|| result).clone()
    }

    /// Alias name -> `Trait::method` for every `as` alias of the `use`
    /// blocks.
    pub fn get_trait_aliases(&self) -> Result<IndexMap<String, String>> {
        Ok(self.trait_adaptations()?.alias_targets().clone())
    }

    // Methods

    fn method_origin(&self) -> MethodOrigin {
        MethodOrigin {
            class: self.handle(),
            is_interface: self.is_interface(),
            is_class: self.decl.kind == ClassLikeKind::Class,
        }
    }

    fn synthetic_members(&self) -> Option<SyntheticMembers> {
        if self.is_enum() {
            Some(enum_synthesis::for_enum(self.backing_type_name().as_deref()))
        } else if self.is_interface() && !self.in_namespace() {
            enum_synthesis::for_marker_interface(self.get_name())
        } else {
            None
        }
    }

    fn immediate_method_table(&self) -> Table<ReflectionMethod> {
        self.immediate_methods
            .get_or_init(|| {
                let mut table = IndexMap::new();
                for member in &self.decl.members {
                    if let ClassMember::Method(decl) = member {
                        let method = ReflectionMethod::new(
                            &self.reflector,
                            self.source.clone(),
                            decl.clone(),
                            self.method_origin(),
                        );
                        table
                            .entry(method.get_name().to_ascii_lowercase())
                            .or_insert(method);
                    }
                }
                if self.is_enum()
                    && let Some(synthetic) = self.synthetic_members()
                {
                    for decl in &synthetic.methods {
                        let method = ReflectionMethod::new(
                            &self.reflector,
                            synthetic.source.clone(),
                            decl.clone(),
                            self.method_origin(),
                        );
                        table
                            .entry(method.get_name().to_ascii_lowercase())
                            .or_insert(method);
                    }
                }
                Rc::new(table)
            })
            .clone()
    }

    /// Trait methods as imported into this class: one entry under the
    /// original name unless an `insteadof` rule excludes it, plus one per
    /// alias.
    fn trait_methods(&self) -> Result<Vec<(String, Rc<ReflectionMethod>)>> {
        let adaptations = self.trait_adaptations()?;
        let mut imported = Vec::new();
        for used in self.get_traits()? {
            for method in used.method_table()?.values() {
                let hash = method_hash(used.get_name(), method.get_name());
                let modifiers = method.get_modifiers();
                if let Some(winner) = adaptations.precedence_winner(&hash) {
                    tracing::debug!(
                        class = %self.get_name(),
                        method = %method.get_name(),
                        excluded = %used.get_name(),
                        %winner,
                        "trait method excluded by insteadof"
                    );
                } else {
                    let modifiers = adaptations
                        .visibility_for(&hash)
                        .map_or(modifiers, |visibility| modifiers.with_visibility(visibility));
                    imported.push((
                        method.get_name().to_ascii_lowercase(),
                        method.rebind(self.handle(), None, modifiers),
                    ));
                }
                for alias in adaptations.aliases_for(&hash) {
                    let modifiers = alias
                        .visibility
                        .map_or(modifiers, |visibility| modifiers.with_visibility(visibility));
                    imported.push((
                        alias.alias.to_ascii_lowercase(),
                        method.rebind(self.handle(), Some(alias.alias.clone()), modifiers),
                    ));
                }
            }
        }
        Ok(imported)
    }

    /// Own methods, then inherited ones, then trait methods, then interface
    /// methods; the first entry for a lowercased name wins. A concrete trait
    /// method replaces an inherited or abstract entry in place.
    fn method_table(&self) -> Result<Table<ReflectionMethod>> {
        guarded_memo(&self.reflector, &self.methods, "methods", self.get_name(), || {
            let mut table: IndexMap<String, Rc<ReflectionMethod>> =
                (*self.immediate_method_table()).clone();
            if let Some(parent) = self.parent_class_or_none()? {
                for (key, method) in parent.method_table()?.iter() {
                    table.entry(key.clone()).or_insert_with(|| method.clone());
                }
            }
            for (key, method) in self.trait_methods()? {
                let replace = match table.get(&key) {
                    None => true,
                    Some(existing) => {
                        !method.is_abstract()
                            && (existing.is_abstract()
                                || !existing
                                    .get_implementing_class_name()
                                    .eq_ignore_ascii_case(self.get_name()))
                    }
                };
                if replace {
                    table.insert(key, method);
                }
            }
            for interface in self.interface_table()?.values() {
                for (key, method) in interface.method_table()?.iter() {
                    table.entry(key.clone()).or_insert_with(|| method.clone());
                }
            }
            Ok(Rc::new(table))
        })
    }

    /// Every method, optionally only those with any of `filter`'s bits.
    pub fn get_methods(&self, filter: Option<MemberModifiers>) -> Result<Vec<Rc<ReflectionMethod>>> {
        Ok(filter_members(self.method_table()?.values(), filter, |m| m.get_modifiers()))
    }

    pub fn get_immediate_methods(&self, filter: Option<MemberModifiers>) -> Vec<Rc<ReflectionMethod>> {
        filter_members(self.immediate_method_table().values(), filter, |m| m.get_modifiers())
    }

    /// Case-insensitive lookup in the merged method table.
    pub fn get_method(&self, name: &str) -> Result<Option<Rc<ReflectionMethod>>> {
        Ok(self.method_table()?.get(&name.to_ascii_lowercase()).cloned())
    }

    pub fn has_method(&self, name: &str) -> Result<bool> {
        Ok(self.method_table()?.contains_key(&name.to_ascii_lowercase()))
    }

    /// `__construct`, else a method that otherwise counts as a constructor.
    pub fn get_constructor(&self) -> Result<Option<Rc<ReflectionMethod>>> {
        let methods = self.method_table()?;
        if let Some(constructor) = methods.get("__construct") {
            return Ok(Some(constructor.clone()));
        }
        Ok(methods.values().find(|method| method.is_constructor()).cloned())
    }

    // Properties

    fn property_origin(&self) -> PropertyOrigin {
        PropertyOrigin {
            class: self.handle(),
            namespace: self.decl.namespace.clone(),
            readonly_class: self.decl.modifiers.contains(&Modifier::Readonly),
        }
    }

    fn immediate_property_table(&self) -> Table<ReflectionProperty> {
        self.immediate_properties
            .get_or_init(|| {
                let origin = self.property_origin();
                let mut table = IndexMap::new();
                for member in &self.decl.members {
                    match member {
                        ClassMember::Property(decl) => {
                            for index in 0..decl.entries.len() {
                                let property = ReflectionProperty::declared(
                                    &self.reflector,
                                    self.source.clone(),
                                    decl.clone(),
                                    index,
                                    &origin,
                                );
                                table.insert(property.get_name().to_string(), property);
                            }
                        }
                        ClassMember::Method(decl)
                            if decl
                                .name
                                .as_ref()
                                .is_some_and(|name| name.name.eq_ignore_ascii_case("__construct")) =>
                        {
                            for (index, param) in decl.params.iter().enumerate() {
                                if param.modifiers.is_empty() {
                                    continue;
                                }
                                let property = ReflectionProperty::promoted(
                                    &self.reflector,
                                    self.source.clone(),
                                    decl.clone(),
                                    index,
                                    &origin,
                                );
                                table.insert(property.get_name().to_string(), property);
                            }
                        }
                        _ => {}
                    }
                }
                if let Some(synthetic) = self.synthetic_members() {
                    for decl in &synthetic.properties {
                        for index in 0..decl.entries.len() {
                            let property = ReflectionProperty::declared(
                                &self.reflector,
                                synthetic.source.clone(),
                                decl.clone(),
                                index,
                                &origin,
                            );
                            table
                                .entry(property.get_name().to_string())
                                .or_insert(property);
                        }
                    }
                }
                Rc::new(table)
            })
            .clone()
    }

    /// Non-private properties of the parent chain and interfaces, then trait
    /// properties, then own properties. Later entries replace earlier ones
    /// of the same name without moving them.
    fn property_table(&self) -> Result<Table<ReflectionProperty>> {
        guarded_memo(&self.reflector, &self.properties, "properties", self.get_name(), || {
            let mut table: IndexMap<String, Rc<ReflectionProperty>> = IndexMap::new();
            if let Some(parent) = self.parent_class_or_none()? {
                for (name, property) in parent.property_table()?.iter() {
                    if !property.is_private() {
                        table.insert(name.clone(), property.clone());
                    }
                }
            }
            for interface in self.interface_table()?.values() {
                for (name, property) in interface.property_table()?.iter() {
                    if !property.is_private() {
                        table.insert(name.clone(), property.clone());
                    }
                }
            }
            for used in self.get_traits()? {
                for (name, property) in used.property_table()?.iter() {
                    table.insert(
                        name.clone(),
                        property.rebind(self.handle(), self.decl.namespace.clone()),
                    );
                }
            }
            for (name, property) in self.immediate_property_table().iter() {
                table.insert(name.clone(), property.clone());
            }
            Ok(Rc::new(table))
        })
    }

    pub fn get_properties(&self, filter: Option<MemberModifiers>) -> Result<Vec<Rc<ReflectionProperty>>> {
        Ok(filter_members(self.property_table()?.values(), filter, |p| p.get_modifiers()))
    }

    /// Declared and promoted properties of this class-like, plus the
    /// synthesized enum properties.
    pub fn get_immediate_properties(&self, filter: Option<MemberModifiers>) -> Vec<Rc<ReflectionProperty>> {
        filter_members(self.immediate_property_table().values(), filter, |p| p.get_modifiers())
    }

    /// Property names are case-sensitive.
    pub fn get_property(&self, name: &str) -> Result<Option<Rc<ReflectionProperty>>> {
        Ok(self.property_table()?.get(name).cloned())
    }

    pub fn has_property(&self, name: &str) -> Result<bool> {
        Ok(self.property_table()?.contains_key(name))
    }

    /// Default values of every property that has one.
    pub fn get_default_properties(&self) -> Result<IndexMap<String, Value>> {
        let mut defaults = IndexMap::new();
        for (name, property) in self.property_table()?.iter() {
            if property.has_default_value() {
                defaults.insert(name.clone(), property.get_default_value()?);
            }
        }
        Ok(defaults)
    }

    /// Current values of the static properties, regardless of visibility.
    pub fn get_static_properties(&self) -> Result<IndexMap<String, Value>> {
        let mut values = IndexMap::new();
        for (name, property) in self.property_table()?.iter() {
            if property.is_static() {
                values.insert(name.clone(), property.current_value()?);
            }
        }
        Ok(values)
    }

    fn static_property(&self, name: &str) -> Result<Rc<ReflectionProperty>> {
        let property = self
            .get_property(name)?
            .ok_or_else(|| ReflectionError::PropertyDoesNotExist {
                class: self.get_name().to_string(),
                property: name.to_string(),
            })?;
        if !property.is_static() {
            return Err(ReflectionError::InvalidStructure(format!(
                "property {}::${name} is not static",
                self.get_name()
            )));
        }
        Ok(property)
    }

    pub fn get_static_property_value(&self, name: &str) -> Result<Value> {
        self.static_property(name)?.get_value()
    }

    pub fn set_static_property_value(&self, name: &str, value: Value) -> Result<()> {
        self.static_property(name)?.set_value(value)
    }

    // Constants

    fn immediate_constant_table(&self) -> Table<ReflectionClassConstant> {
        self.immediate_constants
            .get_or_init(|| {
                let mut table = IndexMap::new();
                for member in &self.decl.members {
                    let ClassMember::Const(decl) = member else {
                        continue;
                    };
                    for index in 0..decl.consts.len() {
                        let constant = ReflectionClassConstant::new(
                            &self.reflector,
                            self.source.clone(),
                            decl.clone(),
                            index,
                            self.handle(),
                            self.decl.namespace.clone(),
                        );
                        table
                            .entry(constant.get_name().to_string())
                            .or_insert(constant);
                    }
                }
                Rc::new(table)
            })
            .clone()
    }

    /// Own constants, then trait constants, then non-private inherited
    /// ones, then interface constants; the first occurrence of a name wins.
    /// Enum cases are not constants here.
    fn constant_table(&self) -> Result<Table<ReflectionClassConstant>> {
        guarded_memo(&self.reflector, &self.constants, "constants", self.get_name(), || {
            let mut table: IndexMap<String, Rc<ReflectionClassConstant>> =
                (*self.immediate_constant_table()).clone();
            for used in self.get_traits()? {
                for (name, constant) in used.constant_table()?.iter() {
                    if !table.contains_key(name) {
                        table.insert(
                            name.clone(),
                            constant.rebind(self.handle(), self.decl.namespace.clone()),
                        );
                    }
                }
            }
            if let Some(parent) = self.parent_class_or_none()? {
                for (name, constant) in parent.constant_table()?.iter() {
                    if !constant.is_private() {
                        table.entry(name.clone()).or_insert_with(|| constant.clone());
                    }
                }
            }
            for interface in self.interface_table()?.values() {
                for (name, constant) in interface.constant_table()?.iter() {
                    table.entry(name.clone()).or_insert_with(|| constant.clone());
                }
            }
            Ok(Rc::new(table))
        })
    }

    pub fn get_immediate_reflection_constants(
        &self,
        filter: Option<MemberModifiers>,
    ) -> Vec<Rc<ReflectionClassConstant>> {
        filter_members(self.immediate_constant_table().values(), filter, |c| c.get_modifiers())
    }

    pub fn get_reflection_constants(
        &self,
        filter: Option<MemberModifiers>,
    ) -> Result<Vec<Rc<ReflectionClassConstant>>> {
        Ok(filter_members(self.constant_table()?.values(), filter, |c| c.get_modifiers()))
    }

    /// Case-sensitive lookup in the merged constant table.
    pub fn get_reflection_constant(&self, name: &str) -> Result<Option<Rc<ReflectionClassConstant>>> {
        Ok(self.constant_table()?.get(name).cloned())
    }

    pub fn has_constant(&self, name: &str) -> Result<bool> {
        Ok(self.constant_table()?.contains_key(name))
    }

    pub fn get_constant(&self, name: &str) -> Result<Option<Value>> {
        self.get_reflection_constant(name)?
            .map(|constant| constant.get_value())
            .transpose()
    }

    /// Name -> compiled value of every constant, optionally filtered.
    pub fn get_constants(&self, filter: Option<MemberModifiers>) -> Result<IndexMap<String, Value>> {
        let mut values = IndexMap::new();
        for constant in self.get_reflection_constants(filter)? {
            values.insert(constant.get_name().to_string(), constant.get_value()?);
        }
        Ok(values)
    }

    // Enum cases

    fn case_table(&self) -> Table<ReflectionEnumCase> {
        self.cases
            .get_or_init(|| {
                let mut table = IndexMap::new();
                for member in &self.decl.members {
                    if let ClassMember::Case(decl) = member {
                        table.insert(
                            decl.name.name.clone(),
                            ReflectionEnumCase::new(
                                &self.reflector,
                                self.source.clone(),
                                decl.clone(),
                                self.handle(),
                                self.decl.namespace.clone(),
                            ),
                        );
                    }
                }
                Rc::new(table)
            })
            .clone()
    }

    pub fn get_cases(&self) -> Vec<Rc<ReflectionEnumCase>> {
        self.case_table().values().cloned().collect()
    }

    pub fn get_case(&self, name: &str) -> Option<Rc<ReflectionEnumCase>> {
        self.case_table().get(name).cloned()
    }

    pub fn has_case(&self, name: &str) -> bool {
        self.case_table().contains_key(name)
    }

    // Attributes

    pub fn get_attributes(&self) -> Vec<Rc<ReflectionAttribute>> {
        self.attributes
            .get_or_init(|| {
                attribute::from_groups(&self.decl.attributes, AttributeTarget::CLASS, &self.context())
            })
            .clone()
    }

    pub fn get_attributes_by_name(&self, name: &str) -> Vec<Rc<ReflectionAttribute>> {
        attribute::by_name(&self.get_attributes(), name)
    }

    pub fn get_attributes_by_instance(&self, class_name: &str) -> Result<Vec<Rc<ReflectionAttribute>>> {
        attribute::by_instance(&self.get_attributes(), class_name)
    }

    // Instantiation

    /// Concrete classes are instantiable unless their constructor is not
    /// public. Enums never are.
    pub fn is_instantiable(&self) -> Result<bool> {
        if self.is_interface() || self.is_trait() || self.is_enum() || self.is_abstract() {
            return Ok(false);
        }
        Ok(self
            .get_constructor()?
            .is_none_or(|constructor| constructor.is_public()))
    }

    pub fn is_cloneable(&self) -> Result<bool> {
        if !self.is_instantiable()? {
            return Ok(false);
        }
        Ok(self
            .get_method("__clone")?
            .is_none_or(|clone| clone.is_public()))
    }

    pub fn is_iterable(&self) -> Result<bool> {
        if self.is_interface() || self.is_trait() || self.is_abstract() {
            return Ok(false);
        }
        self.implements_interface("Traversable")
    }

    pub fn new_instance(&self) -> Result<()> {
        Err(ReflectionError::NotImplemented(
            "instantiating a class requires executing code",
        ))
    }

    pub fn new_instance_args(&self) -> Result<()> {
        self.new_instance()
    }

    pub fn new_instance_without_constructor(&self) -> Result<()> {
        self.new_instance()
    }

    pub fn try_clone(&self) -> Result<Rc<Self>> {
        Err(ReflectionError::Uncloneable("ReflectionClass".to_string()))
    }
}

fn filter_members<'a, T: 'a>(
    members: impl Iterator<Item = &'a Rc<T>>,
    filter: Option<MemberModifiers>,
    modifiers: impl Fn(&T) -> MemberModifiers,
) -> Vec<Rc<T>> {
    members
        .filter(|member| filter.is_none_or(|filter| modifiers(member).intersects(filter)))
        .cloned()
        .collect()
}
