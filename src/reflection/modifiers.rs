use crate::parser::ast::Modifier;
use bitflags::bitflags;

bitflags! {
    /// Modifier bits of methods, properties and class constants, matching
    /// the values of PHP's `ReflectionMethod::IS_*` constants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberModifiers: u32 {
        const PUBLIC = 1;
        const PROTECTED = 2;
        const PRIVATE = 4;
        const STATIC = 16;
        const FINAL = 32;
        const ABSTRACT = 64;
        const READONLY = 128;
    }
}

bitflags! {
    /// `ReflectionClass::IS_*` values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClassModifiers: u32 {
        const IMPLICIT_ABSTRACT = 16;
        const FINAL = 32;
        const EXPLICIT_ABSTRACT = 64;
        const READONLY = 65536;
    }
}

impl MemberModifiers {
    pub const VISIBILITY: MemberModifiers = MemberModifiers::PUBLIC
        .union(MemberModifiers::PROTECTED)
        .union(MemberModifiers::PRIVATE);

    /// Members without an explicit visibility keyword are public.
    pub fn from_ast(modifiers: &[Modifier]) -> Self {
        let mut bits = MemberModifiers::empty();
        for modifier in modifiers {
            bits |= match modifier {
                Modifier::Public => MemberModifiers::PUBLIC,
                Modifier::Protected => MemberModifiers::PROTECTED,
                Modifier::Private => MemberModifiers::PRIVATE,
                Modifier::Static => MemberModifiers::STATIC,
                Modifier::Final => MemberModifiers::FINAL,
                Modifier::Abstract => MemberModifiers::ABSTRACT,
                Modifier::Readonly => MemberModifiers::READONLY,
                Modifier::PublicSet | Modifier::ProtectedSet | Modifier::PrivateSet => {
                    MemberModifiers::empty()
                }
            };
        }
        if !bits.intersects(Self::VISIBILITY) {
            bits |= MemberModifiers::PUBLIC;
        }
        bits
    }

    pub fn visibility_from(modifier: Modifier) -> Option<Self> {
        match modifier {
            Modifier::Public => Some(MemberModifiers::PUBLIC),
            Modifier::Protected => Some(MemberModifiers::PROTECTED),
            Modifier::Private => Some(MemberModifiers::PRIVATE),
            _ => None,
        }
    }

    /// Replaces the visibility bits, keeping the others.
    pub fn with_visibility(self, visibility: MemberModifiers) -> Self {
        (self - Self::VISIBILITY) | (visibility & Self::VISIBILITY)
    }

    /// Keywords in PHP's canonical order, as `Reflection::getModifierNames()` lists them.
    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(MemberModifiers::ABSTRACT) {
            names.push("abstract");
        }
        if self.contains(MemberModifiers::FINAL) {
            names.push("final");
        }
        if self.contains(MemberModifiers::PUBLIC) {
            names.push("public");
        } else if self.contains(MemberModifiers::PROTECTED) {
            names.push("protected");
        } else if self.contains(MemberModifiers::PRIVATE) {
            names.push("private");
        }
        if self.contains(MemberModifiers::STATIC) {
            names.push("static");
        }
        if self.contains(MemberModifiers::READONLY) {
            names.push("readonly");
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_visibility_is_public() {
        let bits = MemberModifiers::from_ast(&[Modifier::Static]);
        assert_eq!(bits, MemberModifiers::PUBLIC | MemberModifiers::STATIC);
        assert_eq!(bits.bits(), 17);
    }

    #[test]
    fn test_with_visibility() {
        let bits = MemberModifiers::from_ast(&[Modifier::Final, Modifier::Public]);
        let bits = bits.with_visibility(MemberModifiers::PRIVATE);
        assert_eq!(bits, MemberModifiers::FINAL | MemberModifiers::PRIVATE);
        assert_eq!(bits.names(), vec!["final", "private"]);
    }
}
