//! Static reflection for PHP source code.
//!
//! Classes, functions and constants are located, parsed and reflected
//! without executing any PHP. Start with a [`Reflector`] over a
//! [`SourceLocator`](locator::SourceLocator):
//!
//! ```
//! use php_reflector::Reflector;
//!
//! let reflector = Reflector::for_source("<?php class Greeter { public function hi() {} }");
//! let class = reflector.reflect_class("Greeter").unwrap();
//! assert!(class.has_method("HI").unwrap());
//! ```

pub mod compiler;
pub mod error;
pub mod identifier;
pub mod locator;
pub mod materializer;
pub mod parser;
pub mod reflection;
pub mod reflector;
pub mod stubs;

pub use error::{ReflectionError, Result};
pub use identifier::{Identifier, IdentifierType};
pub use reflector::{Reflector, ReflectorConfig};
