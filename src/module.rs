//! Feature module contract and identifier registry.
//!
//! A feature module is a pluggable unit bound to one session. The controller
//! drives it through [`FeatureModule::on_create`], [`FeatureModule::on_update`]
//! and [`FeatureModule::on_destroy`], always in the configured list order, and
//! hands it a [`SessionContext`] on every call instead of a back-reference.
//!
//! Identifiers resolve through [`ModuleRegistry`]: a caller-registered factory
//! wins over a [`BuiltinModule`] of the same name; an identifier matching
//! neither is a configuration error.

#[cfg(test)]
#[path = "module_test.rs"]
mod module_test;

use std::collections::HashMap;

use crate::config::Config;
use crate::dom::{Dom, DomEvent};
use crate::error::ResizeError;
use crate::modules::{DisplaySize, Resize, Toolbar};

/// What a module did with an event offered to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// The event does not belong to this module.
    Ignored,
    /// The module consumed the event.
    Handled,
    /// The module changed the image; run a global update.
    UpdateRequested,
}

/// Everything a module may read or drive during a lifecycle call.
pub struct SessionContext<'a, D: Dom> {
    pub dom: &'a mut D,
    pub image: &'a D::Node,
    pub overlay: &'a D::Node,
    pub config: &'a Config,
}

/// Lifecycle contract implemented by every feature module.
pub trait FeatureModule<D: Dom> {
    /// Build DOM and register module-local listeners. Runs once per session.
    ///
    /// # Errors
    ///
    /// Propagates DOM failures; the controller then tears the session down.
    fn on_create(&mut self, ctx: &mut SessionContext<'_, D>) -> Result<(), ResizeError>;

    /// Re-derive geometry and visual state. Must be idempotent.
    ///
    /// # Errors
    ///
    /// Propagates DOM failures.
    fn on_update(&mut self, ctx: &mut SessionContext<'_, D>) -> Result<(), ResizeError>;

    /// Release every node and listener the module created.
    ///
    /// Also called when `on_create` failed part-way, so it must only release
    /// what was actually acquired.
    fn on_destroy(&mut self, ctx: &mut SessionContext<'_, D>);

    /// Handle an event from a listener this module registered.
    ///
    /// # Errors
    ///
    /// Propagates DOM failures.
    fn on_event(&mut self, _ctx: &mut SessionContext<'_, D>, _event: &DomEvent<D::Node>) -> Result<Response, ResizeError> {
        Ok(Response::Ignored)
    }
}

/// Constructor for a module instance.
pub type ModuleFactory<D> = Box<dyn Fn() -> Box<dyn FeatureModule<D>>>;

/// Modules shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModule {
    DisplaySize,
    Toolbar,
    Resize,
}

impl BuiltinModule {
    /// Default module order.
    pub const ALL: [BuiltinModule; 3] = [Self::DisplaySize, Self::Toolbar, Self::Resize];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::DisplaySize => "DisplaySize",
            Self::Toolbar => "Toolbar",
            Self::Resize => "Resize",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    #[must_use]
    pub fn instantiate<D: Dom>(self) -> Box<dyn FeatureModule<D>> {
        match self {
            Self::DisplaySize => Box::new(DisplaySize::<D::Node>::default()),
            Self::Toolbar => Box::new(Toolbar::<D::Node>::default()),
            Self::Resize => Box::new(Resize::<D::Node>::default()),
        }
    }
}

/// One entry of a caller's module list.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleEntry<C> {
    /// An identifier resolved through the registry.
    Name(String),
    /// A caller-defined module and the name it registers under, if it has one.
    Definition { name: Option<String>, definition: C },
}

/// A module list with caller definitions replaced by their names.
#[derive(Debug)]
pub struct SplitModules<C> {
    /// Identifiers in list order.
    pub names: Vec<String>,
    /// Caller definitions to register, in list order.
    pub definitions: Vec<(String, C)>,
}

/// Split a caller's module list into identifiers and the definitions to register.
///
/// # Errors
///
/// Returns [`ResizeError::UnknownModule`] for a definition without a name.
pub fn split_module_list<C>(entries: impl IntoIterator<Item = ModuleEntry<C>>) -> Result<SplitModules<C>, ResizeError> {
    let mut split = SplitModules { names: Vec::new(), definitions: Vec::new() };
    for entry in entries {
        match entry {
            ModuleEntry::Name(name) => split.names.push(name),
            ModuleEntry::Definition { name: Some(name), definition } if !name.is_empty() => {
                split.names.push(name.clone());
                split.definitions.push((name, definition));
            }
            ModuleEntry::Definition { .. } => {
                return Err(ResizeError::UnknownModule("<anonymous module>".to_owned()));
            }
        }
    }
    Ok(split)
}

/// Caller-supplied module factories keyed by identifier.
pub struct ModuleRegistry<D: Dom> {
    overrides: HashMap<String, ModuleFactory<D>>,
}

impl<D: Dom> Default for ModuleRegistry<D> {
    fn default() -> Self {
        Self { overrides: HashMap::new() }
    }
}

impl<D: Dom> ModuleRegistry<D> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any earlier override.
    pub fn register(&mut self, name: impl Into<String>, factory: ModuleFactory<D>) {
        self.overrides.insert(name.into(), factory);
    }

    /// Builder form of [`ModuleRegistry::register`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, factory: ModuleFactory<D>) -> Self {
        self.register(name, factory);
        self
    }

    #[must_use]
    pub fn is_overridden(&self, name: &str) -> bool {
        self.overrides.contains_key(name)
    }

    /// Build the module for one identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError::UnknownModule`] when nothing matches `name`.
    pub fn instantiate(&self, name: &str) -> Result<Box<dyn FeatureModule<D>>, ResizeError> {
        if let Some(factory) = self.overrides.get(name) {
            return Ok(factory());
        }
        BuiltinModule::from_name(name)
            .map(BuiltinModule::instantiate::<D>)
            .ok_or_else(|| ResizeError::UnknownModule(name.to_owned()))
    }

    /// Check that every identifier resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError::UnknownModule`] for the first unresolvable identifier.
    pub fn validate(&self, names: &[String]) -> Result<(), ResizeError> {
        match names
            .iter()
            .find(|name| !self.is_overridden(name) && BuiltinModule::from_name(name).is_none())
        {
            Some(unknown) => Err(ResizeError::UnknownModule(unknown.clone())),
            None => Ok(()),
        }
    }

    /// Build one module per identifier, in order. Fails before building any
    /// module if an identifier is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError::UnknownModule`] for the first unresolvable identifier.
    pub fn instantiate_all(&self, names: &[String]) -> Result<Vec<Box<dyn FeatureModule<D>>>, ResizeError> {
        self.validate(names)?;
        names.iter().map(|name| self.instantiate(name)).collect()
    }
}
