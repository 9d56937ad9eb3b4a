//! Optional capabilities a device exposes to the host
//!
//! The host asks for capabilities by interface name; internally they are
//! stored by [`ComponentTag`] so lookups return typed references.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::display::DisplayComponent;

/// Interface name of the display component
pub const DISPLAY_COMPONENT_VERSION: &str = "IVRDisplayComponent_002";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentTag {
    Display,
}

impl ComponentTag {
    pub fn interface_name(&self) -> &'static str {
        match self {
            ComponentTag::Display => DISPLAY_COMPONENT_VERSION,
        }
    }

    /// Resolves a host interface name; comparison ignores ASCII case.
    pub fn from_interface_name(name: &str) -> Option<Self> {
        [ComponentTag::Display]
            .into_iter()
            .find(|tag| tag.interface_name().eq_ignore_ascii_case(name))
    }
}

#[derive(Clone)]
pub enum Component {
    Display(Arc<dyn DisplayComponent>),
}

impl Component {
    pub fn tag(&self) -> ComponentTag {
        match self {
            Component::Display(_) => ComponentTag::Display,
        }
    }

    pub fn as_display(&self) -> Option<&Arc<dyn DisplayComponent>> {
        match self {
            Component::Display(display) => Some(display),
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.tag()).finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    entries: HashMap<ComponentTag, Component>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component, replacing any previous one with the same tag
    pub fn register(&mut self, component: Component) {
        self.entries.insert(component.tag(), component);
    }

    pub fn get(&self, tag: ComponentTag) -> Option<&Component> {
        self.entries.get(&tag)
    }

    pub fn lookup(&self, interface_name: &str) -> Option<&Component> {
        ComponentTag::from_interface_name(interface_name).and_then(|tag| self.get(tag))
    }

    pub fn display(&self) -> Option<Arc<dyn DisplayComponent>> {
        self.get(ComponentTag::Display)
            .and_then(Component::as_display)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayConfig;
    use crate::display::{DisplayGeometry, GlyphDisplay, StereoLayout};

    fn registry() -> (ComponentRegistry, Arc<dyn DisplayComponent>) {
        let display: Arc<dyn DisplayComponent> = Arc::new(GlyphDisplay::new(
            DisplayGeometry::from_config(&DisplayConfig::default(), StereoLayout::SideBySide),
        ));
        let mut registry = ComponentRegistry::new();
        registry.register(Component::Display(display.clone()));
        (registry, display)
    }

    #[test]
    fn resolves_display_by_name() {
        let (registry, display) = registry();
        let found = registry.lookup(DISPLAY_COMPONENT_VERSION).unwrap();
        assert!(Arc::ptr_eq(found.as_display().unwrap(), &display));
        assert!(registry.lookup("ivrdisplaycomponent_002").is_some());
    }

    #[test]
    fn unknown_names_resolve_to_nothing() {
        let (registry, _) = registry();
        assert!(registry.lookup("IVRDisplayComponent_001").is_none());
        assert!(registry.lookup("IVRCameraComponent_003").is_none());
        assert!(registry.lookup("").is_none());
        assert!(ComponentRegistry::new().display().is_none());
    }
}
