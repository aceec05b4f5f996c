//! Controller discovery by booting an application entry point.
//!
//! The extraction engine does not assume any particular discovery mechanism.
//! It consumes an [`ApplicationRuntime`]: something able to boot an
//! application entry-point class into a [`BootedApplication`] whose component
//! registry can be listed. The runtime is torn down again before
//! [`discover_controllers`] returns, on success and on every failure path,
//! so no side effect of the boot survives the call.
//!
//! Boot failure is fatal for the entry point and propagates to the caller;
//! so is a component class name that resolves to nothing in the metadata
//! registry, which is a configuration error a retry cannot fix.

use log::{debug, info};

use crate::error::{Error, Result};
use crate::metadata::{ClassDef, MetadataRegistry, APPLICATION, ATTR_COMPONENTS, REST_CONTROLLER};

/// How the booted application binds its server port.
///
/// Passed explicitly into the boot call; discovery never touches
/// process-wide state to force a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortBinding {
    /// Bind an ephemeral port so a scan never collides with a running
    /// instance of the same application.
    #[default]
    Ephemeral,
    Fixed(u16),
}

impl std::fmt::Display for PortBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PortBinding::Ephemeral => write!(f, "ephemeral"),
            PortBinding::Fixed(port) => write!(f, "{}", port),
        }
    }
}

/// Options passed into every boot call.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    pub port: PortBinding,
}

/// A running application instance. Dropping the handle tears the instance
/// down; [`shutdown`](BootedApplication::shutdown) may be called earlier and
/// is idempotent.
pub trait BootedApplication {
    /// Class names of every component in the live registry.
    fn component_class_names(&self) -> Vec<String>;

    fn shutdown(&mut self);
}

/// Boots application entry points. Blocking, no timeout: a hanging or
/// failing start-up fails the scan for that entry point outright.
pub trait ApplicationRuntime {
    fn boot<'r>(
        &'r self,
        entry: &ClassDef,
        options: &DiscoveryOptions,
    ) -> Result<Box<dyn BootedApplication + 'r>>;
}

/// Boots `entry`, lists its component registry, applies the consumer
/// exclusion predicate, resolves every remaining class name against the
/// metadata registry and keeps the REST controllers. The booted instance is
/// torn down before this function returns, whatever the outcome.
pub fn discover_controllers<'a>(
    registry: &'a MetadataRegistry,
    runtime: &dyn ApplicationRuntime,
    entry: &ClassDef,
    options: &DiscoveryOptions,
    exclude: Option<&dyn Fn(&str) -> bool>,
) -> Result<Vec<&'a ClassDef>> {
    info!("Scanning application: {}", entry.name);
    let mut booted = runtime.boot(entry, options)?;

    let result = collect_controllers(registry, booted.as_ref(), exclude);

    // Teardown runs on the error path too; Drop backs this up.
    booted.shutdown();
    result
}

fn collect_controllers<'a>(
    registry: &'a MetadataRegistry,
    booted: &dyn BootedApplication,
    exclude: Option<&dyn Fn(&str) -> bool>,
) -> Result<Vec<&'a ClassDef>> {
    let mut controllers = Vec::new();
    for name in booted.component_class_names() {
        if let Some(is_excluded) = exclude {
            if is_excluded(&name) {
                debug!("Component {} excluded by predicate", name);
                continue;
            }
        }
        let class = registry.require_class(&name)?;
        if registry
            .find_merged_class_annotation(class, REST_CONTROLLER)
            .is_some()
        {
            debug!("Discovered REST controller: {}", name);
            controllers.push(class);
        }
    }
    Ok(controllers)
}

/// The in-repo runtime: "booting" an application means reading its component
/// registry out of the metadata table. The entry class must carry the
/// application annotation; its `components` attribute lists the registered
/// class names, defaulting to every class in the registry when absent.
pub struct RegistryRuntime<'a> {
    registry: &'a MetadataRegistry,
}

impl<'a> RegistryRuntime<'a> {
    pub fn new(registry: &'a MetadataRegistry) -> Self {
        Self { registry }
    }
}

impl ApplicationRuntime for RegistryRuntime<'_> {
    fn boot<'r>(
        &'r self,
        entry: &ClassDef,
        options: &DiscoveryOptions,
    ) -> Result<Box<dyn BootedApplication + 'r>> {
        let annotation = entry.annotation(APPLICATION).ok_or_else(|| Error::ApplicationBoot {
            application: entry.name.clone(),
            message: "class carries no application annotation".to_string(),
        })?;

        info!("Booting {} (port: {})", entry.name, options.port);

        let mut components = annotation.string_list(ATTR_COMPONENTS);
        if components.is_empty() {
            components = self.registry.classes().map(|c| c.name.clone()).collect();
        }

        Ok(Box::new(RegistryApplication {
            application: entry.name.clone(),
            components,
            down: false,
        }))
    }
}

struct RegistryApplication {
    application: String,
    components: Vec<String>,
    down: bool,
}

impl BootedApplication for RegistryApplication {
    fn component_class_names(&self) -> Vec<String> {
        self.components.clone()
    }

    fn shutdown(&mut self) {
        if !self.down {
            self.down = true;
            debug!("Tearing down application: {}", self.application);
        }
    }
}

impl Drop for RegistryApplication {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Annotation, AttrValue};
    use std::cell::Cell;
    use std::rc::Rc;

    fn registry_with_app(components: Option<Vec<&str>>) -> MetadataRegistry {
        let mut annotation = Annotation::new(APPLICATION);
        if let Some(components) = components {
            annotation = annotation.with_attr(
                ATTR_COMPONENTS,
                AttrValue::StrList(components.into_iter().map(String::from).collect()),
            );
        }
        MetadataRegistry::from_classes(vec![
            ClassDef::new("App").with_annotation(annotation),
            ClassDef::new("OrderController").with_annotation(Annotation::new(REST_CONTROLLER)),
            ClassDef::new("OrderService"),
            ClassDef::new("UserController").with_annotation(Annotation::new(REST_CONTROLLER)),
        ])
    }

    #[test]
    fn test_discovers_only_rest_controllers() {
        let registry = registry_with_app(Some(vec![
            "OrderController",
            "OrderService",
            "UserController",
        ]));
        let runtime = RegistryRuntime::new(&registry);
        let entry = registry.class("App").unwrap();

        let controllers = discover_controllers(
            &registry,
            &runtime,
            entry,
            &DiscoveryOptions::default(),
            None,
        )
        .unwrap();

        let names: Vec<&str> = controllers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["OrderController", "UserController"]);
    }

    #[test]
    fn test_missing_components_attribute_scans_whole_registry() {
        let registry = registry_with_app(None);
        let runtime = RegistryRuntime::new(&registry);
        let entry = registry.class("App").unwrap();

        let controllers = discover_controllers(
            &registry,
            &runtime,
            entry,
            &DiscoveryOptions::default(),
            None,
        )
        .unwrap();
        assert_eq!(controllers.len(), 2);
    }

    #[test]
    fn test_exclusion_predicate_is_applied() {
        let registry = registry_with_app(Some(vec!["OrderController", "UserController"]));
        let runtime = RegistryRuntime::new(&registry);
        let entry = registry.class("App").unwrap();
        let exclude = |name: &str| name.starts_with("User");

        let controllers = discover_controllers(
            &registry,
            &runtime,
            entry,
            &DiscoveryOptions::default(),
            Some(&exclude),
        )
        .unwrap();

        let names: Vec<&str> = controllers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["OrderController"]);
    }

    #[test]
    fn test_boot_fails_without_application_annotation() {
        let registry = registry_with_app(None);
        let runtime = RegistryRuntime::new(&registry);
        let not_an_app = registry.class("OrderService").unwrap();

        let err = discover_controllers(
            &registry,
            &runtime,
            not_an_app,
            &DiscoveryOptions::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ApplicationBoot { .. }));
    }

    #[test]
    fn test_unloadable_component_class_is_fatal() {
        let registry = registry_with_app(Some(vec!["OrderController", "GhostComponent"]));
        let runtime = RegistryRuntime::new(&registry);
        let entry = registry.class("App").unwrap();

        let err = discover_controllers(
            &registry,
            &runtime,
            entry,
            &DiscoveryOptions::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ClassNotFound(name) if name == "GhostComponent"));
    }

    struct TrackingRuntime {
        torn_down: Rc<Cell<bool>>,
        components: Vec<String>,
    }

    struct TrackingApplication {
        torn_down: Rc<Cell<bool>>,
        components: Vec<String>,
    }

    impl BootedApplication for TrackingApplication {
        fn component_class_names(&self) -> Vec<String> {
            self.components.clone()
        }

        fn shutdown(&mut self) {
            self.torn_down.set(true);
        }
    }

    impl ApplicationRuntime for TrackingRuntime {
        fn boot<'r>(
            &'r self,
            _entry: &ClassDef,
            _options: &DiscoveryOptions,
        ) -> Result<Box<dyn BootedApplication + 'r>> {
            Ok(Box::new(TrackingApplication {
                torn_down: Rc::clone(&self.torn_down),
                components: self.components.clone(),
            }))
        }
    }

    #[test]
    fn test_teardown_happens_on_failure_path() {
        let registry = MetadataRegistry::new();
        let torn_down = Rc::new(Cell::new(false));
        let runtime = TrackingRuntime {
            torn_down: Rc::clone(&torn_down),
            components: vec!["Missing".to_string()],
        };
        let entry = ClassDef::new("App");

        let result = discover_controllers(
            &registry,
            &runtime,
            &entry,
            &DiscoveryOptions::default(),
            None,
        );

        assert!(result.is_err());
        assert!(torn_down.get(), "teardown must run even when the scan fails");
    }

    #[test]
    fn test_teardown_happens_on_success_path() {
        let registry = MetadataRegistry::new();
        let torn_down = Rc::new(Cell::new(false));
        let runtime = TrackingRuntime {
            torn_down: Rc::clone(&torn_down),
            components: Vec::new(),
        };
        let entry = ClassDef::new("App");

        discover_controllers(
            &registry,
            &runtime,
            &entry,
            &DiscoveryOptions::default(),
            None,
        )
        .unwrap();
        assert!(torn_down.get());
    }
}
