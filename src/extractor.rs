//! Endpoint-model extraction.
//!
//! [`ModelExtractor`] drives one generation run: seed class names go in,
//! an accumulated [`RestApplicationModel`] plus the found-types sink come
//! out. A seed is either a REST controller, parsed directly, or an
//! application entry point, booted through the [`crate::discovery`] runtime
//! to obtain its controllers (when application scanning is enabled).
//!
//! Per canonical method the extractor follows a fixed pipeline: build the
//! method-level resource context, classify every formal parameter into
//! path/query/body/ignored, parse the accumulated path template, resolve
//! generic types against the concrete controller class and assemble one
//! immutable [`RestMethodModel`].

use log::{debug, info, warn};
use std::collections::BTreeMap;

use crate::context::ResourceContext;
use crate::discovery::{discover_controllers, ApplicationRuntime, DiscoveryOptions};
use crate::error::Result;
use crate::generics;
use crate::metadata::{
    ClassDef, MetadataRegistry, TypeRef, APPLICATION, ATTR_DEFAULT_VALUE, ATTR_METHOD, ATTR_NAME,
    ATTR_PATH, ATTR_REQUIRED, ATTR_VALUE, NULLABLE, PAGEABLE, PATH_VARIABLE, REQUEST_BODY,
    REQUEST_MAPPING, REQUEST_PARAM, RESPONSE_ENTITY, REST_CONTROLLER,
};
use crate::model::{
    FoundTypes, HttpMethod, MethodParameterModel, RestApplicationModel, RestMethodModel,
    RestQueryParam, ReturnTypeModel,
};
use crate::path_template::{PathPart, PathTemplate};
use crate::resolver::{resolve_endpoint_methods, EndpointMethod};

/// Settings for one extraction run.
pub struct ExtractorSettings {
    /// When false, application entry-point seeds are silently skipped
    /// instead of booted.
    pub scan_applications: bool,
    /// Class-name exclusion predicate applied during discovery.
    pub exclude: Option<Box<dyn Fn(&str) -> bool>>,
    /// Options handed to the application runtime on every boot.
    pub discovery: DiscoveryOptions,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            scan_applications: false,
            exclude: None,
            discovery: DiscoveryOptions::default(),
        }
    }
}

/// Extracts the endpoint model of one application.
pub struct ModelExtractor<'a> {
    registry: &'a MetadataRegistry,
    settings: ExtractorSettings,
    model: RestApplicationModel,
    found_types: FoundTypes,
}

impl<'a> ModelExtractor<'a> {
    pub fn new(registry: &'a MetadataRegistry, settings: ExtractorSettings) -> Self {
        Self {
            registry,
            settings,
            model: RestApplicationModel::new(),
            found_types: FoundTypes::new(),
        }
    }

    /// Processes one seed class name.
    ///
    /// An unknown class name is fatal. An application entry point is booted
    /// via `runtime` when scanning is enabled (boot failure is fatal and
    /// aborts the run for this seed); a controller is parsed directly; any
    /// other class is skipped.
    pub fn process_seed(
        &mut self,
        runtime: &dyn ApplicationRuntime,
        class_name: &str,
    ) -> Result<()> {
        let class = self.registry.require_class(class_name)?;

        if class.annotation(APPLICATION).is_some() {
            if self.settings.scan_applications {
                let exclude = self
                    .settings
                    .exclude
                    .as_ref()
                    .map(|f| f.as_ref() as &dyn Fn(&str) -> bool);
                let controllers = discover_controllers(
                    self.registry,
                    runtime,
                    class,
                    &self.settings.discovery,
                    exclude,
                )?;
                info!(
                    "Application {} contributed {} controllers",
                    class_name,
                    controllers.len()
                );
                for controller in controllers {
                    self.parse_controller(controller);
                }
            } else {
                debug!(
                    "Application scanning disabled, skipping entry point {}",
                    class_name
                );
            }
            return Ok(());
        }

        if self
            .registry
            .find_merged_class_annotation(class, REST_CONTROLLER)
            .is_some()
        {
            self.parse_controller(class);
        } else {
            warn!(
                "Seed class {} is neither an application entry point nor a REST controller",
                class_name
            );
        }
        Ok(())
    }

    /// Parses every canonical endpoint method of one controller class.
    pub fn parse_controller(&mut self, controller: &'a ClassDef) {
        info!("Parsing REST controller: {}", controller.name);

        // An absent or empty class-level mapping path means mapped at root.
        let base_path = self
            .registry
            .find_merged_class_annotation(controller, REQUEST_MAPPING)
            .and_then(|mapping| {
                mapping
                    .first_string(ATTR_PATH)
                    .or_else(|| mapping.first_string(ATTR_VALUE))
                    .map(String::from)
            })
            .unwrap_or_default();
        let context = ResourceContext::new(controller, &base_path);

        for endpoint in resolve_endpoint_methods(self.registry, controller) {
            self.parse_controller_method(&context, controller, endpoint);
        }
    }

    fn parse_controller_method(
        &mut self,
        context: &ResourceContext<'a>,
        controller: &'a ClassDef,
        endpoint: EndpointMethod<'a>,
    ) {
        let method = endpoint.method;
        let Some(mapping) = self
            .registry
            .find_merged_method_annotation(method, REQUEST_MAPPING)
        else {
            return;
        };

        // Method-level sub-context: first declared path, then the declared
        // path-variable bindings.
        let method_path = mapping
            .first_string(ATTR_PATH)
            .or_else(|| mapping.first_string(ATTR_VALUE))
            .unwrap_or("");
        let context = context.sub_path(method_path);

        let mut bindings = BTreeMap::new();
        for parameter in &method.parameters {
            let Some(path_variable) = self
                .registry
                .find_merged_parameter_annotation(parameter, PATH_VARIABLE)
            else {
                continue;
            };
            // The annotation name can be empty when the template variable
            // matches the formal argument.
            let name = path_variable
                .string_attr(ATTR_VALUE)
                .or_else(|| path_variable.string_attr(ATTR_NAME))
                .filter(|n| !n.is_empty())
                .unwrap_or(&parameter.name)
                .to_string();
            let required = path_variable.bool_attr(ATTR_REQUIRED, true);
            bindings.insert(
                name.clone(),
                MethodParameterModel::new(name, parameter.type_ref.clone(), required),
            );
        }
        let context = context.sub_path_param_types(bindings);

        let http_method = mapping
            .first_string(ATTR_METHOD)
            .and_then(HttpMethod::parse)
            .unwrap_or(HttpMethod::Get);

        // Path parameters come out in template order, not declaration order:
        // the declared types may be split across the class-level and
        // method-level mapping paths.
        let template = PathTemplate::parse(context.path());
        let mut path_params = Vec::new();
        for part in template.parts() {
            let PathPart::Parameter {
                original_name,
                valid_name,
            } = part
            else {
                continue;
            };
            let (type_ref, required) = match context.path_param_type(original_name) {
                Some(binding) => (binding.type_ref.clone(), binding.required),
                None => {
                    debug!(
                        "Path variable '{}' of {}.{} has no declared type, defaulting to string",
                        original_name, controller.name, method.name
                    );
                    (TypeRef::string(), true)
                }
            };
            self.found_types.add(type_ref.clone());
            path_params.push(MethodParameterModel::new(
                valid_name.clone(),
                type_ref,
                required,
            ));
        }

        let query_params = self.query_parameters(controller, method.parameters.iter());
        let entity_param = self.entity_parameter(controller, &endpoint);

        let return_type = self.parse_return_type(controller, &endpoint);
        self.found_types.add(return_type.clone());
        let return_type = ReturnTypeModel {
            type_ref: return_type,
            optional: method.annotation(NULLABLE).is_some(),
        };

        debug!(
            "Extracted endpoint: {} {} ({}.{})",
            http_method,
            context.path(),
            controller.name,
            method.name
        );
        self.model.add(RestMethodModel {
            controller: controller.name.clone(),
            name: method.name.clone(),
            return_type,
            http_method,
            path: context.path().to_string(),
            path_params,
            query_params,
            entity_param,
            comment: method.doc.clone(),
        });
    }

    /// Classifies the non-path formal parameters, in declaration order.
    fn query_parameters<'m>(
        &mut self,
        controller: &ClassDef,
        parameters: impl Iterator<Item = &'m crate::metadata::ParameterDef>,
    ) -> Vec<RestQueryParam> {
        let mut query_params = Vec::new();
        for parameter in parameters {
            if self
                .registry
                .find_merged_parameter_annotation(parameter, PATH_VARIABLE)
                .is_some()
            {
                continue;
            }

            if parameter.type_ref.is_named(PAGEABLE) {
                // The pagination convenience type expands to a fixed triple.
                for (name, type_ref) in [
                    ("page", TypeRef::long()),
                    ("size", TypeRef::long()),
                    ("sort", TypeRef::string()),
                ] {
                    self.found_types.add(type_ref.clone());
                    query_params.push(RestQueryParam::Single(MethodParameterModel::new(
                        name, type_ref, false,
                    )));
                }
                continue;
            }

            if let Some(request_param) = self
                .registry
                .find_merged_parameter_annotation(parameter, REQUEST_PARAM)
            {
                let name = request_param
                    .string_attr(ATTR_VALUE)
                    .or_else(|| request_param.string_attr(ATTR_NAME))
                    .filter(|n| !n.is_empty())
                    .unwrap_or(&parameter.name)
                    .to_string();
                // A declared default always makes the parameter effectively
                // optional, whatever the required attribute claims.
                let required = request_param.bool_attr(ATTR_REQUIRED, true)
                    && request_param.attr(ATTR_DEFAULT_VALUE).is_none();
                self.found_types.add(parameter.type_ref.clone());
                query_params.push(RestQueryParam::Single(MethodParameterModel::new(
                    name,
                    parameter.type_ref.clone(),
                    required,
                )));
                continue;
            }

            // Framework-injected objects (request, response, session) are
            // irrelevant to a client contract.
            debug!(
                "Ignoring parameter '{}' of controller {}",
                parameter.name, controller.name
            );
        }
        query_params
    }

    /// The first request-body parameter, generics-resolved against the
    /// concrete controller class. At most one is recognized.
    fn entity_parameter(
        &mut self,
        controller: &ClassDef,
        endpoint: &EndpointMethod<'a>,
    ) -> Option<MethodParameterModel> {
        for parameter in &endpoint.method.parameters {
            let Some(request_body) = self
                .registry
                .find_merged_parameter_annotation(parameter, REQUEST_BODY)
            else {
                continue;
            };
            let resolved = generics::resolve_type(
                self.registry,
                controller,
                &parameter.type_ref,
                endpoint.declaring,
            );
            let required = request_body.bool_attr(ATTR_REQUIRED, true);
            self.found_types.add(resolved.clone());
            let mut model = MethodParameterModel::new(parameter.name.clone(), resolved, required);
            if parameter.nullable {
                model = model.with_nullability_hint(parameter.type_ref.clone());
            }
            return Some(model);
        }
        None
    }

    /// Return-type policy: void stays void, the response envelope unwraps to
    /// its first type argument, everything is resolved against the concrete
    /// controller class.
    fn parse_return_type(&self, controller: &ClassDef, endpoint: &EndpointMethod<'a>) -> TypeRef {
        let declared = &endpoint.method.return_type;
        let model_type = match declared {
            TypeRef::Void => return TypeRef::Void,
            TypeRef::Parameterized { raw, args } if raw == RESPONSE_ENTITY && !args.is_empty() => {
                args[0].clone()
            }
            other => other.clone(),
        };
        generics::resolve_type(self.registry, controller, &model_type, endpoint.declaring)
    }

    pub fn model(&self) -> &RestApplicationModel {
        &self.model
    }

    pub fn found_types(&self) -> &FoundTypes {
        &self.found_types
    }

    /// Consumes the extractor, handing model and sink to the renderer.
    pub fn into_output(self) -> (RestApplicationModel, FoundTypes) {
        (self.model, self.found_types)
    }
}
