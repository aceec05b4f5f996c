//! REST Model Extractor - Endpoint models from application class metadata.
//!
//! This library builds a language-neutral REST endpoint model out of a
//! declarative class-metadata table: which classes are controllers, which
//! methods are HTTP-mapped, what their paths, parameters, request bodies and
//! return types look like. The metadata table replaces runtime reflection,
//! so the engine works the same for any source language that can emit it.
//!
//! # Capabilities
//!
//! - **Inheritance-aware resolution**: endpoint methods declared on generic
//!   base classes or interfaces are collapsed to one canonical method each,
//!   including synthetic erasure bridges
//! - **Generic type resolution**: inherited `T`-typed bodies and return
//!   types resolve against the concrete controller class
//! - **Application scanning**: an application entry point can be booted
//!   through a pluggable runtime to discover its controllers
//!
//! # Architecture
//!
//! The library is organized into several modules that work together:
//!
//! 1. [`loader`] - Loads class metadata from JSON files into a registry
//! 2. [`metadata`] - The metadata table: classes, methods, annotations
//! 3. [`discovery`] - Boots application entry points to find controllers
//! 4. [`resolver`] - Resolves canonical endpoint methods per controller
//! 5. [`generics`] - Resolves inherited type variables to concrete types
//! 6. [`path_template`] - Parses URL path templates into parts
//! 7. [`context`] - The path-accumulating traversal context
//! 8. [`extractor`] - Drives extraction and assembles the endpoint model
//! 9. [`model`] - The output data model
//! 10. [`serializer`] - Serializes the model to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use restmodel_from_metadata::{
//!     discovery::RegistryRuntime,
//!     extractor::{ExtractorSettings, ModelExtractor},
//!     loader::RegistryLoader,
//!     serializer::{serialize_yaml, GenerationOutput},
//! };
//! use std::path::PathBuf;
//!
//! // Load the metadata registry
//! let loader = RegistryLoader::new(PathBuf::from("./metadata"));
//! let registry = loader.load().unwrap();
//!
//! // Extract the endpoint model from a seed class
//! let runtime = RegistryRuntime::new(&registry);
//! let mut extractor = ModelExtractor::new(&registry, ExtractorSettings::default());
//! extractor.process_seed(&runtime, "OrderController").unwrap();
//!
//! // Serialize to YAML
//! let (model, found_types) = extractor.into_output();
//! let yaml = serialize_yaml(&GenerationOutput::new(model, &found_types)).unwrap();
//! println!("{}", yaml);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete
//! CLI application.

pub mod cli;
pub mod context;
pub mod discovery;
pub mod error;
pub mod extractor;
pub mod generics;
pub mod loader;
pub mod metadata;
pub mod model;
pub mod path_template;
pub mod resolver;
pub mod serializer;
