use std::sync::Arc;

use crate::metamodel::{
    config::MetaModelConfig,
    loader::SpecificationLoader,
    programming::ProgrammingModel,
    reflect::{ClassBuilder, MemoryClassRepository},
    validation::{MetaModelValidator, ValidationContext, ValidationFailure, ValidationFailures},
};

// Helper function to create a loader over `classes` without introspecting anything
pub fn loader_with(classes: Vec<ClassBuilder>, config: MetaModelConfig) -> SpecificationLoader {
    let repository: MemoryClassRepository = classes
        .into_iter()
        .map(|class| class.build().unwrap())
        .collect();
    SpecificationLoader::new(ProgrammingModel::default(), Arc::new(repository), config)
}

// Introspects every class and passes the barrier; validation is disabled so single
// validators can be exercised in isolation via `run_validator`
pub fn bootstrap(classes: Vec<ClassBuilder>) -> SpecificationLoader {
    let loader = loader_with(classes, MetaModelConfig::minimal());
    loader.introspect_all().unwrap();
    loader.complete_introspection().unwrap();
    loader
}

// Runs a single validator over every specification of `loader`
pub fn run_validator(
    validator: &dyn MetaModelValidator,
    loader: &SpecificationLoader,
    config: &MetaModelConfig,
) -> Vec<ValidationFailure> {
    let specs = loader.all_specifications();
    let ctx = ValidationContext::new(&specs, config);
    let mut failures = ValidationFailures::new(validator.name());
    validator.validate(&ctx, &mut failures);
    failures.as_slice().to_vec()
}
