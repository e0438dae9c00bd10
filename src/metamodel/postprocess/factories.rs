use crate::{
    metamodel::{
        factory::{
            factory_error, ClassContext, MethodContext, MethodRemover, ParameterContext,
            ProcessingStage,
        },
        identifier::FeatureKind,
        postprocess::{PostProcessContext, PostProcessor},
        spec::ObjectSpecification,
    },
    Result,
};

/// Runs the facet factories registered under [`ProcessingStage::PostProcessing`].
///
/// The factories see every holder of the specification exactly once, like during
/// construction, but with an empty method set: nothing is left to consume.
pub struct FacetFactoryPostProcessor;

impl PostProcessor for FacetFactoryPostProcessor {
    fn name(&self) -> &'static str {
        "FacetFactoryPostProcessor"
    }

    fn post_process(&self, spec: &ObjectSpecification, ctx: &PostProcessContext<'_>) -> Result<()> {
        let class = spec.class();
        let mut remover = MethodRemover::default();

        for factory in ctx.model().factories_for(ProcessingStage::PostProcessing) {
            let kinds = factory.feature_kinds();
            if kinds.applies_to(FeatureKind::Type) {
                factory
                    .process_class(&mut ClassContext::new(class, spec.holder(), &mut remover))
                    .map_err(|e| factory_error(factory, spec.identifier(), e))?;
            }

            for member in spec.declared_members() {
                if kinds.applies_to(member.kind()) {
                    factory
                        .process_method(&mut MethodContext::new(
                            class,
                            member.method(),
                            member.holder(),
                            &mut remover,
                        ))
                        .map_err(|e| factory_error(factory, member.identifier(), e))?;
                }
                if !kinds.applies_to(FeatureKind::ActionParameter) {
                    continue;
                }
                for parameter in member.parameters() {
                    factory
                        .process_param(&mut ParameterContext::new(
                            class,
                            member.method(),
                            parameter.descriptor.as_ref(),
                            parameter.holder(),
                            &mut remover,
                        ))
                        .map_err(|e| factory_error(factory, parameter.identifier(), e))?;
                }
            }
        }
        Ok(())
    }
}
