use crate::{
    metamodel::{
        postprocess::{PostProcessContext, PostProcessor},
        spec::ObjectSpecification,
    },
    Result,
};

/// Registers every specification with its direct superclass
pub struct SubclassLinking;

impl PostProcessor for SubclassLinking {
    fn name(&self) -> &'static str {
        "SubclassLinking"
    }

    fn priority(&self) -> u32 {
        100
    }

    fn post_process(&self, spec: &ObjectSpecification, ctx: &PostProcessContext<'_>) -> Result<()> {
        if let Some(superclass) = spec.superclass() {
            superclass.add_subclass(ctx.reference(spec.name()));
        }
        Ok(())
    }
}
