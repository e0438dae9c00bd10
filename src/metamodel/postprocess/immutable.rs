use std::sync::Arc;

use tracing::trace;

use crate::{
    metamodel::{
        facets::{DisabledFacet, DisabledFacetWithReason, FacetType, ImmutableFacet},
        postprocess::{PostProcessContext, PostProcessor},
        spec::ObjectSpecification,
    },
    Result,
};

/// Disables the associations of an immutable type.
///
/// Every property and collection of a type carrying an [`ImmutableFacet`] (own or inherited)
/// gets a `DisabledFacet` derived from it, with the immutable facet's reason. Inherited
/// associations are covered through the subtype-local holders built at construction.
/// Members that already have a directly contributed `DisabledFacet` keep it.
pub struct DisabledFromImmutable;

impl PostProcessor for DisabledFromImmutable {
    fn name(&self) -> &'static str {
        "DisabledFromImmutable"
    }

    fn priority(&self) -> u32 {
        300
    }

    fn post_process(&self, spec: &ObjectSpecification, _ctx: &PostProcessContext<'_>) -> Result<()> {
        let Some(immutable) = spec.facet::<dyn ImmutableFacet>() else {
            return Ok(());
        };

        for member in spec.declared_members().iter().filter(|m| m.is_association()) {
            let holder = member.holder();
            if holder
                .get_facet::<dyn DisabledFacet>()
                .is_some_and(|existing| !existing.is_derived())
            {
                trace!(member = %member.identifier(), "keeps its declared disabled facet");
                continue;
            }

            trace!(member = %member.identifier(), "disabled by immutable type");
            holder.add_facet::<dyn DisabledFacet>(Arc::new(DisabledFacetWithReason::derived(
                member.identifier(),
                immutable.reason(),
                FacetType::of::<dyn ImmutableFacet>(),
            )))?;
        }
        Ok(())
    }
}
